//! `sitekit` CLI: drive the site's forms from a terminal.
//!
//! Each subcommand fills a form view from its flags, runs the matching
//! controller from `sitekit-client`, and prints what the controller rendered.
//! The admin session lives in a small JSON file between invocations.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sitekit_client::config::DEFAULT_BASE_URL;
use sitekit_client::controllers::{
    BlogAdminController, ContactController, ImageUploadController, LeadController,
    LoginController, blog, contact, lead, login, upload,
};
use sitekit_client::types::ImageFile;
use sitekit_client::{
    Backend, ClientConfig, FileSessionStore, FormView, GateError, HttpBackend, SessionHandle,
    SubmitOutcome,
};

use crate::render::Palette;

// ── CLI structure ────────────────────────────────────────────────────

/// sitekit: site forms and blog admin from the terminal.
#[derive(Parser)]
#[command(
    name = "sitekit",
    version,
    about = "sitekit CLI: log in, publish blog posts, upload images, send leads and messages",
    long_about = None,
    after_help = "Environment variables:\n  \
         SITEKIT_URL            Site origin (default: http://127.0.0.1:8000)\n  \
         SITEKIT_SESSION_FILE   Session file (default: ~/.sitekit/session.json)\n  \
         SITEKIT_TIMEOUT_SECS   Request timeout in seconds (default: none)\n  \
         SITEKIT_LOG_LEVEL      Log filter when RUST_LOG is unset (default: warn)\n\n\
         Examples:\n  \
         sitekit login --email admin@example.com\n  \
         sitekit blog publish --title 'Hello' --content 'First post' --image cover.png\n  \
         sitekit quote --name Ada --email ada@example.com --platform shopify"
)]
struct Cli {
    /// Site origin.
    #[arg(long, env = "SITEKIT_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Where the admin session is kept.
    #[arg(long, env = "SITEKIT_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "SITEKIT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Disable colored output.
    #[arg(long, default_value = "false")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the blog admin and store the session.
    Login {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, env = "SITEKIT_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Session inspection.
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Blog admin operations (requires login).
    Blog {
        #[command(subcommand)]
        action: BlogCommands,
    },
    /// Upload an image and print its public URL.
    Upload {
        /// Image file (jpeg, png, gif, or webp; at most 5 MB).
        file: PathBuf,
    },
    /// Submit the "request a quote" form.
    Quote {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        platform: String,
        #[arg(long, default_value = "")]
        budget: String,
        #[arg(long, default_value = "")]
        timeline: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Submit the contact form.
    Contact {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Check the site's health endpoint.
    Health,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Show whether a token is stored and the cached user record.
    Show,
}

#[derive(Subcommand)]
enum BlogCommands {
    /// List existing posts.
    List,
    /// Publish a new post, optionally uploading a cover image first.
    Publish {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, default_value = "")]
        slug: String,
        /// Comma-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
        /// Cover image to upload before publishing.
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

// ── Wiring ───────────────────────────────────────────────────────────

struct App {
    backend: Arc<HttpBackend>,
    session: SessionHandle,
    session_path: PathBuf,
    palette: Palette,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let config = ClientConfig::from_env()
            .context("invalid SITEKIT_* environment")?
            .with_base_url(&cli.url)
            .context("invalid --url")?;
        let backend = Arc::new(HttpBackend::new(&config)?);

        let session_path = match &cli.session_file {
            Some(path) => path.clone(),
            None => home_dir()?.join(".sitekit").join("session.json"),
        };
        let session = SessionHandle::new(Arc::new(FileSessionStore::new(&session_path)));
        debug!(url = %config.base_url, session = %session_path.display(), "configured");

        Ok(Self {
            backend,
            session,
            session_path,
            palette: Palette::new(!cli.no_color),
        })
    }

    /// Gate the blog admin. A refused gate becomes a CLI error pointing at
    /// `sitekit login`.
    async fn blog_admin(&self) -> Result<BlogAdminController> {
        match BlogAdminController::open(self.backend.clone(), self.session.clone()).await {
            Ok(controller) => Ok(controller),
            Err(GateError::Redirect { to }) => {
                bail!("not logged in (redirected to {to}); run `sitekit login` first")
            }
            Err(e) => Err(e).context("failed to read session"),
        }
    }
}

/// Returns the user's home directory.
fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .context("cannot determine home directory (HOME / USERPROFILE not set)")
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Turn a submission outcome into the process result, after the view has
/// been printed.
fn finish(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Succeeded | SubmitOutcome::Skipped => Ok(()),
        SubmitOutcome::Invalid => bail!("form has invalid fields"),
        SubmitOutcome::Failed => bail!("request failed"),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned());
    Ok(ImageFile {
        file_name,
        content_type: content_type_for(path).to_owned(),
        bytes,
    })
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let palette = Palette::new(!cli.no_color);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let Palette {
                reset, bold, red, ..
            } = palette;
            eprintln!();
            eprintln!("  {red}{bold}✗ Error:{reset} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = App::new(&cli)?;
    match cli.command {
        Commands::Login { email, password } => cmd_login(&app, &email, &password).await,
        Commands::Logout => cmd_logout(&app).await,
        Commands::Session {
            action: SessionCommands::Show,
        } => cmd_session_show(&app).await,
        Commands::Blog { action } => match action {
            BlogCommands::List => cmd_blog_list(&app).await,
            BlogCommands::Publish {
                title,
                content,
                slug,
                tags,
                image,
            } => {
                let fields = [
                    (blog::TITLE_FIELD, title),
                    (blog::CONTENT_FIELD, content),
                    (blog::SLUG_FIELD, slug),
                    (blog::TAGS_FIELD, tags),
                ];
                cmd_blog_publish(&app, fields, image.as_deref()).await
            }
        },
        Commands::Upload { file } => cmd_upload(&app, &file).await,
        Commands::Quote {
            name,
            email,
            company,
            platform,
            budget,
            timeline,
            message,
        } => {
            let view = LeadController::view().with_values([
                (lead::NAME_FIELD, name),
                (lead::EMAIL_FIELD, email),
                (lead::COMPANY_FIELD, company),
                (lead::PLATFORM_FIELD, platform),
                (lead::BUDGET_FIELD, budget),
                (lead::TIMELINE_FIELD, timeline),
                (lead::MESSAGE_FIELD, message),
            ]);
            cmd_quote(&app, view).await
        }
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let view = ContactController::view().with_values([
                (contact::NAME_FIELD, name),
                (contact::EMAIL_FIELD, email),
                (contact::SUBJECT_FIELD, subject),
                (contact::MESSAGE_FIELD, message),
            ]);
            cmd_contact(&app, view).await
        }
        Commands::Health => cmd_health(&app).await,
    }
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_login(app: &App, email: &str, password: &str) -> Result<()> {
    let controller = LoginController::new(app.backend.clone(), app.session.clone());
    let mut view = LoginController::view()
        .with_values([(login::EMAIL_FIELD, email), (login::PASSWORD_FIELD, password)]);

    app.palette.header("🔑", "Admin Login");
    let outcome = controller.submit(&mut view).await;
    app.palette.view(&view);
    if outcome == SubmitOutcome::Succeeded {
        app.palette
            .kv_line("Session", &app.session_path.display().to_string());
    }
    finish(outcome)
}

async fn cmd_logout(app: &App) -> Result<()> {
    app.session.clear().await.context("failed to clear session")?;
    app.palette.success("Logged out");
    Ok(())
}

async fn cmd_session_show(app: &App) -> Result<()> {
    let token = app.session.token().await.context("failed to read session")?;
    let user = app.session.user().await.context("failed to read session")?;
    let site_cookie = app
        .session
        .site_cookie()
        .await
        .context("failed to read session")?;

    app.palette.header("👤", "Session");
    app.palette
        .kv_line("File", &app.session_path.display().to_string());
    app.palette
        .kv_line("Logged in", if token.is_some() { "yes" } else { "no" });
    app.palette.kv_line(
        "Image uploads",
        if site_cookie.is_some() { "yes" } else { "no" },
    );
    match user {
        Some(user) => app.palette.record("User", &user),
        None => app.palette.kv_line("User", "-"),
    }
    Ok(())
}

async fn cmd_blog_list(app: &App) -> Result<()> {
    let admin = app.blog_admin().await?;
    let mut view = BlogAdminController::view();
    admin
        .load_posts(&mut view)
        .await
        .context("failed to load blog posts")?;
    app.palette.blog_list(view.blog_list());
    Ok(())
}

async fn cmd_blog_publish(
    app: &App,
    fields: [(&str, String); 4],
    image: Option<&Path>,
) -> Result<()> {
    let admin = app.blog_admin().await?;
    let mut view = BlogAdminController::view();

    app.palette.header("📝", "Publish Blog Post");

    if let Some(path) = image {
        view.attach_file(upload::FILE_FIELD, read_image(path).await?);
        let uploads = ImageUploadController::new(app.backend.clone(), app.session.clone());
        let outcome = uploads.select(&mut view).await;
        app.palette.view(&view);
        finish(outcome).context("image upload failed")?;
    }

    for (field, value) in fields {
        view.set_value(field, &value);
    }
    let outcome = admin.submit(&mut view).await;
    app.palette.view(&view);
    finish(outcome)
}

async fn cmd_upload(app: &App, path: &Path) -> Result<()> {
    let mut view = BlogAdminController::view();
    view.attach_file(upload::FILE_FIELD, read_image(path).await?);

    app.palette.header("🖼", "Image Upload");
    let controller = ImageUploadController::new(app.backend.clone(), app.session.clone());
    let outcome = controller.select(&mut view).await;
    app.palette.view(&view);
    finish(outcome)
}

async fn cmd_quote(app: &App, mut view: FormView) -> Result<()> {
    app.palette.header("💬", "Request a Quote");
    let controller = LeadController::new(app.backend.clone());
    let outcome = controller.submit(&mut view).await;
    app.palette.view(&view);
    finish(outcome)
}

async fn cmd_contact(app: &App, mut view: FormView) -> Result<()> {
    app.palette.header("✉", "Contact");
    let controller = ContactController::new(app.backend.clone());
    let outcome = controller.submit(&mut view).await;
    app.palette.view(&view);
    finish(outcome)
}

async fn cmd_health(app: &App) -> Result<()> {
    let report = app
        .backend
        .health()
        .await
        .with_context(|| format!("health check against {} failed", app.backend.base_url()))?;

    app.palette.header("🩺", "Site Health");
    app.palette.kv_line("Status", &report.status);
    app.palette.kv_line("Service", &report.service);
    app.palette.kv_line(
        "Database",
        if report.db_connected {
            "connected"
        } else {
            "disconnected"
        },
    );
    if report.status != "healthy" || !report.db_connected {
        app.palette.warning("site is degraded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("dir/b.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("c.gif")), "image/gif");
        assert_eq!(content_type_for(Path::new("d.png")), "image/png");
        assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn outcomes_map_to_exit_status() {
        assert!(finish(SubmitOutcome::Succeeded).is_ok());
        assert!(finish(SubmitOutcome::Skipped).is_ok());
        assert!(finish(SubmitOutcome::Invalid).is_err());
        assert!(finish(SubmitOutcome::Failed).is_err());
    }
}
