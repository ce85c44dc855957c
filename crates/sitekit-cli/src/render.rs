//! Terminal rendering of a [`FormView`].

use serde_json::Value;
use sitekit_client::view::{BlogList, FormView, StatusKind};

/// ANSI escapes, or empty strings when color is off.
pub struct Palette {
    pub reset: &'static str,
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub cyan: &'static str,
    pub white: &'static str,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        if color {
            Self {
                reset: "\x1b[0m",
                bold: "\x1b[1m",
                dim: "\x1b[2m",
                red: "\x1b[31m",
                green: "\x1b[32m",
                yellow: "\x1b[33m",
                cyan: "\x1b[36m",
                white: "\x1b[37m",
            }
        } else {
            Self {
                reset: "",
                bold: "",
                dim: "",
                red: "",
                green: "",
                yellow: "",
                cyan: "",
                white: "",
            }
        }
    }

    pub fn header(&self, icon: &str, title: &str) {
        let Self {
            reset,
            bold,
            dim,
            cyan,
            ..
        } = self;
        println!("{bold}{cyan}{icon} {title}{reset}");
        println!("{dim}─────────────────────────────────────────{reset}");
    }

    pub fn kv_line(&self, key: &str, value: &str) {
        let Self {
            reset, dim, white, ..
        } = self;
        println!("  {dim}{key:<20}{reset} {white}{value}{reset}");
    }

    pub fn success(&self, msg: &str) {
        let Self {
            reset, bold, green, ..
        } = self;
        println!("{green}{bold}✓{reset} {msg}");
    }

    pub fn warning(&self, msg: &str) {
        let Self {
            reset,
            bold,
            yellow,
            ..
        } = self;
        println!("{yellow}{bold}⚠{reset} {yellow}{msg}{reset}");
    }

    pub fn failure(&self, msg: &str) {
        let Self {
            reset, bold, red, ..
        } = self;
        println!("{red}{bold}✗{reset} {red}{msg}{reset}");
    }

    pub fn info(&self, msg: &str) {
        let Self { reset, dim, .. } = self;
        println!("{dim}…{reset} {msg}");
    }

    /// Print everything a controller left in `view`: inline errors, the
    /// status line, preview, pending navigation, and the blog list.
    pub fn view(&self, view: &FormView) {
        for (field, message) in view.field_errors() {
            self.failure(&format!("{field}: {message}"));
        }

        if let Some(status) = view.status() {
            match status.kind {
                StatusKind::Success => self.success(&status.text),
                StatusKind::Error => self.failure(&status.text),
                StatusKind::Info => self.info(&status.text),
            }
        }

        if let Some(url) = view.preview() {
            self.kv_line("Image", url);
        }
        if let Some(path) = view.navigation() {
            self.kv_line("Continue at", path);
        }

        self.blog_list(view.blog_list());
    }

    pub fn blog_list(&self, list: &BlogList) {
        let Self {
            reset, bold, dim, ..
        } = self;
        match list {
            BlogList::NotLoaded => {}
            BlogList::Empty => {
                println!();
                println!("  {dim}No blog posts yet.{reset}");
            }
            BlogList::Rows(rows) => {
                println!();
                self.header("📝", "Blog Posts");
                println!(
                    "  {bold}{:<32} {:<24} {:<10} {}{reset}",
                    "TITLE", "SLUG", "CREATED", "ID"
                );
                for row in rows {
                    println!(
                        "  {:<32} {dim}{:<24}{reset} {:<10} {dim}{}{reset}",
                        row.title, row.slug, row.created, row.id
                    );
                }
            }
        }
    }

    /// Pretty-print a JSON record under `key`, one field per line when it
    /// is an object.
    pub fn record(&self, key: &str, record: &Value) {
        match record {
            Value::Object(map) if !map.is_empty() => {
                self.kv_line(key, "");
                for (k, v) in map {
                    let shown = v.as_str().map_or_else(|| v.to_string(), str::to_owned);
                    self.kv_line(&format!("  {k}"), &shown);
                }
            }
            Value::Null => self.kv_line(key, "-"),
            other => self.kv_line(key, &other.to_string()),
        }
    }
}
