//! Admin blog page: post list and new-post form.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{error, info};

use crate::backend::Backend;
use crate::endpoint::{CREATE_BLOG, LIST_BLOGS};
use crate::error::{ApiError, ClientError, GateError};
use crate::session::{AccessToken, AdminGate, SessionHandle};
use crate::types::{Ack, BlogPost, FormData};
use crate::validation::FieldErrors;
use crate::view::{BlogList, BlogRow, FormView, StatusKind};
use crate::workflow::{FormController, SubmissionWorkflow, SubmitOutcome};

pub const TITLE_FIELD: &str = "title";
pub const CONTENT_FIELD: &str = "content";
pub const SLUG_FIELD: &str = "slug";
pub const TAGS_FIELD: &str = "tags";
/// Hidden field the image upload fills in.
pub const IMAGE_URL_FIELD: &str = "image_url";

/// Controller for the admin blog page.
///
/// Only obtainable through [`open`](Self::open), which runs the admin gate
/// first.
pub struct BlogAdminController {
    backend: Arc<dyn Backend>,
    session: SessionHandle,
}

impl BlogAdminController {
    /// Run the admin gate and, if it passes, return the controller.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Redirect`] when no token is stored. No other
    /// page logic runs in that case.
    pub async fn open(
        backend: Arc<dyn Backend>,
        session: SessionHandle,
    ) -> Result<Self, GateError> {
        AdminGate::check(&session).await?;
        Ok(Self { backend, session })
    }

    /// A fresh view for the new-post form.
    pub fn view() -> FormView {
        FormView::new("Publish").with_hidden(IMAGE_URL_FIELD)
    }

    /// Re-read the token for each request; a logout elsewhere takes effect
    /// immediately.
    async fn token(&self, path: &'static str) -> Result<AccessToken, ClientError> {
        self.session
            .token()
            .await?
            .ok_or_else(|| ApiError::MissingToken { path }.into())
    }

    /// Fetch the posts and render them into `view`.
    ///
    /// On failure the list area is left as it was; the error is traced and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the backend or session error.
    pub async fn load_posts(&self, view: &mut FormView) -> Result<usize, ClientError> {
        let result = match self.token(LIST_BLOGS.path).await {
            Ok(token) => self.backend.list_blogs(&token).await.map_err(ClientError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(posts) => {
                let count = posts.len();
                view.set_blog_list(render_posts(&posts));
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "error loading blogs");
                Err(e)
            }
        }
    }

    pub async fn submit(&self, view: &mut FormView) -> SubmitOutcome {
        SubmissionWorkflow::run(self, view).await
    }
}

#[async_trait::async_trait]
impl FormController for BlogAdminController {
    type Payload = FormData;
    type Response = Ack;

    fn name(&self) -> &'static str {
        "blog"
    }

    fn busy_label(&self) -> Option<&str> {
        Some("Publishing...")
    }

    fn extract(&self, view: &FormView) -> FormData {
        view.values().clone()
    }

    fn validate(&self, payload: &FormData) -> Result<(), FieldErrors> {
        let field = |name: &str| payload.get(name).map_or("", String::as_str);
        let mut errors = FieldErrors::new();
        errors.require(TITLE_FIELD, field(TITLE_FIELD), "Title is required");
        errors.require(CONTENT_FIELD, field(CONTENT_FIELD), "Content is required");
        errors.into_result()
    }

    async fn send(&self, payload: &FormData) -> Result<Ack, ClientError> {
        let token = self.token(CREATE_BLOG.path).await?;
        Ok(self.backend.create_blog(&token, payload).await?)
    }

    async fn on_success(&self, response: Ack, view: &mut FormView) -> Result<(), ClientError> {
        if !response.success {
            return Err(ClientError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        info!("blog post published");
        // Reset keeps hidden fields; the image belongs to the post just sent.
        view.reset();
        view.set_value(IMAGE_URL_FIELD, "");
        view.set_preview(None);
        view.show_status(StatusKind::Success, "Blog post published successfully!");
        // A failed reload is traced; the publish itself succeeded.
        let _ = self.load_posts(view).await;
        Ok(())
    }

    fn on_failure(&self, error: &ClientError, view: &mut FormView) {
        let text = match error.server_message() {
            Some(message) => format!("Error: {message}"),
            None => "Error publishing blog post".to_owned(),
        };
        view.show_status(StatusKind::Error, text);
    }
}

fn render_posts(posts: &[BlogPost]) -> BlogList {
    if posts.is_empty() {
        return BlogList::Empty;
    }
    BlogList::Rows(
        posts
            .iter()
            .map(|p| BlogRow {
                id: p.id.clone(),
                title: p.title.clone(),
                slug: p.slug.clone(),
                created: p.created_at.as_deref().map(format_date).unwrap_or_default(),
            })
            .collect(),
    )
}

/// Render a backend timestamp as `YYYY-MM-DD`.
///
/// Accepts RFC 3339, naive ISO 8601 (what the backend's `isoformat()`
/// produces), or a bare date. Anything else is shown verbatim.
pub(crate) fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.date().to_string();
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.to_string();
    }
    raw.to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::endpoint::LOGIN_PAGE_PATH;
    use crate::fake::{Call, FakeBackend};

    async fn logged_in() -> (Arc<FakeBackend>, SessionHandle, BlogAdminController) {
        let fake = Arc::new(FakeBackend::default());
        let session = SessionHandle::in_memory();
        session
            .store_login(&AccessToken::new("T"), &Value::Null, None)
            .await
            .unwrap();
        let controller = BlogAdminController::open(fake.clone(), session.clone())
            .await
            .unwrap();
        (fake, session, controller)
    }

    fn post(id: &str, title: &str, created_at: Option<&str>) -> BlogPost {
        BlogPost {
            id: id.to_owned(),
            title: title.to_owned(),
            slug: title.to_lowercase(),
            created_at: created_at.map(str::to_owned),
            ..BlogPost::default()
        }
    }

    #[tokio::test]
    async fn gate_refuses_without_token_and_makes_no_calls() {
        let fake = Arc::new(FakeBackend::default());
        let result = BlogAdminController::open(fake.clone(), SessionHandle::in_memory()).await;
        assert!(matches!(result, Err(GateError::Redirect { to }) if to == LOGIN_PAGE_PATH));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn load_posts_renders_rows() {
        let (fake, _, controller) = logged_in().await;
        *fake.list_blogs.lock().unwrap() = Some(Ok(vec![
            post("1", "Hello", Some("2024-03-01T10:00:00.123456")),
            post("2", "World", None),
        ]));

        let mut view = BlogAdminController::view();
        assert_eq!(controller.load_posts(&mut view).await.unwrap(), 2);

        let BlogList::Rows(rows) = view.blog_list() else {
            panic!("expected rows, got {:?}", view.blog_list());
        };
        assert_eq!(rows[0].created, "2024-03-01");
        assert_eq!(rows[1].created, "");
        assert_eq!(fake.calls(), vec![Call::ListBlogs { token: "T".to_owned() }]);
    }

    #[tokio::test]
    async fn empty_list_renders_placeholder() {
        let (fake, _, controller) = logged_in().await;
        *fake.list_blogs.lock().unwrap() = Some(Ok(vec![]));
        let mut view = BlogAdminController::view();
        controller.load_posts(&mut view).await.unwrap();
        assert_eq!(view.blog_list(), &BlogList::Empty);
    }

    #[tokio::test]
    async fn load_failure_leaves_list_untouched() {
        let (fake, _, controller) = logged_in().await;
        *fake.list_blogs.lock().unwrap() = Some(Err(ApiError::Http {
            status: 500,
            message: None,
        }));
        let mut view = BlogAdminController::view();
        assert!(controller.load_posts(&mut view).await.is_err());
        assert_eq!(view.blog_list(), &BlogList::NotLoaded);
    }

    #[tokio::test]
    async fn publish_sends_raw_fields_with_token_then_reloads() {
        let (fake, _, controller) = logged_in().await;
        *fake.create_blog.lock().unwrap() = Some(Ok(Ack {
            success: true,
            message: None,
        }));
        *fake.list_blogs.lock().unwrap() = Some(Ok(vec![post("1", "Hello", None)]));

        let mut view = BlogAdminController::view().with_values([
            (TITLE_FIELD, "Hello"),
            (CONTENT_FIELD, "Body"),
            (IMAGE_URL_FIELD, "/static/uploads/a.png"),
        ]);
        view.set_preview(Some("/static/uploads/a.png".to_owned()));
        let outcome = controller.submit(&mut view).await;

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(view.status().unwrap().text, "Blog post published successfully!");
        assert_eq!(view.value(TITLE_FIELD), "");
        assert_eq!(view.value(IMAGE_URL_FIELD), "");
        assert!(view.preview().is_none());
        assert!(matches!(view.blog_list(), BlogList::Rows(rows) if rows.len() == 1));
        assert!(view.submit().enabled);

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        let Call::CreateBlog { token, fields } = &calls[0] else {
            panic!("expected CreateBlog, got {:?}", calls[0]);
        };
        assert_eq!(token, "T");
        assert_eq!(fields.get(IMAGE_URL_FIELD).unwrap(), "/static/uploads/a.png");
        assert_eq!(calls[1], Call::ListBlogs { token: "T".to_owned() });
    }

    #[tokio::test]
    async fn missing_title_blocks_publish() {
        let (fake, _, controller) = logged_in().await;
        let mut view = BlogAdminController::view().with_values([(CONTENT_FIELD, "Body")]);
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Invalid);
        assert_eq!(view.field_error(TITLE_FIELD), Some("Title is required"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_publish_shows_server_message() {
        let (fake, _, controller) = logged_in().await;
        *fake.create_blog.lock().unwrap() = Some(Ok(Ack {
            success: false,
            message: Some("Slug already exists".to_owned()),
        }));
        let mut view = BlogAdminController::view()
            .with_values([(TITLE_FIELD, "Hello"), (CONTENT_FIELD, "Body")]);
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Failed);
        assert_eq!(view.status().unwrap().text, "Error: Slug already exists");
        assert_eq!(view.value(TITLE_FIELD), "Hello");
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() {
        let (fake, _, controller) = logged_in().await;
        *fake.create_blog.lock().unwrap() =
            Some(Err(ApiError::Transport("reset".to_owned())));
        let mut view = BlogAdminController::view()
            .with_values([(TITLE_FIELD, "Hello"), (CONTENT_FIELD, "Body")]);
        controller.submit(&mut view).await;
        assert_eq!(view.status().unwrap().text, "Error publishing blog post");
    }

    #[tokio::test]
    async fn logout_after_open_fails_the_next_request() {
        let (fake, session, controller) = logged_in().await;
        session.clear().await.unwrap();
        let mut view = BlogAdminController::view()
            .with_values([(TITLE_FIELD, "Hello"), (CONTENT_FIELD, "Body")]);
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Failed);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_date("2024-03-01T10:00:00Z"), "2024-03-01");
        assert_eq!(format_date("2024-03-01T23:30:00+02:00"), "2024-03-01");
        assert_eq!(format_date("2024-03-01T10:00:00"), "2024-03-01");
        assert_eq!(format_date("2024-03-01T10:00:00.5"), "2024-03-01");
        assert_eq!(format_date("2024-03-01"), "2024-03-01");
        assert_eq!(format_date("yesterday"), "yesterday");
    }
}
