//! Admin login form.
//!
//! Signs in twice with the same credentials: `POST /api/login` for the bearer
//! token the blog API wants, then the site's form login for the
//! `admin_user_id` cookie image uploads want. Only the first decides whether
//! the login succeeded.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::endpoint::ADMIN_DASHBOARD_PATH;
use crate::error::{ApiError, ClientError};
use crate::session::{AccessToken, SessionHandle, SiteCookie};
use crate::types::{LoginRequest, LoginResponse};
use crate::validation::FieldErrors;
use crate::view::{FormView, StatusKind};
use crate::workflow::{FormController, SubmissionWorkflow, SubmitOutcome};

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

/// Both halves of a login.
#[derive(Debug, Clone)]
pub struct LoginReply {
    pub response: LoginResponse,
    /// `None` if the API login was refused or the form login set no cookie.
    pub site_cookie: Option<SiteCookie>,
}

/// Validates credentials, logs in, stores the session, and navigates to the
/// dashboard.
pub struct LoginController {
    backend: Arc<dyn Backend>,
    session: SessionHandle,
}

impl LoginController {
    pub fn new(backend: Arc<dyn Backend>, session: SessionHandle) -> Self {
        Self { backend, session }
    }

    /// A fresh view for this form.
    pub fn view() -> FormView {
        FormView::new("Login")
    }

    pub async fn submit(&self, view: &mut FormView) -> SubmitOutcome {
        SubmissionWorkflow::run(self, view).await
    }
}

#[async_trait::async_trait]
impl FormController for LoginController {
    type Payload = LoginRequest;
    type Response = LoginReply;

    fn name(&self) -> &'static str {
        "login"
    }

    fn busy_label(&self) -> Option<&str> {
        Some("Signing in...")
    }

    fn extract(&self, view: &FormView) -> LoginRequest {
        LoginRequest {
            email: view.value(EMAIL_FIELD).to_owned(),
            password: view.value(PASSWORD_FIELD).to_owned(),
        }
    }

    fn validate(&self, payload: &LoginRequest) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_email(
            EMAIL_FIELD,
            &payload.email,
            "Email is required",
            "Please enter a valid email",
        );
        errors.require(PASSWORD_FIELD, &payload.password, "Password is required");
        errors.into_result()
    }

    async fn send(&self, payload: &LoginRequest) -> Result<LoginReply, ClientError> {
        let response = self.backend.login(payload).await?;
        if !response.success {
            return Ok(LoginReply {
                response,
                site_cookie: None,
            });
        }
        let site_cookie = match self.backend.site_login(payload).await {
            Ok(cookie) => cookie,
            Err(e) => {
                warn!(error = %e, "site login failed, image uploads will be refused");
                None
            }
        };
        Ok(LoginReply {
            response,
            site_cookie,
        })
    }

    async fn on_success(&self, reply: LoginReply, view: &mut FormView) -> Result<(), ClientError> {
        let LoginReply {
            response,
            site_cookie,
        } = reply;
        if !response.success {
            return Err(ClientError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| ApiError::Decode("login response has no access_token".to_owned()))?;
        let user = response.user.unwrap_or_default();

        self.session
            .store_login(&token, &user, site_cookie.as_ref())
            .await?;
        info!(site_cookie = site_cookie.is_some(), "logged in");

        view.reset();
        view.show_status(
            StatusKind::Success,
            response.message.unwrap_or_else(|| "Login successful".to_owned()),
        );
        view.navigate(ADMIN_DASHBOARD_PATH);
        Ok(())
    }

    fn on_failure(&self, error: &ClientError, view: &mut FormView) {
        let text = if error.is_server_refusal() {
            format!(
                "Login failed: {}",
                error.server_message().unwrap_or("unknown error")
            )
        } else {
            format!("Login error: {error}")
        };
        view.show_status(StatusKind::Error, text);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fake::{Call, FakeBackend};

    fn setup() -> (Arc<FakeBackend>, SessionHandle, LoginController) {
        let fake = Arc::new(FakeBackend::default());
        let session = SessionHandle::in_memory();
        let controller = LoginController::new(fake.clone(), session.clone());
        (fake, session, controller)
    }

    fn form(email: &str, password: &str) -> FormView {
        LoginController::view().with_values([(EMAIL_FIELD, email), (PASSWORD_FIELD, password)])
    }

    #[tokio::test]
    async fn empty_password_blocks_request_for_any_email() {
        for email in ["", "not-an-email", "a@b.co"] {
            let (fake, _, controller) = setup();
            let mut view = form(email, "");
            let outcome = controller.submit(&mut view).await;
            assert_eq!(outcome, SubmitOutcome::Invalid, "email {email:?}");
            assert!(fake.calls().is_empty());
            assert_eq!(view.field_error(PASSWORD_FIELD), Some("Password is required"));
        }
    }

    #[tokio::test]
    async fn whitespace_password_counts_as_empty() {
        let (fake, _, controller) = setup();
        let mut view = form("a@b.co", "   ");
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Invalid);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn email_messages() {
        let (_, _, controller) = setup();
        let mut view = form("", "pw");
        controller.submit(&mut view).await;
        assert_eq!(view.field_error(EMAIL_FIELD), Some("Email is required"));

        let mut view = form("a@b", "pw");
        controller.submit(&mut view).await;
        assert_eq!(view.field_error(EMAIL_FIELD), Some("Please enter a valid email"));
        assert!(view.field_error(PASSWORD_FIELD).is_none());
    }

    fn accepted(user: serde_json::Value) -> LoginResponse {
        LoginResponse {
            success: true,
            access_token: Some("T".to_owned()),
            user: Some(user),
            message: Some("Login successful".to_owned()),
        }
    }

    #[tokio::test]
    async fn success_stores_token_cookie_and_navigates() {
        let (fake, session, controller) = setup();
        let user = json!({"id": "1", "name": "Ada", "email": "ada@example.com"});
        *fake.login.lock().unwrap() = Some(Ok(accepted(user.clone())));
        *fake.site_login.lock().unwrap() = Some(Ok(Some(SiteCookie::new("1"))));

        let mut view = form("ada@example.com", "hunter2");
        let outcome = controller.submit(&mut view).await;

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(session.token().await.unwrap().unwrap().as_str(), "T");
        assert_eq!(session.user().await.unwrap(), Some(user));
        assert_eq!(session.site_cookie().await.unwrap(), Some(SiteCookie::new("1")));
        assert_eq!(view.navigation(), Some(ADMIN_DASHBOARD_PATH));
        assert_eq!(
            fake.calls(),
            vec![
                Call::Login {
                    email: "ada@example.com".to_owned(),
                    password: "hunter2".to_owned(),
                },
                Call::SiteLogin {
                    email: "ada@example.com".to_owned(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_site_login_still_logs_in_without_cookie() {
        for site_login in [Ok(None), Err(ApiError::Http { status: 500, message: None })] {
            let (fake, session, controller) = setup();
            *fake.login.lock().unwrap() = Some(Ok(accepted(json!({"name": "Ada"}))));
            *fake.site_login.lock().unwrap() = Some(site_login);

            let mut view = form("ada@example.com", "hunter2");
            assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Succeeded);
            assert_eq!(view.status().unwrap().text, "Login successful");
            assert!(session.token().await.unwrap().is_some());
            assert_eq!(session.site_cookie().await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn rejected_login_shows_message_and_stores_nothing() {
        let (fake, session, controller) = setup();
        *fake.login.lock().unwrap() = Some(Err(ApiError::Http {
            status: 401,
            message: Some("Invalid credentials".to_owned()),
        }));

        let mut view = form("ada@example.com", "wrong");
        let outcome = controller.submit(&mut view).await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(view.status().unwrap().text, "Login failed: Invalid credentials");
        assert!(session.token().await.unwrap().is_none());
        assert!(view.navigation().is_none());
        assert!(view.submit().enabled);
        assert_eq!(fake.calls().len(), 1, "no form login after a refusal");
    }

    #[tokio::test]
    async fn success_false_is_a_failure() {
        let (fake, session, controller) = setup();
        *fake.login.lock().unwrap() = Some(Ok(LoginResponse {
            success: false,
            message: Some("Account disabled".to_owned()),
            ..LoginResponse::default()
        }));

        let mut view = form("ada@example.com", "pw");
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Failed);
        assert_eq!(view.status().unwrap().text, "Login failed: Account disabled");
        assert!(session.token().await.unwrap().is_none());
        assert!(!fake.calls().iter().any(|c| matches!(c, Call::SiteLogin { .. })));
    }

    #[tokio::test]
    async fn missing_token_in_success_is_an_error() {
        let (fake, session, controller) = setup();
        *fake.login.lock().unwrap() = Some(Ok(LoginResponse {
            success: true,
            ..LoginResponse::default()
        }));

        let mut view = form("ada@example.com", "pw");
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Failed);
        assert!(view.status().unwrap().text.starts_with("Login error: "));
        assert!(session.token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transport_error_message() {
        let (fake, _, controller) = setup();
        *fake.login.lock().unwrap() = Some(Err(ApiError::Transport("connection refused".to_owned())));

        let mut view = form("ada@example.com", "pw");
        controller.submit(&mut view).await;
        assert_eq!(
            view.status().unwrap().text,
            "Login error: request failed: connection refused"
        );
    }
}
