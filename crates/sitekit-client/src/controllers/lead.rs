//! "Request a quote" lead form.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::types::QuoteRequest;
use crate::validation::FieldErrors;
use crate::view::{FormView, StatusKind};
use crate::workflow::{FormController, SubmissionWorkflow, SubmitOutcome};

pub const NAME_FIELD: &str = "name";
pub const EMAIL_FIELD: &str = "email";
pub const COMPANY_FIELD: &str = "company";
pub const PLATFORM_FIELD: &str = "platform";
pub const BUDGET_FIELD: &str = "budget";
pub const TIMELINE_FIELD: &str = "timeline";
pub const MESSAGE_FIELD: &str = "message";

const SUCCESS_TEXT: &str = "Thanks! Your request was received. We'll contact you soon.";
const FAILURE_TEXT: &str = "Failed to submit. Try again later.";
const NETWORK_TEXT: &str = "Network error. Try again later.";

pub struct LeadController {
    backend: Arc<dyn Backend>,
}

impl LeadController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn view() -> FormView {
        FormView::new("Request Quote")
    }

    pub async fn submit(&self, view: &mut FormView) -> SubmitOutcome {
        SubmissionWorkflow::run(self, view).await
    }
}

#[async_trait::async_trait]
impl FormController for LeadController {
    type Payload = QuoteRequest;
    type Response = ();

    fn name(&self) -> &'static str {
        "lead"
    }

    fn busy_label(&self) -> Option<&str> {
        Some("Sending...")
    }

    // Select fields (platform, budget) are sent as-is; free text is trimmed.
    fn extract(&self, view: &FormView) -> QuoteRequest {
        let text = |field: &str| view.value(field).trim().to_owned();
        QuoteRequest {
            name: text(NAME_FIELD),
            email: text(EMAIL_FIELD),
            company: text(COMPANY_FIELD),
            platform: view.value(PLATFORM_FIELD).to_owned(),
            budget: view.value(BUDGET_FIELD).to_owned(),
            timeline: text(TIMELINE_FIELD),
            message: text(MESSAGE_FIELD),
        }
    }

    fn validate(&self, payload: &QuoteRequest) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require(NAME_FIELD, &payload.name, "Name is required");
        errors.require_email(
            EMAIL_FIELD,
            &payload.email,
            "Email is required",
            "Please enter a valid email",
        );
        errors.into_result()
    }

    async fn send(&self, payload: &QuoteRequest) -> Result<(), ClientError> {
        Ok(self.backend.request_quote(payload).await?)
    }

    async fn on_success(&self, _response: (), view: &mut FormView) -> Result<(), ClientError> {
        view.show_status(StatusKind::Success, SUCCESS_TEXT);
        view.reset();
        Ok(())
    }

    fn on_failure(&self, error: &ClientError, view: &mut FormView) {
        let text = if error.is_server_refusal() {
            error.server_message().unwrap_or(FAILURE_TEXT).to_owned()
        } else {
            NETWORK_TEXT.to_owned()
        };
        view.show_status(StatusKind::Error, text);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::fake::{Call, FakeBackend};

    fn setup() -> (Arc<FakeBackend>, LeadController) {
        let fake = Arc::new(FakeBackend::default());
        let controller = LeadController::new(fake.clone());
        (fake, controller)
    }

    fn filled() -> FormView {
        LeadController::view().with_values([
            (NAME_FIELD, "  Ada  "),
            (EMAIL_FIELD, " ada@example.com "),
            (COMPANY_FIELD, "Analytical"),
            (PLATFORM_FIELD, "shopify"),
            (BUDGET_FIELD, "5k-10k"),
            (TIMELINE_FIELD, "Q3"),
            (MESSAGE_FIELD, "Need a storefront\n"),
        ])
    }

    fn assert_button_restored(view: &FormView) {
        assert!(view.submit().enabled);
        assert_eq!(view.submit().label, "Request Quote");
    }

    #[tokio::test]
    async fn success_trims_sends_resets_and_restores() {
        let (fake, controller) = setup();
        *fake.request_quote.lock().unwrap() = Some(Ok(()));
        let mut view = filled();

        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Succeeded);

        let status = view.status().unwrap();
        assert_eq!(status.kind, StatusKind::Success);
        assert_eq!(status.text, SUCCESS_TEXT);
        assert_eq!(view.value(NAME_FIELD), "");
        assert_button_restored(&view);
        assert_eq!(
            fake.calls(),
            vec![Call::RequestQuote(QuoteRequest {
                name: "Ada".to_owned(),
                email: "ada@example.com".to_owned(),
                company: "Analytical".to_owned(),
                platform: "shopify".to_owned(),
                budget: "5k-10k".to_owned(),
                timeline: "Q3".to_owned(),
                message: "Need a storefront".to_owned(),
            })]
        );
    }

    #[tokio::test]
    async fn button_is_restored_after_every_outcome() {
        let failures = [
            Err(ApiError::Http {
                status: 422,
                message: Some("value is not a valid email address".to_owned()),
            }),
            Err(ApiError::Http {
                status: 500,
                message: None,
            }),
            Err(ApiError::Transport("connection refused".to_owned())),
            Err(ApiError::Decode("EOF".to_owned())),
            Ok(()),
        ];
        for scripted in failures {
            let (fake, controller) = setup();
            *fake.request_quote.lock().unwrap() = Some(scripted);
            let mut view = filled();
            controller.submit(&mut view).await;
            assert_button_restored(&view);
        }
    }

    #[tokio::test]
    async fn failure_messages() {
        let cases = [
            (
                ApiError::Http {
                    status: 422,
                    message: Some("value is not a valid email address".to_owned()),
                },
                "value is not a valid email address",
            ),
            (
                ApiError::Http {
                    status: 500,
                    message: None,
                },
                FAILURE_TEXT,
            ),
            (ApiError::Transport("reset".to_owned()), NETWORK_TEXT),
            (ApiError::Decode("EOF".to_owned()), NETWORK_TEXT),
        ];
        for (err, expected) in cases {
            let (fake, controller) = setup();
            *fake.request_quote.lock().unwrap() = Some(Err(err));
            let mut view = filled();
            assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Failed);
            let status = view.status().unwrap();
            assert_eq!(status.kind, StatusKind::Error);
            assert_eq!(status.text, expected);
            assert_eq!(view.value(NAME_FIELD), "  Ada  ");
        }
    }

    #[tokio::test]
    async fn invalid_email_blocks_request() {
        let (fake, controller) = setup();
        let mut view = filled();
        view.set_value(EMAIL_FIELD, "ada@example");
        assert_eq!(controller.submit(&mut view).await, SubmitOutcome::Invalid);
        assert_eq!(view.field_error(EMAIL_FIELD), Some("Please enter a valid email"));
        assert!(fake.calls().is_empty());
        assert_button_restored(&view);
    }
}
