//! Contact form.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::types::{ContactRequest, ContactResponse};
use crate::validation::{FieldErrors, is_valid_email};
use crate::view::{FormView, StatusKind};
use crate::workflow::{FormController, SubmissionWorkflow, SubmitOutcome};

pub const NAME_FIELD: &str = "name";
pub const EMAIL_FIELD: &str = "email";
pub const SUBJECT_FIELD: &str = "subject";
pub const MESSAGE_FIELD: &str = "message";

const MISSING_TEXT: &str = "Please fill in all fields";
const INVALID_EMAIL_TEXT: &str = "Please enter a valid email address";

pub struct ContactController {
    backend: Arc<dyn Backend>,
}

impl ContactController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn view() -> FormView {
        FormView::new("Send Message")
    }

    pub async fn submit(&self, view: &mut FormView) -> SubmitOutcome {
        SubmissionWorkflow::run(self, view).await
    }
}

#[async_trait::async_trait]
impl FormController for ContactController {
    type Payload = ContactRequest;
    type Response = ContactResponse;

    fn name(&self) -> &'static str {
        "contact"
    }

    fn busy_label(&self) -> Option<&str> {
        Some("Sending...")
    }

    fn extract(&self, view: &FormView) -> ContactRequest {
        ContactRequest {
            name: view.value(NAME_FIELD).to_owned(),
            email: view.value(EMAIL_FIELD).to_owned(),
            subject: view.value(SUBJECT_FIELD).to_owned(),
            message: view.value(MESSAGE_FIELD).to_owned(),
        }
    }

    // Presence is checked on the raw value; the email shape only once every
    // field is present.
    fn validate(&self, payload: &ContactRequest) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            (NAME_FIELD, &payload.name),
            (EMAIL_FIELD, &payload.email),
            (SUBJECT_FIELD, &payload.subject),
            (MESSAGE_FIELD, &payload.message),
        ] {
            if value.is_empty() {
                errors.push(field, MISSING_TEXT);
            }
        }
        if errors.is_empty() && !is_valid_email(&payload.email) {
            errors.push(EMAIL_FIELD, INVALID_EMAIL_TEXT);
        }
        errors.into_result()
    }

    fn on_invalid(&self, errors: &FieldErrors, view: &mut FormView) {
        for e in errors.iter() {
            view.mark_error(&e.field, &e.message);
        }
        if let Some(first) = errors.first() {
            view.show_status(StatusKind::Error, first.message.clone());
        }
    }

    async fn send(&self, payload: &ContactRequest) -> Result<ContactResponse, ClientError> {
        Ok(self.backend.contact(payload).await?)
    }

    async fn on_success(
        &self,
        response: ContactResponse,
        view: &mut FormView,
    ) -> Result<(), ClientError> {
        view.show_status(
            StatusKind::Success,
            response
                .message
                .unwrap_or_else(|| "Message sent".to_owned()),
        );
        view.reset();
        Ok(())
    }

    fn on_failure(&self, error: &ClientError, view: &mut FormView) {
        let text = if error.is_server_refusal() {
            format!("Error: {}", error.server_message().unwrap_or("Server error"))
        } else {
            format!("Error: {error}")
        };
        view.show_status(StatusKind::Error, text);
    }
}
