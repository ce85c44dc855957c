//! The shared submit cycle: validate → submit → render → restore.
//!
//! A controller implements [`FormController`] to supply field extraction,
//! validation, the backend call, and the success/failure renderers.
//! [`SubmissionWorkflow::run`] drives any of them through the same steps:
//!
//! 1. Clear inline errors and the status area.
//! 2. Extract a payload from the view and validate it. On failure, render
//!    the errors and stop; no request is made.
//! 3. Disable the submit control (if the controller has one) and run the
//!    controller's start hook.
//! 4. Make the backend call and render success or failure.
//! 5. Restore the submit control, whatever happened in step 4.

use tracing::{debug, warn};

use crate::error::ClientError;
use crate::validation::FieldErrors;
use crate::view::FormView;

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid,
    /// Nothing to submit (e.g. no file selected); nothing was sent.
    Skipped,
    /// The request completed and the success renderer ran.
    Succeeded,
    /// The request or the success handling failed; the failure renderer ran.
    Failed,
}

impl SubmitOutcome {
    /// Whether a request went out.
    pub fn sent_request(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A controller bound to one form.
#[async_trait::async_trait]
pub trait FormController: Send + Sync {
    /// What gets sent.
    type Payload: Send + Sync;
    /// What comes back on success.
    type Response: Send;

    /// Short name used in traces.
    fn name(&self) -> &'static str;

    /// Label for the submit control while the request is in flight, or
    /// `None` if this controller has no submit control to disable.
    fn busy_label(&self) -> Option<&str>;

    /// Build the payload from the current field values.
    fn extract(&self, view: &FormView) -> Self::Payload;

    /// Synchronous checks that must pass before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns every failed check.
    fn validate(&self, payload: &Self::Payload) -> Result<(), FieldErrors>;

    /// Render validation failures. Defaults to inline annotations.
    fn on_invalid(&self, errors: &FieldErrors, view: &mut FormView) {
        for e in errors.iter() {
            view.mark_error(&e.field, &e.message);
        }
    }

    /// Runs after validation passes, right before the request.
    fn on_start(&self, _view: &mut FormView) {}

    /// The single backend call.
    ///
    /// # Errors
    ///
    /// Returns whatever the backend or session reports.
    async fn send(&self, payload: &Self::Payload) -> Result<Self::Response, ClientError>;

    /// Render a successful response and apply its side effects.
    ///
    /// # Errors
    ///
    /// An error here is rendered by [`on_failure`](Self::on_failure) like any
    /// other failure.
    async fn on_success(
        &self,
        response: Self::Response,
        view: &mut FormView,
    ) -> Result<(), ClientError>;

    /// Render a failure as status text.
    fn on_failure(&self, error: &ClientError, view: &mut FormView);
}

/// Drives a [`FormController`] through one submission.
pub struct SubmissionWorkflow;

impl SubmissionWorkflow {
    pub async fn run<C>(controller: &C, view: &mut FormView) -> SubmitOutcome
    where
        C: FormController + ?Sized,
    {
        view.clear_errors();
        view.hide_status();

        let payload = controller.extract(view);
        if let Err(errors) = controller.validate(&payload) {
            debug!(form = controller.name(), failed = errors.len(), "validation failed");
            controller.on_invalid(&errors, view);
            return SubmitOutcome::Invalid;
        }

        if let Some(label) = controller.busy_label() {
            view.begin_busy(label);
        }
        controller.on_start(view);

        let result = match controller.send(&payload).await {
            Ok(response) => controller.on_success(response, view).await,
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(()) => {
                debug!(form = controller.name(), "submission succeeded");
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                warn!(form = controller.name(), error = %e, "submission failed");
                controller.on_failure(&e, view);
                SubmitOutcome::Failed
            }
        };

        if controller.busy_label().is_some() {
            view.restore_submit();
        }
        outcome
    }
}
