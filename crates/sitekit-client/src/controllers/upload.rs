//! Image upload for the blog form.
//!
//! Triggered when a file is selected, not by the form's submit control. A
//! successful upload fills the hidden `image_url` field so the post that is
//! published next carries the image.
//!
//! The upload route checks the site cookie rather than the bearer token, so
//! the controller sends whatever cookie the last login stored.

use std::sync::Arc;

use crate::backend::Backend;
use crate::controllers::blog::IMAGE_URL_FIELD;
use crate::error::ClientError;
use crate::session::SessionHandle;
use crate::types::{ImageFile, UploadResponse};
use crate::validation::FieldErrors;
use crate::view::{FormView, StatusKind};
use crate::workflow::{FormController, SubmissionWorkflow, SubmitOutcome};

/// File input the image is attached to.
pub const FILE_FIELD: &str = "image_file";

/// Largest file accepted before any upload is attempted (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub struct ImageUploadController {
    backend: Arc<dyn Backend>,
    session: SessionHandle,
}

impl ImageUploadController {
    pub fn new(backend: Arc<dyn Backend>, session: SessionHandle) -> Self {
        Self { backend, session }
    }

    /// Upload whatever is attached to [`FILE_FIELD`].
    ///
    /// Returns [`SubmitOutcome::Skipped`] if nothing is attached.
    pub async fn select(&self, view: &mut FormView) -> SubmitOutcome {
        if view.file(FILE_FIELD).is_none() {
            return SubmitOutcome::Skipped;
        }
        SubmissionWorkflow::run(self, view).await
    }
}

#[async_trait::async_trait]
impl FormController for ImageUploadController {
    type Payload = Option<ImageFile>;
    type Response = UploadResponse;

    fn name(&self) -> &'static str {
        "image-upload"
    }

    fn busy_label(&self) -> Option<&str> {
        None
    }

    fn extract(&self, view: &FormView) -> Option<ImageFile> {
        view.file(FILE_FIELD).cloned()
    }

    fn validate(&self, payload: &Option<ImageFile>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match payload {
            None => errors.push(FILE_FIELD, "No file selected"),
            Some(file) if file.size() > MAX_UPLOAD_BYTES => {
                errors.push(FILE_FIELD, "File too large (max 5MB)");
            }
            Some(_) => {}
        }
        errors.into_result()
    }

    fn on_invalid(&self, errors: &FieldErrors, view: &mut FormView) {
        if let Some(first) = errors.first() {
            view.show_status(StatusKind::Error, first.message.clone());
        }
        view.clear_file(FILE_FIELD);
    }

    fn on_start(&self, view: &mut FormView) {
        view.show_status(StatusKind::Info, "Uploading...");
    }

    async fn send(&self, payload: &Option<ImageFile>) -> Result<UploadResponse, ClientError> {
        let Some(file) = payload else {
            return Ok(UploadResponse::default());
        };
        let cookie = self.session.site_cookie().await?;
        Ok(self.backend.upload_image(file, cookie.as_ref()).await?)
    }

    async fn on_success(
        &self,
        response: UploadResponse,
        view: &mut FormView,
    ) -> Result<(), ClientError> {
        let url = response.url.unwrap_or_default();
        view.set_value(IMAGE_URL_FIELD, &url);
        view.show_status(StatusKind::Success, "Upload complete");
        view.set_preview(Some(url));
        Ok(())
    }

    fn on_failure(&self, error: &ClientError, view: &mut FormView) {
        let text = match error {
            ClientError::Api(api) if error.is_server_refusal() => format!(
                "Upload failed: {}",
                api.message_or_status_text().unwrap_or_default()
            ),
            _ => "Upload error".to_owned(),
        };
        view.show_status(StatusKind::Error, text);
        view.set_value(IMAGE_URL_FIELD, "");
        view.set_preview(None);
    }
}
