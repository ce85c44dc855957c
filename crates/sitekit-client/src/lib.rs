//! Form controllers for the site's public and admin pages.
//!
//! Each form (admin login, blog publishing, image upload, quote request,
//! contact) is a [`FormController`](workflow::FormController) that reads
//! field values from a [`FormView`](view::FormView), validates them, makes
//! one call through a [`Backend`], and renders the outcome back into the
//! view. The HTTP transport, the session store, and the render target are
//! all injected, so the same controllers drive a terminal, a test, or any
//! other front end.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sitekit_client::controllers::{LeadController, lead};
//! use sitekit_client::{ClientConfig, HttpBackend};
//!
//! # async fn example() -> Result<(), sitekit_client::ClientError> {
//! let backend = Arc::new(HttpBackend::new(&ClientConfig::from_env()?)?);
//! let controller = LeadController::new(backend);
//!
//! let mut view = LeadController::view()
//!     .with_values([(lead::NAME_FIELD, "Ada"), (lead::EMAIL_FIELD, "ada@example.com")]);
//! controller.submit(&mut view).await;
//! if let Some(status) = view.status() {
//!     tracing::info!(text = %status.text, "quote request finished");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod controllers;
pub mod endpoint;
mod error;
pub mod session;
pub mod types;
pub mod validation;
pub mod view;
pub mod workflow;

#[cfg(test)]
mod fake;

pub use backend::{Backend, HttpBackend};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, ConfigError, GateError, SessionError};
pub use session::{
    AccessToken, AdminGate, FileSessionStore, MemorySessionStore, SessionHandle, SiteCookie,
};
pub use view::{FormView, Status, StatusKind};
pub use workflow::{FormController, SubmissionWorkflow, SubmitOutcome};
