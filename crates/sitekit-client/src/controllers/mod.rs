//! One controller per form. Controllers share no state with each other; each
//! owns its [`FormView`](crate::view::FormView) for the duration of a call.

pub mod blog;
pub mod contact;
pub mod lead;
pub mod login;
pub mod upload;

pub use blog::BlogAdminController;
pub use contact::ContactController;
pub use lead::LeadController;
pub use login::LoginController;
pub use upload::ImageUploadController;
