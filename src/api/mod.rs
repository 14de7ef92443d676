//! Typed wrappers, one method per backend endpoint
//!
//! Every method maps its parameters onto a `Fetch` (method, path, query, body)
//! and hands it to the shared `HttpClient`. Nothing here retries or caches.

mod activity;
mod auth;
mod checkin;
mod registration;
mod statistics;
mod upload;

pub use activity::ActivityApi;
pub use auth::AuthApi;
pub use checkin::CheckinApi;
pub use registration::RegistrationApi;
pub use statistics::StatisticsApi;
pub use upload::{is_allowed_image, ImageFile, UploadApi, UploadedFile, ALLOWED_IMAGE_EXTENSIONS};
