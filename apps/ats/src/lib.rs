pub mod api_client;
pub mod bulk;
pub mod candidates;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod state;

pub use api_client::{ApiClient, CandidateApi, MultipartPayload};
pub use candidates::{CandidateListController, CandidateListState, UploadOptions};
pub use errors::AppError;
pub use events::{EventName, NotificationBus};
