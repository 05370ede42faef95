pub mod error;
pub mod models;
pub mod retry;
pub mod schema;
pub mod testutil;
pub mod traits;

pub use error::AppError;
pub use models::{AiReply, AskRequest, ChangeOutcome, Effect, EffectListPage, ModelKind, Vendor};
pub use traits::{ImageOrigin, ImageStore, LlmBackend, Portal};
