pub mod config;
pub mod extract;
pub mod image;
pub mod llm;
pub mod portal;
pub mod store;

pub use config::{PortalConfig, VendorConfig};
pub use image::{ImageService, ReqwestImageOrigin};
pub use llm::{GeminiBackend, LlmRouter, OpenAiBackend};
pub use portal::PortalClient;
pub use store::FsImageStore;
