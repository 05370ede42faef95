use std::future::Future;

use crate::error::AppError;
use crate::models::{AiReply, AskRequest, ChangeOutcome, EffectListPage};

/// Session and catalog operations against the effect portal.
pub trait Portal: Send + Sync + Clone {
    /// Log in with portal credentials and return the session cookie value.
    ///
    /// A login page that sets no session cookie yields an empty string
    /// rather than an error; only transport failures are errors.
    fn login(
        &self,
        mail: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Scrape one page of the effect catalog using an existing session.
    fn effect_list(
        &self,
        session_id: &str,
        page: u32,
    ) -> impl Future<Output = Result<EffectListPage, AppError>> + Send;

    /// Select an effect. An expired session is reported in the outcome,
    /// not as an error.
    fn change_effect(
        &self,
        session_id: &str,
        hash_id: &str,
        sec_key: &str,
    ) -> impl Future<Output = Result<ChangeOutcome, AppError>> + Send;
}

/// Blob store holding cached effect images, keyed by object name.
pub trait ImageStore: Send + Sync + Clone {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, AppError>> + Send;

    fn put(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Fetches original image bytes from the portal CDN.
pub trait ImageOrigin: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AppError>> + Send;
}

/// One LLM vendor backend, or a router dispatching across several.
pub trait LlmBackend: Send + Sync + Clone {
    fn ask(&self, request: &AskRequest)
    -> impl Future<Output = Result<AiReply, AppError>> + Send;
}
