//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{AiReply, AskRequest, ChangeOutcome, Effect, EffectListPage};
use crate::traits::{ImageOrigin, ImageStore, LlmBackend, Portal};

// ---------------------------------------------------------------------------
// MockPortal
// ---------------------------------------------------------------------------

/// Mock portal with configurable per-operation results.
///
/// Result queues pop front on each call; an empty queue yields a benign
/// default so tests only configure what they assert on.
#[derive(Clone, Default)]
pub struct MockPortal {
    login_results: Arc<Mutex<Vec<Result<String, AppError>>>>,
    list_results: Arc<Mutex<Vec<Result<EffectListPage, AppError>>>>,
    change_results: Arc<Mutex<Vec<Result<ChangeOutcome, AppError>>>>,
    pub login_calls: Arc<Mutex<Vec<(String, String)>>>,
    pub list_calls: Arc<Mutex<Vec<(String, u32)>>>,
    pub change_calls: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl MockPortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(session_id: &str) -> Self {
        let mock = Self::default();
        mock.login_results
            .lock()
            .unwrap()
            .push(Ok(session_id.to_string()));
        mock
    }

    pub fn with_page(page: EffectListPage) -> Self {
        let mock = Self::default();
        mock.list_results.lock().unwrap().push(Ok(page));
        mock
    }

    pub fn with_list_error(error: AppError) -> Self {
        let mock = Self::default();
        mock.list_results.lock().unwrap().push(Err(error));
        mock
    }

    pub fn with_change(outcome: ChangeOutcome) -> Self {
        let mock = Self::default();
        mock.change_results.lock().unwrap().push(Ok(outcome));
        mock
    }

    /// Queue a list page onto an existing mock (builder form).
    pub fn and_page(self, page: EffectListPage) -> Self {
        self.list_results.lock().unwrap().push(Ok(page));
        self
    }
}

impl Portal for MockPortal {
    async fn login(&self, mail: &str, password: &str) -> Result<String, AppError> {
        self.login_calls
            .lock()
            .unwrap()
            .push((mail.to_string(), password.to_string()));
        let mut results = self.login_results.lock().unwrap();
        if results.is_empty() {
            Ok("mock-session".to_string())
        } else {
            results.remove(0)
        }
    }

    async fn effect_list(&self, session_id: &str, page: u32) -> Result<EffectListPage, AppError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), page));
        let mut results = self.list_results.lock().unwrap();
        if results.is_empty() {
            Ok(EffectListPage::default())
        } else {
            results.remove(0)
        }
    }

    async fn change_effect(
        &self,
        session_id: &str,
        hash_id: &str,
        sec_key: &str,
    ) -> Result<ChangeOutcome, AppError> {
        self.change_calls.lock().unwrap().push((
            session_id.to_string(),
            hash_id.to_string(),
            sec_key.to_string(),
        ));
        let mut results = self.change_results.lock().unwrap();
        if results.is_empty() {
            Ok(ChangeOutcome {
                succeed: true,
                session_id: session_id.to_string(),
                dl_sec_key: String::new(),
            })
        } else {
            results.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryImageStore
// ---------------------------------------------------------------------------

/// In-memory blob store recording every write.
#[derive(Clone, Default)]
pub struct MemoryImageStore {
    pub objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Keys written via `put`, in order.
    pub puts: Arc<Mutex<Vec<String>>>,
    put_error: Arc<Mutex<Option<AppError>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(key: &str, bytes: &[u8]) -> Self {
        let store = Self::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        store
    }

    pub fn with_put_error(error: AppError) -> Self {
        let store = Self::default();
        *store.put_error.lock().unwrap() = Some(error);
        store
    }
}

impl ImageStore for MemoryImageStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let mut err = self.put_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        self.puts.lock().unwrap().push(key.to_string());
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockImageOrigin
// ---------------------------------------------------------------------------

/// Mock origin fetcher counting every fetch.
#[derive(Clone)]
pub struct MockImageOrigin {
    responses: Arc<Mutex<Vec<Result<Vec<u8>, AppError>>>>,
    default_bytes: Vec<u8>,
    pub fetched_urls: Arc<Mutex<Vec<String>>>,
}

impl MockImageOrigin {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_bytes: bytes.to_vec(),
            fetched_urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        let origin = Self::new(b"");
        origin.responses.lock().unwrap().push(Err(error));
        origin
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched_urls.lock().unwrap().len()
    }
}

impl ImageOrigin for MockImageOrigin {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.fetched_urls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_bytes.clone())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockLlm
// ---------------------------------------------------------------------------

/// Mock LLM backend recording every request.
#[derive(Clone)]
pub struct MockLlm {
    responses: Arc<Mutex<Vec<Result<AiReply, AppError>>>>,
    pub requests: Arc<Mutex<Vec<AskRequest>>>,
}

impl MockLlm {
    pub fn new(message: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(AiReply {
                message: message.to_string(),
            })])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl LlmBackend for MockLlm {
    async fn ask(&self, request: &AskRequest) -> Result<AiReply, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(AiReply {
                message: "mock reply".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a one-item catalog page for testing.
pub fn make_test_page() -> EffectListPage {
    EffectListPage {
        effects: vec![Effect {
            name: "Red".to_string(),
            id: "42".to_string(),
            hash_id: "abc".to_string(),
        }],
        dl_sec_key: "xyz".to_string(),
        has_next: false,
    }
}
