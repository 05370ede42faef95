use kaleido_core::AppError;

/// Portal endpoint configuration, read from the environment.
///
/// URL values are templates with `{placeholder}` substitution:
///
/// - `KALEIDO_LOGIN_URL`: `{mail}`, `{password}`
/// - `KALEIDO_TOP_URL`: no placeholders; the URL the session cookie is
///   recorded against after login
/// - `KALEIDO_LIST_URL`: `{page}`
/// - `KALEIDO_IMAGE_URL`: `{id}`
/// - `KALEIDO_CHANGE_URL`: `{hash}`, `{slot}`, `{key}`
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub top_url: String,
    pub list_url: String,
    pub image_url: String,
    pub change_url: String,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            login_url: require("KALEIDO_LOGIN_URL")?,
            top_url: require("KALEIDO_TOP_URL")?,
            list_url: require("KALEIDO_LIST_URL")?,
            image_url: require("KALEIDO_IMAGE_URL")?,
            change_url: require("KALEIDO_CHANGE_URL")?,
        })
    }
}

/// LLM vendor API keys.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub openai_api_key: String,
    pub gemini_api_key: String,
}

impl VendorConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            openai_api_key: require("KALEIDO_OPENAI_API_KEY")?,
            gemini_api_key: require("KALEIDO_GEMINI_API_KEY")?,
        })
    }
}

fn require(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::ConfigError(format!("{name} not set")))
}

/// Substitute `{name}` placeholders in a URL template.
pub(crate) fn render(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in pairs {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
