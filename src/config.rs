use std::env;
use std::path::PathBuf;

const DEFAULT_MODEL_PROVIDER: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_DOCUMENT_PATH: &str = "Lic_Computacao_Metodologia-Pesquisa-Cientifica.pdf";
const DEFAULT_API_KEY_SECRET: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub model_provider: String,
    pub model: String,
    pub model_base_url: String,
    /// `None` leaves the request unbounded; the provider decides when to give up.
    pub model_timeout_secs: Option<u64>,
    pub document_path: PathBuf,
    pub api_key_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            model_provider: non_empty(get_var("MODEL_PROVIDER"))
                .unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string()),
            model: non_empty(get_var("MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url: non_empty(get_var("MODEL_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_timeout_secs: parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref()),
            document_path: non_empty(get_var("DOCUMENT_PATH"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_PATH)),
            api_key_secret: non_empty(get_var("API_KEY_SECRET"))
                .unwrap_or_else(|| DEFAULT_API_KEY_SECRET.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env_with(|_| None)
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_model_timeout_secs(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}
