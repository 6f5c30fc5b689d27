//! Server configuration types for LawHelp.
//!
//! `ServerConfig` represents `lawhelp.toml`. Every field except the two
//! secrets has a default; the secrets have none and must come from the file
//! or the environment.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration for the LawHelp server.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,

    /// SQLite URL. Defaults to `{data_dir}/lawhelp.db` when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub answer: AnswerConfig,
}

/// Address the HTTP + WebSocket server binds to.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Bearer token verification and handshake settings.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the credential issuer.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub jwt_secret: Option<SecretString>,

    /// Clock skew tolerated on `exp` / `nbf`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,

    /// How long a new connection may stay unauthenticated.
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            leeway_secs: 0,
            handshake_timeout_secs: default_handshake_timeout_secs(),
        }
    }
}

/// Answer engine (OpenAI-compatible completion endpoint) settings.
#[derive(Debug, Deserialize)]
pub struct AnswerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on a single completion call, in seconds.
    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// UTF-8 text file holding the legal corpus. Built-in excerpt when unset.
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    #[serde(default = "default_corpus_title")]
    pub corpus_title: String,

    /// Corpus text beyond this many characters is cut off.
    #[serde(default = "default_max_corpus_chars")]
    pub max_corpus_chars: usize,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.3
}

fn default_answer_timeout_secs() -> u64 {
    60
}

fn default_system_prompt() -> String {
    "You are a legal assistant trained on the Cameroon Penal Code. \
     Answer strictly based on the legal text."
        .to_string()
}

fn default_corpus_title() -> String {
    "Cameroon Penal Code".to_string()
}

fn default_max_corpus_chars() -> usize {
    24_000
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_answer_timeout_secs(),
            system_prompt: default_system_prompt(),
            corpus_path: None,
            corpus_title: default_corpus_title(),
            max_corpus_chars: default_max_corpus_chars(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}
