//! Legal reference text fed to the answer engine with every question.

use std::path::Path;

use tracing::{info, warn};

/// Excerpt used when no corpus file is configured.
pub const BUILTIN_PENAL_CODE_EXCERPT: &str = "\
Article 318 - Theft:
(1) Whoever fraudulently takes another person's property is guilty of theft and shall be punished with imprisonment for 1 to 5 years.
(2) If the theft was committed at night or by more than one person, the punishment may be increased.

Article 319 - Aggravating Circumstances:
The sentence shall be doubled if the theft was committed with violence.";

/// Titled body of legal text, capped to a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalCorpus {
    pub title: String,
    pub text: String,
}

impl LegalCorpus {
    pub fn builtin(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: BUILTIN_PENAL_CODE_EXCERPT.to_string(),
        }
    }

    /// Build from raw text, trimming it and cutting it at `max_chars` characters.
    pub fn from_text(title: impl Into<String>, text: &str, max_chars: usize) -> Self {
        let text = text.trim();
        let text = match text.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                warn!(max_chars, "Legal corpus truncated");
                &text[..cut]
            }
            None => text,
        };
        Self {
            title: title.into(),
            text: text.to_string(),
        }
    }

    /// Load a UTF-8 corpus file, or the built-in excerpt when `path` is `None`.
    ///
    /// A configured file that is empty after trimming is an error.
    pub async fn load(
        path: Option<&Path>,
        title: &str,
        max_chars: usize,
    ) -> Result<Self, std::io::Error> {
        let Some(path) = path else {
            info!("No corpus file configured, using built-in excerpt");
            return Ok(Self::builtin(title));
        };

        let raw = tokio::fs::read_to_string(path).await?;
        let corpus = Self::from_text(title, &raw, max_chars);
        if corpus.text.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("corpus file {} is empty", path.display()),
            ));
        }
        info!(
            path = %path.display(),
            chars = corpus.text.chars().count(),
            "Legal corpus loaded"
        );
        Ok(corpus)
    }

    /// User prompt for one question.
    pub fn prompt_for(&self, question: &str) -> String {
        format!("{}:\n\n{}\n\nQuestion: {}", self.title, self.text, question)
    }
}
