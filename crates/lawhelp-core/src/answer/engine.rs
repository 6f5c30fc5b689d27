//! AnswerEngine trait definition.

use std::sync::Arc;
use std::time::Duration;

use lawhelp_types::error::AnswerError;

/// Generates an answer for a legal question.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in lawhelp-infra (e.g., `LegalAnswerEngine`).
pub trait AnswerEngine: Send + Sync {
    fn generate_answer(
        &self,
        question: &str,
    ) -> impl std::future::Future<Output = Result<String, AnswerError>> + Send;
}

impl<T: AnswerEngine> AnswerEngine for Arc<T> {
    fn generate_answer(
        &self,
        question: &str,
    ) -> impl std::future::Future<Output = Result<String, AnswerError>> + Send {
        (**self).generate_answer(question)
    }
}

/// Run the engine, turning a call that outlives `limit` into [`AnswerError::Timeout`].
pub async fn generate_with_timeout<A: AnswerEngine>(
    engine: &A,
    question: &str,
    limit: Duration,
) -> Result<String, AnswerError> {
    match tokio::time::timeout(limit, engine.generate_answer(question)).await {
        Ok(result) => result,
        Err(_) => Err(AnswerError::Timeout(limit.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl AnswerEngine for Echo {
        async fn generate_answer(&self, question: &str) -> Result<String, AnswerError> {
            Ok(format!("echo: {question}"))
        }
    }

    struct Stuck;

    impl AnswerEngine for Stuck {
        async fn generate_answer(&self, _question: &str) -> Result<String, AnswerError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_generate_within_limit() {
        let answer = generate_with_timeout(&Echo, "hi", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(answer, "echo: hi");
    }

    #[tokio::test]
    async fn test_arc_engine_delegates() {
        let engine = Arc::new(Echo);
        assert_eq!(engine.generate_answer("x").await.unwrap(), "echo: x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_engine_times_out() {
        let err = generate_with_timeout(&Stuck, "hi", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Timeout(60)));
    }
}
