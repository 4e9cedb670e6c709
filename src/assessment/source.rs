//! Question supply seams: the remote `QuestionSource` and the local `FallbackProvider`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Question, RunRequest};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed question payload: {0}")]
    Malformed(String),
}

/// Supplies an ordered batch of questions for a topic.
///
/// On success an implementation returns between 1 and `request.count`
/// questions. The runner still checks the batch and treats an empty or
/// ill-shaped one as `SourceError::Malformed`.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch(&self, request: &RunRequest) -> Result<Vec<Question>, SourceError>;
}

/// Deterministic local questions used when the source fails.
/// Must return at least one question for any request with `count >= 1`.
pub trait FallbackProvider: Send + Sync {
    fn fallback(&self, request: &RunRequest) -> Vec<Question>;
}

/// Accept a fetched batch only if it is non-empty, no longer than requested,
/// and every question is well shaped.
pub fn validate_batch(
    questions: Vec<Question>,
    request: &RunRequest,
) -> Result<Vec<Question>, SourceError> {
    if questions.is_empty() {
        return Err(SourceError::Malformed("empty question list".into()));
    }
    if questions.len() > request.count {
        return Err(SourceError::Malformed(format!(
            "{} questions returned, {} requested",
            questions.len(),
            request.count
        )));
    }
    for (i, q) in questions.iter().enumerate() {
        q.validate()
            .map_err(|e| SourceError::Malformed(format!("question {}: {}", i, e)))?;
    }
    Ok(questions)
}
