use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JudgeError;
use crate::types::{JudgeRequest, JudgeVerdict};

/// Capability to rate the business impact of one block edit.
///
/// Implementations make a single attempt; timeouts, retries, fallback and
/// memoization are layered on by [`crate::ResilientJudge`].
#[async_trait]
pub trait SemanticJudge: Send + Sync {
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "judge"
    }
}

#[async_trait]
impl<T: SemanticJudge + ?Sized> SemanticJudge for Arc<T> {
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        (**self).classify(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: SemanticJudge + ?Sized> SemanticJudge for Box<T> {
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        (**self).classify(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
