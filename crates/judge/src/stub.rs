use async_trait::async_trait;

use crate::error::JudgeError;
use crate::judge::SemanticJudge;
use crate::types::{ImpactLevel, JudgeRequest, JudgeVerdict};

/// Offline judge returning one fixed verdict for every request.
///
/// Used by the CLI when no service is configured and by deterministic tests.
#[derive(Debug, Clone)]
pub struct StubJudge {
    verdict: JudgeVerdict,
}

impl StubJudge {
    pub fn new(verdict: JudgeVerdict) -> Self {
        Self { verdict }
    }

    pub fn with_impact(impact: ImpactLevel) -> Self {
        Self::new(JudgeVerdict::new(impact, "stub judgment", 1.0))
    }
}

impl Default for StubJudge {
    fn default() -> Self {
        Self::with_impact(ImpactLevel::Medium)
    }
}

#[async_trait]
impl SemanticJudge for StubJudge {
    async fn classify(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        Ok(self.verdict.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_verdict() {
        let judge = StubJudge::with_impact(ImpactLevel::Low);
        let verdict = judge
            .classify(&JudgeRequest::new("a", "b", "paragraph"))
            .await
            .unwrap();
        assert_eq!(verdict.impact, ImpactLevel::Low);
        assert_eq!(verdict.rationale, "stub judgment");
        assert_eq!(StubJudge::default().name(), "stub");
    }
}
