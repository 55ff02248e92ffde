//! # Wardrobe Skill
//!
//! Shortlists candidates per category for the design step.

use crate::error::StepResult;
use crate::state::{WardrobeCandidates, WeatherReading};
use crate::tools::{bounded, WardrobeSource};
use std::sync::Arc;
use std::time::Duration;

pub struct WardrobeSkill {
    source: Arc<dyn WardrobeSource>,
    top_n: usize,
    timeout: Duration,
}

impl WardrobeSkill {
    pub fn new(source: Arc<dyn WardrobeSource>, top_n: usize, timeout: Duration) -> Self {
        Self {
            source,
            top_n: top_n.max(1),
            timeout,
        }
    }

    /// An empty store yields empty categories, not a failure
    pub async fn run(
        &self,
        weather: Option<&WeatherReading>,
        context: Option<&str>,
    ) -> StepResult<WardrobeCandidates> {
        let candidates = bounded(
            "wardrobe retrieval",
            self.timeout,
            self.source.retrieve(weather, context, self.top_n),
        )
        .await?;

        tracing::debug!(
            total = candidates.total(),
            missing = ?candidates.missing_essentials(),
            "Shortlisted wardrobe candidates"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::state::Category;
    use crate::testing::{one_per_category, FixedWardrobe};

    #[tokio::test]
    async fn test_passes_top_n_and_returns_candidates() {
        let wardrobe = FixedWardrobe::ok(one_per_category());
        let seen = wardrobe.last_top_n();
        let skill = WardrobeSkill::new(Arc::new(wardrobe), 3, Duration::from_secs(1));

        let candidates = skill.run(None, Some("dinner")).await.unwrap();
        assert_eq!(candidates.first(Category::Footwear).unwrap().name, "Boots");
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_store_is_success() {
        let skill = WardrobeSkill::new(
            Arc::new(FixedWardrobe::ok(WardrobeCandidates::new())),
            4,
            Duration::from_secs(1),
        );
        let candidates = skill.run(None, None).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(candidates.missing_essentials().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let wardrobe = FixedWardrobe::ok(one_per_category()).with_delay(Duration::from_secs(30));
        let skill = WardrobeSkill::new(Arc::new(wardrobe), 4, Duration::from_secs(5));
        let err = skill.run(None, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }
}
