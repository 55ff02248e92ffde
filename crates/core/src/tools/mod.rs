//! # Collaborator Tools
//!
//! Deterministic data services the steps call into. Each sits behind a
//! narrow trait so the orchestrator can run against stubs.
//!
//! ## Modules
//!
//! - `weather` - OpenWeatherMap client with demo-coordinate fallback
//! - `wardrobe` - SQLite item store with ranked retrieval

pub mod wardrobe;
pub mod weather;

pub use wardrobe::{WardrobeStats, WardrobeStore};
pub use weather::OpenWeatherClient;

use crate::error::{StepError, StepResult};
use crate::state::{WardrobeCandidates, WeatherReading};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Source of current weather for a named location
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, location: &str) -> StepResult<WeatherReading>;
}

/// Ranked retrieval of wardrobe items
#[async_trait]
pub trait WardrobeSource: Send + Sync {
    /// Top `top_n` items per category. Every category is present in the result.
    async fn retrieve(
        &self,
        weather: Option<&WeatherReading>,
        context: Option<&str>,
        top_n: usize,
    ) -> StepResult<WardrobeCandidates>;
}

/// Run a collaborator call under a deadline; expiry becomes `ErrorKind::Timeout`
pub async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> StepResult<T>
where
    F: Future<Output = StepResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                limit_ms = limit.as_millis() as u64,
                "Collaborator call timed out"
            );
            Err(StepError::timeout(operation, limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let ok = bounded("fast", Duration::from_secs(1), async { Ok::<_, StepError>(7) }).await;
        assert_eq!(ok, Ok(7));

        let err = bounded("fast", Duration::from_secs(1), async {
            Err::<u8, _>(StepError::lookup("nope"))
        })
        .await;
        assert_eq!(err.unwrap_err().kind, ErrorKind::LookupError);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result = bounded("slow", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StepError>(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("slow"));
    }
}
