use std::future::Future;
use std::time::Duration;

use rosterhub_core::{AppError, AppResult};

/// Upper bound on a single guard or resolver store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeout(Duration);

impl StoreTimeout {
    /// Longest timeout accepted from configuration.
    pub const MAX: Duration = Duration::from_secs(2);

    /// Creates a timeout between 1ms and [`StoreTimeout::MAX`].
    pub fn new(duration: Duration) -> AppResult<Self> {
        if duration.is_zero() || duration > Self::MAX {
            return Err(AppError::Validation(format!(
                "store timeout must be between 1ms and {}ms",
                Self::MAX.as_millis()
            )));
        }

        Ok(Self(duration))
    }

    /// Creates a timeout from milliseconds.
    pub fn from_millis(millis: u64) -> AppResult<Self> {
        Self::new(Duration::from_millis(millis))
    }

    /// Returns the configured duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Runs a store operation, turning an elapsed timeout into `Unavailable`.
    pub async fn run<T, F>(&self, operation: &str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::time::timeout(self.0, future).await.map_err(|_| {
            AppError::Unavailable(format!(
                "{operation} timed out after {}ms",
                self.0.as_millis()
            ))
        })?
    }
}

impl Default for StoreTimeout {
    fn default() -> Self {
        Self(Self::MAX)
    }
}
