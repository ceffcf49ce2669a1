//! Per-call context: deadline, cancellation, and caller metadata.
//!
//! Every store call the engine makes goes through [`LookupContext::guard`],
//! so a batch caller can cancel outstanding lookups or bound their latency.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Destination country for risk enrichment.
    pub destination: Option<String>,
}

impl LookupContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::default()
        }
    }

    /// Share a caller-owned token, e.g. one per batch job.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the call is already cancelled or past its deadline.
    pub fn check(&self) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(EngineError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run a store future, racing it against cancellation and the deadline.
    ///
    /// The future is dropped (and its query abandoned) on either.
    pub async fn guard<T, F>(&self, fut: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        self.check()?;
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            _ = expired => Err(EngineError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_passes_through_result() {
        let ctx = LookupContext::new();
        let value = ctx.guard(async { Ok::<_, EngineError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn guard_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = LookupContext::new().with_cancellation(token.clone());
        token.cancel();
        let err = ctx
            .guard(async { Ok::<_, EngineError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn guard_reports_deadline() {
        let ctx = LookupContext::with_timeout(Duration::from_millis(50));
        let err = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, EngineError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancel_mid_flight() {
        let token = CancellationToken::new();
        let ctx = LookupContext::new().with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = ctx
            .guard(std::future::pending::<EngineResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        canceller.await.unwrap();
    }
}
