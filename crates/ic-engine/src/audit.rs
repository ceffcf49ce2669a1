//! Audit and review logging.
//!
//! Callers enqueue a record per lookup without waiting; a background task
//! applies the history append and optional review flag. Queue saturation
//! and store failures are logged and dropped, never surfaced to callers.
//! [`AuditLogger::flush`] and [`AuditLogger::shutdown`] let batch callers
//! wait for queued writes before exiting.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use ic_protocol::{
    Confidence, LookupHistoryEntry, LookupType, Outcome, QualityLabel, Response, ReviewFlag,
};

use crate::context::LookupContext;
use crate::store::Store;

/// One lookup's worth of audit writes.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub entry: LookupHistoryEntry,
    pub flag: Option<ReviewFlag>,
}

enum AuditMessage {
    Record(Box<AuditRecord>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

pub struct AuditLogger {
    tx: mpsc::Sender<AuditMessage>,
    worker: Mutex<Option<JoinHandle<()>>>,
    review_threshold: Confidence,
}

impl AuditLogger {
    /// Spawn the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(store: Arc<dyn Store>, capacity: usize, review_threshold: u8) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(store, rx));
        Self {
            tx,
            worker: Mutex::new(Some(worker)),
            review_threshold: Confidence::new(review_threshold.into()),
        }
    }

    /// Build the history entry and, when warranted, a review flag.
    pub fn build_record<T: Serialize>(
        &self,
        ctx: &LookupContext,
        query: &str,
        lookup_type: LookupType,
        response: &Response<T>,
    ) -> AuditRecord {
        let now = Utc::now();
        let result = serde_json::to_value(response).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to serialize response for audit");
            serde_json::Value::Null
        });
        let confidence = response.confidence_score;

        let entry = LookupHistoryEntry {
            id: Uuid::now_v7(),
            query: query.to_string(),
            lookup_type,
            result,
            confidence,
            created_at: now,
            user_id: ctx.user_id.clone(),
            session_id: ctx.session_id.clone(),
        };

        let quality = if !response.outcome.has_data() {
            Some(QualityLabel::Failed)
        } else if confidence < self.review_threshold {
            Some(QualityLabel::LowConfidence)
        } else {
            None
        };

        let flag = quality.map(|quality| ReviewFlag {
            id: Uuid::now_v7(),
            query: query.to_string(),
            lookup_type,
            confidence,
            quality,
            suggestion: review_suggestion(response.outcome, lookup_type),
            created_at: now,
        });

        AuditRecord { entry, flag }
    }

    /// Enqueue the audit writes for one response. Never blocks.
    pub fn record<T: Serialize>(
        &self,
        ctx: &LookupContext,
        query: &str,
        lookup_type: LookupType,
        response: &Response<T>,
    ) {
        let record = self.build_record(ctx, query, lookup_type, response);
        match self.tx.try_send(AuditMessage::Record(Box::new(record))) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(query, %lookup_type, "audit queue full, dropping lookup record");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(query, "audit logger shut down, dropping lookup record");
            }
        }
    }

    /// Wait until every record queued before this call has been written.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(AuditMessage::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Drain the queue, stop the writer, and wait for it to exit.
    /// Records enqueued afterwards are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(AuditMessage::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
        if let Some(worker) = self.worker.lock().await.take()
            && let Err(e) = worker.await
        {
            tracing::error!(error = %e, "audit worker panicked");
        }
    }
}

fn review_suggestion(outcome: Outcome, lookup_type: LookupType) -> String {
    match outcome {
        Outcome::NoMatch => format!(
            "No data for this {lookup_type} lookup; add a curated pattern or reference row."
        ),
        Outcome::InvalidInput => {
            "Input was rejected; check whether a common format is being misparsed.".to_string()
        }
        Outcome::SystemError => {
            "Lookup failed with a system error; re-run once the store is healthy.".to_string()
        }
        Outcome::Partial => {
            "Partial match; confirm the vehicle and promote it to an exact pattern.".to_string()
        }
        Outcome::Heuristic => {
            "Heuristic match; verify the learned pattern's canonical fields.".to_string()
        }
        Outcome::Exact | Outcome::Resolved => {
            "Low-confidence source; look for a more authoritative reference.".to_string()
        }
    }
}

async fn run_worker(store: Arc<dyn Store>, mut rx: mpsc::Receiver<AuditMessage>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            AuditMessage::Record(record) => write(store.as_ref(), &record).await,
            AuditMessage::Flush(ack) => {
                let _ = ack.send(());
            }
            AuditMessage::Shutdown(ack) => {
                rx.close();
                while let Some(msg) = rx.recv().await {
                    match msg {
                        AuditMessage::Record(record) => write(store.as_ref(), &record).await,
                        AuditMessage::Flush(ack) | AuditMessage::Shutdown(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
                let _ = ack.send(());
                break;
            }
        }
    }
    tracing::debug!("audit worker stopped");
}

/// History and flag writes are independent; one failing does not skip the other.
async fn write(store: &dyn Store, record: &AuditRecord) {
    if let Err(e) = store.append_history(&record.entry).await {
        tracing::warn!(error = %e, query = %record.entry.query, "failed to append lookup history");
    }
    if let Some(flag) = &record.flag
        && let Err(e) = store.append_review_flag(flag).await
    {
        tracing::warn!(error = %e, query = %flag.query, "failed to append review flag");
    }
}
