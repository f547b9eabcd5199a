//! Detecting that a newer build has been deployed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use coursehub_shared::{ApiError, VersionInfo};
use tokio::sync::watch;

use crate::api_client::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateStatus {
    /// No successful check yet.
    #[default]
    Unknown,
    Current,
    UpdateAvailable {
        current: String,
        latest: String,
    },
}

/// Remembers the first build id it sees and compares later ones against it.
#[derive(Clone)]
pub struct UpdateDetector {
    api: ApiClient,
    url: String,
    baseline: Arc<Mutex<Option<String>>>,
    status: watch::Sender<UpdateStatus>,
}

impl UpdateDetector {
    /// `url` is the full address of the version endpoint.
    pub fn new(api: ApiClient, url: impl Into<String>) -> Self {
        let (status, _) = watch::channel(UpdateStatus::Unknown);
        Self {
            api,
            url: url.into(),
            baseline: Arc::new(Mutex::new(None)),
            status,
        }
    }

    pub fn status(&self) -> UpdateStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.status.subscribe()
    }

    pub async fn check(&self) -> Result<UpdateStatus, ApiError> {
        let info: VersionInfo = self.api.get_json(&self.url).await?;
        let status = self.compare(info);
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
        Ok(status)
    }

    fn compare(&self, info: VersionInfo) -> UpdateStatus {
        let mut baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner);
        match baseline.as_deref() {
            None => {
                crate::log_info!("UpdateDetector: running build {} ({})", info.build_id, info.version);
                *baseline = Some(info.build_id);
                UpdateStatus::Current
            }
            Some(current) if current == info.build_id => UpdateStatus::Current,
            Some(current) => UpdateStatus::UpdateAvailable {
                current: current.to_string(),
                latest: info.build_id,
            },
        }
    }

    /// Check every `interval` until an update is found. Failed checks are
    /// logged and retried on the next tick.
    pub async fn poll(&self, interval: Duration) -> UpdateStatus {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.check().await {
                Ok(status @ UpdateStatus::UpdateAvailable { .. }) => {
                    crate::log_info!("UpdateDetector: {:?}", status);
                    return status;
                }
                Ok(_) => {}
                Err(e) => crate::log_debug!("UpdateDetector: version check failed: {}", e),
            }
        }
    }
}
