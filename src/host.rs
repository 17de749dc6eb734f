//! Host embedding shell boundary
//!
//! The host (a chat-app style shell) supplies environment detection and
//! optional UI primitives. Correctness never depends on them: [`NullShell`]
//! degrades every primitive to a harmless no-op.

use crate::config::DeviceClass;
use crate::error::TrackerResult;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

/// Interface to the embedding host
#[async_trait]
pub trait HostShell: Send + Sync {
    /// Whether the tracker runs inside an embedding host
    fn is_embedded(&self) -> bool;

    fn device_class(&self) -> DeviceClass;

    /// Native confirmation prompt; hosts without UI accept by default
    async fn confirm(&self, title: &str, message: &str) -> bool;

    /// Non-blocking user notice
    fn notify(&self, message: &str);

    /// Ask the host to open a URL (deep link or web link)
    fn open_url(&self, url: &str) -> TrackerResult<()>;

    /// Visibility signal, `true` once the host is backgrounded
    fn visibility(&self) -> watch::Receiver<bool>;
}

/// Shell for hosts that offer no UI primitives
pub struct NullShell {
    device_class: DeviceClass,
    visibility: watch::Sender<bool>,
}

impl NullShell {
    pub fn new(device_class: DeviceClass) -> Self {
        let (visibility, _) = watch::channel(false);
        Self {
            device_class,
            visibility,
        }
    }
}

#[async_trait]
impl HostShell for NullShell {
    fn is_embedded(&self) -> bool {
        false
    }

    fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    async fn confirm(&self, _title: &str, message: &str) -> bool {
        debug!("No confirmation UI available, accepting: {}", message);
        true
    }

    fn notify(&self, message: &str) {
        info!("{}", message);
    }

    fn open_url(&self, url: &str) -> TrackerResult<()> {
        info!("Open in wallet or browser: {}", url);
        Ok(())
    }

    fn visibility(&self) -> watch::Receiver<bool> {
        self.visibility.subscribe()
    }
}
