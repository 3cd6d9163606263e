//! External content launcher.
//!
//! Pushes can carry a direct URL or a backend HTML content id; accepting one
//! hands the resolved URL to the platform's "open externally" facility.

use crate::error::SdkResult;
use tracing::info;
use url::Url;

/// Opens URLs outside the application (browser, system handler).
pub trait ContentLauncher: Send + Sync {
    /// Opens the URL externally.
    fn open(&self, url: &Url) -> SdkResult<()>;
}

/// A launcher that only logs. Useful for headless hosts and as a default.
#[derive(Debug, Default)]
pub struct NoopLauncher;

impl ContentLauncher for NoopLauncher {
    fn open(&self, url: &Url) -> SdkResult<()> {
        info!(%url, "content launch requested");
        Ok(())
    }
}

/// Mock launcher for testing.
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every URL it is asked to open.
    #[derive(Debug, Default)]
    pub struct RecordingLauncher {
        opened: Mutex<Vec<Url>>,
    }

    impl RecordingLauncher {
        /// Creates a recording launcher.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// URLs opened so far.
        pub fn opened(&self) -> Vec<Url> {
            self.opened.lock().unwrap().clone()
        }
    }

    impl ContentLauncher for RecordingLauncher {
        fn open(&self, url: &Url) -> SdkResult<()> {
            self.opened.lock().unwrap().push(url.clone());
            Ok(())
        }
    }
}
