//! Opening links in the desktop browser.

use std::io;
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Errors that can occur when opening a link.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The opener could not be started.
    #[error("failed to run xdg-open: {0}")]
    Spawn(#[from] io::Error),

    /// The opener exited unsuccessfully.
    #[error("xdg-open {0}")]
    Failed(ExitStatus),
}

/// Shows a URL to the operator.
pub trait LinkOpener: Send + Sync {
    /// Open `url`.
    ///
    /// # Errors
    ///
    /// Returns `OpenError` if the link could not be opened.
    fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// `xdg-open URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdgOpen;

impl LinkOpener for XdgOpen {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        let status = Command::new("xdg-open").arg(url).status()?;
        if status.success() {
            tracing::debug!(%url, "Opened link");
            Ok(())
        } else {
            Err(OpenError::Failed(status))
        }
    }
}
