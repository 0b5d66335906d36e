//! Cooperative cancellation for long-running beatmap operations.
//!
//! Parsing, defaulting, conversion and mod application all accept an
//! optional [`CancellationToken`] and poll it at well-defined points:
//! every parsed line, every hit object, every mod application phase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// A shareable flag that requests cancellation of an in-progress operation.
///
/// Cancellation is cooperative: signalling the token does not interrupt
/// anything by itself, but every stage checks it at loop boundaries and
/// unwinds with [`Error::Cancelled`] once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, unsignalled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every operation holding this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Error::Cancelled)` if cancellation has been requested
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Checkpoint helper for the common `Option<&CancellationToken>` threading.
pub(crate) fn checkpoint(token: Option<&CancellationToken>) -> Result<()> {
    match token {
        Some(token) => token.checkpoint(),
        None => Ok(()),
    }
}
