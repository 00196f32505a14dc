//! Interactive controls: the submit trigger and the one-shot save action.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::endpoint::GameEndpoint;
use crate::error::{Result, StreamError};
use crate::render::OutputSink;

#[derive(Debug)]
struct SubmitState {
    enabled: AtomicBool,
    reenabled: AtomicUsize,
}

/// Shared handle to the submit control. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct SubmitControl {
    state: Arc<SubmitState>,
}

impl Default for SubmitControl {
    fn default() -> Self {
        SubmitControl {
            state: Arc::new(SubmitState {
                enabled: AtomicBool::new(true),
                reenabled: AtomicUsize::new(0),
            }),
        }
    }
}

impl SubmitControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    /// How many times a finished submission has re-enabled the control.
    pub fn reenable_count(&self) -> usize {
        self.state.reenabled.load(Ordering::SeqCst)
    }

    /// Disable the control for the lifetime of the returned guard.
    ///
    /// Fails while another submission holds the control. The guard re-enables
    /// on drop, so completion, transport failure and cancellation all release
    /// it exactly once.
    pub fn disable(&self) -> Result<SubmitGuard> {
        self.state
            .enabled
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| StreamError::SubmissionInProgress)?;
        debug!("submit control disabled");
        Ok(SubmitGuard { state: Arc::clone(&self.state) })
    }
}

#[must_use = "dropping the guard re-enables the submit control"]
#[derive(Debug)]
pub struct SubmitGuard {
    state: Arc<SubmitState>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.state.enabled.store(true, Ordering::SeqCst);
        self.state.reenabled.fetch_add(1, Ordering::SeqCst);
        debug!("submit control re-enabled");
    }
}

/// The control materialized from the save sentinel.
///
/// Activation posts the save request, shows a single confirmation and then
/// disables the control for good. A failed request leaves it enabled so the
/// user can try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveControl {
    label: String,
    enabled: bool,
}

impl Default for SaveControl {
    fn default() -> Self {
        SaveControl { label: "Save Conversation".to_string(), enabled: true }
    }
}

impl SaveControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn activate<E, O>(&mut self, endpoint: &E, output: &mut O) -> Result<()>
    where
        E: GameEndpoint,
        O: OutputSink + ?Sized,
    {
        if !self.enabled {
            return Err(StreamError::SaveAlreadyUsed);
        }
        endpoint.save_conversation().await?;
        output.confirm_save()?;
        self.enabled = false;
        Ok(())
    }
}
