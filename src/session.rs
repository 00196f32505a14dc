//! The stream renderer: one form submission, streamed and rendered line by line.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::classify::{Classified, Policy};
use crate::control::{SaveControl, SubmitControl};
use crate::endpoint::GameEndpoint;
use crate::error::{Result, StreamError};
use crate::form::FormSubmission;
use crate::lines::LineReader;
use crate::render::OutputSink;

/// Shown while waiting for the response headers.
pub const STARTING_STATUS: &str = "Starting game...";

/// Counters for one completed submission, plus one save control per
/// sentinel the server sent, in stream order.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub lines_read: usize,
    pub rendered: usize,
    pub ignored: usize,
    pub dropped: usize,
    pub save_controls: Vec<SaveControl>,
}

/// Drives a submission from form to rendered output.
///
/// The endpoint, the output container and the submit control are explicit
/// handles owned by the renderer; nothing is looked up ambiently.
pub struct StreamRenderer<E, O> {
    endpoint: E,
    output: O,
    policy: Policy,
    submit: SubmitControl,
    idle_timeout: Option<Duration>,
}

impl<E, O> StreamRenderer<E, O>
where
    E: GameEndpoint,
    O: OutputSink,
{
    pub fn new(endpoint: E, output: O, policy: Policy) -> Self {
        StreamRenderer {
            endpoint,
            output,
            policy,
            submit: SubmitControl::new(),
            idle_timeout: None,
        }
    }

    pub fn with_submit_control(mut self, submit: SubmitControl) -> Self {
        self.submit = submit;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Submit `form` and render the streamed response until it ends.
    ///
    /// The submit control is disabled for the whole call and re-enabled
    /// exactly once on return, whether the stream completed or failed.
    pub async fn submit(&mut self, form: &FormSubmission) -> Result<SubmissionReport> {
        let _guard = self.submit.disable()?;

        self.output.clear()?;
        self.output.status(STARTING_STATUS)?;

        let chunks = self.endpoint.start_game(form).await?;
        self.output.clear()?;

        let mut reader = LineReader::new(chunks).with_idle_timeout(self.idle_timeout);
        let mut report = SubmissionReport::default();

        while let Some(line) = reader.next_line().await? {
            report.lines_read += 1;
            match self.policy.classify(&line) {
                Classified::Message(message) => {
                    self.output.append(&message)?;
                    report.rendered += 1;
                }
                Classified::SaveTrigger => {
                    let control = SaveControl::new();
                    self.output.offer_save(&control)?;
                    debug!(offered = report.save_controls.len() + 1, "save control offered");
                    report.save_controls.push(control);
                }
                Classified::Ignored => report.ignored += 1,
                Classified::Dropped(e) => {
                    warn!(error = %e, line = %line, "dropping unusable stream record");
                    report.dropped += 1;
                }
            }
        }

        info!(
            lines = report.lines_read,
            rendered = report.rendered,
            dropped = report.dropped,
            policy = %self.policy.kind(),
            "stream complete"
        );
        self.output.finish(&report)?;
        Ok(report)
    }

    /// Like [`submit`](Self::submit), but gives up with
    /// [`StreamError::Cancelled`] as soon as `cancel` resolves.
    pub async fn submit_until<C>(
        &mut self,
        form: &FormSubmission,
        cancel: C,
    ) -> Result<SubmissionReport>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            report = self.submit(form) => report,
            _ = cancel => {
                warn!("submission cancelled before the stream finished");
                Err(StreamError::Cancelled)
            }
        }
    }

    /// Activate a save control offered by a previous submission.
    pub async fn activate_save(&mut self, control: &mut SaveControl) -> Result<()> {
        control.activate(&self.endpoint, &mut self.output).await
    }
}
