use std::io::{self, Write};

use clap::ValueEnum;
use colored::*;
use serde::Deserialize;

use crate::classify::{Category, RenderedMessage};
use crate::control::SaveControl;
use crate::session::SubmissionReport;

/// Append-only output container the renderer writes into.
pub trait OutputSink {
    /// Forget everything shown for the previous submission.
    fn clear(&mut self) -> io::Result<()>;

    /// Transient progress text, not part of the game transcript.
    fn status(&mut self, text: &str) -> io::Result<()>;

    fn append(&mut self, message: &RenderedMessage) -> io::Result<()>;

    fn offer_save(&mut self, control: &SaveControl) -> io::Result<()>;

    fn confirm_save(&mut self) -> io::Result<()>;

    fn finish(&mut self, _report: &SubmissionReport) -> io::Result<()> {
        Ok(())
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }
    fn status(&mut self, text: &str) -> io::Result<()> {
        (**self).status(text)
    }
    fn append(&mut self, message: &RenderedMessage) -> io::Result<()> {
        (**self).append(message)
    }
    fn offer_save(&mut self, control: &SaveControl) -> io::Result<()> {
        (**self).offer_save(control)
    }
    fn confirm_save(&mut self) -> io::Result<()> {
        (**self).confirm_save()
    }
    fn finish(&mut self, report: &SubmissionReport) -> io::Result<()> {
        (**self).finish(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored, human-readable lines
    Terminal,
    /// One JSON record per rendered element
    Json,
}

// -- Terminal ---------------------------------------------------------------

/// Colored line-per-message output.
///
/// A terminal cannot take back what it printed, so "clear" draws a rule
/// between submissions instead. Only transcript output counts: a clear that
/// follows nothing but status text draws nothing.
pub struct TerminalOutput<W: Write> {
    out: W,
    transcript_shown: bool,
}

impl<W: Write> TerminalOutput<W> {
    pub fn new(out: W) -> Self {
        TerminalOutput { out, transcript_shown: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Apply the per-category style. Speaker lines get a role label because the
/// prefix has already been stripped from the text.
pub fn style_message(message: &RenderedMessage) -> String {
    let text = message.text.as_str();
    match message.category {
        Category::Event => text.bright_yellow().to_string(),
        Category::Narrator => format!("{} {}", "Narrador ▸".bright_magenta().bold(), text),
        Category::Detective => format!("{} {}", "Detective ▸".bright_cyan().bold(), text),
        Category::Error => text.bright_red().bold().to_string(),
        Category::Plain => text.normal().to_string(),
    }
}

impl<W: Write> OutputSink for TerminalOutput<W> {
    fn clear(&mut self) -> io::Result<()> {
        if !std::mem::take(&mut self.transcript_shown) {
            return Ok(());
        }
        writeln!(self.out, "{}", "=".repeat(50).bright_blue())
    }

    fn status(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text.dimmed())?;
        self.out.flush()
    }

    fn append(&mut self, message: &RenderedMessage) -> io::Result<()> {
        self.transcript_shown = true;
        writeln!(self.out, "{}", style_message(message))?;
        self.out.flush()
    }

    fn offer_save(&mut self, control: &SaveControl) -> io::Result<()> {
        self.transcript_shown = true;
        writeln!(self.out)?;
        writeln!(self.out, "{}", format!("[ {} ]", control.label()).black().on_bright_green())?;
        self.out.flush()
    }

    fn confirm_save(&mut self) -> io::Result<()> {
        self.transcript_shown = true;
        writeln!(self.out, "{}", "Conversation saved!".bright_green().bold())?;
        self.out.flush()
    }

    fn finish(&mut self, report: &SubmissionReport) -> io::Result<()> {
        self.transcript_shown = true;
        writeln!(self.out, "\n{}", "=".repeat(50).bright_blue())?;
        writeln!(
            self.out,
            "Complete! Read {} lines, rendered {}.",
            report.lines_read, report.rendered
        )?;
        if report.dropped > 0 {
            writeln!(
                self.out,
                "{}",
                format!("{} malformed records skipped.", report.dropped).bright_red()
            )?;
        }
        self.out.flush()
    }
}

// -- JSON -------------------------------------------------------------------

/// NDJSON output for piping into other tools. Rendered messages keep the
/// `{type, content}` record shape; controls use their own `type` values.
pub struct JsonOutput<W: Write> {
    out: W,
}

impl<W: Write> JsonOutput<W> {
    pub fn new(out: W) -> Self {
        JsonOutput { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn record(&mut self, value: &impl serde::Serialize) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> OutputSink for JsonOutput<W> {
    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn status(&mut self, _text: &str) -> io::Result<()> {
        Ok(())
    }

    fn append(&mut self, message: &RenderedMessage) -> io::Result<()> {
        self.record(message)
    }

    fn offer_save(&mut self, control: &SaveControl) -> io::Result<()> {
        self.record(&serde_json::json!({ "type": "save_offer", "content": control.label() }))
    }

    fn confirm_save(&mut self) -> io::Result<()> {
        self.record(&serde_json::json!({ "type": "save_confirmed", "content": "Conversation saved!" }))
    }
}
