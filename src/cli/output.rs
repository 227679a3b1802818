//! Output sink and status display

use crate::cli::args::VerbosityLevel;
use crate::core::result::{AttemptOutcome, AttemptStatus, DownloadResult};
use crate::error::CtError;
use crate::platform::links::LinkSink;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Destination for discovered links: a file or stdout.
///
/// Buffered output is flushed after each link and again when the sink is
/// finished or dropped.
pub struct OutputSink {
    writer: Box<dyn Write>,
}

impl OutputSink {
    /// Open `path`, or stdout when `None`
    pub fn open(path: Option<&Path>) -> Result<Self, CtError> {
        let writer: Box<dyn Write> = match path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout()),
        };
        Ok(Self { writer })
    }

    /// Wrap an arbitrary writer
    pub fn from_writer(writer: impl Write + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Flush and release the sink, reporting any final write error
    pub fn finish(mut self) -> Result<(), CtError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl LinkSink for OutputSink {
    fn emit(&mut self, link: &str) -> Result<(), CtError> {
        write!(self.writer, "{}\t", link)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Status messages on stderr
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a progress bar over the agent rotation
    pub fn create_progress_bar(&mut self, total: u64) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} agents {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(style);

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Finish progress bar
    pub fn finish_progress(&self) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_and_clear();
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            self.print(format!("{} {}", "info:".blue().bold(), message));
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            self.print(format!("{} {}", "warning:".yellow().bold(), message));
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        self.print(format!("{} {}", "error:".red().bold(), message));
    }

    /// Print debug message
    pub fn debug(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Verbose {
            self.print(format!("{} {}", "debug:".dimmed(), message));
        }
    }

    /// Print the run header
    pub fn print_start(&self, url: &str, agents: usize) {
        self.info(&format!("Fetching links for {} with {} user agents", url, agents));
    }

    /// Print the end-of-run summary
    pub fn print_summary(&self, result: &DownloadResult) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        let found = result.links().len();
        let tried = result.attempts().len();
        let line = format!(
            "Found {} link(s) from {} agent(s), {} failed",
            found,
            tried,
            result.failures()
        );
        if found > 0 {
            self.print(format!("{} {}", "done:".green().bold(), line));
        } else {
            self.warning(&line);
        }
    }

    fn print(&self, line: String) {
        match &self.progress_bar {
            Some(progress_bar) if !progress_bar.is_finished() => progress_bar.println(line),
            _ => eprintln!("{}", line),
        }
    }

    fn attempt_finished(&self, outcome: &AttemptOutcome) {
        match &outcome.status {
            AttemptStatus::Found(_) => {}
            AttemptStatus::NoLink => {
                self.debug(&format!("agent #{} got no link", outcome.index + 1))
            }
            AttemptStatus::Failed(e) => {
                self.warning(&format!("agent #{} failed: {}", outcome.index + 1, e))
            }
        }
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.inc(1);
        }
    }
}

/// Link sink that also drives the formatter
pub struct ReportingSink<'a> {
    sink: &'a mut OutputSink,
    formatter: &'a OutputFormatter,
}

impl<'a> ReportingSink<'a> {
    pub fn new(sink: &'a mut OutputSink, formatter: &'a OutputFormatter) -> Self {
        Self { sink, formatter }
    }
}

impl LinkSink for ReportingSink<'_> {
    fn emit(&mut self, link: &str) -> Result<(), CtError> {
        self.sink.emit(link)
    }

    fn attempt_started(&mut self, index: usize, user_agent: &str) {
        self.formatter
            .debug(&format!("agent #{}: {}", index + 1, user_agent));
    }

    fn attempt_finished(&mut self, outcome: &AttemptOutcome) {
        self.formatter.attempt_finished(outcome);
    }
}
