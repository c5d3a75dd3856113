//! Index-build progress reporting.
//!
//! A first run downloads the statute, parses it, and embeds every chunk in
//! batches — minutes of work the user should see advancing. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event during corpus preparation.
#[derive(Clone, Debug)]
pub enum BuildEvent {
    /// Downloading the source document (size unknown up front).
    Fetching { url: String },
    /// Extracting page texts from the cached document.
    Parsing,
    /// Embedding batch `n` of `total` (`chunks` chunks overall).
    Embedding { n: usize, total: usize, chunks: usize },
}

/// Reports build progress. Implementations write to stderr.
pub trait BuildProgressReporter: Send + Sync {
    fn report(&self, event: BuildEvent);
}

/// Human-friendly progress: "index build  embedding batch 3 / 12".
pub struct StderrProgress;

impl BuildProgressReporter for StderrProgress {
    fn report(&self, event: BuildEvent) {
        let line = match &event {
            BuildEvent::Fetching { url } => format!("index build  fetching {}\n", url),
            BuildEvent::Parsing => "index build  parsing pages...\n".to_string(),
            BuildEvent::Embedding { n, total, chunks } => format!(
                "index build  embedding batch {} / {} ({} chunks)\n",
                n, total, chunks
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BuildProgressReporter for NoProgress {
    fn report(&self, _event: BuildEvent) {}
}

/// Progress mode for the CLI: human progress when stderr is a TTY,
/// otherwise off.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
}

impl ProgressMode {
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn BuildProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
        }
    }
}
