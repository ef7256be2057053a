pub mod core;
pub mod utils;

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

pub use crate::core::recorder::{ProgressRecorder, DEFAULT_RESULTS_FILE};
pub use crate::core::state::{Finding, ScanState};
pub use crate::utils::{filter_valid_targets, read_lines};

/// Output abstraction for the scan pipeline.
/// The CLI implements this with colored terminal output; tests capture
/// lines in memory to assert on the exact wording.
pub trait ScanEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
}

pub type SinkRef = Arc<dyn ScanEventSink>;

/// Terminal output sink for CLI usage.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self)
    }
}

impl ScanEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use colored::*;
        let colored = match level {
            "success" => message.green().to_string(),
            "error"   => message.red().to_string(),
            "warn"    => message.yellow().to_string(),
            "phase"   => message.bright_cyan().bold().to_string(),
            _         => message.to_string(),
        };
        write_line(&mut std::io::stdout().lock(), &colored);
    }
}

/// Best-effort terminal write. A failed stdout write (e.g. a broken
/// pipe, which `print!` would turn into a panic) is ignored so a save
/// in progress keeps its never-propagate contract.
fn write_line(out: &mut dyn std::io::Write, text: &str) {
    let _ = write!(out, "{}\r\n", text);
    let _ = out.flush();
}

/// Extension seam for the per-site exposure check.
///
/// Discovery and bounty-program matching live behind this trait; the
/// run loop only records whatever findings an implementation returns.
#[async_trait]
pub trait SiteChecker: Send + Sync {
    async fn check(&self, url: &str) -> anyhow::Result<Vec<Finding>>;
}

/// Placeholder checker: performs no network I/O and reports nothing.
pub struct NoopChecker;

#[async_trait]
impl SiteChecker for NoopChecker {
    async fn check(&self, _url: &str) -> anyhow::Result<Vec<Finding>> {
        Ok(Vec::new())
    }
}
