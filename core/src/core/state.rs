/// Scan state accumulation and crash-recovery checkpointing.
///
/// Findings and counters accumulate here while the run loop walks the
/// target list. The state is flushed to a JSON checkpoint after each
/// site completes, using an atomic write (tmp + rename) so a kill
/// mid-flush cannot corrupt it.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const STATE_FILE: &str = ".wpdecron-state.json";

pub const PLATFORM_HACKERONE: &str = "HackerOne";
pub const PLATFORM_INTIGRITI: &str = "Intigriti";

/// One detected exposure paired with the bounty program it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub vulnerable_url: String,
    pub program_url: String,
    pub platform: String,
    pub checked_at: String,
}

impl Finding {
    pub fn new(
        vulnerable_url: impl Into<String>,
        program_url: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            vulnerable_url: vulnerable_url.into(),
            program_url: program_url.into(),
            platform: platform.into(),
            checked_at: now_iso(),
        }
    }

    /// Composed match summary, also the deduplication key when listing
    /// matches.
    pub fn match_summary(&self) -> String {
        format!(
            "{} → {} ({})",
            self.vulnerable_url, self.program_url, self.platform
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanState {
    pub current_site: usize,
    pub total_sites: usize,
    pub vulnerable_count: usize,
    pub h1_matches_count: usize,
    pub intigriti_matches_count: usize,
    pub other_bb_count: usize,
    pub results: Vec<Finding>,
    pub started_at: String,
}

impl ScanState {
    pub fn new(total_sites: usize) -> Self {
        Self {
            total_sites,
            started_at: now_iso(),
            ..Default::default()
        }
    }

    pub fn default_path() -> &'static str {
        STATE_FILE
    }

    /// Appends a finding and bumps the matching platform counter.
    /// Platform names match exactly; any other non-empty platform
    /// counts as "other", an empty platform bumps no platform counter.
    pub fn record(&mut self, finding: Finding) {
        self.vulnerable_count += 1;
        match finding.platform.as_str() {
            PLATFORM_HACKERONE => self.h1_matches_count += 1,
            PLATFORM_INTIGRITI => self.intigriti_matches_count += 1,
            "" => {}
            _ => self.other_bb_count += 1,
        }
        self.results.push(finding);
    }

    pub fn any_platform_matches(&self) -> bool {
        self.h1_matches_count > 0 || self.intigriti_matches_count > 0 || self.other_bb_count > 0
    }

    /// Atomic write: serialize to .tmp, then rename over the real file.
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let tmp = format!("{}.tmp", path);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &str) -> Option<Self> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    pub fn delete(path: &str) {
        let _ = fs::remove_file(path);
    }

    pub fn exists(path: &str) -> bool {
        Path::new(path).exists()
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
