/// Progress reporting and CSV snapshot persistence.
///
/// Invoked on interrupt or at the end of a run, typically while the
/// process is already shutting down, so this is best effort: any
/// failure while writing the snapshot is reported as a single
/// diagnostic line and swallowed. The caller never sees an error.

use std::collections::HashSet;
use std::time::Instant;

use csv::Writer;
use log::debug;

use crate::core::state::ScanState;
use crate::SinkRef;

pub const DEFAULT_RESULTS_FILE: &str = "results.csv";

const CSV_HEADER: [&str; 4] = ["vulnerable_url", "program_url", "platform", "checked_at"];

/// Renders a scan progress summary and overwrites the CSV snapshot of
/// all findings so far. Reads the state, never mutates it; calling it
/// twice with the same state yields byte-identical file contents.
pub struct ProgressRecorder {
    output_path: String,
    sink: SinkRef,
}

impl ProgressRecorder {
    pub fn new(output_path: impl Into<String>, sink: SinkRef) -> Self {
        Self {
            output_path: output_path.into(),
            sink,
        }
    }

    /// Prints the summary block and, if there are findings, replaces
    /// the snapshot file. Safe to call at any point during a scan.
    pub fn save_progress(&self, state: &ScanState, start_time: Instant) {
        debug!("saving progress after {:?} of scanning", start_time.elapsed());
        if let Err(e) = self.try_save(state) {
            self.sink
                .on_log("error", &format!("\n[-] Error saving progress: {}", e));
        }
    }

    fn try_save(&self, state: &ScanState) -> anyhow::Result<()> {
        self.sink.on_log("success", "\n[+] Progress Summary (Interrupted):");
        self.sink.on_log(
            "",
            &format!(
                "    • Sites processed: {}/{}",
                state.current_site, state.total_sites
            ),
        );
        self.sink.on_log(
            "",
            &format!("    • Vulnerable sites found: {}", state.vulnerable_count),
        );
        self.sink.on_log(
            "",
            &format!("    • HackerOne program matches: {}", state.h1_matches_count),
        );
        self.sink.on_log(
            "",
            &format!(
                "    • Intigriti program matches: {}",
                state.intigriti_matches_count
            ),
        );
        self.sink.on_log(
            "",
            &format!(
                "    • Other bug bounty programs found: {}",
                state.other_bb_count
            ),
        );

        if state.results.is_empty() {
            self.sink.on_log("warn", "\n[-] No results to save yet");
            return Ok(());
        }

        // Full snapshot overwrite, not an append.
        let mut writer = Writer::from_path(&self.output_path)?;
        writer.write_record(CSV_HEADER)?;
        for finding in &state.results {
            writer.write_record([
                finding.vulnerable_url.as_str(),
                finding.program_url.as_str(),
                finding.platform.as_str(),
                finding.checked_at.as_str(),
            ])?;
        }
        writer.flush()?;

        self.sink.on_log(
            "success",
            &format!("\n[+] Progress saved to {}", self.output_path),
        );

        if state.any_platform_matches() {
            self.sink
                .on_log("warn", "\n[!] Bug Bounty Program Matches Found So Far:");
            let mut seen = HashSet::new();
            for finding in &state.results {
                let summary = finding.match_summary();
                if seen.insert(summary.clone()) {
                    self.sink.on_log("", &format!("    • {}", summary));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Finding;
    use crate::ScanEventSink;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Sink that captures lines for assertions on exact wording.
    #[derive(Default)]
    struct CaptureSink {
        lines: Mutex<Vec<String>>,
    }

    impl ScanEventSink for CaptureSink {
        fn on_log(&self, _level: &str, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    fn recorder_in(dir: &tempfile::TempDir) -> (ProgressRecorder, Arc<CaptureSink>, PathBuf) {
        let sink = Arc::new(CaptureSink::default());
        let sink_ref: SinkRef = sink.clone();
        let path = dir.path().join("results.csv");
        let recorder = ProgressRecorder::new(path.to_str().unwrap(), sink_ref);
        (recorder, sink, path)
    }

    fn finding(vuln: &str, program: &str, platform: &str) -> Finding {
        Finding {
            vulnerable_url: vuln.to_string(),
            program_url: program.to_string(),
            platform: platform.to_string(),
            checked_at: "2024-01-01T00:00:00".to_string(),
        }
    }

    fn captured(sink: &CaptureSink) -> Vec<String> {
        sink.lines.lock().unwrap().clone()
    }

    #[test]
    fn empty_state_prints_notice_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, sink, path) = recorder_in(&dir);

        let mut state = ScanState::new(10);
        state.current_site = 3;
        recorder.save_progress(&state, Instant::now());

        let lines = captured(&sink);
        assert!(lines.iter().any(|l| l.contains("[-] No results to save yet")));
        assert!(lines.iter().any(|l| l.contains("Sites processed: 3/10")));
        assert!(!path.exists());
    }

    #[test]
    fn snapshot_has_exact_header_and_rows_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, _sink, path) = recorder_in(&dir);

        let mut state = ScanState::new(2);
        state.record(finding("http://b.com/wp-json", "https://hackerone.com/b", "HackerOne"));
        state.record(finding("http://a.com/wp-json", "https://app.intigriti.com/a", "Intigriti"));
        recorder.save_progress(&state, Instant::now());

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "vulnerable_url,program_url,platform,checked_at\n\
             http://b.com/wp-json,https://hackerone.com/b,HackerOne,2024-01-01T00:00:00\n\
             http://a.com/wp-json,https://app.intigriti.com/a,Intigriti,2024-01-01T00:00:00\n"
        );
    }

    #[test]
    fn saving_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, _sink, path) = recorder_in(&dir);

        let mut state = ScanState::new(1);
        state.record(finding("http://a.com/wp-json", "https://hackerone.com/a", "HackerOne"));

        recorder.save_progress(&state, Instant::now());
        let first = fs::read(&path).unwrap();
        recorder.save_progress(&state, Instant::now());
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn match_list_dedupes_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, sink, _path) = recorder_in(&dir);

        let mut state = ScanState::new(3);
        state.record(finding("http://a.com", "https://hackerone.com/p1", "HackerOne"));
        state.record(finding("http://b.com", "https://hackerone.com/p2", "HackerOne"));
        state.record(finding("http://a.com", "https://hackerone.com/p1", "HackerOne"));
        recorder.save_progress(&state, Instant::now());

        let matches: Vec<String> = captured(&sink)
            .into_iter()
            .filter(|l| l.contains(" → "))
            .collect();
        assert_eq!(
            matches,
            vec![
                "    • http://a.com → https://hackerone.com/p1 (HackerOne)",
                "    • http://b.com → https://hackerone.com/p2 (HackerOne)",
            ]
        );
    }

    #[test]
    fn no_match_list_when_platform_counters_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, sink, path) = recorder_in(&dir);

        // vulnerable site with no matched program
        let mut state = ScanState::new(1);
        state.record(finding("http://a.com", "", ""));
        recorder.save_progress(&state, Instant::now());

        assert!(path.exists());
        let lines = captured(&sink);
        assert!(!lines.iter().any(|l| l.contains("Bug Bounty Program Matches")));
    }

    #[test]
    fn write_failure_is_contained_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(CaptureSink::default());
        let sink_ref: SinkRef = sink.clone();
        let bad_path = dir.path().join("no_such_dir").join("results.csv");
        let recorder = ProgressRecorder::new(bad_path.to_str().unwrap(), sink_ref);

        let mut state = ScanState::new(1);
        state.record(finding("http://a.com", "https://hackerone.com/a", "HackerOne"));
        // must not panic or propagate
        recorder.save_progress(&state, Instant::now());

        let lines = captured(&sink);
        assert!(lines.iter().any(|l| l.contains("[-] Error saving progress:")));
        // summary is still printed before the failure
        assert!(lines.iter().any(|l| l.contains("Sites processed:")));
    }

    #[test]
    fn end_to_end_single_finding() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, sink, path) = recorder_in(&dir);

        let mut state = ScanState::new(1);
        state.current_site = 1;
        state.record(finding(
            "http://a.com/wp-json",
            "https://hackerone.com/acme",
            "HackerOne",
        ));
        recorder.save_progress(&state, Instant::now());

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "vulnerable_url,program_url,platform,checked_at\n\
             http://a.com/wp-json,https://hackerone.com/acme,HackerOne,2024-01-01T00:00:00\n"
        );

        let lines = captured(&sink);
        assert!(lines.iter().any(|l| l.contains("Sites processed: 1/1")));
        assert!(lines.iter().any(|l| l.contains("HackerOne program matches: 1")));
        assert!(lines
            .iter()
            .any(|l| l.contains("http://a.com/wp-json → https://hackerone.com/acme (HackerOne)")));
    }
}
