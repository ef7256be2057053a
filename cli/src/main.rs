use clap::{CommandFactory, Parser};
use colored::*;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use wpdecron_core::{
    filter_valid_targets, read_lines, ConsoleSink, NoopChecker, ProgressRecorder, ScanEventSink,
    ScanState, SinkRef, SiteChecker, DEFAULT_RESULTS_FILE,
};

#[derive(Parser, Debug)]
#[command(
    name = "WPDECRON",
    version,
    about = "WordPress cron-exposure recon helper with bug bounty program matching",
    override_usage = "wpdecron <target>  <options>",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Check a single site:          wpdecron http://target.com
  Check sites from a file:      wpdecron -l sites.txt
  Custom snapshot path:         wpdecron -l sites.txt -o findings.csv
  Resume an interrupted run:    wpdecron -l sites.txt --resume
  Dry-run test:                 wpdecron -l sites.txt --dry-run"
)]
pub struct Args {
    #[arg(required_unless_present = "list")]
    pub target: Option<String>,

    #[arg(short = 'l', long = "list", help = "File containing target URLs (one per line)")]
    pub list: Option<String>,

    #[arg(short = 'o', long, default_value = DEFAULT_RESULTS_FILE, help = "Output CSV path for the findings snapshot")]
    pub output: String,

    #[arg(short = 'v', long, default_value_t = false, help = "Show the whole process (Verbose Mode)")]
    pub verbose: bool,

    #[arg(long, default_value_t = false, help = "Resume from the last interrupted checkpoint")]
    pub resume: bool,

    #[arg(long, help = "List targets without checking them")]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::init();
    print_banner();

    let args = Args::parse();

    let mut targets: Vec<String> = Vec::new();

    if let Some(ref list_path) = args.list {
        match read_lines(list_path) {
            Ok(lines) => {
                let valid = filter_valid_targets(lines);
                print!(
                    "{}\r\n",
                    format!("[+] Loaded {} target(s) from {}", valid.len(), list_path)
                        .green().bold()
                );
                std::io::stdout().flush().ok();
                targets.extend(valid);
            }
            Err(e) => {
                eprint!("{}\r\n", format!("[!] Failed to read '{}': {}", list_path, e).red());
                process::exit(1);
            }
        }
    }

    if let Some(ref t) = args.target {
        targets.push(t.clone());
    }

    if targets.is_empty() {
        eprint!("{}\r\n", "[!] No targets specified. Provide a URL or use -l <file>.".red());
        let mut cmd = Args::command();
        cmd.print_help().unwrap();
        process::exit(1);
    }

    if args.dry_run {
        for t in &targets {
            println!("[DRY RUN] Would check target: {}", t);
        }
        return;
    }

    run_scan(&targets, &args).await;
}

/// Prints the WPDECRON ASCII banner.
fn print_banner() {
    let banner = r#"
 __      _____  ___  ___ ___ ___  ___  _  _
 \ \    / / _ \|   \| __/ __| _ \/ _ \| \| |
  \ \/\/ /|  _/| |) | _| (__|   / (_) | .` |
   \_/\_/ |_|  |___/|___\___|_|_\\___/|_|\_|
    "#;
    print!("{}\r\n", banner.bright_cyan().bold());
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

/// Walks the target list, checkpointing after each site. Ctrl-C at any
/// point saves a snapshot and leaves the checkpoint behind for
/// --resume; a completed run saves the final snapshot and deletes it.
async fn run_scan(targets: &[String], args: &Args) {
    let sink: SinkRef = ConsoleSink::new_ref();
    let recorder = ProgressRecorder::new(args.output.clone(), Arc::clone(&sink));
    let state_path = ScanState::default_path();

    let mut state = match ScanState::load(state_path) {
        Some(s) if args.resume => {
            print!(
                "{}\r\n",
                format!("[+] Resuming from checkpoint (site {}/{})", s.current_site, s.total_sites)
                    .yellow()
            );
            std::io::stdout().flush().ok();
            s
        }
        _ => ScanState::new(targets.len()),
    };

    let checker = NoopChecker;
    let start_time = Instant::now();

    for target in targets.iter().skip(state.current_site) {
        if args.verbose {
            sink.on_log("phase", &format!("[*] Checking {}", target));
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                recorder.save_progress(&state, start_time);
                return;
            }
            res = checker.check(target) => match res {
                Ok(findings) => {
                    for finding in findings {
                        sink.on_log("warn", &format!("[!] Match: {}", finding.match_summary()));
                        state.record(finding);
                    }
                }
                Err(e) => {
                    eprint!("{}\r\n", format!("[!] Check failed for {}: {}", target, e).red());
                }
            }
        }

        state.current_site += 1;
        if let Err(e) = state.save(state_path) {
            log::warn!("checkpoint write failed: {}", e);
        }
    }

    recorder.save_progress(&state, start_time);
    ScanState::delete(state_path);
}
