//! Command-line design rule checker.
//!
//! Usage:
//!   boardcheck <board.json> [options]
//!
//! Options:
//!   --netlist <file>   Check placed footprints against a JSON netlist
//!   --config <file>    JSON check configuration (categories, limits, cleanup)
//!   --report <file>    Write the report here instead of standard output
//!   --json             Write the report as JSON
//!
//! Exit status is 0 when no error-severity violation was found, 1 when at
//! least one was, and 2 when an input could not be read or the report could
//! not be written.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use boardcheck_core::Board;
use boardcheck_drc::{DrcCategory, DrcEngine, DrcObserver, DrcViolation, TrackCleaner};
use boardcheck_io::{CheckConfig, IoError, ReportFormat, ReportWriter};

struct Args {
    board: PathBuf,
    netlist: Option<PathBuf>,
    config: Option<PathBuf>,
    report: Option<PathBuf>,
    json: bool,
}

fn usage(program: &str) {
    eprintln!("Usage: {} <board.json> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --netlist <file>   Check placed footprints against a JSON netlist");
    eprintln!("  --config <file>    JSON check configuration");
    eprintln!("  --report <file>    Write the report to a file instead of stdout");
    eprintln!("  --json             Write the report as JSON");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut board = None;
    let mut netlist = None;
    let mut config = None;
    let mut report = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--netlist" | "--config" | "--report") => {
                i += 1;
                let value = args
                    .get(i)
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("{} needs a file argument", flag))?;
                match flag {
                    "--netlist" => netlist = Some(value),
                    "--config" => config = Some(value),
                    _ => report = Some(value),
                }
            }
            "--json" => json = true,
            other if other.starts_with("--") => return Err(format!("unknown option {}", other)),
            other => {
                if board.is_some() {
                    return Err(format!("unexpected argument {}", other));
                }
                board = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    Ok(Args {
        board: board.ok_or("no board file given")?,
        netlist,
        config,
        report,
        json,
    })
}

/// Forwards engine notifications to the log. Never cancels.
#[derive(Default)]
struct LoggingObserver {
    current: Option<DrcCategory>,
}

impl DrcObserver for LoggingObserver {
    fn on_violation(&mut self, violation: &DrcViolation) {
        log::debug!("[{}] {}", violation.code, violation.message);
    }

    fn on_progress(&mut self, category: DrcCategory, done: usize, total: usize) {
        if self.current != Some(category) {
            self.current = Some(category);
            log::debug!("Checking {}: {} items", category, total);
        }
        log::trace!("{}: {}/{}", category, done, total);
    }
}

fn run(args: &Args) -> Result<bool, IoError> {
    let config = match &args.config {
        Some(path) => boardcheck_io::load_config(path)?,
        None => CheckConfig::default(),
    };
    let board: Board = boardcheck_io::load_board(&args.board)?;
    let netlist = match &args.netlist {
        Some(path) => Some(boardcheck_io::load_netlist(path)?),
        None => None,
    };

    let mut engine = DrcEngine::new(config.options.clone());
    let mut observer = LoggingObserver::default();
    let mut report = engine.run(&board, netlist.as_ref(), &mut observer);

    if let Some(cleanup) = config.cleanup {
        let proposals = TrackCleaner::new(cleanup).analyze(&board);
        log::info!("Track cleanup proposes {} changes", proposals.len());
        report.append(proposals);
    }

    let format = if args.json { ReportFormat::Json } else { config.report };
    match &args.report {
        Some(path) => boardcheck_io::save_report(path, &report, &board, format)?,
        None => {
            let stdout = io::stdout();
            let mut writer = ReportWriter::new(stdout.lock());
            writer.write(&report, &board, format)?;
            writer.into_inner().flush()?;
        }
    }

    log::info!(
        "{} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    );
    Ok(report.error_count() > 0)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("boardcheck");
    let parsed = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {}", message);
            usage(program);
            return ExitCode::from(2);
        }
    };

    match run(&parsed) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            log::error!("{}", err);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("boardcheck")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_all_options() {
        let parsed = parse_args(&args(&[
            "board.json",
            "--netlist",
            "net.json",
            "--config",
            "drc.json",
            "--report",
            "out.rpt",
            "--json",
        ]))
        .unwrap();
        assert_eq!(parsed.board, PathBuf::from("board.json"));
        assert_eq!(parsed.netlist, Some(PathBuf::from("net.json")));
        assert_eq!(parsed.config, Some(PathBuf::from("drc.json")));
        assert_eq!(parsed.report, Some(PathBuf::from("out.rpt")));
        assert!(parsed.json);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["board.json", "--netlist"])).is_err());
        assert!(parse_args(&args(&["board.json", "--frobnicate"])).is_err());
        assert!(parse_args(&args(&["a.json", "b.json"])).is_err());
    }
}
