use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dfarun::prelude::*;

use tracing::debug;
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("dfarun")
        .about("Evaluates strings against table-driven deterministic finite automata")
        .subcommand_required(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .subcommand(
            Command::new("run")
                .about("classifies the lines of one test file against one automaton definition")
                .arg(
                    Arg::new("definition")
                        .value_name("DEFINITION")
                        .required(true),
                )
                .arg(Arg::new("tests").value_name("TESTS").required(true))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("where to write the verdicts instead of the default sibling file"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("discovers dfa-*/test-* pairs in a directory and evaluates all of them")
                .arg(Arg::new("dir").value_name("DIR").required(true)),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let Ok(Some(verbosity)) = matches.try_get_one::<String>("verbosity") else {
        return;
    };

    let level = match verbosity.as_str() {
        "trace" => filter::LevelFilter::TRACE,
        "debug" => filter::LevelFilter::DEBUG,
        "info" => filter::LevelFilter::INFO,
        _ => unreachable!(),
    };

    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(level))
        .init();
}

fn report_failure(error: &dyn std::error::Error) {
    eprintln!("error: {error}");
    let mut source = error.source();
    while let Some(inner) = source {
        eprintln!("  caused by: {inner}");
        source = inner.source();
    }
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match matches.subcommand() {
        Some(("run", matches)) => {
            let definition = Path::new(
                matches
                    .get_one::<String>("definition")
                    .expect("argument is required"),
            );
            let tests = Path::new(matches.get_one::<String>("tests").expect("argument is required"));
            let output = matches
                .get_one::<String>("output")
                .map(PathBuf::from)
                .unwrap_or_else(|| output_path(tests));

            debug!("evaluating single pair");
            match evaluate(definition, tests, &output) {
                Ok(report) => {
                    println!(
                        "{}: {}/{} accepted",
                        report.output.display(),
                        report.accepted,
                        report.total
                    );
                    ExitCode::SUCCESS
                }
                Err(error) => {
                    report_failure(&error);
                    ExitCode::FAILURE
                }
            }
        }
        Some(("scan", matches)) => {
            let dir = Path::new(matches.get_one::<String>("dir").expect("argument is required"));

            match scan_pairs(dir) {
                Ok(pairs) if pairs.is_empty() => {
                    eprintln!("no definition/test pairs found in {}", dir.display());
                    ExitCode::FAILURE
                }
                Ok(pairs) => {
                    debug!("found {} pairs", pairs.len());
                    let summary = run_all(&pairs);
                    println!(
                        "{} of {} pairs evaluated",
                        summary.succeeded,
                        summary.succeeded + summary.failed
                    );
                    if summary.all_succeeded() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(error) => {
                    report_failure(&error);
                    ExitCode::FAILURE
                }
            }
        }
        _ => unreachable!(),
    }
}
