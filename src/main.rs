use std::ffi::OsString;
use std::sync::Arc;
use std::{env, process};

use clap::Parser;
use slipstream::cli::commands::execute_command;
use slipstream::cli::output::TerminalReporter;
use slipstream::cli::{Cli, CliError};
use slipstream::domain::Level;
use slipstream::exitcode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let args: Vec<OsString> = env::args_os().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => process::exit(CliError::from(e).report(&TerminalReporter::default())),
    };

    let level = cli.level();
    setup_logging(level);
    let reporter = TerminalReporter::new(level);

    let argv = lossy_argv(&args);
    if let Err(e) = execute_command(cli, &argv, Arc::new(reporter)) {
        process::exit(e.report(&reporter));
    }
    process::exit(exitcode::OK);
}

/// Arguments as text for alias rewriting; invalid UTF-8 is replaced.
fn lossy_argv(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn setup_logging(level: Level) {
    let filter = match level {
        Level::VerboseDebug => LevelFilter::TRACE,
        Level::Debug => LevelFilter::DEBUG,
        _ => LevelFilter::WARN,
    };

    // Create a subscriber with formatted output directed to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::debug!("message level: {level}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[cfg(unix)]
    #[test]
    fn given_non_utf8_argument_when_converting_argv_then_replaced() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from("slipstream"),
            OsString::from("show"),
            OsString::from_vec(vec![0xff]),
        ];

        let argv = lossy_argv(&args);

        assert_eq!(argv, vec!["slipstream", "show", "\u{FFFD}"]);
    }

    #[cfg(unix)]
    #[test]
    fn given_non_utf8_value_when_parsing_then_usage_error() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from("slipstream"),
            OsString::from("config"),
            OsString::from("set"),
            OsString::from("username"),
            OsString::from_vec(vec![b'a', 0xff]),
        ];

        let err = Cli::try_parse_from(&args).unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidUtf8);
    }
}
