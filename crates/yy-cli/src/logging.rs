//! Logging initialization for the CLI.
//!
//! The parser library only emits `tracing` events; installing a subscriber
//! is the binary's job.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO, 1 = DEBUG, 2+ = TRACE for the `yy` targets
/// * `json` - emit JSON lines instead of text
/// * `trace` - enable the per-step parser traces regardless of verbosity
///
/// Logs go to stderr so stdout stays reserved for command output.
pub fn init(verbosity: u8, json: bool, trace: bool) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(directive(&format!("yy={level}")))
        .add_directive(directive(&format!("yy_cli={level}")))
        .add_directive(directive(&format!("yy_parser={level}")));
    if trace {
        filter = filter
            .add_directive(directive("yy::rd=trace"))
            .add_directive(directive("yy::lalr=trace"));
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    // A second init (tests) keeps the first subscriber.
    let result = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(trace).with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        eprintln!("warning: logging already initialized: {err}");
    }
}

fn directive(text: &str) -> tracing_subscriber::filter::Directive {
    text.parse()
        .unwrap_or_else(|_| Level::WARN.into())
}
