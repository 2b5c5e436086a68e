#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::doc_markdown)]

mod commands;
mod config;
mod description;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use config::Config;
use miette::Result;

#[derive(Parser, Debug)]
#[command(name = "yy")]
#[command(author, version, about = "Lex and parse files from JSON grammar descriptions", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Print the tokens of a file
    Lex {
        /// Source file
        file: PathBuf,

        /// Lexer description (JSON)
        #[arg(long, short = 'p', value_name = "PATH")]
        patterns: PathBuf,
    },

    /// Parse a file with a recursive-descent grammar and print the tree
    Parse {
        /// Source file
        file: PathBuf,

        /// Lexer description (JSON)
        #[arg(long, short = 'p', value_name = "PATH")]
        patterns: PathBuf,

        /// Grammar description (JSON)
        #[arg(long, short = 'g', value_name = "PATH")]
        grammar: PathBuf,

        /// Element to parse instead of the grammar's start element
        #[arg(long)]
        start: Option<String>,

        /// Maximum element nesting depth (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_depth: u32,

        /// Trace element entry, exit and token matches
        #[arg(long)]
        trace: bool,
    },

    /// Run LALR(1) tables over a file
    Lalr {
        /// Source file
        file: PathBuf,

        /// Lexer description (JSON)
        #[arg(long, short = 'p', value_name = "PATH")]
        patterns: PathBuf,

        /// Table description (JSON)
        #[arg(long, short = 't', value_name = "PATH")]
        tables: PathBuf,

        /// Recover from syntax errors through `error` productions
        #[arg(long)]
        keep_going: bool,

        /// Most frames the parse stack may hold
        #[arg(long, default_value_t = 10_000)]
        max_stack: usize,

        /// Trace shifts, reductions and recovery
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    let trace = matches!(
        cli.command,
        Some(Commands::Parse { trace: true, .. } | Commands::Lalr { trace: true, .. })
    );
    logging::init(config.verbosity, config.json_logs, trace);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(config.json_logs),
        Some(Commands::Lex { file, patterns }) => {
            let span = tracing::info_span!("lex", cmd = "lex", file = %file.display());
            let _guard = span.enter();
            commands::lex::run(&config, &file, &patterns)
        }
        Some(Commands::Parse {
            file,
            patterns,
            grammar,
            start,
            max_depth,
            trace,
        }) => {
            let span = tracing::info_span!("parse", cmd = "parse", file = %file.display());
            let _guard = span.enter();
            let action = commands::parse::ParseAction {
                file: &file,
                patterns: &patterns,
                grammar: &grammar,
                start: start.as_deref(),
                max_depth,
                trace,
            };
            commands::parse::run(&config, &action)
        }
        Some(Commands::Lalr {
            file,
            patterns,
            tables,
            keep_going,
            max_stack,
            trace,
        }) => {
            let span = tracing::info_span!("lalr", cmd = "lalr", file = %file.display());
            let _guard = span.enter();
            let action = commands::lalr::LalrAction {
                file: &file,
                patterns: &patterns,
                tables: &tables,
                keep_going,
                max_stack,
                trace,
            };
            commands::lalr::run(&config, &action)
        }
    }
}
