//! oxide-dialect CLI
//!
//! Command-line front-end for checking, formatting, folding, translating and
//! analyzing T-SQL and PostgreSQL scripts.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oxide_dialect_core::{Dialect, ParseOptions};

/// SQL dialect parser and translator.
#[derive(Parser)]
#[command(name = "oxide-dialect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dialect of the input (`tsql` or `postgres`).
    #[arg(short, long, global = true, env = "OXIDE_DIALECT", default_value = "tsql")]
    dialect: Dialect,

    /// Maximum nesting of parentheses, subqueries and blocks.
    #[arg(long, global = true, default_value_t = oxide_dialect_core::parser::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Give up after this many milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the SQL comes from.
#[derive(Args)]
struct Input {
    /// Script to read (standard input if not specified).
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report statements that do not parse.
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Print the script in canonical form.
    Format {
        #[command(flatten)]
        input: Input,
    },

    /// Print the script with constant expressions folded.
    Fold {
        #[command(flatten)]
        input: Input,
    },

    /// Print the script in another dialect.
    Translate {
        /// Target dialect.
        #[arg(long)]
        to: Dialect,

        #[command(flatten)]
        input: Input,
    },

    /// Build symbol tables and validate the script.
    Analyze {
        #[command(flatten)]
        input: Input,
    },
}

impl Commands {
    fn input(&self) -> &Input {
        match self {
            Self::Check { input }
            | Self::Format { input }
            | Self::Fold { input }
            | Self::Translate { input, .. }
            | Self::Analyze { input } => input,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = ParseOptions::default().with_max_depth(cli.max_depth);
    if let Some(ms) = cli.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let sql = commands::read_input(cli.command.input().file.as_deref())?;
    let dialect = cli.dialect;
    let output = match &cli.command {
        Commands::Check { .. } => commands::check(dialect, &sql, options)?,
        Commands::Format { .. } => commands::format(dialect, &sql, options)?,
        Commands::Fold { .. } => commands::fold(dialect, &sql, options)?,
        Commands::Translate { to, .. } => commands::translate(dialect, *to, &sql, options)?,
        Commands::Analyze { .. } => commands::analyze(dialect, &sql, options)?,
    };
    println!("{output}");

    Ok(())
}
