//! Ruminate CLI - shorten CSS class and id selectors across a site.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ruminate::builder::Ruminate;
use ruminate::errors::{exit_code, RuminateError};
use ruminate::output::{format_map_report, format_report, OutputError, OutputFormat};
use ruminate::placement::OutputTarget;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ruminate")]
#[command(about = "Shorten CSS class and id selectors across stylesheets, markup and scripts")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write a debug-level log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite stylesheets, views and scripts
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Write results under this directory instead of in place
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rewrite in memory and report without writing
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the selectors found and the names they would get
    Map {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Stylesheet files or directories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    css: Vec<PathBuf>,

    /// View files or directories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    html: Vec<PathBuf>,

    /// Script files or directories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    js: Vec<PathBuf>,

    /// Extension of view files inside directories
    #[arg(long, default_value = "html")]
    view_ext: String,

    /// Class or id names to leave untouched (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Prefix for generated names
    #[arg(long, default_value = "")]
    prefix: String,

    /// Characters to build generated names from
    #[arg(long)]
    alphabet: Option<String>,

    /// Names never to generate (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "ad")]
    reserved: Vec<String>,

    /// Skip files matching this glob, relative to their root (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Include hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Skip files ignored by git
    #[arg(long)]
    gitignore: bool,
}

impl SourceArgs {
    fn builder(self) -> Ruminate {
        let builder = Ruminate::new()
            .css(self.css)
            .views(self.html)
            .scripts(self.js)
            .view_extension(&self.view_ext)
            .ignore(self.ignore)
            .prefix(self.prefix)
            .reserved(self.reserved.into_iter().filter(|r| !r.is_empty()))
            .exclude(self.exclude)
            .include_hidden(self.hidden)
            .respect_gitignore(self.gitignore);
        match self.alphabet {
            Some(alphabet) => builder.alphabet(alphabet),
            None => builder,
        }
    }
}

fn format_for(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<(), RuminateError> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

fn run(source: SourceArgs, output: Option<PathBuf>, dry_run: bool, json: bool) -> Result<(), RuminateError> {
    let target = output.map_or(OutputTarget::InPlace, OutputTarget::Mirror);
    let report = source.builder().output(target).dry_run(dry_run).run()?;
    emit(&format_report(&report, format_for(json))?, json)?;
    Ok(())
}

fn map(source: SourceArgs, json: bool) -> Result<(), RuminateError> {
    let report = source.builder().map()?;
    emit(&format_map_report(&report, format_for(json))?, json)?;
    Ok(())
}

/// Write a formatted report to stdout.
fn emit(text: &str, json: bool) -> Result<(), OutputError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if json {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Run { json, .. } => *json,
        Commands::Map { json, .. } => *json,
        Commands::Completions { .. } => false,
    }
}

fn main() {
    let cli = Cli::parse();
    let json_output = json_flag(&cli.command);

    let result = init_logging(cli.verbose, cli.log_file.as_ref()).and_then(|()| match cli.command {
        Commands::Run {
            source,
            output,
            dry_run,
            json,
        } => run(source, output, dry_run, json),
        Commands::Map { source, json } => map(source, json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "ruminate", &mut std::io::stdout());
            Ok(())
        }
    });

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }
            let payload = ErrorOutput {
                error: e.to_string(),
            };
            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}
