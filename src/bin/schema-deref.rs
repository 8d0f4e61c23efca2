//! Schema Dereferencer CLI
//!
//! Command-line interface for inlining `$ref` pointers in JSON Schemas.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use schema_deref::{
    dereference_with_options, load_schema_auto, DereferenceOptions, Dereferenced, MergePolicy,
    SourceFetcher,
};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-deref")]
#[command(about = "Inline $ref pointers in JSON Schemas")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dereference a schema and print the result
    Deref {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Let remote definitions replace existing ones with the same name
        #[arg(long)]
        overwrite_definitions: bool,
    },

    /// Report refs that cannot be resolved
    Check {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Do not fetch remote documents; leave remote refs in place
    #[arg(long)]
    offline: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10, env = "SCHEMA_DEREF_TIMEOUT")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Deref {
            schema,
            output,
            pretty,
            fetch,
            overwrite_definitions,
        } => {
            let policy = if overwrite_definitions {
                MergePolicy::Overwrite
            } else {
                MergePolicy::KeepExisting
            };
            run_deref(&schema, output, pretty, &fetch, policy).await
        }

        Commands::Check {
            schema,
            fetch,
            json,
        } => run_check(&schema, &fetch, json).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr so stdout stays clean JSON. `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("schema_deref={level},{level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dereference_source(
    schema_source: &str,
    fetch: &FetchArgs,
    policy: MergePolicy,
) -> Result<Dereferenced, u8> {
    let timeout = Duration::from_secs(fetch.timeout);

    let schema = load_schema_auto(schema_source, timeout).await.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    // Relative remote bases resolve against the schema's own location
    let fetcher = SourceFetcher::for_source(schema_source)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?
        .timeout(timeout);

    let options = DereferenceOptions::new()
        .follow_remote(!fetch.offline)
        .merge_policy(policy);

    Ok(dereference_with_options(&schema, &fetcher, &options).await)
}

async fn run_deref(
    schema_source: &str,
    output: Option<PathBuf>,
    pretty: bool,
    fetch: &FetchArgs,
    policy: MergePolicy,
) -> Result<(), u8> {
    let result = dereference_source(schema_source, fetch, policy).await?;

    for reference in &result.unresolved {
        tracing::warn!(reference = %reference, "unresolved ref left in output");
    }

    let json_output = to_json(&result.schema, pretty).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn to_json(value: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Machine-readable result of `check --json`.
#[derive(Serialize)]
struct CheckReport<'a> {
    complete: bool,
    fetched: &'a [String],
    unresolved: &'a BTreeSet<String>,
    recursive: &'a BTreeSet<String>,
}

async fn run_check(schema_source: &str, fetch: &FetchArgs, json_output: bool) -> Result<(), u8> {
    let result = dereference_source(schema_source, fetch, MergePolicy::KeepExisting).await?;

    if json_output {
        let report = CheckReport {
            complete: result.is_complete(),
            fetched: &result.fetched,
            unresolved: &result.unresolved,
            recursive: &result.recursive,
        };
        let json = serde_json::to_string(&report).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else {
        for url in &result.fetched {
            println!("  fetched    {}", url);
        }
        for reference in &result.recursive {
            println!("  recursive  {}", reference);
        }
        for reference in &result.unresolved {
            println!("  \x1b[31munresolved\x1b[0m {}", reference);
        }

        if result.is_complete() {
            println!("\x1b[32m✓ all refs resolved\x1b[0m");
        } else {
            println!(
                "\x1b[31m✗ {} unresolved ref(s)\x1b[0m",
                result.unresolved.len()
            );
        }
    }

    if result.is_complete() {
        Ok(())
    } else {
        Err(1)
    }
}
