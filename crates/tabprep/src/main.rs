//! CLI entry point for the tabular preprocessing pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use tabprep::{ConfigFile, Pipeline, PipelineResult, PreprocessingError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Configuration-driven tabular data preprocessing",
    long_about = "Cleans, normalizes and engineers features for a table, driven by a YAML file.\n\n\
                  EXAMPLES:\n  \
                  # Run the pipeline on a CSV file\n  \
                  tabprep -c config.yaml -i data.csv -o processed.csv\n\n  \
                  # Print the processing summary as JSON\n  \
                  tabprep -c config.yaml -i data.csv -o processed.csv --json"
)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config_file: String,

    /// Path to the input table
    #[arg(short, long)]
    input_file: String,

    /// Path the processed table is written to
    #[arg(short, long)]
    output_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Output the processing summary as JSON on stdout
    ///
    /// Disables all progress logs; only the final JSON is printed.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> std::result::Result<PipelineResult, PreprocessingError> {
    let config = ConfigFile::load(&args.config_file)?.pipeline_config()?;
    info!(
        "Loaded configuration from {} (input: {}, output: {})",
        args.config_file,
        config.input_format.as_str(),
        config.output_format.as_str()
    );

    let pipeline = Pipeline::builder().config(config).build()?;
    pipeline.run(&args.input_file, &args.output_file)
}

fn print_summary(result: &PipelineResult) {
    let summary = &result.summary;
    println!("{}", "=".repeat(60));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(60));
    println!(
        "Rows:    {} -> {} ({} removed)",
        summary.rows_before, summary.rows_after, summary.rows_removed
    );
    println!(
        "Columns: {} -> {}",
        summary.columns_before, summary.columns_after
    );
    if !summary.columns_added.is_empty() {
        println!("Added:   {}", summary.columns_added.join(", "));
    }
    if !summary.columns_removed.is_empty() {
        println!("Removed: {}", summary.columns_removed.join(", "));
    }
    for stage in &summary.stages {
        println!(
            "  {:<12} {:>6}ms  ({} x {})",
            stage.state.display_name(),
            stage.duration_ms,
            stage.rows,
            stage.columns
        );
    }
    println!("Total time: {}ms", summary.duration_ms);
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match run(&args) {
        Ok(result) => {
            if args.json {
                let json = serde_json::to_string_pretty(&result.summary)
                    .context("Failed to serialize processing summary")?;
                println!("{}", json);
            } else if !args.quiet {
                print_summary(&result);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                let payload = serde_json::json!({ "error": e });
                println!("{}", payload);
            }
            Err(anyhow::Error::new(e).context("Preprocessing failed"))
        }
    }
}
