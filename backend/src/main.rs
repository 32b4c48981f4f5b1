//! Scorecard CLI - Reshape analytics rows into performance scorecards
//!
//! # Main Commands
//!
//! ```bash
//! scorecard serve                                   # Start HTTP server (port 3000)
//! scorecard pivot taxonomy.json --rows rows.csv \
//!     --program P1 --periods "2024Q1;2024Q2"        # Build a scorecard
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! scorecard flatten taxonomy.json                   # Enriched element records
//! scorecard resolve taxonomy.json --program P1      # In-scope groups + query params
//! scorecard validate taxonomy.json                  # Check taxonomy shape
//! scorecard classify --actual 40 --target 50        # Classify one pair
//! ```

use clap::{Args, Parser, Subcommand};
use scorecard::{
    build_query_params, build_scorecard_from_files, classify, flatten_hierarchy,
    format_percentage, load_taxonomy_file, parse_taxonomy, resolve_scope, start_server,
    Direction, EngineConfig, NavigationContext, Thresholds,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "scorecard")]
#[command(about = "Flatten indicator taxonomies and pivot analytics rows into scorecards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Navigation selection, mirroring the dashboard's query parameters
#[derive(Args, Debug, Default)]
struct ContextArgs {
    /// Selected data element
    #[arg(long)]
    element: Option<String>,

    /// Selected data element group
    #[arg(long)]
    element_group: Option<String>,

    /// Selected data element group-set
    #[arg(long)]
    element_group_set: Option<String>,

    /// Program id
    #[arg(long)]
    program: Option<String>,

    /// `;`-separated period ids
    #[arg(long)]
    periods: Option<String>,

    /// Organisation unit
    #[arg(long)]
    org_unit: Option<String>,
}

impl From<ContextArgs> for NavigationContext {
    fn from(args: ContextArgs) -> Self {
        NavigationContext {
            element: args.element,
            element_group: args.element_group,
            element_group_set: args.element_group_set,
            program: args.program,
            periods: args.periods,
            org_unit: args.org_unit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a taxonomy into enriched element records
    Flatten {
        /// Taxonomy JSON file
        taxonomy: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the in-scope groups and analytics query parameters
    Resolve {
        /// Taxonomy JSON file
        taxonomy: PathBuf,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Full pipeline: taxonomy + analytics rows → dense scorecard rows
    Pivot {
        /// Taxonomy JSON file
        taxonomy: PathBuf,

        /// Analytics rows (JSON or CSV)
        #[arg(short, long)]
        rows: Option<PathBuf>,

        #[command(flatten)]
        context: ContextArgs,

        /// Dimension to pivot (repeatable; default: target and actual)
        #[arg(short, long = "dimension")]
        dimensions: Vec<String>,

        /// Dimension id holding targets
        #[arg(long)]
        target_dimension: Option<String>,

        /// Dimension id holding actuals
        #[arg(long)]
        actual_dimension: Option<String>,

        /// Treat elements without a direction attribute as lower-is-better
        #[arg(long)]
        descending: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a taxonomy JSON file
    Validate {
        /// Taxonomy JSON file
        taxonomy: PathBuf,
    },

    /// Classify one actual/target pair
    Classify {
        #[arg(long, default_value = "")]
        actual: String,

        #[arg(long, default_value = "")]
        target: String,

        /// Lower is better
        #[arg(long)]
        descending: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SCORECARD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    let result = match cli.command {
        Commands::Flatten { taxonomy, output } => cmd_flatten(&taxonomy, output.as_deref()),

        Commands::Resolve { taxonomy, context } => cmd_resolve(&taxonomy, context.into()),

        Commands::Pivot {
            taxonomy,
            rows,
            context,
            dimensions,
            target_dimension,
            actual_dimension,
            descending,
            output,
        } => {
            let mut config = config;
            if let Some(target) = target_dimension {
                config.pivot.target_dimension = target;
            }
            if let Some(actual) = actual_dimension {
                config.pivot.actual_dimension = actual;
            }
            if descending {
                config.pivot.default_direction = Direction::Descending;
            }
            let dimensions = if dimensions.is_empty() { None } else { Some(dimensions) };
            cmd_pivot(&taxonomy, rows.as_deref(), context.into(), dimensions, &config, output.as_deref())
        }

        Commands::Validate { taxonomy } => cmd_validate(&taxonomy),

        Commands::Classify {
            actual,
            target,
            descending,
        } => cmd_classify(&actual, &target, descending, &config.pivot.thresholds),

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_flatten(taxonomy: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📖 Flattening: {}", taxonomy.display());

    let raw = load_taxonomy_file(taxonomy)?;
    let group_sets = parse_taxonomy(&raw)?;
    let records = flatten_hierarchy(&group_sets);
    eprintln!("✅ {} enriched elements from {} group-sets", records.len(), group_sets.len());

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_resolve(taxonomy: &Path, context: NavigationContext) -> Result<(), Box<dyn std::error::Error>> {
    let raw = load_taxonomy_file(taxonomy)?;
    let group_sets = parse_taxonomy(&raw)?;

    let scope = resolve_scope(&context, &group_sets);
    let query = build_query_params(&scope, &context);
    eprintln!(
        "🔎 {} group-sets, {} groups in scope",
        scope.group_sets.len(),
        scope.data_element_groups.len()
    );

    let json = serde_json::to_string_pretty(&json!({ "scope": scope, "query": query }))?;
    write_output(&json, None)?;

    Ok(())
}

fn cmd_pivot(
    taxonomy: &Path,
    rows: Option<&Path>,
    context: NavigationContext,
    dimensions: Option<Vec<String>>,
    config: &EngineConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", taxonomy.display());
    if rows.is_none() {
        eprintln!("   ⚠️  No analytics rows given, every cell will be empty");
    }

    let result = build_scorecard_from_files(taxonomy, rows, context, dimensions, &config.pivot)?;

    if !result.errors.is_empty() {
        eprintln!("\n❌ Taxonomy rejected, dataset is empty:");
        for err in result.errors.iter().take(5) {
            eprintln!("   - {}", err);
        }
    }

    eprintln!("\n📊 Summary:");
    for summary in &result.summaries {
        eprintln!(
            "   {}: {} achieved, {} moderate, {} not achieved, {} no data",
            summary.period, summary.achieved, summary.moderate, summary.not_achieved, summary.no_data
        );
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_validate(taxonomy: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", taxonomy.display());

    let raw = load_taxonomy_file(taxonomy)?;
    match parse_taxonomy(&raw) {
        Ok(group_sets) => {
            eprintln!("✅ Valid taxonomy: {} group-sets", group_sets.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("\n❌ Invalid taxonomy:");
            for err in e.messages().iter().take(10) {
                eprintln!("   - {}", err);
            }
            std::process::exit(1);
        }
    }
}

fn cmd_classify(
    actual: &str,
    target: &str,
    descending: bool,
    thresholds: &Thresholds,
) -> Result<(), Box<dyn std::error::Error>> {
    let direction = Direction::from_descending(descending);
    let result = classify(
        scorecard::parse_value(actual),
        scorecard::parse_value(target),
        direction,
        thresholds,
    );

    let json = serde_json::to_string_pretty(&json!({
        "performance": format_percentage(result.ratio),
        "band": result.band,
        "style": result.style,
        "direction": direction,
    }))?;
    write_output(&json, None)?;

    Ok(())
}

async fn cmd_serve(config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
