//! feedmat CLI - materialize feeds into entities against a schema
//!
//! Feeds and schemas are read from YAML or JSON files; entities are written to
//! stdout as NDJSON or a JSON array. Diagnostics go to stderr via `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedmat::{write_entities, Feed, Materializer, MaterializerConfig, Metadata, OutputFormat, TracingDiagnostics};

#[derive(Parser)]
#[command(name = "feedmat")]
#[command(version, about = "Materialize syndication feeds into typed entities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a feed and print its entities
    Materialize {
        /// Feed document (.json, or YAML otherwise)
        #[arg(short, long)]
        feed: PathBuf,

        /// Schema metadata (.json, or YAML otherwise)
        #[arg(short, long)]
        schema: PathBuf,

        /// Target entity type (defaults to the feed's own type annotation)
        #[arg(short = 't', long = "type")]
        target_type: Option<String>,

        /// Output format (ndjson, json)
        #[arg(long, default_value = "ndjson")]
        format: OutputFormat,

        /// Materializer options file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum association nesting depth - overrides config file
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Load a schema and list its types and mappings
    Inspect {
        /// Schema metadata (.json, or YAML otherwise)
        #[arg(short, long)]
        schema: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Materialize {
            feed,
            schema,
            target_type,
            format,
            config,
            max_depth,
        } => materialize(feed, schema, target_type, format, config, max_depth),
        Commands::Inspect { schema } => inspect(schema),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn materialize(
    feed_path: PathBuf,
    schema_path: PathBuf,
    target_type: Option<String>,
    format: OutputFormat,
    config_path: Option<PathBuf>,
    max_depth: Option<usize>,
) -> Result<(), String> {
    let metadata = Metadata::load_from_file(&schema_path)
        .map_err(|e| format!("Failed to load schema {}: {}", schema_path.display(), e))?;
    let feed = Feed::load_from_file(&feed_path)
        .map_err(|e| format!("Failed to load feed {}: {}", feed_path.display(), e))?;

    let mut config = match config_path {
        Some(path) => MaterializerConfig::load_from_file(&path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?,
        None => MaterializerConfig::default(),
    };
    if let Some(depth) = max_depth {
        config.max_depth = depth;
    }

    tracing::debug!(
        entries = feed.entries.len(),
        max_depth = config.max_depth,
        "materializing {}",
        feed_path.display()
    );

    let materializer = Materializer::new(&metadata).with_config(config);
    let mut diagnostics = TracingDiagnostics;
    let entities = materializer
        .parse(&feed, target_type.as_deref(), &mut diagnostics)
        .ok_or_else(|| match &target_type {
            Some(tag) => format!("Unknown target entity type '{}'", tag),
            None => "Feed declares no resolvable entity type; pass --type".to_string(),
        })?;

    let written = write_entities(io::stdout().lock(), entities, format)
        .map_err(|e| format!("Failed to write entities: {}", e))?;
    tracing::info!(entities = written, "done");
    Ok(())
}

fn inspect(schema_path: PathBuf) -> Result<(), String> {
    let metadata = Metadata::load_from_file(&schema_path)
        .map_err(|e| format!("Failed to load schema {}: {}", schema_path.display(), e))?;

    println!("Schema {}", schema_path.display());
    if let Some(ns) = &metadata.namespace {
        println!("  namespace: {}", ns);
    }

    for entity_type in &metadata.entity_types {
        let marker = if entity_type.is_abstract { " (abstract)" } else { "" };
        println!("  entity {}{}", metadata.qualified_name(&entity_type.name), marker);
        for property in &entity_type.properties {
            let nullable = if property.nullable { "" } else { " not null" };
            println!(
                "    {} -> {}: {}{}",
                property.name,
                property.field_name(),
                property.edm_type,
                nullable
            );
        }
        for end in &entity_type.navigation {
            let arity = if end.is_to_many() { "many" } else { "one" };
            println!("    {} -> {}: {} ({})", end.name, end.field_name(), end.target_type, arity);
        }
    }

    for complex in &metadata.complex_types {
        println!("  complex {}", metadata.qualified_name(&complex.name));
        for property in &complex.properties {
            println!("    {} -> {}: {}", property.name, property.field_name(), property.edm_type);
        }
    }

    for mapping in metadata.mappings() {
        let mode = if mapping.is_syndication() { "syndication" } else { "content" };
        println!(
            "  mapping {} {} -> {}.{}",
            mode, mapping.value_path, mapping.entity_type, mapping.property_path
        );
    }

    Ok(())
}
