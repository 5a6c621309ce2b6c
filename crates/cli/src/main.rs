//! Stratus CLI entry point.
//!
//! The binary is a thin consumer of the resolution engine: it loads a field
//! schema from a file, builds the options bag from an optional payload file
//! overlaid with `-O key=value` overrides, resolves through the engine, and
//! renders the resulting configuration document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map as JsonMap, Value};
use stratus_engine::{RemoteOptionSource, ResolveSettings, Resolver, Schema, StaticOptionSource, paths};
use stratus_types::FieldSpec;
use tracing::debug;

#[derive(Parser)]
#[command(name = "stratus", about = "Stratus cloud-management CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a field schema into a configuration document
    Resolve(ResolveArgs),
    /// Schema utilities
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Run the schema-load-time validation pass only
    Validate {
        /// Schema file (YAML or JSON list of field specs)
        #[arg(long)]
        schema: PathBuf,
    },
}

#[derive(Args)]
struct ResolveArgs {
    /// Schema file (YAML or JSON list of field specs)
    #[arg(long)]
    schema: PathBuf,

    /// Payload file seeding the options bag
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Dotted-key override merged into the options bag, e.g. -O network.vpcId=vpc-1
    #[arg(short = 'O', value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Never prompt; fail on unresolvable required fields
    #[arg(long)]
    no_prompt: bool,

    /// Prompt even for fields the options bag already covers
    #[arg(long)]
    always_prompt: bool,

    /// Suppress prompting for every field without failing
    #[arg(long)]
    no_options: bool,

    /// Field name or label to never prompt for (repeatable)
    #[arg(long)]
    skip: Vec<String>,

    /// When given, the only field names or labels prompted for (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Do not contact the platform; remote option sources return nothing
    #[arg(long)]
    offline: bool,

    /// Output rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Resolve(args) => run_resolve(args).await,
        Command::Schema {
            command: SchemaCommand::Validate { schema },
        } => run_validate(&schema),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_resolve(args: ResolveArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let bag = build_bag(args.payload.as_deref(), &args.set)?;

    let settings = ResolveSettings {
        no_prompt: args.no_prompt,
        always_prompt: args.always_prompt,
        no_options: args.no_options,
        skip_fields: args.skip,
        only_fields: args.only,
    };

    let document = if args.offline {
        let source = StaticOptionSource::default();
        Resolver::new(&source, settings).resolve(&schema, bag).await?
    } else {
        let client = stratus_api::StratusClient::from_env()?;
        let source = RemoteOptionSource::new(client);
        Resolver::new(&source, settings).resolve(&schema, bag).await?
    };

    let rendered = match args.output {
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
        OutputFormat::Yaml => serde_yaml::to_string(&document)?,
    };
    println!("{rendered}");
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let schema = load_schema(path)?;
    println!("schema is valid ({} fields)", schema.fields.len());
    Ok(())
}

/// Load and compile a schema file. YAML is a superset of the JSON the
/// platform emits, so one parser covers both.
fn load_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read schema file '{}'", path.display()))?;
    let specs: Vec<FieldSpec> =
        serde_yaml::from_str(&content).with_context(|| format!("parse schema file '{}'", path.display()))?;
    debug!(fields = specs.len(), "loaded schema");
    Ok(Schema::compile(specs)?)
}

/// Build the options bag: payload file first, `-O` overrides on top.
fn build_bag(payload: Option<&Path>, overrides: &[String]) -> Result<JsonMap<String, Value>> {
    let mut bag = match payload {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("read payload file '{}'", path.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("parse payload file '{}'", path.display()))?;
            match value {
                Value::Object(map) => map,
                Value::Null => JsonMap::new(),
                _ => bail!("payload file '{}' must contain a mapping", path.display()),
            }
        }
        None => JsonMap::new(),
    };

    for entry in overrides {
        let (key, value) = parse_override(entry)?;
        let segments: Vec<String> = key.split('.').map(str::to_string).collect();
        paths::set_path(&mut bag, &segments, Value::String(value));
    }
    Ok(bag)
}

/// Split a `-O key=value` entry; the value keeps any later `=` characters.
fn parse_override(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => bail!("override '{entry}' must have the form key=value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_override_splits_on_first_equals() {
        let (key, value) = parse_override("tags=a=b").unwrap();
        assert_eq!(key, "tags");
        assert_eq!(value, "a=b");
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=x").is_err());
    }

    #[test]
    fn test_overrides_vivify_nested_keys() {
        let bag = build_bag(None, &["network.vpcId=vpc-1".into(), "region=eu".into()]).unwrap();
        assert_eq!(
            Value::Object(bag),
            json!({"network": {"vpcId": "vpc-1"}, "region": "eu"})
        );
    }

    #[test]
    fn test_payload_file_seeds_bag_and_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region: us-east-1\nnodeCount: 3").unwrap();

        let bag = build_bag(Some(file.path()), &["region=eu-west-1".into()]).unwrap();
        assert_eq!(bag["region"], json!("eu-west-1"));
        assert_eq!(bag["nodeCount"], json!(3));
    }

    #[test]
    fn test_schema_file_loads_and_compiles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- fieldName: clusterName\n  required: true\n- fieldName: region\n  dependsOnCode: clusterName"
        )
        .unwrap();

        let schema = load_schema(file.path()).unwrap();
        assert_eq!(schema.fields.len(), 2);
    }
}
