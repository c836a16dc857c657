//! Binary to synthesize a model from a JSON Schema.
//!
//! Usage: `jsonschemamodel schema.json` prints the model's schema as
//! re-emitted from the field table; `--instance data.json` validates a
//! document against it and prints the normalized instance instead.
//! Pass `-` to read the schema from stdin.

use std::io::{read_to_string, stdin};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use json_schema_model::{
    ExtraFields, KeywordPolicy, Model, NamingStrategy, OneOfMode, SynthesisError,
    SynthesisOptions, create_model_from_file, create_model_from_str,
};
use tracing_subscriber::EnvFilter;

/// Synthesize a validating model from a JSON Schema
#[derive(Parser, Debug)]
#[command(name = "jsonschemamodel", version, about, long_about = None)]
struct Cli {
    /// Schema file, or '-' for stdin
    schema: String,

    /// JSON document to validate against the model
    #[arg(long, short)]
    instance: Option<PathBuf>,

    /// Root model name (defaults to the schema title, then `DynamicModel`)
    #[arg(long)]
    root_name: Option<String>,

    /// Warn about unsupported keywords instead of failing
    #[arg(long, default_value_t = false)]
    lenient: bool,

    /// Require exactly one `oneOf` branch to match
    #[arg(long, default_value_t = false)]
    exclusive_one_of: bool,

    /// Maximum schema nesting depth
    #[arg(long, default_value_t = json_schema_model::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Extra-key policy for objects without `additionalProperties`
    #[arg(long, value_enum, default_value_t = ExtraArg::Ignore)]
    extra: ExtraArg,

    /// How anonymous nested objects are named
    #[arg(long, value_enum, default_value_t = NamingArg::Property)]
    naming: NamingArg,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExtraArg {
    Ignore,
    Allow,
    Forbid,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NamingArg {
    Property,
    Path,
}

impl Cli {
    fn options(&self) -> SynthesisOptions {
        let mut options = SynthesisOptions::default()
            .with_max_depth(self.max_depth)
            .with_extra(match self.extra {
                ExtraArg::Ignore => ExtraFields::Ignore,
                ExtraArg::Allow => ExtraFields::Allow,
                ExtraArg::Forbid => ExtraFields::Forbid,
            })
            .with_naming(match self.naming {
                NamingArg::Property => NamingStrategy::PropertyName,
                NamingArg::Path => NamingStrategy::Path,
            });
        if let Some(name) = &self.root_name {
            options = options.with_root_name(name.clone());
        }
        if self.lenient {
            options = options.with_unknown_keywords(KeywordPolicy::Ignore);
        }
        if self.exclusive_one_of {
            options = options.with_one_of(OneOfMode::Exclusive);
        }
        options
    }

    fn model(&self) -> Result<Model, SynthesisError> {
        let options: SynthesisOptions = self.options();
        if self.schema == "-" {
            let schema_json: String = read_to_string(stdin())?;
            create_model_from_str(&schema_json, &options)
        } else {
            create_model_from_file(&self.schema, &options)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let model: Model = match cli.model() {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    tracing::info!(model = model.name(), "model ready");

    let output: serde_json::Value = match &cli.instance {
        None => model.json_schema(),
        Some(path) => {
            let document: serde_json::Value = match std::fs::read_to_string(path)
                .map_err(SynthesisError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(SynthesisError::from))
            {
                Ok(document) => document,
                Err(e) => {
                    eprintln!("Error reading {}: {e}", path.display());
                    process::exit(1);
                }
            };
            match model.validate(&document) {
                Ok(instance) => instance.into_value(),
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
