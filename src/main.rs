//! Plan Forecast CLI
//!
//! Generates, analyses and validates financial projections from the command line

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use plan_forecast::{
    export::{export, ExportFormat},
    metrics::calculate_with,
    template::{BuiltinCatalog, JsonCatalog, ParamValue, Parameters, TemplateCatalog},
    validation::validate_sequence,
    EngineConfig, FinancialProjection, FinancialValidationResult, ScenarioRequest, ScenarioRunner,
    SqliteStore,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "plan-forecast",
    version,
    about = "Generate, analyse and validate business plan financial projections"
)]
struct Cli {
    #[arg(long, global = true, help = "Engine configuration JSON (thresholds and validation rules)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Template catalog JSON; built-in templates when omitted")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a forecast from a request file or a template
    Generate {
        #[arg(long, conflicts_with = "template", help = "Scenario request JSON file; start_year is required, other fields default")]
        request: Option<PathBuf>,
        #[arg(long, help = "Template id, e.g. saas")]
        template: Option<String>,
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override, help = "Template parameter override")]
        overrides: Vec<(String, ParamValue)>,
        #[arg(long, default_value_t = 1)]
        plan_id: i64,
        #[arg(long, default_value = "json", help = "csv | json | excel")]
        format: String,
        #[arg(long, help = "Output file; stdout when omitted")]
        out: Option<PathBuf>,
        #[arg(long, help = "Persist the forecast into this SQLite database")]
        db: Option<PathBuf>,
        #[arg(long, requires = "db", help = "Overwrite periods the plan already has")]
        replace: bool,
    },
    /// Print metrics for a projections JSON file
    Metrics {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        plan_id: i64,
    },
    /// Validate a projections JSON file period by period
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
    /// Compare scenarios from a JSON array of requests
    Compare {
        #[arg(long, help = "JSON array of scenario requests, each with a start_year")]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        plan_id: i64,
    },
    /// List available templates
    Templates {
        #[arg(long)]
        category: Option<String>,
    },
}

fn parse_override(raw: &str) -> std::result::Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    Ok((key.trim().to_string(), ParamValue::parse(value)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let builtin = BuiltinCatalog;
    let json_catalog;
    let catalog: &dyn TemplateCatalog = match &cli.catalog {
        Some(path) => {
            json_catalog = JsonCatalog::from_path(path)
                .with_context(|| format!("Load templates {}", path.display()))?;
            &json_catalog
        }
        None => &builtin,
    };
    let runner = ScenarioRunner::with_catalog(catalog, config);

    match cli.command {
        Command::Generate {
            request,
            template,
            overrides,
            plan_id,
            format,
            out,
            db,
            replace,
        } => {
            let format = ExportFormat::parse(&format)?;
            let request: ScenarioRequest = match (request, template) {
                (Some(path), _) => ScenarioRequest::from_path(&path)
                    .with_context(|| format!("Load request {}", path.display()))?,
                (None, Some(id)) => {
                    let overrides: Parameters = overrides.into_iter().collect();
                    runner.resolver().resolve(&id, &overrides)?
                }
                (None, None) => bail!("either --request or --template is required"),
            };

            let projections = match db {
                Some(path) => {
                    let mut store = SqliteStore::open(&path)
                        .with_context(|| format!("Open DB at {}", path.display()))?;
                    let scenario = runner.run(&mut store, plan_id, &request, replace)?;
                    eprintln!(
                        "Stored {} periods for plan {} (grade {})",
                        scenario.projections.len(),
                        plan_id,
                        scenario.metrics.health_score
                    );
                    scenario.projections
                }
                None => runner.generate(plan_id, &request)?,
            };

            let payload = export(&projections, format)?;
            match out {
                Some(path) => {
                    fs::write(&path, &payload.bytes)
                        .with_context(|| format!("Write {}", path.display()))?;
                    eprintln!("Exported {} projections to {}", projections.len(), path.display());
                }
                None => io::stdout().lock().write_all(&payload.bytes)?,
            }
        }
        Command::Metrics { input, plan_id } => {
            let projections: Vec<FinancialProjection> = read_json(&input)?;
            print_json(&calculate_with(plan_id, &projections, &runner.config().metrics))?;
        }
        Command::Validate { input } => {
            let projections: Vec<FinancialProjection> = read_json(&input)?;
            let results = validate_sequence(&projections, &runner.config().validation);
            print_json(&FinancialValidationResult::merge(&results))?;
        }
        Command::Compare { input, plan_id } => {
            let file = File::open(&input).with_context(|| format!("Open {}", input.display()))?;
            let scenarios = ScenarioRequest::list_from_reader(BufReader::new(file))
                .with_context(|| format!("Load requests {}", input.display()))?;
            let compared = runner.compare(plan_id, &scenarios)?;
            let summary: Vec<_> = compared
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "periods": c.projections.len(),
                        "metrics": c.metrics,
                        "validation": c.validation,
                    })
                })
                .collect();
            print_json(&summary)?;
        }
        Command::Templates { category } => {
            let templates = match category {
                Some(category) => catalog.by_category(&category)?,
                None => catalog.list_templates()?,
            };
            print_json(&templates)?;
        }
    }

    Ok(())
}
