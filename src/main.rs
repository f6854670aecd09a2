//! House Price Estimator - Main Entry Point
//!
//! Loads the price model once, then estimates prices for submitted
//! properties, either from flags or an interactive prompt session.
//!
//! # Commands
//!
//! - `predict` - Estimate one property described by flags
//! - `interactive` - Prompt for properties until end of input
//! - `inspect` - Show the model's expected features and importances

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use house_price_estimator::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    display::render_estimate,
    types::property::limits,
    City, EstimateError, Estimator, Furnishing, ModelLoader, PropertyInput,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::filter::Directive;

/// House price estimator over a pre-trained regression model
#[derive(Parser)]
#[command(name = "house-price")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Model artifact (overrides the configured path)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the price of one property
    ///
    /// Example:
    ///   house-price predict --city Bogor --furnishing furnished --land 100 --building 90
    Predict {
        #[command(flatten)]
        property: PropertyArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Prompt for properties until end of input
    Interactive,
    /// Show the model's expected features and importances
    Inspect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct PropertyArgs {
    /// Number of bedrooms
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=8))]
    bedrooms: u32,

    /// Number of bathrooms
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=4))]
    bathrooms: u32,

    /// Land size in square metres
    #[arg(long = "land", default_value_t = 100.0, value_parser = parse_area)]
    land_size_m2: f64,

    /// Building size in square metres
    #[arg(long = "building", default_value_t = 90.0, value_parser = parse_area)]
    building_size_m2: f64,

    /// Number of floors
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=6))]
    floors: u32,

    /// City (e.g. "Jakarta Selatan")
    #[arg(long, default_value = "Bekasi", value_parser = City::from_str)]
    city: City,

    /// Furnishing: baru, furnished, semi furnished, unfurnished
    #[arg(long, default_value = "baru", value_parser = Furnishing::from_str)]
    furnishing: Furnishing,
}

impl From<PropertyArgs> for PropertyInput {
    fn from(args: PropertyArgs) -> Self {
        PropertyInput::new(args.city, args.furnishing)
            .with_rooms(args.bedrooms, args.bathrooms)
            .with_sizes(args.land_size_m2, args.building_size_m2)
            .with_floors(args.floors)
    }
}

fn parse_area(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("{}", e))?;
    let (min, max) = limits::AREA_M2;
    if !(min..=max).contains(&value) {
        return Err(format!("must be between {} and {}", min, max));
    }
    Ok(value)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)?;
    init_logging(&config.logging)?;

    let model_path = cli.model.clone().unwrap_or_else(|| config.model.path.clone());
    info!(model = %model_path, "Starting house price estimator");

    let loader = ModelLoader::from_config(&config.model);

    match cli.command {
        Commands::Predict { property, format } => {
            let estimator = Estimator::open(loader, &model_path);
            if let Some(e) = estimator.load_error() {
                eprintln!("warning: {}", e);
            }
            print!("{}", run_predict(&estimator, &property.into(), format)?);
        }
        Commands::Interactive => {
            let mut estimator = Estimator::open(loader, &model_path);
            run_interactive(&mut estimator)?;
            estimator.metrics().print_summary();
        }
        Commands::Inspect => {
            let estimator = Estimator::open(loader, &model_path);
            let Some(engine) = estimator.engine() else {
                anyhow::bail!(
                    "{}",
                    estimator
                        .load_error()
                        .cloned()
                        .unwrap_or(EstimateError::ModelNotReady)
                );
            };
            println!("Model: {}", engine.model_name());
            match engine.expected_features() {
                Some(names) => {
                    println!("Expected features ({}):", names.len());
                    for name in names {
                        println!("  {}", name);
                    }
                }
                None => println!("Expected features: not declared"),
            }
            if let Some(mut importances) = engine.model().feature_importances() {
                importances.sort_by(|a, b| b.1.total_cmp(&a.1));
                println!("Feature importance:");
                for (name, value) in importances {
                    println!("  {:<32} {:.4}", name, value);
                }
            }
        }
    }

    Ok(())
}

/// Estimate one property and render it; validation runs even without a model.
fn run_predict(
    estimator: &Estimator,
    input: &PropertyInput,
    format: OutputFormat,
) -> Result<String> {
    let estimate = estimator.estimate(input)?;
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&estimate)?),
        OutputFormat::Text => render_estimate(&estimate),
    })
}

fn crate_directive(logging: &LoggingConfig) -> Result<Directive> {
    format!("house_price_estimator={}", logging.level)
        .parse()
        .context("Invalid logging level")
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(crate_directive(logging)?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Prompt-driven session: one complete estimate per submission.
fn run_interactive(estimator: &mut Estimator) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    if let Some(e) = estimator.load_error() {
        println!("Model could not be loaded: {}", e);
        while !estimator.is_ready() {
            let Some(path) = ask(&mut lines, "Path to a substitute model (blank to continue without)")?
            else {
                return Ok(());
            };
            if path.is_empty() {
                break;
            }
            match estimator.replace_model(&path) {
                Ok(()) => println!("Model loaded from {}", path),
                Err(e) => println!("{}", e),
            }
        }
    }

    loop {
        let Some(input) = read_property(&mut lines)? else {
            break;
        };

        match estimator.estimate(&input) {
            Ok(estimate) => print!("{}", render_estimate(&estimate)),
            Err(e) => println!("{}", e),
        }

        match ask(&mut lines, "Estimate another property? [Y/n]")? {
            Some(answer) if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no") => {
                break
            }
            Some(_) => println!(),
            None => break,
        }
    }

    Ok(())
}

type Lines<'a> = io::Lines<io::StdinLock<'a>>;

/// Print a prompt and read one trimmed line; `None` at end of input.
fn ask(lines: &mut Lines<'_>, prompt: &str) -> Result<Option<String>> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

/// Ask until the answer parses and passes `check`; blank takes the default.
fn ask_value<T, F>(lines: &mut Lines<'_>, label: &str, default: T, check: F) -> Result<Option<T>>
where
    T: FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
    F: Fn(&T) -> std::result::Result<(), String>,
{
    loop {
        let Some(answer) = ask(lines, &format!("{} [{}]", label, default))? else {
            return Ok(None);
        };
        if answer.is_empty() {
            return Ok(Some(default));
        }
        match answer.parse::<T>() {
            Ok(value) => match check(&value) {
                Ok(()) => return Ok(Some(value)),
                Err(e) => println!("  {}", e),
            },
            Err(e) => println!("  {}", e),
        }
    }
}

fn in_range(bounds: (u32, u32)) -> impl Fn(&u32) -> std::result::Result<(), String> {
    move |v| {
        if (bounds.0..=bounds.1).contains(v) {
            Ok(())
        } else {
            Err(format!("must be between {} and {}", bounds.0, bounds.1))
        }
    }
}

fn area_in_range(v: &f64) -> std::result::Result<(), String> {
    parse_area(&v.to_string()).map(|_| ())
}

fn read_property(lines: &mut Lines<'_>) -> Result<Option<PropertyInput>> {
    let defaults = PropertyInput::default();

    macro_rules! field {
        ($label:expr, $default:expr, $check:expr) => {
            match ask_value(lines, $label, $default, $check)? {
                Some(value) => value,
                None => return Ok(None),
            }
        };
    }

    let bedrooms = field!("Bedrooms", defaults.bedrooms, in_range(limits::BEDROOMS));
    let bathrooms = field!("Bathrooms", defaults.bathrooms, in_range(limits::BATHROOMS));
    let land = field!("Land size (m²)", defaults.land_size_m2, area_in_range);
    let building = field!("Building size (m²)", defaults.building_size_m2, area_in_range);
    let floors = field!("Floors", defaults.floors, in_range(limits::FLOORS));
    let city = field!("City", defaults.city, |_: &City| Ok(()));
    let furnishing = field!("Furnishing", defaults.furnishing, |_: &Furnishing| Ok(()));

    Ok(Some(
        PropertyInput::new(city, furnishing)
            .with_rooms(bedrooms, bathrooms)
            .with_sizes(land, building)
            .with_floors(floors),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::EnvFilter;

    fn oversized() -> PropertyInput {
        PropertyInput::new(City::Bogor, Furnishing::Furnished).with_sizes(100.0, 120.0)
    }

    #[test]
    fn test_predict_without_model_reports_validation_first() {
        let estimator = Estimator::open(ModelLoader::new(), "missing/full_model.onnx");
        assert!(estimator.load_error().is_some());

        let err = run_predict(&estimator, &oversized(), OutputFormat::Text).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EstimateError>(),
            Some(EstimateError::Validation(_))
        ));

        let valid = oversized().with_sizes(100.0, 90.0);
        let err = run_predict(&estimator, &valid, OutputFormat::Json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EstimateError>(),
            Some(EstimateError::ModelNotReady)
        ));
    }

    #[test]
    fn test_predict_json_output() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/models/demo_price.json");
        let estimator = Estimator::open(ModelLoader::new(), path);

        let input = oversized().with_sizes(100.0, 90.0);
        let out = run_predict(&estimator, &input, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["model"], "demo_price");
    }

    #[test]
    fn test_format_rejects_unknown_value() {
        let parsed = Cli::try_parse_from(["house-price", "predict", "--format", "jsn"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["house-price", "predict", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Predict { format: OutputFormat::Json, .. }
        ));
    }

    #[test]
    fn test_default_logging_passes_info() {
        let directive = crate_directive(&AppConfig::default().logging).unwrap();
        let filter = EnvFilter::new("").add_directive(directive);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
