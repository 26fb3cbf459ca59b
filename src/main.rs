//! CME Engine CLI
//!
//! Computes ten-year capital market expectations for all asset classes,
//! optionally under override scenarios loaded from JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use cme_engine::inputs::OverrideSet;
use cme_engine::output::{format_percentage, format_results_table};
use cme_engine::{BaseCurrency, DefaultInputs, EquityMethod, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "cme", version, about = "Ten-year capital market expectations engine")]
struct Args {
    /// Base currency for returns: usd or eur
    #[arg(long, default_value = "usd")]
    base_currency: String,

    /// Equity methodology: ra or gk (Grinold-Kroner)
    #[arg(long, default_value = "ra")]
    equity_model: String,

    /// JSON file with a nested override structure
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// JSON file with stress overrides, compared against the base run
    #[arg(long)]
    stress: Option<PathBuf>,

    /// Scenario name used in the output
    #[arg(long, default_value = "RA Defaults")]
    scenario_name: String,

    /// Emit the full scenario result as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the flat catalog of default assumptions and exit
    #[arg(long)]
    list_defaults: bool,
}

fn load_overrides(path: Option<&Path>) -> Result<OverrideSet> {
    match path {
        None => Ok(OverrideSet::new()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading overrides from {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing overrides from {}", path.display()))
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_defaults {
        for (path, value) in DefaultInputs::catalog() {
            println!("{:<45} {}", path, value);
        }
        return Ok(());
    }

    let base_currency = match args.base_currency.to_ascii_lowercase().as_str() {
        "usd" => BaseCurrency::Usd,
        "eur" => BaseCurrency::Eur,
        other => bail!("unsupported base currency: {} (valid: usd, eur)", other),
    };
    let equity_method = match args.equity_model.to_ascii_lowercase().as_str() {
        "ra" => EquityMethod::Ra,
        "gk" => EquityMethod::Gk,
        other => bail!("unsupported equity model: {} (valid: ra, gk)", other),
    };

    let runner = ScenarioRunner::new(base_currency, equity_method);
    let overrides = load_overrides(args.overrides.as_deref())?;

    if let Some(stress_path) = args.stress.as_deref() {
        let stress_overrides = load_overrides(Some(stress_path))?;
        let (base, stress, comparison) = runner.run_stress_test(
            overrides,
            stress_overrides,
            &args.scenario_name,
            "Stress Scenario",
        )?;

        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "base": base,
                    "stress": stress,
                }))?
            );
        } else {
            println!("{}", comparison);
            let worst = stress
                .results
                .values()
                .zip(base.results.values())
                .map(|(s, b)| (s.asset_class.clone(), s.expected_return_nominal - b.expected_return_nominal))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((asset, delta)) = worst {
                println!(
                    "Largest impact: {} ({} nominal)",
                    asset,
                    format_percentage(delta, 2)
                );
            }
        }
        return Ok(());
    }

    let name = if overrides.is_empty() {
        args.scenario_name.clone()
    } else if args.scenario_name == "RA Defaults" {
        "Custom Scenario".to_string()
    } else {
        args.scenario_name.clone()
    };
    let result = runner.run(&name, overrides)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", format_results_table(&result, true));
    }
    Ok(())
}
