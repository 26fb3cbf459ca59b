//! Result records and text formatting for scenario output
//!
//! These are the shapes the collaborating layers (API, dashboard) consume,
//! so everything here serializes. The table formatters back the CLI.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{AssetClass, BaseCurrency, Region};
use crate::inputs::{InputSource, OverrideSet};

/// A resolved input value with its provenance, flattened for reporting
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputRecord {
    pub value: f64,
    pub source: InputSource,
}

/// How one macro input influenced one asset's results
#[derive(Debug, Clone, Serialize)]
pub struct MacroDependency {
    /// Macro path, e.g. `us.inflation_forecast`
    pub macro_input: String,
    /// Value actually used in the calculation
    pub value_used: f64,
    pub source: InputSource,
    /// Output fields this input affects
    pub affects: Vec<String>,
    /// Human-readable impact note
    pub impact_description: String,
}

/// Expected-return result for one asset class
#[derive(Debug, Clone, Serialize)]
pub struct AssetClassResult {
    /// Display name of the asset class
    pub asset_class: String,
    pub expected_return_nominal: f64,
    pub expected_return_real: f64,
    /// Named return components, e.g. yield / roll_return / valuation
    pub components: BTreeMap<String, f64>,
    /// Every input that entered the calculation, with provenance
    pub inputs_used: BTreeMap<String, InputRecord>,
    /// Which macro forecasts fed this asset and how
    pub macro_dependencies: BTreeMap<String, MacroDependency>,
}

/// Headline macro assumptions for one region
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MacroSummary {
    pub rgdp_growth: f64,
    pub inflation: f64,
    pub tbill_rate: f64,
}

/// FX forecast summary for one foreign currency
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FxSummary {
    pub fx_change: f64,
    pub carry_component: f64,
    pub ppp_component: f64,
}

/// Complete results for one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub base_currency: BaseCurrency,
    pub results: BTreeMap<AssetClass, AssetClassResult>,
    pub macro_assumptions: BTreeMap<Region, MacroSummary>,
    pub overrides_applied: OverrideSet,
    /// Foreign currency -> FX forecast; empty for a USD base
    pub fx_forecasts: BTreeMap<String, FxSummary>,
}

/// Format a decimal as a percentage string, e.g. 0.0234 -> "2.34%"
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

/// Render a scenario as a text table
pub fn format_results_table(results: &ScenarioResult, show_components: bool) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(80));
    lines.push(format!(
        "Capital Market Expectations: {} (base {})",
        results.scenario_name,
        results.base_currency.as_str().to_uppercase()
    ));
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("{:<25} {:<12} {:<12}", "Asset Class", "Nominal", "Real"));
    lines.push("-".repeat(50));

    for result in results.results.values() {
        lines.push(format!(
            "{:<25} {:<12} {:<12}",
            result.asset_class,
            format_percentage(result.expected_return_nominal, 2),
            format_percentage(result.expected_return_real, 2),
        ));
        if show_components {
            for (name, value) in &result.components {
                lines.push(format!(
                    "  - {:<21} {}",
                    name,
                    format_percentage(*value, 2)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("-".repeat(50));
    lines.push("Macro Assumptions:".to_string());
    for (region, summary) in &results.macro_assumptions {
        lines.push(format!("  {}:", region.as_str().to_uppercase()));
        lines.push(format!(
            "    rgdp_growth: {}",
            format_percentage(summary.rgdp_growth, 2)
        ));
        lines.push(format!(
            "    inflation: {}",
            format_percentage(summary.inflation, 2)
        ));
        lines.push(format!(
            "    tbill_rate: {}",
            format_percentage(summary.tbill_rate, 2)
        ));
    }

    if !results.fx_forecasts.is_empty() {
        lines.push(String::new());
        lines.push("FX Forecasts (annual change vs base):".to_string());
        for (currency, fx) in &results.fx_forecasts {
            lines.push(format!(
                "  {}: {} (carry {}, ppp {})",
                currency.to_uppercase(),
                format_percentage(fx.fx_change, 2),
                format_percentage(fx.carry_component, 2),
                format_percentage(fx.ppp_component, 2),
            ));
        }
    }

    let overrides = results.overrides_applied.leaves();
    if !overrides.is_empty() {
        lines.push(String::new());
        lines.push("Overrides Applied:".to_string());
        for (path, value) in overrides {
            lines.push(format!("  {}: {}", path, value));
        }
    }

    lines.push(String::new());
    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Render a base-vs-stress comparison as a text table
pub fn format_comparison_table(base: &ScenarioResult, stress: &ScenarioResult) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(80));
    lines.push(format!(
        "Scenario Comparison: {} vs {}",
        base.scenario_name, stress.scenario_name
    ));
    lines.push("=".repeat(80));
    lines.push(String::new());
    lines.push(format!(
        "{:<25} {:>12} {:>12} {:>10}",
        "Asset Class", "Base", "Stress", "Delta"
    ));
    lines.push("-".repeat(62));

    for (asset, base_result) in &base.results {
        if let Some(stress_result) = stress.results.get(asset) {
            let delta =
                stress_result.expected_return_nominal - base_result.expected_return_nominal;
            lines.push(format!(
                "{:<25} {:>12} {:>12} {:>+9.2}%",
                base_result.asset_class,
                format_percentage(base_result.expected_return_nominal, 2),
                format_percentage(stress_result.expected_return_nominal, 2),
                delta * 100.0,
            ));
        }
    }

    lines.push(String::new());
    lines.push("=".repeat(80));
    lines.join("\n")
}
