//! Scenario runner for batch and stress-test computations
//!
//! One engine instance handles one scenario; the runner fans batches out
//! across independent instances, so no synchronization is needed between
//! scenarios.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{BaseCurrency, EngineError, EquityMethod};
use crate::engine::CmeEngine;
use crate::inputs::OverrideSet;
use crate::output::{format_comparison_table, ScenarioResult};

/// One named scenario: a label plus its override set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default)]
    pub overrides: OverrideSet,
}

/// Batch runner sharing a base currency and equity methodology
///
/// # Example
/// ```
/// use cme_engine::scenario::ScenarioRunner;
/// use cme_engine::inputs::OverrideSet;
///
/// let runner = ScenarioRunner::default();
/// let mut overrides = OverrideSet::new();
/// overrides.set("macro.us.inflation_forecast", 0.045);
/// let result = runner.run("Inflation Shock", overrides).unwrap();
/// assert_eq!(result.results.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioRunner {
    base_currency: BaseCurrency,
    equity_method: EquityMethod,
}

impl ScenarioRunner {
    pub fn new(base_currency: BaseCurrency, equity_method: EquityMethod) -> Self {
        Self {
            base_currency,
            equity_method,
        }
    }

    /// Run a single named scenario on a fresh engine instance
    pub fn run(&self, name: &str, overrides: OverrideSet) -> Result<ScenarioResult, EngineError> {
        let mut engine = CmeEngine::new(overrides, self.base_currency, self.equity_method);
        engine.compute_scenario(name)
    }

    /// Run many scenarios in parallel, one engine instance each
    ///
    /// The caller bounds the batch size; results come back in input order.
    pub fn run_scenarios(
        &self,
        specs: &[ScenarioSpec],
    ) -> Result<Vec<ScenarioResult>, EngineError> {
        specs
            .par_iter()
            .map(|spec| self.run(&spec.name, spec.overrides.clone()))
            .collect()
    }

    /// Run a base case against a stressed scenario and format a comparison
    pub fn run_stress_test(
        &self,
        base_overrides: OverrideSet,
        stress_overrides: OverrideSet,
        base_name: &str,
        stress_name: &str,
    ) -> Result<(ScenarioResult, ScenarioResult, String), EngineError> {
        let base = self.run(base_name, base_overrides)?;
        let stress = self.run(stress_name, stress_overrides)?;
        let comparison = format_comparison_table(&base, &stress);
        Ok((base, stress, comparison))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetClass;
    use approx::assert_relative_eq;

    #[test]
    fn test_run_scenarios_batch() {
        let runner = ScenarioRunner::default();

        let specs: Vec<ScenarioSpec> = [0.03, 0.045, 0.06]
            .iter()
            .map(|&inflation| {
                let mut overrides = OverrideSet::new();
                overrides.set("macro.us.inflation_forecast", inflation);
                ScenarioSpec {
                    name: format!("Inflation {:.1}%", inflation * 100.0),
                    overrides,
                }
            })
            .collect();

        let results = runner.run_scenarios(&specs).unwrap();
        assert_eq!(results.len(), 3);

        // Higher inflation lifts the nominal cash return through the
        // T-Bill long-term leg
        let cash = |r: &ScenarioResult| {
            r.results[&AssetClass::Liquidity].expected_return_nominal
        };
        assert!(cash(&results[2]) > cash(&results[0]));
    }

    #[test]
    fn test_scenarios_are_independent() {
        let runner = ScenarioRunner::default();
        let mut stressed = OverrideSet::new();
        stressed.set("bonds_hy.default_rate", 0.10);

        let specs = vec![
            ScenarioSpec {
                name: "Base".to_string(),
                overrides: OverrideSet::new(),
            },
            ScenarioSpec {
                name: "Defaults Spike".to_string(),
                overrides: stressed,
            },
        ];
        let results = runner.run_scenarios(&specs).unwrap();

        // The stressed override must not leak into the base run
        assert!(results[0].overrides_applied.is_empty());
        assert_relative_eq!(
            results[0].results[&AssetClass::BondsHy].components["credit_loss"],
            0.055 * 0.60,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            results[1].results[&AssetClass::BondsHy].components["credit_loss"],
            0.10 * 0.60,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_stress_test_comparison() {
        let runner = ScenarioRunner::default();
        let mut stress = OverrideSet::new();
        stress.set("macro.us.inflation_forecast", 0.06);

        let (base, stressed, comparison) = runner
            .run_stress_test(OverrideSet::new(), stress, "RA Defaults", "High Inflation")
            .unwrap();

        assert_eq!(base.scenario_name, "RA Defaults");
        assert_eq!(stressed.scenario_name, "High Inflation");
        assert!(comparison.contains("RA Defaults vs High Inflation"));
        assert!(comparison.contains("Liquidity (Cash)"));
    }

    #[test]
    fn test_spec_deserializes_from_json() {
        let json = r#"{
            "name": "Stagflation",
            "overrides": {"macro": {"us": {"inflation_forecast": 0.07, "rgdp_growth": 0.0}}}
        }"#;
        let spec: ScenarioSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.name, "Stagflation");
        assert_eq!(
            spec.overrides.get(&["macro", "us", "inflation_forecast"]),
            Some(0.07)
        );
    }
}
