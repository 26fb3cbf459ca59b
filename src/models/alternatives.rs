//! Absolute return (diversified hedge fund) factor model
//!
//! E[HF Return] = E[T-Bill] + sum(beta_i x premium_i) + trading alpha
//!
//! Factor set: market, size (SMB), value (HML), profitability (RMW),
//! investment (CMA), momentum (UMD). The market premium is derived from
//! the US equity model's nominal return; the rest use discounted
//! historical premia.

use std::collections::BTreeMap;

use crate::config::{AssetClass, HedgeFundParams};
use crate::inputs::{DefaultInputs, OverrideManager, TrackedMap, TrackedValue};

/// Factor names, market first
pub const FACTORS: [&str; 6] = [
    "market",
    "size",
    "value",
    "profitability",
    "investment",
    "momentum",
];

/// Complete hedge-fund return forecast
#[derive(Debug, Clone)]
pub struct HedgeFundForecast {
    pub expected_return_nominal: f64,
    pub expected_return_real: f64,

    pub tbill_component: f64,
    pub factor_return: f64,
    pub trading_alpha: f64,

    /// Per-factor beta x premium contributions
    pub factor_contributions: BTreeMap<String, f64>,

    pub inflation: f64,

    pub components: BTreeMap<String, TrackedMap>,
}

/// Hedge-fund factor model
pub struct HedgeFundModel<'a> {
    overrides: &'a OverrideManager,
}

impl<'a> HedgeFundModel<'a> {
    pub fn new(overrides: &'a OverrideManager) -> Self {
        Self { overrides }
    }

    /// Factor exposures, overridable at `absolute_return.beta_<factor>`
    pub fn factor_betas(&self) -> TrackedMap {
        let mut betas = TrackedMap::new();
        for factor in FACTORS {
            let field = format!("beta_{}", factor);
            betas.insert(
                factor.to_string(),
                self.overrides
                    .asset_value(AssetClass::AbsoluteReturn, &field, 0.0),
            );
        }
        betas
    }

    /// Expected factor premia
    ///
    /// Market premium is the supplied equity return over T-Bill when both
    /// are available (computed). Other factors take the historical premium
    /// haircut by the forward-looking discount unless overridden at
    /// `absolute_return.premium_<factor>`.
    pub fn factor_premia(
        &self,
        equity_return: Option<f64>,
        tbill_rate: Option<f64>,
    ) -> TrackedMap {
        let params = HedgeFundParams::default();
        let mut premia = TrackedMap::new();

        match (equity_return, tbill_rate) {
            (Some(equity), Some(tbill)) => {
                premia.insert(
                    "market".to_string(),
                    TrackedValue::computed(equity - tbill),
                );
            }
            _ => {
                let historical =
                    DefaultInputs::historical_factor_premium("market").unwrap_or(0.05);
                premia.insert(
                    "market".to_string(),
                    self.overrides.asset_value(
                        AssetClass::AbsoluteReturn,
                        "premium_market",
                        historical,
                    ),
                );
            }
        }

        for factor in &FACTORS[1..] {
            let historical = DefaultInputs::historical_factor_premium(factor).unwrap_or(0.02);
            let field = format!("premium_{}", factor);
            premia.insert(
                factor.to_string(),
                self.overrides.asset_value(
                    AssetClass::AbsoluteReturn,
                    &field,
                    historical * params.historical_discount,
                ),
            );
        }
        premia
    }

    /// Manager skill beyond factor exposures, defaulting to half the
    /// historical estimate
    pub fn trading_alpha(&self) -> TrackedValue {
        let params = HedgeFundParams::default();
        self.overrides.asset_value(
            AssetClass::AbsoluteReturn,
            "trading_alpha",
            params.historical_discount * params.historical_alpha,
        )
    }

    /// Complete hedge-fund forecast for the given macro backdrop
    pub fn compute_return(
        &self,
        tbill_forecast: f64,
        inflation_forecast: f64,
        equity_return: Option<f64>,
    ) -> HedgeFundForecast {
        let betas = self.factor_betas();
        let premia = self.factor_premia(equity_return, Some(tbill_forecast));
        let alpha = self.trading_alpha();

        let mut factor_contributions = BTreeMap::new();
        let mut contributions_map = TrackedMap::new();
        let mut factor_return = 0.0;
        for factor in FACTORS {
            let contribution = betas[factor].value * premia[factor].value;
            factor_return += contribution;
            factor_contributions.insert(factor.to_string(), contribution);
            contributions_map.insert(
                factor.to_string(),
                TrackedValue::computed(contribution),
            );
        }

        let expected_return_nominal = tbill_forecast + factor_return + alpha.value;
        let expected_return_real = expected_return_nominal - inflation_forecast;

        let mut rate_result = TrackedMap::new();
        rate_result.insert(
            "tbill_forecast".to_string(),
            TrackedValue::computed(tbill_forecast),
        );

        let mut beta_result = TrackedMap::new();
        for factor in FACTORS {
            beta_result.insert(format!("beta_{}", factor), betas[factor]);
        }
        let mut premium_result = TrackedMap::new();
        for factor in FACTORS {
            premium_result.insert(format!("premium_{}", factor), premia[factor]);
        }

        let mut alpha_result = TrackedMap::new();
        alpha_result.insert("trading_alpha".to_string(), alpha);

        let mut components = BTreeMap::new();
        components.insert("rate".to_string(), rate_result);
        components.insert("betas".to_string(), beta_result);
        components.insert("premia".to_string(), premium_result);
        components.insert("contributions".to_string(), contributions_map);
        components.insert("alpha".to_string(), alpha_result);

        HedgeFundForecast {
            expected_return_nominal,
            expected_return_real,
            tbill_component: tbill_forecast,
            factor_return,
            trading_alpha: alpha.value,
            factor_contributions,
            inflation: inflation_forecast,
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::InputSource;
    use approx::assert_relative_eq;

    fn manager() -> OverrideManager {
        OverrideManager::default()
    }

    #[test]
    fn test_market_premium_from_equity_return() {
        let manager = manager();
        let model = HedgeFundModel::new(&manager);
        let premia = model.factor_premia(Some(0.065), Some(0.035));
        assert_relative_eq!(premia["market"].value, 0.03, epsilon = 1e-12);
        assert_eq!(premia["market"].source, InputSource::Computed);
    }

    #[test]
    fn test_non_market_premia_discounted() {
        let manager = manager();
        let model = HedgeFundModel::new(&manager);
        let premia = model.factor_premia(Some(0.065), Some(0.035));
        // 6% historical momentum at a 50% haircut
        assert_relative_eq!(premia["momentum"].value, 0.03, epsilon = 1e-12);
        assert_eq!(premia["momentum"].source, InputSource::Default);
        assert_relative_eq!(premia["size"].value, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_premium_override() {
        let mut manager = manager();
        manager.set_override("absolute_return.premium_value", 0.05);
        let model = HedgeFundModel::new(&manager);
        let premia = model.factor_premia(Some(0.065), Some(0.035));
        assert_eq!(premia["value"].value, 0.05);
        assert_eq!(premia["value"].source, InputSource::Override);
    }

    #[test]
    fn test_return_decomposition() {
        let manager = manager();
        let model = HedgeFundModel::new(&manager);
        let forecast = model.compute_return(0.035, 0.023, Some(0.065));

        let expected_factor: f64 = FACTORS
            .iter()
            .map(|f| forecast.factor_contributions[*f])
            .sum();
        assert_relative_eq!(forecast.factor_return, expected_factor, epsilon = 1e-12);
        assert_relative_eq!(
            forecast.expected_return_nominal,
            0.035 + forecast.factor_return + forecast.trading_alpha,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            forecast.expected_return_real,
            forecast.expected_return_nominal - 0.023,
            epsilon = 1e-12
        );
        // Default alpha is half the 2% historical estimate
        assert_relative_eq!(forecast.trading_alpha, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_beta_override_scales_contribution() {
        let mut manager = manager();
        manager.set_override("absolute_return.beta_market", 0.60);
        let model = HedgeFundModel::new(&manager);
        let forecast = model.compute_return(0.035, 0.023, Some(0.065));
        // 0.60 beta on a 3% market premium
        assert_relative_eq!(
            forecast.factor_contributions["market"],
            0.60 * 0.03,
            epsilon = 1e-12
        );
    }
}
