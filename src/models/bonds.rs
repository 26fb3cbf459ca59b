//! Bond return models: government, high yield, and emerging markets
//!
//! All three share one framework:
//!
//! Return = Yield + Roll Return + Valuation Return - Credit Losses
//!
//! The variants differ only in their credit-loss policy and, for high
//! yield, an additional credit-spread reversion folded into valuation.
//! That difference is a small policy record injected into one shared
//! algorithm, not a class hierarchy.

use std::collections::BTreeMap;

use crate::config::{
    AssetClass, BondParams, MeanReversionParams, EM_HARD_CURRENCY_SPREAD, EM_INFLATION_PREMIUM,
};
use crate::inputs::{DefaultInputs, OverrideManager, TrackedMap, TrackedValue};

/// Complete bond return forecast
#[derive(Debug, Clone)]
pub struct BondForecast {
    pub expected_return_nominal: f64,
    pub expected_return_real: f64,

    pub yield_component: f64,
    pub roll_return: f64,
    pub valuation_return: f64,
    pub credit_loss: f64,

    /// Inflation used for the real-return subtraction
    pub inflation: f64,

    pub components: BTreeMap<String, TrackedMap>,
}

/// Expected-loss policy for a bond class
///
/// Sovereign developed bonds carry no policy: their credit loss is zero by
/// definition, not a parameterization of this formula.
#[derive(Debug, Clone, Copy)]
pub struct CreditLossPolicy {
    /// Annual default rate fallback when the catalog has no entry
    pub default_rate: f64,
    /// Recovery rate fallback when the catalog has no entry
    pub recovery_rate: f64,
}

/// Structural description of one bond asset class
#[derive(Debug, Clone, Copy)]
pub struct BondSpec {
    pub asset_class: AssetClass,
    pub credit: Option<CreditLossPolicy>,
    /// Whether the class reverts a credit spread toward fair value
    pub spread_reversion: bool,
}

/// Shared bond return model, parameterized by a [`BondSpec`]
pub struct BondModel<'a> {
    overrides: &'a OverrideManager,
    spec: BondSpec,
}

impl<'a> BondModel<'a> {
    pub fn new(overrides: &'a OverrideManager, spec: BondSpec) -> Self {
        Self { overrides, spec }
    }

    /// Developed-market government bonds: zero credit losses
    pub fn government(overrides: &'a OverrideManager) -> Self {
        Self::new(
            overrides,
            BondSpec {
                asset_class: AssetClass::BondsGlobal,
                credit: None,
                spread_reversion: false,
            },
        )
    }

    /// US high yield: default losses plus credit-spread reversion
    pub fn high_yield(overrides: &'a OverrideManager) -> Self {
        Self::new(
            overrides,
            BondSpec {
                asset_class: AssetClass::BondsHy,
                credit: Some(CreditLossPolicy {
                    default_rate: 0.055,
                    recovery_rate: 0.40,
                }),
                spread_reversion: true,
            },
        )
    }

    /// EM sovereign bonds (hard or local currency via [`Self::compute_return_em`])
    pub fn em(overrides: &'a OverrideManager) -> Self {
        Self::new(
            overrides,
            BondSpec {
                asset_class: AssetClass::BondsEm,
                credit: Some(CreditLossPolicy {
                    default_rate: 0.028,
                    recovery_rate: 0.55,
                }),
                spread_reversion: false,
            },
        )
    }

    fn inputs(&self) -> TrackedMap {
        self.overrides.asset_inputs(self.spec.asset_class)
    }

    fn asset_value(&self, field: &str, fallback: f64) -> TrackedValue {
        self.overrides
            .asset_value(self.spec.asset_class, field, fallback)
    }

    /// Expected annual credit loss = default rate x (1 - recovery rate)
    fn credit_loss(&self) -> TrackedMap {
        let mut result = TrackedMap::new();
        match self.spec.credit {
            None => {
                result.insert("credit_loss".to_string(), TrackedValue::default_of(0.0));
                result.insert("default_rate".to_string(), TrackedValue::default_of(0.0));
                result.insert("recovery_rate".to_string(), TrackedValue::default_of(1.0));
            }
            Some(policy) => {
                let default_rate = self.asset_value("default_rate", policy.default_rate);
                let recovery_rate = self.asset_value("recovery_rate", policy.recovery_rate);
                let loss = default_rate.value * (1.0 - recovery_rate.value);
                result.insert("credit_loss".to_string(), TrackedValue::computed(loss));
                result.insert("default_rate".to_string(), default_rate);
                result.insert("recovery_rate".to_string(), recovery_rate);
            }
        }
        result
    }

    /// Average value of a quantity reverting toward fair over `years`
    fn average_reverting(current: f64, fair: f64, speed: f64, years: u32) -> f64 {
        let mut total = 0.0;
        let mut value = current;
        for _ in 0..years {
            total += value;
            value += speed * (fair - value);
        }
        total / years as f64
    }

    /// Average yield over the horizon: T-Bill plus the mean of the
    /// simulated term-premium path.
    ///
    /// A direct `current_yield` override shifts the term premium by the
    /// same delta so yield and premium stay mutually consistent.
    fn yield_component(
        &self,
        current_yield: TrackedValue,
        tbill_forecast: f64,
        horizon_years: u32,
    ) -> TrackedMap {
        let base_term_premium = self.asset_value("current_term_premium", 0.015);

        let current_term_premium = if current_yield.is_override() {
            let default_yield =
                DefaultInputs::asset_default(self.spec.asset_class, "current_yield")
                    .unwrap_or(current_yield.value);
            let yield_delta = current_yield.value - default_yield;
            TrackedValue::computed(base_term_premium.value + yield_delta)
        } else {
            base_term_premium
        };

        let fair_term_premium = self.asset_value("fair_term_premium", 0.015);

        let reversion = MeanReversionParams::default();
        let avg_term_premium = Self::average_reverting(
            current_term_premium.value,
            fair_term_premium.value,
            reversion.term_premium_speed(),
            horizon_years,
        );
        let avg_yield = tbill_forecast + avg_term_premium;

        let mut result = TrackedMap::new();
        result.insert("current_yield".to_string(), current_yield);
        result.insert(
            "tbill_forecast".to_string(),
            TrackedValue::computed(tbill_forecast),
        );
        result.insert("current_term_premium".to_string(), current_term_premium);
        result.insert("fair_term_premium".to_string(), fair_term_premium);
        result.insert(
            "avg_term_premium".to_string(),
            TrackedValue::computed(avg_term_premium),
        );
        result.insert("avg_yield".to_string(), TrackedValue::computed(avg_yield));
        result
    }

    /// Roll-down return: first-order approximation assuming a constant
    /// yield-curve slope of term premium over assumed maturity.
    fn roll_return(&self, duration: TrackedValue, term_premium: f64) -> TrackedMap {
        let params = BondParams::default();
        let slope = term_premium / params.assumed_maturity_years;
        let roll = slope * duration.value;

        let mut result = TrackedMap::new();
        result.insert("roll_return".to_string(), TrackedValue::computed(roll));
        result.insert(
            "yield_curve_slope".to_string(),
            TrackedValue::computed(slope),
        );
        result.insert("duration".to_string(), duration);
        result
    }

    /// Valuation return from expected term-premium change: premiums rising
    /// toward fair value mean yields rise and prices fall.
    fn valuation_return(
        &self,
        current_term_premium: f64,
        fair_term_premium: f64,
        duration: f64,
        horizon_years: u32,
    ) -> TrackedMap {
        let reversion = MeanReversionParams::default();
        let fraction = reversion.partial_reversion_fraction(horizon_years);
        let expected_tp_change = (fair_term_premium - current_term_premium) * fraction;
        let valuation = -duration * expected_tp_change / horizon_years as f64;

        let mut result = TrackedMap::new();
        result.insert(
            "valuation_return".to_string(),
            TrackedValue::computed(valuation),
        );
        result.insert(
            "expected_tp_change".to_string(),
            TrackedValue::computed(expected_tp_change),
        );
        result.insert(
            "reversion_fraction".to_string(),
            TrackedValue::computed(fraction),
        );
        result
    }

    /// Complete bond forecast for the given macro backdrop
    pub fn compute_return(
        &self,
        tbill_forecast: f64,
        inflation_forecast: f64,
        horizon_years: u32,
    ) -> BondForecast {
        let inputs = self.inputs();
        let current_yield = inputs
            .get("current_yield")
            .copied()
            .unwrap_or(TrackedValue::default_of(0.04));
        let duration = inputs
            .get("duration")
            .copied()
            .unwrap_or(TrackedValue::default_of(7.0));

        let yield_result = self.yield_component(current_yield, tbill_forecast, horizon_years);
        let avg_yield = yield_result["avg_yield"].value;
        let current_tp = yield_result["current_term_premium"].value;
        let fair_tp = yield_result["fair_term_premium"].value;

        let roll_result = self.roll_return(duration, current_tp);
        let roll_return = roll_result["roll_return"].value;

        let mut valuation_result =
            self.valuation_return(current_tp, fair_tp, duration.value, horizon_years);
        let mut valuation_return = valuation_result["valuation_return"].value;

        let credit_result = self.credit_loss();
        let credit_loss = credit_result["credit_loss"].value;

        let mut components = BTreeMap::new();

        // High yield: 50% reversion of the credit spread toward fair value
        // over the horizon, folded into valuation. Spread widening means a
        // price decline.
        if self.spec.spread_reversion {
            let params = BondParams::default();
            let credit_spread = self.asset_value("credit_spread", 0.035);
            let fair_spread = self.asset_value("fair_credit_spread", 0.04);
            let spread_change =
                (fair_spread.value - credit_spread.value) * params.hy_spread_reversion_fraction;
            let spread_valuation = -duration.value * spread_change / horizon_years as f64;

            let mut spread_result = TrackedMap::new();
            spread_result.insert("current_spread".to_string(), credit_spread);
            spread_result.insert("fair_spread".to_string(), fair_spread);
            spread_result.insert(
                "spread_valuation".to_string(),
                TrackedValue::computed(spread_valuation),
            );
            components.insert("credit_spread".to_string(), spread_result);

            valuation_return += spread_valuation;
            valuation_result.insert(
                "valuation_return".to_string(),
                TrackedValue::computed(valuation_return),
            );
        }

        let expected_return_nominal = avg_yield + roll_return + valuation_return - credit_loss;
        let expected_return_real = expected_return_nominal - inflation_forecast;

        components.insert("yield".to_string(), yield_result);
        components.insert("roll".to_string(), roll_result);
        components.insert("valuation".to_string(), valuation_result);
        components.insert("credit".to_string(), credit_result);

        BondForecast {
            expected_return_nominal,
            expected_return_real,
            yield_component: avg_yield,
            roll_return,
            valuation_return,
            credit_loss,
            inflation: inflation_forecast,
            components,
        }
    }

    /// EM bond forecast in hard- or local-currency mode
    ///
    /// Hard currency: priced off the US T-Bill plus a fixed credit spread
    /// when no EM T-Bill is supplied, with US inflation for the real
    /// return. Local currency: an EM inflation premium is added to the
    /// supplied inflation instead.
    pub fn compute_return_em(
        &self,
        us_tbill_forecast: f64,
        inflation_forecast: f64,
        em_tbill_forecast: Option<f64>,
        hard_currency: bool,
        horizon_years: u32,
    ) -> BondForecast {
        let (em_tbill, spread_applied) = match em_tbill_forecast {
            Some(rate) => (rate, 0.0),
            None => (
                us_tbill_forecast + EM_HARD_CURRENCY_SPREAD,
                EM_HARD_CURRENCY_SPREAD,
            ),
        };

        let (effective_inflation, inflation_premium) = if hard_currency {
            (inflation_forecast, None)
        } else {
            let premium = self.asset_value("em_inflation_premium", EM_INFLATION_PREMIUM);
            (inflation_forecast + premium.value, Some(premium))
        };

        let mut forecast = self.compute_return(em_tbill, effective_inflation, horizon_years);

        let mut pricing = TrackedMap::new();
        pricing.insert("us_tbill_forecast".to_string(), TrackedValue::computed(us_tbill_forecast));
        pricing.insert("em_tbill_forecast".to_string(), TrackedValue::computed(em_tbill));
        pricing.insert(
            "credit_spread_over_us".to_string(),
            TrackedValue::default_of(spread_applied),
        );
        if let Some(premium) = inflation_premium {
            pricing.insert("em_inflation_premium".to_string(), premium);
        }
        forecast.components.insert("em_pricing".to_string(), pricing);

        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::InputSource;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const HORIZON: u32 = 10;

    fn manager() -> OverrideManager {
        OverrideManager::default()
    }

    #[test]
    fn test_government_zero_credit_loss() {
        let manager = manager();
        let model = BondModel::government(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        assert_eq!(forecast.credit_loss, 0.0);
    }

    #[test]
    fn test_high_yield_credit_loss_formula() {
        let mut manager = manager();
        manager.set_override("bonds_hy.default_rate", 0.08);
        let model = BondModel::high_yield(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        // 8% defaults at 40% recovery
        assert_relative_eq!(forecast.credit_loss, 0.08 * 0.60, epsilon = 1e-12);
        assert_eq!(
            forecast.components["credit"]["default_rate"].source,
            InputSource::Override
        );
    }

    #[test]
    fn test_valuation_zero_at_fair_value() {
        let mut manager = manager();
        manager.set_override("bonds_global.current_term_premium", 0.015);
        manager.set_override("bonds_global.fair_term_premium", 0.015);
        let model = BondModel::government(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        assert_abs_diff_eq!(forecast.valuation_return, 0.0, epsilon = 1e-15);
        // No reversion pressure: the average premium equals the level
        assert_relative_eq!(
            forecast.components["yield"]["avg_term_premium"].value,
            0.015,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_roll_return_slope() {
        let manager = manager();
        let model = BondModel::government(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        // slope = 1.0% premium over 10y maturity, times 7y duration
        assert_relative_eq!(
            forecast.roll_return,
            0.01 / 10.0 * 7.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_current_yield_override_shifts_term_premium() {
        let mut manager = manager();
        // +1% over the 3.5% default yield
        manager.set_override("bonds_global.current_yield", 0.045);
        let model = BondModel::government(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);

        let tp = &forecast.components["yield"]["current_term_premium"];
        assert_relative_eq!(tp.value, 0.01 + 0.01, epsilon = 1e-12);
        assert_eq!(tp.source, InputSource::Computed);
    }

    #[test]
    fn test_below_fair_premium_gives_negative_valuation() {
        // Default global bonds: current 1.0% below fair 1.5%, so yields
        // rise and prices fall over the horizon.
        let manager = manager();
        let model = BondModel::government(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        assert!(forecast.valuation_return < 0.0);
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let manager = manager();
        let model = BondModel::high_yield(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        assert_relative_eq!(
            forecast.expected_return_nominal,
            forecast.yield_component + forecast.roll_return + forecast.valuation_return
                - forecast.credit_loss,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            forecast.expected_return_real,
            forecast.expected_return_nominal - 0.023,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_hy_spread_reversion_direction() {
        // Current spread 2.71% below fair 4.0%: widening ahead, negative
        // valuation adjustment.
        let manager = manager();
        let model = BondModel::high_yield(&manager);
        let forecast = model.compute_return(0.035, 0.023, HORIZON);
        let spread_valuation =
            forecast.components["credit_spread"]["spread_valuation"].value;
        assert!(spread_valuation < 0.0);
        assert_relative_eq!(
            spread_valuation,
            -4.0 * (0.04 - 0.0271) * 0.5 / 10.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_em_hard_currency_pricing() {
        let manager = manager();
        let model = BondModel::em(&manager);
        let forecast = model.compute_return_em(0.035, 0.023, None, true, HORIZON);

        let pricing = &forecast.components["em_pricing"];
        assert_relative_eq!(
            pricing["em_tbill_forecast"].value,
            0.035 + EM_HARD_CURRENCY_SPREAD,
            epsilon = 1e-12
        );
        // Hard currency: US inflation used directly
        assert_relative_eq!(forecast.inflation, 0.023, epsilon = 1e-12);
    }

    #[test]
    fn test_em_local_currency_adds_inflation_premium() {
        let manager = manager();
        let model = BondModel::em(&manager);
        let forecast = model.compute_return_em(0.035, 0.040, Some(0.06), false, HORIZON);
        assert_relative_eq!(
            forecast.inflation,
            0.040 + EM_INFLATION_PREMIUM,
            epsilon = 1e-12
        );
        // Supplied EM T-Bill used as-is, no spread
        assert_relative_eq!(
            forecast.components["em_pricing"]["em_tbill_forecast"].value,
            0.06,
            epsilon = 1e-12
        );
    }
}
