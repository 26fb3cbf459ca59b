//! Equity return models for the US, Europe, Japan, and EM regions
//!
//! Two interchangeable methodologies, chosen once per engine instance:
//!
//! - RA: real return = dividend yield + blended real EPS growth + valuation
//!   change from CAEY mean reversion
//! - Grinold-Kroner: nominal return = dividend yield + net buybacks +
//!   nominal revenue growth + margin change + P/E convergence
//!
//! Each produces its own forecast shape; the engine normalizes both into
//! the common per-asset result record.

use std::collections::BTreeMap;

use crate::config::{AssetClass, EquityParams, MeanReversionParams};
use crate::inputs::{OverrideManager, TrackedMap, TrackedValue};

/// RA-methodology equity forecast
#[derive(Debug, Clone)]
pub struct RaForecast {
    pub expected_return_nominal: f64,
    pub expected_return_real: f64,

    pub dividend_yield: f64,
    pub real_eps_growth: f64,
    pub valuation_change: f64,

    /// Inflation added to the real return for the nominal figure
    pub inflation: f64,

    pub components: BTreeMap<String, TrackedMap>,
}

/// Grinold-Kroner equity forecast
#[derive(Debug, Clone)]
pub struct GkForecast {
    pub expected_return_nominal: f64,
    pub expected_return_real: f64,

    pub dividend_yield: f64,
    pub net_buyback_yield: f64,
    pub revenue_growth: f64,
    pub margin_change: f64,
    pub valuation_change: f64,

    /// False when the caller overrode revenue growth directly, severing the
    /// macro linkage (still reported for explanation purposes).
    pub revenue_growth_is_computed: bool,

    pub inflation: f64,

    pub components: BTreeMap<String, TrackedMap>,
}

/// Equity return model covering both methodologies
pub struct EquityModel<'a> {
    overrides: &'a OverrideManager,
}

impl<'a> EquityModel<'a> {
    pub fn new(overrides: &'a OverrideManager) -> Self {
        Self { overrides }
    }

    fn asset_value(&self, asset: AssetClass, field: &str, fallback: f64) -> TrackedValue {
        self.overrides.asset_value(asset, field, fallback)
    }

    /// Blended real EPS growth: 50/50 country and regional, capped at
    /// global GDP growth when a cap is supplied (cap only, never a floor).
    fn eps_growth(&self, asset: AssetClass, global_rgdp_growth: Option<f64>) -> TrackedMap {
        let params = EquityParams::default();
        let country = self.asset_value(asset, "real_eps_growth", 0.015);
        let regional = self.asset_value(asset, "regional_eps_growth", 0.015);

        let blended = params.country_weight * country.value + params.regional_weight * regional.value;
        let capped = match global_rgdp_growth {
            Some(cap) => blended.min(cap),
            None => blended,
        };

        let mut result = TrackedMap::new();
        result.insert("real_eps_growth".to_string(), TrackedValue::computed(capped));
        result.insert("country_eps_growth".to_string(), country);
        result.insert("regional_eps_growth".to_string(), regional);
        result.insert(
            "blended_eps_growth".to_string(),
            TrackedValue::computed(blended),
        );
        if let Some(cap) = global_rgdp_growth {
            result.insert("eps_growth_cap".to_string(), TrackedValue::computed(cap));
        }
        result.insert(
            "country_weight".to_string(),
            TrackedValue::default_of(params.country_weight),
        );
        result.insert(
            "regional_weight".to_string(),
            TrackedValue::default_of(params.regional_weight),
        );
        result
    }

    /// Valuation change from CAEY reverting toward fair value over the full
    /// reversion period, averaged over the forecast horizon.
    ///
    /// The annual CAEY change is dampened by the `reversion_speed`
    /// multiplier (1.0 = full-speed reversion). Non-positive CAEY levels
    /// short-circuit to a zero valuation effect: they are plausible stress
    /// overrides, not errors.
    fn valuation_change(&self, asset: AssetClass, horizon_years: u32) -> TrackedMap {
        let reversion = MeanReversionParams::default();
        let current_caey = self.asset_value(asset, "current_caey", 0.04);
        let fair_caey = self.asset_value(asset, "fair_caey", 0.05);
        let speed = self.asset_value(asset, "reversion_speed", 1.0);
        let full_reversion_years = reversion.caey_full_reversion_years;

        let (avg_valuation, caey_annual_change) =
            if current_caey.value > 0.0 && fair_caey.value > 0.0 {
                let exponent = speed.value / full_reversion_years as f64;
                let annual_change = (fair_caey.value / current_caey.value).powf(exponent) - 1.0;

                // Simulate the CAEY path: each year's price effect is the
                // inverse of the CAEY move, compounding along the way.
                let mut cumulative = 0.0;
                let mut caey = current_caey.value;
                for _ in 0..horizon_years {
                    let caey_next = caey * (1.0 + annual_change);
                    cumulative += caey / caey_next - 1.0;
                    caey = caey_next;
                }
                (cumulative / horizon_years as f64, annual_change)
            } else {
                (0.0, 0.0)
            };

        let mut result = TrackedMap::new();
        result.insert(
            "valuation_change".to_string(),
            TrackedValue::computed(avg_valuation),
        );
        result.insert("current_caey".to_string(), current_caey);
        result.insert("fair_caey".to_string(), fair_caey);
        result.insert("reversion_speed".to_string(), speed);
        result.insert(
            "caey_annual_change".to_string(),
            TrackedValue::computed(caey_annual_change),
        );
        result.insert(
            "full_reversion_years".to_string(),
            TrackedValue::default_of(full_reversion_years as f64),
        );
        result
    }

    /// RA-methodology forecast for one equity asset class
    pub fn compute_ra(
        &self,
        asset: AssetClass,
        inflation_forecast: f64,
        global_rgdp_growth: Option<f64>,
        horizon_years: u32,
    ) -> RaForecast {
        let dividend_yield = self.asset_value(asset, "dividend_yield", 0.02);

        let eps_result = self.eps_growth(asset, global_rgdp_growth);
        let real_eps_growth = eps_result["real_eps_growth"].value;

        let valuation_result = self.valuation_change(asset, horizon_years);
        let valuation_change = valuation_result["valuation_change"].value;

        let expected_return_real = dividend_yield.value + real_eps_growth + valuation_change;
        let expected_return_nominal = expected_return_real + inflation_forecast;

        let mut dividend_result = TrackedMap::new();
        dividend_result.insert("dividend_yield".to_string(), dividend_yield);

        let mut components = BTreeMap::new();
        components.insert("dividend".to_string(), dividend_result);
        components.insert("eps".to_string(), eps_result);
        components.insert("valuation".to_string(), valuation_result);

        RaForecast {
            expected_return_nominal,
            expected_return_real,
            dividend_yield: dividend_yield.value,
            real_eps_growth,
            valuation_change,
            inflation: inflation_forecast,
            components,
        }
    }

    /// Grinold-Kroner forecast for one equity asset class
    ///
    /// Revenue growth auto-derives from the macro backdrop (inflation +
    /// real GDP + a revenue/GDP wedge) unless the caller overrides it
    /// directly, in which case the macro linkage is broken.
    pub fn compute_gk(
        &self,
        asset: AssetClass,
        macro_inflation: f64,
        macro_rgdp: f64,
        horizon_years: u32,
    ) -> GkForecast {
        let dividend_yield = self.asset_value(asset, "dividend_yield", 0.02);
        let net_buyback_yield = self.asset_value(asset, "net_buyback_yield", 0.0);
        let margin_change = self.asset_value(asset, "margin_change", 0.0);
        let wedge = self.asset_value(asset, "revenue_gdp_wedge", 0.0);

        let revenue_path = format!("{}.revenue_growth", asset.as_str());
        let (revenue_growth, revenue_growth_is_computed) =
            if self.overrides.has_override(&revenue_path) {
                let overridden = self
                    .overrides
                    .asset_value(asset, "revenue_growth", 0.0);
                (overridden, false)
            } else {
                (
                    TrackedValue::computed(macro_inflation + macro_rgdp + wedge.value),
                    true,
                )
            };

        let current_pe = self.asset_value(asset, "current_pe", 0.0);
        let target_pe = self.asset_value(asset, "target_pe", 0.0);
        let valuation_change = if current_pe.value > 0.0 && target_pe.value > 0.0 {
            (target_pe.value / current_pe.value).powf(1.0 / horizon_years as f64) - 1.0
        } else {
            0.0
        };

        let expected_return_nominal = dividend_yield.value
            + net_buyback_yield.value
            + revenue_growth.value
            + margin_change.value
            + valuation_change;
        let expected_return_real = expected_return_nominal - macro_inflation;

        let mut income_result = TrackedMap::new();
        income_result.insert("dividend_yield".to_string(), dividend_yield);
        income_result.insert("net_buyback_yield".to_string(), net_buyback_yield);

        let mut growth_result = TrackedMap::new();
        growth_result.insert("revenue_growth".to_string(), revenue_growth);
        growth_result.insert("revenue_gdp_wedge".to_string(), wedge);
        growth_result.insert("margin_change".to_string(), margin_change);
        growth_result.insert(
            "macro_inflation".to_string(),
            TrackedValue::computed(macro_inflation),
        );
        growth_result.insert("macro_rgdp".to_string(), TrackedValue::computed(macro_rgdp));

        let mut valuation_result = TrackedMap::new();
        valuation_result.insert(
            "valuation_change".to_string(),
            TrackedValue::computed(valuation_change),
        );
        valuation_result.insert("current_pe".to_string(), current_pe);
        valuation_result.insert("target_pe".to_string(), target_pe);

        let mut components = BTreeMap::new();
        components.insert("income".to_string(), income_result);
        components.insert("growth".to_string(), growth_result);
        components.insert("valuation".to_string(), valuation_result);

        GkForecast {
            expected_return_nominal,
            expected_return_real,
            dividend_yield: dividend_yield.value,
            net_buyback_yield: net_buyback_yield.value,
            revenue_growth: revenue_growth.value,
            margin_change: margin_change.value,
            valuation_change,
            revenue_growth_is_computed,
            inflation: macro_inflation,
            components,
        }
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
    fn test_ra_components_sum() {
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityEurope, 0.021, None, HORIZON);
        assert_relative_eq!(
            forecast.expected_return_real,
            forecast.dividend_yield + forecast.real_eps_growth + forecast.valuation_change,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            forecast.expected_return_nominal,
            forecast.expected_return_real + 0.021,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_ra_eps_blend_and_cap() {
        let manager = manager();
        let model = EquityModel::new(&manager);

        // US default: 50/50 of 1.8% and 1.6% = 1.7%, uncapped at 3%
        let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, Some(0.03), HORIZON);
        assert_relative_eq!(forecast.real_eps_growth, 0.017, epsilon = 1e-12);

        // A 1% global growth ceiling binds
        let capped = model.compute_ra(AssetClass::EquityUs, 0.023, Some(0.01), HORIZON);
        assert_relative_eq!(capped.real_eps_growth, 0.01, epsilon = 1e-12);

        // The cap never lifts growth
        let low = model.compute_ra(AssetClass::EquityJapan, 0.016, Some(0.10), HORIZON);
        assert_relative_eq!(low.real_eps_growth, 0.012, epsilon = 1e-12);
    }

    #[test]
    fn test_ra_valuation_zero_at_fair() {
        // Europe defaults: current CAEY equals fair CAEY
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityEurope, 0.021, None, HORIZON);
        assert_abs_diff_eq!(forecast.valuation_change, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ra_expensive_market_drags() {
        // US defaults: CAEY 2.48% well below fair 5%, strong negative drag
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, None, HORIZON);
        assert!(forecast.valuation_change < -0.01);
    }

    #[test]
    fn test_ra_valuation_monotone_in_fair_caey() {
        // Raising the fair yield deepens the price drag, with no sign
        // flips across the range; exactly zero at fair == current.
        let model_for = |fair: f64| {
            let mut manager = OverrideManager::default();
            manager.set_override("equity_us.current_caey", 0.04);
            manager.set_override("equity_us.fair_caey", fair);
            manager
        };

        let mut previous = f64::INFINITY;
        for fair in [0.02, 0.03, 0.04, 0.05, 0.06, 0.08] {
            let manager = model_for(fair);
            let model = EquityModel::new(&manager);
            let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, None, HORIZON);
            assert!(
                forecast.valuation_change <= previous + 1e-15,
                "valuation not monotone at fair_caey={}",
                fair
            );
            if (fair - 0.04).abs() < 1e-12 {
                assert_abs_diff_eq!(forecast.valuation_change, 0.0, epsilon = 1e-12);
            }
            previous = forecast.valuation_change;
        }
    }

    #[test]
    fn test_ra_degenerate_caey_short_circuits() {
        let mut manager = manager();
        manager.set_override("equity_us.current_caey", 0.0);
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, None, HORIZON);
        assert_eq!(forecast.valuation_change, 0.0);

        let mut manager = OverrideManager::default();
        manager.set_override("equity_us.fair_caey", -0.01);
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, None, HORIZON);
        assert_eq!(forecast.valuation_change, 0.0);
    }

    #[test]
    fn test_ra_zero_reversion_speed_freezes_valuation() {
        let mut manager = manager();
        manager.set_override("equity_us.reversion_speed", 0.0);
        let model = EquityModel::new(&manager);
        let forecast = model.compute_ra(AssetClass::EquityUs, 0.023, None, HORIZON);
        assert_abs_diff_eq!(forecast.valuation_change, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gk_revenue_growth_auto_derived() {
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_gk(AssetClass::EquityUs, 0.023, 0.012, HORIZON);
        assert!(forecast.revenue_growth_is_computed);
        // inflation + real GDP + 2% wedge
        assert_relative_eq!(
            forecast.revenue_growth,
            0.023 + 0.012 + 0.020,
            epsilon = 1e-12
        );
        assert_eq!(
            forecast.components["growth"]["revenue_growth"].source,
            InputSource::Computed
        );
    }

    #[test]
    fn test_gk_revenue_override_severs_macro_linkage() {
        let mut manager = manager();
        manager.set_override("equity_us.revenue_growth", 0.04);
        let model = EquityModel::new(&manager);
        let forecast = model.compute_gk(AssetClass::EquityUs, 0.023, 0.012, HORIZON);
        assert!(!forecast.revenue_growth_is_computed);
        assert_eq!(forecast.revenue_growth, 0.04);
        assert_eq!(
            forecast.components["growth"]["revenue_growth"].source,
            InputSource::Override
        );
    }

    #[test]
    fn test_gk_pe_convergence() {
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_gk(AssetClass::EquityUs, 0.023, 0.012, HORIZON);
        // 22x converging to 20x over 10 years
        assert_relative_eq!(
            forecast.valuation_change,
            (20.0_f64 / 22.0).powf(0.1) - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gk_degenerate_pe_short_circuits() {
        let mut manager = manager();
        manager.set_override("equity_japan.current_pe", 0.0);
        let model = EquityModel::new(&manager);
        let forecast = model.compute_gk(AssetClass::EquityJapan, 0.016, 0.005, HORIZON);
        assert_eq!(forecast.valuation_change, 0.0);
    }

    #[test]
    fn test_gk_real_is_nominal_less_inflation() {
        let manager = manager();
        let model = EquityModel::new(&manager);
        let forecast = model.compute_gk(AssetClass::EquityEm, 0.038, 0.040, HORIZON);
        assert_relative_eq!(
            forecast.expected_return_real,
            forecast.expected_return_nominal - 0.038,
            epsilon = 1e-12
        );
    }
}
