//! Macroeconomic forecasts: real GDP growth, inflation, and T-Bill rates
//!
//! These forecasts are the foundation every asset class model builds on.
//! Each of the three headline forecasts can be overridden directly at the
//! final level, short-circuiting its building blocks, or driven by the
//! blocks with each block individually overridable.

use std::collections::BTreeMap;

use crate::config::{
    country_factor, gdp_weight, long_term_inflation, rgdp_adjustment, InflationWeights, Region,
    TbillParams,
};
use crate::inputs::{InputSource, OverrideManager, TrackedMap, TrackedValue};
use crate::math::demographic_effect;

/// Complete macro forecast for one region
///
/// Built once per engine instance and cached; immutable thereafter.
#[derive(Debug, Clone)]
pub struct MacroForecast {
    pub rgdp_growth: f64,
    pub inflation: f64,
    pub tbill_rate: f64,
    /// Sum of real growth and inflation
    pub nominal_gdp_growth: f64,
    /// Intermediate building blocks by stage ("rgdp", "inflation", "tbill")
    pub components: BTreeMap<String, TrackedMap>,
}

impl MacroForecast {
    /// Flat `stage.field -> source` map for provenance reporting
    pub fn sources(&self) -> BTreeMap<String, InputSource> {
        let mut sources = BTreeMap::new();
        for (stage, fields) in &self.components {
            for (field, tv) in fields {
                sources.insert(format!("{}.{}", stage, field), tv.source);
            }
        }
        sources
    }
}

fn field(inputs: &TrackedMap, name: &str, fallback: f64) -> TrackedValue {
    inputs
        .get(name)
        .copied()
        .unwrap_or(TrackedValue::default_of(fallback))
}

/// Building-block macro forecasting model
pub struct MacroModel<'a> {
    overrides: &'a OverrideManager,
}

impl<'a> MacroModel<'a> {
    pub fn new(overrides: &'a OverrideManager) -> Self {
        Self { overrides }
    }

    /// Real GDP growth = output-per-capita growth + population growth,
    /// where output-per-capita = productivity + demographic effect +
    /// region-class adjustment.
    pub fn forecast_rgdp_growth(&self, region: Region) -> TrackedMap {
        let inputs = self.overrides.macro_inputs(region);
        let population_growth = field(&inputs, "population_growth", 0.0);

        // Direct override wins outright; building blocks are left out of
        // the result so they are not misreported as used.
        let direct = self
            .overrides
            .get_value("macro", Some(region.as_str()), "rgdp_growth", f64::NAN);
        if direct.is_override() {
            let mut result = TrackedMap::new();
            result.insert("rgdp_growth".to_string(), direct);
            result.insert("population_growth".to_string(), population_growth);
            result.insert(
                "output_per_capita_growth".to_string(),
                TrackedValue::computed(direct.value - population_growth.value),
            );
            return result;
        }

        let productivity_growth = field(&inputs, "productivity_growth", 0.012);
        let my_ratio = field(&inputs, "my_ratio", 2.0);
        let demographic = demographic_effect(my_ratio.value);

        let adjustment = self.overrides.get_value(
            "macro",
            Some(region.as_str()),
            "rgdp_adjustment",
            rgdp_adjustment(region),
        );

        let output_per_capita = productivity_growth.value + demographic + adjustment.value;
        let rgdp_growth = output_per_capita + population_growth.value;

        let mut result = TrackedMap::new();
        result.insert(
            "rgdp_growth".to_string(),
            TrackedValue::computed(rgdp_growth),
        );
        result.insert("population_growth".to_string(), population_growth);
        result.insert("productivity_growth".to_string(), productivity_growth);
        result.insert("my_ratio".to_string(), my_ratio);
        result.insert(
            "demographic_effect".to_string(),
            TrackedValue::computed(demographic),
        );
        result.insert("adjustment".to_string(), adjustment);
        result.insert(
            "output_per_capita_growth".to_string(),
            TrackedValue::computed(output_per_capita),
        );
        result
    }

    /// Inflation = 30% current headline + 70% long-term anchor + adjustment
    pub fn forecast_inflation(&self, region: Region) -> TrackedMap {
        let inputs = self.overrides.macro_inputs(region);
        let weights = InflationWeights::default();
        let current_headline = field(&inputs, "current_headline_inflation", 0.025);

        let direct =
            self.overrides
                .get_value("macro", Some(region.as_str()), "inflation_forecast", f64::NAN);
        if direct.is_override() {
            let mut result = TrackedMap::new();
            result.insert("inflation_forecast".to_string(), direct);
            result.insert("current_headline_inflation".to_string(), current_headline);
            return result;
        }

        let long_term = self.overrides.get_value(
            "macro",
            Some(region.as_str()),
            "long_term_inflation",
            long_term_inflation(region),
        );
        let adjustment =
            self.overrides
                .get_value("macro", Some(region.as_str()), "inflation_adjustment", 0.0);

        let forecast = weights.current_weight * current_headline.value
            + weights.long_term_weight * long_term.value
            + adjustment.value;

        let mut result = TrackedMap::new();
        result.insert(
            "inflation_forecast".to_string(),
            TrackedValue::computed(forecast),
        );
        result.insert("current_headline_inflation".to_string(), current_headline);
        result.insert("long_term_inflation".to_string(), long_term);
        result.insert("adjustment".to_string(), adjustment);
        result.insert(
            "current_weight".to_string(),
            TrackedValue::default_of(weights.current_weight),
        );
        result.insert(
            "long_term_weight".to_string(),
            TrackedValue::default_of(weights.long_term_weight),
        );
        result
    }

    /// T-Bill = 30% current + 70% max(floor, country factor + RGDP + inflation)
    ///
    /// RGDP and inflation forecasts are passed in when already computed so
    /// one forecast pass resolves them exactly once.
    pub fn forecast_tbill(
        &self,
        region: Region,
        rgdp_forecast: Option<f64>,
        inflation_forecast: Option<f64>,
    ) -> TrackedMap {
        let inputs = self.overrides.macro_inputs(region);
        let params = TbillParams::default();
        let current_tbill = field(&inputs, "current_tbill", 0.04);

        let direct =
            self.overrides
                .get_value("macro", Some(region.as_str()), "tbill_forecast", f64::NAN);
        if direct.is_override() {
            let mut result = TrackedMap::new();
            result.insert("tbill_forecast".to_string(), direct);
            result.insert("current_tbill".to_string(), current_tbill);
            return result;
        }

        let rgdp = rgdp_forecast.unwrap_or_else(|| {
            self.forecast_rgdp_growth(region)["rgdp_growth"].value
        });
        let inflation = inflation_forecast.unwrap_or_else(|| {
            self.forecast_inflation(region)["inflation_forecast"].value
        });

        let cf = self.overrides.get_value(
            "macro",
            Some(region.as_str()),
            "country_factor",
            country_factor(region),
        );

        let long_term = (cf.value + rgdp + inflation).max(params.rate_floor);
        let forecast =
            params.current_weight * current_tbill.value + params.long_term_weight * long_term;

        let mut result = TrackedMap::new();
        result.insert(
            "tbill_forecast".to_string(),
            TrackedValue::computed(forecast),
        );
        result.insert("current_tbill".to_string(), current_tbill);
        result.insert(
            "long_term_tbill".to_string(),
            TrackedValue::computed(long_term),
        );
        result.insert("country_factor".to_string(), cf);
        result.insert("rgdp_forecast".to_string(), TrackedValue::computed(rgdp));
        result.insert(
            "inflation_forecast".to_string(),
            TrackedValue::computed(inflation),
        );
        result.insert(
            "rate_floor".to_string(),
            TrackedValue::default_of(params.rate_floor),
        );
        result
    }

    /// Full three-part forecast for a region
    pub fn full_forecast(&self, region: Region) -> MacroForecast {
        let rgdp_result = self.forecast_rgdp_growth(region);
        let inflation_result = self.forecast_inflation(region);

        let rgdp_growth = rgdp_result["rgdp_growth"].value;
        let inflation = inflation_result["inflation_forecast"].value;

        let tbill_result = self.forecast_tbill(region, Some(rgdp_growth), Some(inflation));
        let tbill_rate = tbill_result["tbill_forecast"].value;

        let mut components = BTreeMap::new();
        components.insert("rgdp".to_string(), rgdp_result);
        components.insert("inflation".to_string(), inflation_result);
        components.insert("tbill".to_string(), tbill_result);

        MacroForecast {
            rgdp_growth,
            inflation,
            tbill_rate,
            nominal_gdp_growth: rgdp_growth + inflation,
            components,
        }
    }

    /// GDP-weighted global real growth across all regions
    pub fn global_rgdp_growth(&self) -> f64 {
        let total_weight: f64 = Region::ALL.iter().map(|r| gdp_weight(*r)).sum();
        Region::ALL
            .iter()
            .map(|&region| {
                let forecast = self.forecast_rgdp_growth(region);
                gdp_weight(region) / total_weight * forecast["rgdp_growth"].value
            })
            .sum()
    }
}
