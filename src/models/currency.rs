//! FX forecasting: carry and purchasing-power-parity blend
//!
//! Converts a local-currency asset return into a base-currency return
//! using a 30/70 weighting of the short-rate differential (carry) and the
//! inflation differential (long-run PPP convergence).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{BaseCurrency, Currency, EngineError, Region};
use crate::models::macro_model::MacroForecast;

/// Weight on the interest-rate differential
pub const CARRY_WEIGHT: f64 = 0.30;
/// Weight on the inflation differential
pub const PPP_WEIGHT: f64 = 0.70;

/// Expected annual FX change between two currency regions
///
/// Positive means the home currency is expected to depreciate, which adds
/// to foreign asset returns expressed in home currency.
#[derive(Debug, Clone, Serialize)]
pub struct FxForecast {
    pub fx_change: f64,
    pub carry_component: f64,
    pub ppp_component: f64,
    pub home_tbill: f64,
    pub foreign_tbill: f64,
    pub home_inflation: f64,
    pub foreign_inflation: f64,
}

/// FX adjustment for one asset, or a no-op when currencies match
#[derive(Debug, Clone, Serialize)]
pub struct FxAdjustment {
    pub fx_return: f64,
    pub needs_adjustment: bool,
    pub components: Option<FxForecast>,
}

impl FxAdjustment {
    fn none() -> Self {
        Self {
            fx_return: 0.0,
            needs_adjustment: false,
            components: None,
        }
    }
}

/// PPP-based FX model
#[derive(Debug, Clone, Copy, Default)]
pub struct FxModel;

impl FxModel {
    /// E[FX change] = 30% x (home T-Bill - foreign T-Bill)
    ///              + 70% x (home inflation - foreign inflation)
    pub fn forecast_fx_change(home: &MacroForecast, foreign: &MacroForecast) -> FxForecast {
        let carry_component = home.tbill_rate - foreign.tbill_rate;
        let ppp_component = home.inflation - foreign.inflation;
        let fx_change = CARRY_WEIGHT * carry_component + PPP_WEIGHT * ppp_component;

        FxForecast {
            fx_change,
            carry_component,
            ppp_component,
            home_tbill: home.tbill_rate,
            foreign_tbill: foreign.tbill_rate,
            home_inflation: home.inflation,
            foreign_inflation: foreign.inflation,
        }
    }

    /// FX adjustment for an asset denominated in `local`, reported in
    /// `base`. Base-pegged assets and same-currency assets need none.
    pub fn adjustment_for_asset(
        base: BaseCurrency,
        local: Currency,
        forecasts: &BTreeMap<Region, MacroForecast>,
    ) -> Result<FxAdjustment, EngineError> {
        if local == Currency::Base || local == base.currency() {
            return Ok(FxAdjustment::none());
        }

        let home_region = base.region();
        let foreign_region = local.region()?;

        let home = forecasts
            .get(&home_region)
            .ok_or_else(|| EngineError::UnknownRegion(home_region.as_str().to_string()))?;
        let foreign = forecasts
            .get(&foreign_region)
            .ok_or_else(|| EngineError::UnknownRegion(foreign_region.as_str().to_string()))?;

        let forecast = Self::forecast_fx_change(home, foreign);
        Ok(FxAdjustment {
            fx_return: forecast.fx_change,
            needs_adjustment: true,
            components: Some(forecast),
        })
    }
}
