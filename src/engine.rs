//! Orchestration engine: macro forecasts, asset models, FX, and provenance
//!
//! One engine instance computes one scenario's worth of results. It owns
//! the override resolution layer and an explicit macro-forecast cache that
//! is invalidated whenever the override set changes. Models are lightweight
//! values borrowing the resolver for the duration of a computation.

use std::collections::BTreeMap;

use log::debug;

use crate::config::{
    AssetClass, BaseCurrency, Currency, EngineError, EquityMethod, Region, FORECAST_HORIZON_YEARS,
};
use crate::inputs::{InputSource, OverrideManager, OverrideSet, TrackedMap};
use crate::models::{
    BondForecast, BondModel, EquityModel, FxModel, GkForecast, HedgeFundModel, MacroForecast,
    MacroModel, RaForecast,
};
use crate::output::{
    AssetClassResult, FxSummary, InputRecord, MacroDependency, MacroSummary, ScenarioResult,
};

/// Macro forecasts for all regions plus the global growth aggregate,
/// computed once per override set
#[derive(Debug, Clone)]
pub struct MacroSnapshot {
    pub forecasts: BTreeMap<Region, MacroForecast>,
    pub global_rgdp_growth: f64,
}

/// Explicit cache for the macro snapshot
///
/// Invalidation is a visible operation, not a side effect of re-invocation
/// order: every override mutation calls [`MacroCache::invalidate`].
#[derive(Debug, Clone, Default)]
pub struct MacroCache {
    snapshot: Option<MacroSnapshot>,
}

impl MacroCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached snapshot; the next access rebuilds it
    pub fn invalidate(&mut self) {
        if self.snapshot.take().is_some() {
            debug!("macro cache invalidated");
        }
    }

    pub fn is_populated(&self) -> bool {
        self.snapshot.is_some()
    }

    fn get_or_build(&mut self, build: impl FnOnce() -> MacroSnapshot) -> &MacroSnapshot {
        if self.snapshot.is_none() {
            self.snapshot = Some(build());
            debug!("macro cache populated");
        }
        match &self.snapshot {
            Some(snapshot) => snapshot,
            None => unreachable!("populated above"),
        }
    }
}

/// Asset flavor, for dependency impact wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DependencyKind {
    Liquidity,
    Bond,
    Equity,
    HedgeFund,
}

/// Capital market expectations engine
///
/// Intended for one scenario per instance; run concurrent scenarios with
/// independent instances.
pub struct CmeEngine {
    overrides: OverrideManager,
    base_currency: BaseCurrency,
    equity_method: EquityMethod,
    macro_cache: MacroCache,
}

impl CmeEngine {
    pub fn new(
        overrides: OverrideSet,
        base_currency: BaseCurrency,
        equity_method: EquityMethod,
    ) -> Self {
        Self {
            overrides: OverrideManager::new(overrides),
            base_currency,
            equity_method,
            macro_cache: MacroCache::new(),
        }
    }

    /// Engine with no overrides, USD base, RA equity methodology
    pub fn with_defaults() -> Self {
        Self::new(OverrideSet::new(), BaseCurrency::Usd, EquityMethod::Ra)
    }

    pub fn base_currency(&self) -> BaseCurrency {
        self.base_currency
    }

    pub fn equity_method(&self) -> EquityMethod {
        self.equity_method
    }

    pub fn overrides(&self) -> &OverrideManager {
        &self.overrides
    }

    /// Deep-merge new overrides and invalidate the macro cache
    pub fn set_overrides(&mut self, updates: OverrideSet) {
        self.overrides.merge_overrides(updates);
        self.macro_cache.invalidate();
    }

    /// Inject a single override path and invalidate the macro cache
    pub fn set_override(&mut self, path: &str, value: f64) {
        self.overrides.set_override(path, value);
        self.macro_cache.invalidate();
    }

    /// Drop all overrides and invalidate the macro cache
    pub fn clear_overrides(&mut self) {
        self.overrides.clear_overrides();
        self.macro_cache.invalidate();
    }

    /// Macro forecasts for all regions, cached after the first call
    pub fn macro_snapshot(&mut self) -> &MacroSnapshot {
        let overrides = &self.overrides;
        self.macro_cache.get_or_build(|| {
            let model = MacroModel::new(overrides);
            let forecasts = Region::ALL
                .iter()
                .map(|&region| (region, model.full_forecast(region)))
                .collect();
            MacroSnapshot {
                forecasts,
                global_rgdp_growth: model.global_rgdp_growth(),
            }
        })
    }

    /// Provenance of every macro input and forecast, keyed
    /// `region.field`, plus the global growth aggregate
    fn macro_sources(&self) -> BTreeMap<String, InputSource> {
        const DIRECT_FIELDS: [&str; 3] = ["inflation_forecast", "rgdp_growth", "tbill_forecast"];
        const BUILDING_BLOCKS: [&str; 7] = [
            "population_growth",
            "productivity_growth",
            "my_ratio",
            "current_headline_inflation",
            "long_term_inflation",
            "current_tbill",
            "country_factor",
        ];

        let mut sources = BTreeMap::new();
        for region in Region::ALL {
            for field in DIRECT_FIELDS.iter().chain(BUILDING_BLOCKS.iter()) {
                let path = format!("macro.{}.{}", region.as_str(), field);
                let source = if self.overrides.has_override(&path) {
                    InputSource::Override
                } else {
                    InputSource::Default
                };
                sources.insert(format!("{}.{}", region.as_str(), field), source);
            }
        }

        // Global growth is affected by any regional growth-block override
        let global_affected = Region::ALL.iter().any(|region| {
            ["rgdp_growth", "population_growth", "productivity_growth", "my_ratio"]
                .iter()
                .any(|field| {
                    sources.get(&format!("{}.{}", region.as_str(), field))
                        == Some(&InputSource::Override)
                })
        });
        sources.insert(
            "global.rgdp_growth".to_string(),
            if global_affected {
                InputSource::AffectedByOverride
            } else {
                InputSource::Computed
            },
        );
        sources
    }

    fn build_macro_dependencies(
        &self,
        kind: DependencyKind,
        region: Region,
        snapshot: &MacroSnapshot,
        sources: &BTreeMap<String, InputSource>,
        include_tbill: bool,
        include_inflation: bool,
        include_gdp_cap: bool,
    ) -> BTreeMap<String, MacroDependency> {
        let mut deps = BTreeMap::new();
        let forecast = &snapshot.forecasts[&region];

        if include_tbill {
            let mut tbill_source = sources
                .get(&format!("{}.tbill_forecast", region.as_str()))
                .copied()
                .unwrap_or(InputSource::Computed);
            // Long-term T-Bill = country factor + GDP + inflation, so a GDP
            // or inflation override flows into T-Bill even when T-Bill
            // itself was left alone.
            if tbill_source == InputSource::Default {
                let gdp_overridden = sources
                    .get(&format!("{}.rgdp_growth", region.as_str()))
                    == Some(&InputSource::Override);
                let inflation_overridden = sources
                    .get(&format!("{}.inflation_forecast", region.as_str()))
                    == Some(&InputSource::Override);
                if gdp_overridden || inflation_overridden {
                    tbill_source = InputSource::AffectedByOverride;
                }
            }

            let (impact, affects) = match kind {
                DependencyKind::Liquidity => (
                    format!(
                        "T-Bill rate is the direct cash return ({:.2}%)",
                        forecast.tbill_rate * 100.0
                    ),
                    vec!["expected_return_nominal".to_string()],
                ),
                DependencyKind::Bond => (
                    "Base rate for yield calculation".to_string(),
                    vec![
                        "yield".to_string(),
                        "expected_return_nominal".to_string(),
                    ],
                ),
                _ => (
                    "Risk-free rate component".to_string(),
                    vec!["expected_return_nominal".to_string()],
                ),
            };

            deps.insert(
                "tbill".to_string(),
                MacroDependency {
                    macro_input: format!("{}.tbill_forecast", region.as_str()),
                    value_used: forecast.tbill_rate,
                    source: tbill_source,
                    affects,
                    impact_description: impact,
                },
            );
        }

        if include_inflation {
            let inflation_source = sources
                .get(&format!("{}.inflation_forecast", region.as_str()))
                .copied()
                .unwrap_or(InputSource::Default);

            let (impact, affects) = match kind {
                DependencyKind::Equity => (
                    format!(
                        "Added to real return for nominal ({:.2}%)",
                        forecast.inflation * 100.0
                    ),
                    vec!["expected_return_nominal".to_string()],
                ),
                DependencyKind::Bond => (
                    "Subtracted from nominal for real return".to_string(),
                    vec!["expected_return_real".to_string()],
                ),
                _ => (
                    "Inflation forecast for region".to_string(),
                    vec!["expected_return_real".to_string()],
                ),
            };

            deps.insert(
                "inflation".to_string(),
                MacroDependency {
                    macro_input: format!("{}.inflation_forecast", region.as_str()),
                    value_used: forecast.inflation,
                    source: inflation_source,
                    affects,
                    impact_description: impact,
                },
            );
        }

        if include_gdp_cap {
            let gdp_source = sources
                .get("global.rgdp_growth")
                .copied()
                .unwrap_or(InputSource::Computed);
            deps.insert(
                "global_gdp_cap".to_string(),
                MacroDependency {
                    macro_input: "global.rgdp_growth".to_string(),
                    value_used: snapshot.global_rgdp_growth,
                    source: gdp_source,
                    affects: vec!["real_eps_growth".to_string()],
                    impact_description: format!(
                        "Caps EPS growth at {:.2}% (GDP-weighted global average)",
                        snapshot.global_rgdp_growth * 100.0
                    ),
                },
            );
        }

        deps
    }

    /// Flatten per-stage tracked components into `stage_field -> record`
    fn flatten_inputs(components: &BTreeMap<String, TrackedMap>) -> BTreeMap<String, InputRecord> {
        let mut inputs = BTreeMap::new();
        for (stage, fields) in components {
            for (field, tv) in fields {
                inputs.insert(
                    format!("{}_{}", stage, field),
                    InputRecord {
                        value: tv.value,
                        source: tv.source,
                    },
                );
            }
        }
        inputs
    }

    /// Liquidity: the base currency region's T-Bill rate, no spread, no FX
    pub fn compute_liquidity(&mut self) -> Result<AssetClassResult, EngineError> {
        let sources = self.macro_sources();
        let base_region = self.base_currency.region();
        let snapshot = self.macro_snapshot().clone();
        let forecast = &snapshot.forecasts[&base_region];

        let nominal = forecast.tbill_rate;
        let real = nominal - forecast.inflation;

        let macro_deps = self.build_macro_dependencies(
            DependencyKind::Liquidity,
            base_region,
            &snapshot,
            &sources,
            true,
            true,
            false,
        );

        // Surface the T-Bill building blocks as this asset's inputs
        let mut tbill_components = BTreeMap::new();
        if let Some(stage) = forecast.components.get("tbill") {
            tbill_components.insert("tbill".to_string(), stage.clone());
        }

        Ok(AssetClassResult {
            asset_class: AssetClass::Liquidity.display_name().to_string(),
            expected_return_nominal: nominal,
            expected_return_real: real,
            components: BTreeMap::from([("tbill_rate".to_string(), nominal)]),
            inputs_used: Self::flatten_inputs(&tbill_components),
            macro_dependencies: macro_deps,
        })
    }

    fn bond_result(
        &self,
        asset: AssetClass,
        forecast: BondForecast,
        snapshot: &MacroSnapshot,
        sources: &BTreeMap<String, InputSource>,
    ) -> AssetClassResult {
        let macro_deps = self.build_macro_dependencies(
            DependencyKind::Bond,
            Region::Us,
            snapshot,
            sources,
            true,
            true,
            false,
        );

        AssetClassResult {
            asset_class: asset.display_name().to_string(),
            expected_return_nominal: forecast.expected_return_nominal,
            expected_return_real: forecast.expected_return_real,
            components: BTreeMap::from([
                ("yield".to_string(), forecast.yield_component),
                ("roll_return".to_string(), forecast.roll_return),
                ("valuation".to_string(), forecast.valuation_return),
                ("credit_loss".to_string(), forecast.credit_loss),
            ]),
            inputs_used: Self::flatten_inputs(&forecast.components),
            macro_dependencies: macro_deps,
        }
    }

    /// Developed government bonds, priced off the US macro backdrop
    pub fn compute_bonds_global(&mut self) -> Result<AssetClassResult, EngineError> {
        let sources = self.macro_sources();
        let snapshot = self.macro_snapshot().clone();
        let us = &snapshot.forecasts[&Region::Us];
        let forecast = BondModel::government(&self.overrides).compute_return(
            us.tbill_rate,
            us.inflation,
            FORECAST_HORIZON_YEARS,
        );
        Ok(self.bond_result(AssetClass::BondsGlobal, forecast, &snapshot, &sources))
    }

    /// US high yield bonds
    pub fn compute_bonds_hy(&mut self) -> Result<AssetClassResult, EngineError> {
        let sources = self.macro_sources();
        let snapshot = self.macro_snapshot().clone();
        let us = &snapshot.forecasts[&Region::Us];
        let forecast = BondModel::high_yield(&self.overrides).compute_return(
            us.tbill_rate,
            us.inflation,
            FORECAST_HORIZON_YEARS,
        );
        Ok(self.bond_result(AssetClass::BondsHy, forecast, &snapshot, &sources))
    }

    /// EM hard-currency (USD-denominated) sovereign bonds: priced off the
    /// US curve plus the EM credit spread, with US inflation for the real
    /// return
    pub fn compute_bonds_em(&mut self) -> Result<AssetClassResult, EngineError> {
        let sources = self.macro_sources();
        let snapshot = self.macro_snapshot().clone();
        let us = &snapshot.forecasts[&Region::Us];
        let forecast = BondModel::em(&self.overrides).compute_return_em(
            us.tbill_rate,
            us.inflation,
            None,
            true,
            FORECAST_HORIZON_YEARS,
        );
        Ok(self.bond_result(AssetClass::BondsEm, forecast, &snapshot, &sources))
    }

    fn equity_macro_region(asset: AssetClass) -> Result<Region, EngineError> {
        match asset {
            AssetClass::EquityUs => Ok(Region::Us),
            AssetClass::EquityEurope => Ok(Region::Eurozone),
            AssetClass::EquityJapan => Ok(Region::Japan),
            AssetClass::EquityEm => Ok(Region::Em),
            other => Err(EngineError::UnknownAssetClass(format!(
                "{} is not an equity class",
                other.as_str()
            ))),
        }
    }

    /// Equity return for one region, routed through the configured
    /// methodology
    pub fn compute_equity(&mut self, asset: AssetClass) -> Result<AssetClassResult, EngineError> {
        match self.equity_method {
            EquityMethod::Ra => self.compute_equity_ra(asset),
            EquityMethod::Gk => self.compute_equity_gk(asset),
        }
    }

    fn compute_equity_ra(&mut self, asset: AssetClass) -> Result<AssetClassResult, EngineError> {
        let region = Self::equity_macro_region(asset)?;
        let sources = self.macro_sources();
        let snapshot = self.macro_snapshot().clone();
        let region_macro = &snapshot.forecasts[&region];

        let forecast: RaForecast = EquityModel::new(&self.overrides).compute_ra(
            asset,
            region_macro.inflation,
            Some(snapshot.global_rgdp_growth),
            FORECAST_HORIZON_YEARS,
        );

        let macro_deps = self.build_macro_dependencies(
            DependencyKind::Equity,
            region,
            &snapshot,
            &sources,
            false,
            true,
            true,
        );

        Ok(AssetClassResult {
            asset_class: asset.display_name().to_string(),
            expected_return_nominal: forecast.expected_return_nominal,
            expected_return_real: forecast.expected_return_real,
            components: BTreeMap::from([
                ("dividend_yield".to_string(), forecast.dividend_yield),
                ("real_eps_growth".to_string(), forecast.real_eps_growth),
                ("valuation_change".to_string(), forecast.valuation_change),
            ]),
            inputs_used: Self::flatten_inputs(&forecast.components),
            macro_dependencies: macro_deps,
        })
    }

    fn compute_equity_gk(&mut self, asset: AssetClass) -> Result<AssetClassResult, EngineError> {
        let region = Self::equity_macro_region(asset)?;
        let sources = self.macro_sources();
        let snapshot = self.macro_snapshot().clone();
        let region_macro = &snapshot.forecasts[&region];

        let forecast: GkForecast = EquityModel::new(&self.overrides).compute_gk(
            asset,
            region_macro.inflation,
            region_macro.rgdp_growth,
            FORECAST_HORIZON_YEARS,
        );

        let inflation_source = sources
            .get(&format!("{}.inflation_forecast", region.as_str()))
            .copied()
            .unwrap_or(InputSource::Default);
        let gdp_source = sources
            .get(&format!("{}.rgdp_growth", region.as_str()))
            .copied()
            .unwrap_or(InputSource::Default);

        let mut macro_deps = BTreeMap::new();
        if forecast.revenue_growth_is_computed {
            // Revenue growth carries the macro linkage: both inflation and
            // GDP flow into the nominal return through it.
            macro_deps.insert(
                "inflation".to_string(),
                MacroDependency {
                    macro_input: format!("{}.inflation_forecast", region.as_str()),
                    value_used: region_macro.inflation,
                    source: inflation_source,
                    affects: vec![
                        "revenue_growth".to_string(),
                        "expected_return_nominal".to_string(),
                    ],
                    impact_description: format!(
                        "Flows into revenue growth ({:.2}% of {:.2}%)",
                        region_macro.inflation * 100.0,
                        forecast.revenue_growth * 100.0
                    ),
                },
            );
            macro_deps.insert(
                "rgdp".to_string(),
                MacroDependency {
                    macro_input: format!("{}.rgdp_growth", region.as_str()),
                    value_used: region_macro.rgdp_growth,
                    source: gdp_source,
                    affects: vec![
                        "revenue_growth".to_string(),
                        "expected_return_nominal".to_string(),
                    ],
                    impact_description: format!(
                        "Flows into revenue growth ({:.2}% of {:.2}%)",
                        region_macro.rgdp_growth * 100.0,
                        forecast.revenue_growth * 100.0
                    ),
                },
            );
        } else {
            macro_deps.insert(
                "inflation".to_string(),
                MacroDependency {
                    macro_input: format!("{}.inflation_forecast", region.as_str()),
                    value_used: region_macro.inflation,
                    source: inflation_source,
                    affects: vec!["expected_return_real".to_string()],
                    impact_description: format!(
                        "Used for real return back-computation ({:.2}%)",
                        region_macro.inflation * 100.0
                    ),
                },
            );
        }

        Ok(AssetClassResult {
            asset_class: asset.display_name().to_string(),
            expected_return_nominal: forecast.expected_return_nominal,
            expected_return_real: forecast.expected_return_real,
            components: BTreeMap::from([
                ("dividend_yield".to_string(), forecast.dividend_yield),
                ("net_buyback_yield".to_string(), forecast.net_buyback_yield),
                ("revenue_growth".to_string(), forecast.revenue_growth),
                ("margin_change".to_string(), forecast.margin_change),
                ("valuation_change".to_string(), forecast.valuation_change),
            ]),
            inputs_used: Self::flatten_inputs(&forecast.components),
            macro_dependencies: macro_deps,
        })
    }

    /// US equity nominal return under the configured methodology, feeding
    /// the hedge-fund market premium
    fn us_equity_nominal(&mut self) -> f64 {
        let snapshot = self.macro_snapshot().clone();
        let us = &snapshot.forecasts[&Region::Us];
        let model = EquityModel::new(&self.overrides);
        match self.equity_method {
            EquityMethod::Ra => {
                model
                    .compute_ra(
                        AssetClass::EquityUs,
                        us.inflation,
                        Some(snapshot.global_rgdp_growth),
                        FORECAST_HORIZON_YEARS,
                    )
                    .expected_return_nominal
            }
            EquityMethod::Gk => {
                model
                    .compute_gk(
                        AssetClass::EquityUs,
                        us.inflation,
                        us.rgdp_growth,
                        FORECAST_HORIZON_YEARS,
                    )
                    .expected_return_nominal
            }
        }
    }

    /// Absolute return (hedge funds): base-region T-Bill and inflation,
    /// with the US equity return driving the market factor premium
    pub fn compute_absolute_return(&mut self) -> Result<AssetClassResult, EngineError> {
        let sources = self.macro_sources();
        let base_region = self.base_currency.region();
        let equity_nominal = self.us_equity_nominal();
        let snapshot = self.macro_snapshot().clone();
        let base_macro = &snapshot.forecasts[&base_region];

        let forecast = HedgeFundModel::new(&self.overrides).compute_return(
            base_macro.tbill_rate,
            base_macro.inflation,
            Some(equity_nominal),
        );

        let mut macro_deps = self.build_macro_dependencies(
            DependencyKind::HedgeFund,
            base_region,
            &snapshot,
            &sources,
            true,
            true,
            false,
        );

        // The market premium inherits any override reaching the US equity
        // forecast through inflation or the global GDP cap.
        let us_inflation_overridden =
            sources.get("us.inflation_forecast") == Some(&InputSource::Override);
        let global_affected = matches!(
            sources.get("global.rgdp_growth"),
            Some(InputSource::Override) | Some(InputSource::AffectedByOverride)
        );
        let equity_affected = us_inflation_overridden || global_affected;

        macro_deps.insert(
            "us_equity_return".to_string(),
            MacroDependency {
                macro_input: "us.equity_return".to_string(),
                value_used: equity_nominal,
                source: if equity_affected {
                    InputSource::AffectedByOverride
                } else {
                    InputSource::Computed
                },
                affects: vec!["factor_return".to_string()],
                impact_description: format!(
                    "US equity return ({:.2}%) used for market factor premium",
                    equity_nominal * 100.0
                ),
            },
        );

        Ok(AssetClassResult {
            asset_class: AssetClass::AbsoluteReturn.display_name().to_string(),
            expected_return_nominal: forecast.expected_return_nominal,
            expected_return_real: forecast.expected_return_real,
            components: BTreeMap::from([
                ("tbill".to_string(), forecast.tbill_component),
                ("factor_return".to_string(), forecast.factor_return),
                ("trading_alpha".to_string(), forecast.trading_alpha),
            ]),
            inputs_used: Self::flatten_inputs(&forecast.components),
            macro_dependencies: macro_deps,
        })
    }

    /// Apply the FX adjustment for a non-base-currency asset
    fn apply_fx(
        &mut self,
        mut result: AssetClassResult,
        asset: AssetClass,
    ) -> Result<AssetClassResult, EngineError> {
        let local = asset.local_currency();
        let base = self.base_currency;
        let snapshot = self.macro_snapshot();
        let adjustment = FxModel::adjustment_for_asset(base, local, &snapshot.forecasts)?;

        if !adjustment.needs_adjustment {
            return Ok(result);
        }

        result.expected_return_nominal += adjustment.fx_return;
        result.expected_return_real += adjustment.fx_return;
        result
            .components
            .insert("fx_return".to_string(), adjustment.fx_return);

        if let Some(fx) = adjustment.components {
            let computed = |value| InputRecord {
                value,
                source: InputSource::Computed,
            };
            result
                .inputs_used
                .insert("fx_home_tbill".to_string(), computed(fx.home_tbill));
            result
                .inputs_used
                .insert("fx_foreign_tbill".to_string(), computed(fx.foreign_tbill));
            result
                .inputs_used
                .insert("fx_home_inflation".to_string(), computed(fx.home_inflation));
            result.inputs_used.insert(
                "fx_foreign_inflation".to_string(),
                computed(fx.foreign_inflation),
            );
            result.inputs_used.insert(
                "fx_carry_component".to_string(),
                computed(fx.carry_component),
            );
            result
                .inputs_used
                .insert("fx_ppp_component".to_string(), computed(fx.ppp_component));
        }

        Ok(result)
    }

    /// Compute one asset class's result, FX-adjusted into the base currency
    pub fn compute_asset(&mut self, asset: AssetClass) -> Result<AssetClassResult, EngineError> {
        debug!("computing {}", asset.as_str());
        let result = match asset {
            AssetClass::Liquidity => self.compute_liquidity()?,
            AssetClass::BondsGlobal => self.compute_bonds_global()?,
            AssetClass::BondsHy => self.compute_bonds_hy()?,
            AssetClass::BondsEm => self.compute_bonds_em()?,
            AssetClass::EquityUs
            | AssetClass::EquityEurope
            | AssetClass::EquityJapan
            | AssetClass::EquityEm => self.compute_equity(asset)?,
            AssetClass::AbsoluteReturn => self.compute_absolute_return()?,
        };
        self.apply_fx(result, asset)
    }

    /// FX forecasts for foreign currencies relative to the base; empty for
    /// a USD base
    pub fn compute_fx_forecasts(&mut self) -> Result<BTreeMap<String, FxSummary>, EngineError> {
        if self.base_currency == BaseCurrency::Usd {
            return Ok(BTreeMap::new());
        }

        let base = self.base_currency;
        let snapshot = self.macro_snapshot();
        let mut forecasts = BTreeMap::new();
        for currency in [Currency::Usd, Currency::Jpy, Currency::Em] {
            if currency == base.currency() {
                continue;
            }
            let adjustment =
                FxModel::adjustment_for_asset(base, currency, &snapshot.forecasts)?;
            if let Some(fx) = adjustment.components {
                forecasts.insert(
                    currency.as_str().to_string(),
                    FxSummary {
                        fx_change: fx.fx_change,
                        carry_component: fx.carry_component,
                        ppp_component: fx.ppp_component,
                    },
                );
            }
        }
        Ok(forecasts)
    }

    /// Compute all asset classes plus macro and FX summaries
    pub fn compute_scenario(&mut self, scenario_name: &str) -> Result<ScenarioResult, EngineError> {
        let mut results = BTreeMap::new();
        for asset in AssetClass::ALL {
            results.insert(asset, self.compute_asset(asset)?);
        }

        let fx_forecasts = self.compute_fx_forecasts()?;
        let snapshot = self.macro_snapshot();
        let macro_assumptions = snapshot
            .forecasts
            .iter()
            .map(|(&region, forecast)| {
                (
                    region,
                    MacroSummary {
                        rgdp_growth: forecast.rgdp_growth,
                        inflation: forecast.inflation,
                        tbill_rate: forecast.tbill_rate,
                    },
                )
            })
            .collect();

        Ok(ScenarioResult {
            scenario_name: scenario_name.to_string(),
            base_currency: self.base_currency,
            results,
            macro_assumptions,
            overrides_applied: self.overrides.overrides().clone(),
            fx_forecasts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_no_override_invariant() {
        let mut engine = CmeEngine::with_defaults();
        let scenario = engine.compute_scenario("RA Defaults").unwrap();

        // Every non-derived input reports its default provenance
        for result in scenario.results.values() {
            for (name, record) in &result.inputs_used {
                assert_ne!(
                    record.source,
                    InputSource::Override,
                    "{} unexpectedly overridden in {}",
                    name,
                    result.asset_class
                );
            }
            for dep in result.macro_dependencies.values() {
                assert_ne!(dep.source, InputSource::Override);
                assert_ne!(dep.source, InputSource::AffectedByOverride);
            }
        }
        assert!(scenario.overrides_applied.is_empty());
    }

    #[test]
    fn test_liquidity_equals_us_tbill_for_usd_base() {
        let mut engine = CmeEngine::with_defaults();
        let scenario = engine.compute_scenario("Base").unwrap();

        let liquidity = &scenario.results[&AssetClass::Liquidity];
        let us_tbill = scenario.macro_assumptions[&Region::Us].tbill_rate;
        assert_eq!(liquidity.expected_return_nominal, us_tbill);
        assert!(scenario.fx_forecasts.is_empty());
    }

    #[test]
    fn test_override_precedence_direct_forecast() {
        let mut engine = CmeEngine::with_defaults();
        engine.set_override("macro.us.inflation_forecast", 0.045);
        let scenario = engine.compute_scenario("Inflation Shock").unwrap();

        assert_eq!(scenario.macro_assumptions[&Region::Us].inflation, 0.045);
        let bonds = &scenario.results[&AssetClass::BondsGlobal];
        let dep = &bonds.macro_dependencies["inflation"];
        assert_eq!(dep.source, InputSource::Override);
        assert_eq!(dep.value_used, 0.045);
    }

    #[test]
    fn test_provenance_propagation_to_tbill() {
        for path in ["macro.us.rgdp_growth", "macro.us.inflation_forecast"] {
            let mut engine = CmeEngine::with_defaults();
            engine.set_override(path, 0.05);
            let result = engine.compute_liquidity().unwrap();
            let tbill_dep = &result.macro_dependencies["tbill"];
            assert_eq!(
                tbill_dep.source,
                InputSource::AffectedByOverride,
                "override of {} did not flag the T-Bill dependency",
                path
            );
        }
    }

    #[test]
    fn test_macro_cache_invalidation() {
        let mut engine = CmeEngine::with_defaults();
        let before = engine.macro_snapshot().forecasts[&Region::Us].tbill_rate;
        assert!(engine.macro_cache.is_populated());

        engine.set_override("macro.us.tbill_forecast", 0.10);
        assert!(!engine.macro_cache.is_populated());
        let after = engine.macro_snapshot().forecasts[&Region::Us].tbill_rate;
        assert_eq!(after, 0.10);
        assert_ne!(before, after);

        engine.clear_overrides();
        let restored = engine.macro_snapshot().forecasts[&Region::Us].tbill_rate;
        assert_relative_eq!(restored, before, epsilon = 1e-12);
    }

    #[test]
    fn test_batch_example_hy_overrides() {
        let mut baseline = CmeEngine::with_defaults();
        let base = baseline.compute_scenario("Base").unwrap();

        let mut engine = CmeEngine::with_defaults();
        engine.set_override("macro.us.inflation_forecast", 0.045);
        engine.set_override("bonds_hy.default_rate", 0.08);
        let stressed = engine.compute_scenario("Stress").unwrap();

        let hy = &stressed.results[&AssetClass::BondsHy];
        // Credit loss reflects the overridden default rate at the default
        // 40% recovery
        assert_relative_eq!(
            hy.components["credit_loss"],
            0.08 * (1.0 - 0.40),
            epsilon = 1e-12
        );

        // The nominal-to-real wedge moves one-for-one with the US
        // inflation delta
        let base_hy = &base.results[&AssetClass::BondsHy];
        let base_wedge =
            base_hy.expected_return_nominal - base_hy.expected_return_real;
        let stressed_wedge = hy.expected_return_nominal - hy.expected_return_real;
        let inflation_delta = 0.045 - base.macro_assumptions[&Region::Us].inflation;
        assert_relative_eq!(
            stressed_wedge - base_wedge,
            inflation_delta,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_eur_base_applies_fx_and_reports_forecasts() {
        let mut engine =
            CmeEngine::new(OverrideSet::new(), BaseCurrency::Eur, EquityMethod::Ra);
        let scenario = engine.compute_scenario("EUR Base").unwrap();

        // USD assets pick up an FX component under a EUR base
        let us_equity = &scenario.results[&AssetClass::EquityUs];
        assert!(us_equity.components.contains_key("fx_return"));
        // Europe equity is already in base currency
        let eu_equity = &scenario.results[&AssetClass::EquityEurope];
        assert!(!eu_equity.components.contains_key("fx_return"));
        // Liquidity pegs to the base region: EUR T-Bill, no FX
        let liquidity = &scenario.results[&AssetClass::Liquidity];
        assert_eq!(
            liquidity.expected_return_nominal,
            scenario.macro_assumptions[&Region::Eurozone].tbill_rate
        );

        assert!(scenario.fx_forecasts.contains_key("usd"));
        assert!(scenario.fx_forecasts.contains_key("jpy"));
        assert!(scenario.fx_forecasts.contains_key("em"));
        assert!(!scenario.fx_forecasts.contains_key("eur"));

        // FX component on the result matches the reported forecast
        let fx_usd = scenario.fx_forecasts["usd"];
        assert_relative_eq!(
            us_equity.components["fx_return"],
            fx_usd.fx_change,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gk_method_changes_equity_shape() {
        let mut engine = CmeEngine::new(OverrideSet::new(), BaseCurrency::Usd, EquityMethod::Gk);
        let result = engine.compute_equity(AssetClass::EquityUs).unwrap();
        assert!(result.components.contains_key("net_buyback_yield"));
        assert!(result.components.contains_key("revenue_growth"));
        assert!(!result.components.contains_key("real_eps_growth"));

        // Revenue growth dependencies point at both inflation and GDP
        assert!(result.macro_dependencies.contains_key("rgdp"));
        assert!(result.macro_dependencies.contains_key("inflation"));
    }

    #[test]
    fn test_gk_revenue_override_reduces_dependencies() {
        let mut engine = CmeEngine::new(OverrideSet::new(), BaseCurrency::Usd, EquityMethod::Gk);
        engine.set_override("equity_us.revenue_growth", 0.04);
        let result = engine.compute_equity(AssetClass::EquityUs).unwrap();
        assert!(!result.macro_dependencies.contains_key("rgdp"));
        assert_eq!(
            result.macro_dependencies["inflation"].affects,
            vec!["expected_return_real".to_string()]
        );
    }

    #[test]
    fn test_absolute_return_market_premium_linkage() {
        let mut engine = CmeEngine::with_defaults();
        let result = engine.compute_absolute_return().unwrap();
        let dep = &result.macro_dependencies["us_equity_return"];
        assert_eq!(dep.source, InputSource::Computed);

        // An inflation override upstream flags the equity-return linkage
        let mut engine = CmeEngine::with_defaults();
        engine.set_override("macro.us.inflation_forecast", 0.05);
        let result = engine.compute_absolute_return().unwrap();
        let dep = &result.macro_dependencies["us_equity_return"];
        assert_eq!(dep.source, InputSource::AffectedByOverride);
    }

    #[test]
    fn test_absolute_return_decomposition() {
        let mut engine = CmeEngine::with_defaults();
        let result = engine.compute_absolute_return().unwrap();
        assert_relative_eq!(
            result.expected_return_nominal,
            result.components["tbill"]
                + result.components["factor_return"]
                + result.components["trading_alpha"],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_merge_overrides_accumulates() {
        let mut engine = CmeEngine::with_defaults();
        let mut first = OverrideSet::new();
        first.set("macro.us.inflation_forecast", 0.04);
        engine.set_overrides(first);

        let mut second = OverrideSet::new();
        second.set("bonds_hy.default_rate", 0.09);
        engine.set_overrides(second);

        assert!(engine.overrides().has_override("macro.us.inflation_forecast"));
        assert!(engine.overrides().has_override("bonds_hy.default_rate"));
    }

    #[test]
    fn test_scenario_covers_all_assets() {
        let mut engine = CmeEngine::with_defaults();
        let scenario = engine.compute_scenario("Full").unwrap();
        assert_eq!(scenario.results.len(), AssetClass::ALL.len());
        assert_eq!(scenario.macro_assumptions.len(), Region::ALL.len());
        // The nominal-to-real wedge is the relevant region's inflation for
        // every US-priced asset (FX shifts nominal and real equally)
        let us_inflation = scenario.macro_assumptions[&Region::Us].inflation;
        for asset in [
            AssetClass::Liquidity,
            AssetClass::BondsGlobal,
            AssetClass::BondsHy,
            AssetClass::BondsEm,
            AssetClass::EquityUs,
            AssetClass::AbsoluteReturn,
        ] {
            let result = &scenario.results[&asset];
            assert!(result.expected_return_nominal.is_finite());
            assert_abs_diff_eq!(
                result.expected_return_nominal - result.expected_return_real,
                us_inflation,
                epsilon = 1e-12
            );
        }
    }
}
