//! Baseline input assumptions for every model
//!
//! These are the values used when the caller supplies no override. Market
//! data entries are point-in-time observations a deployment refreshes
//! externally; methodology parameters live in [`crate::config`].

use std::collections::BTreeMap;

use crate::config::{country_factor, long_term_inflation, AssetClass, Region};

/// EWMA estimation settings for a fair-value series
#[derive(Debug, Clone, Copy)]
pub struct EwmaParams {
    pub window_years: usize,
    pub half_life_years: f64,
}

/// Series the fair-value anchors are estimated from, with their EWMA settings
pub const EWMA_PARAMS: &[(&str, EwmaParams)] = &[
    ("productivity_growth", EwmaParams { window_years: 10, half_life_years: 5.0 }),
    ("inflation_dm", EwmaParams { window_years: 10, half_life_years: 5.0 }),
    ("inflation_em", EwmaParams { window_years: 10, half_life_years: 2.0 }),
    ("tbill_country_factor", EwmaParams { window_years: 10, half_life_years: 5.0 }),
    ("bond_term_premium", EwmaParams { window_years: 50, half_life_years: 20.0 }),
    ("credit_spread", EwmaParams { window_years: 50, half_life_years: 20.0 }),
    ("caey_fair_value", EwmaParams { window_years: 50, half_life_years: 20.0 }),
];

// Macro market data by region. Placeholder observations the caller is
// expected to override with current readings.
const MACRO_US: &[(&str, f64)] = &[
    ("current_headline_inflation", 0.025), // 2.5%
    ("current_tbill", 0.0367),             // 3.67% (3-month UST yield)
    ("population_growth", 0.004),          // 0.4%
    ("productivity_growth", 0.012),        // 1.2%
    ("my_ratio", 2.1),                     // Middle/Young ratio
];

const MACRO_EUROZONE: &[(&str, f64)] = &[
    ("current_headline_inflation", 0.022), // 2.2%
    ("current_tbill", 0.0204),             // 2.04% (3m Euribor)
    ("population_growth", 0.001),          // 0.1%
    ("productivity_growth", 0.010),        // 1.0%
    ("my_ratio", 2.3),
];

const MACRO_JAPAN: &[(&str, f64)] = &[
    ("current_headline_inflation", 0.020), // 2.0%
    ("current_tbill", 0.0075),             // 0.75% (BOJ policy rate)
    ("population_growth", -0.005),         // -0.5%
    ("productivity_growth", 0.008),        // 0.8%
    ("my_ratio", 2.5),
];

const MACRO_EM: &[(&str, f64)] = &[
    ("current_headline_inflation", 0.045), // 4.5%
    ("current_tbill", 0.060),              // 6.0%
    ("population_growth", 0.010),          // 1.0%
    ("productivity_growth", 0.025),        // 2.5%
    ("my_ratio", 1.5),
];

// Asset class market data. Equity tables carry both the RA keys
// (caey/eps) and the Grinold-Kroner keys (buyback/revenue/pe); each
// methodology reads only its own.
const BONDS_GLOBAL: &[(&str, f64)] = &[
    ("current_yield", 0.035),        // 3.5%
    ("duration", 7.0),               // 7 years
    ("current_term_premium", 0.01),  // 1.0%
    ("fair_term_premium", 0.015),    // 1.5%
];

const BONDS_HY: &[(&str, f64)] = &[
    ("current_yield", 0.075),        // 7.5%
    ("duration", 4.0),               // 4 years
    ("credit_spread", 0.0271),       // 2.71% (ICE BofA HY OAS)
    ("fair_credit_spread", 0.04),    // 4.0%
    ("default_rate", 0.055),         // 5.5%
    ("recovery_rate", 0.40),         // 40%
];

const BONDS_EM: &[(&str, f64)] = &[
    ("current_yield", 0.0577),       // 5.77% (EM USD aggregate YTM)
    ("duration", 5.5),               // 5.5 years
    ("current_term_premium", 0.015), // 1.5%
    ("fair_term_premium", 0.02),     // 2.0%
    ("default_rate", 0.028),         // 2.8% (hard currency)
    ("recovery_rate", 0.55),         // 55%
];

const EQUITY_US: &[(&str, f64)] = &[
    ("dividend_yield", 0.0113),      // 1.13% (S&P 500 TTM)
    ("current_caey", 0.0248),        // 2.48% (CAPE ~40)
    ("fair_caey", 0.05),             // 5.0% (CAPE ~20)
    ("real_eps_growth", 0.018),      // 1.8%
    ("regional_eps_growth", 0.016),  // DM average
    ("reversion_speed", 1.0),        // 100% = full CAEY mean reversion
    ("net_buyback_yield", 0.015),    // 1.5% (gross ~3% minus dilution)
    ("revenue_gdp_wedge", 0.020),    // 2.0% (global revenue exposure)
    ("margin_change", -0.005),       // -0.5% (mild compression from peak)
    ("current_pe", 22.0),            // Forward P/E
    ("target_pe", 20.0),             // Long-run equilibrium P/E
];

const EQUITY_EUROPE: &[(&str, f64)] = &[
    ("dividend_yield", 0.030),       // 3.0% (MSCI Europe)
    ("current_caey", 0.055),
    ("fair_caey", 0.055),
    ("real_eps_growth", 0.012),      // 1.2%
    ("regional_eps_growth", 0.016),  // DM average
    ("reversion_speed", 1.0),
    ("net_buyback_yield", 0.005),    // 0.5% (lower buyback culture)
    ("revenue_gdp_wedge", 0.005),
    ("margin_change", 0.000),
    ("current_pe", 14.0),
    ("target_pe", 14.0),
];

const EQUITY_JAPAN: &[(&str, f64)] = &[
    ("dividend_yield", 0.022),       // 2.2% (MSCI Japan)
    ("current_caey", 0.055),
    ("fair_caey", 0.05),
    ("real_eps_growth", 0.008),      // 0.8%
    ("regional_eps_growth", 0.016),  // DM average
    ("reversion_speed", 1.0),
    ("net_buyback_yield", 0.008),    // 0.8% (growing buyback trend)
    ("revenue_gdp_wedge", 0.005),
    ("margin_change", 0.003),        // 0.3% (governance reform)
    ("current_pe", 15.0),
    ("target_pe", 14.5),
];

const EQUITY_EM: &[(&str, f64)] = &[
    ("dividend_yield", 0.030),       // 3.0% (MSCI EM)
    ("current_caey", 0.065),
    ("fair_caey", 0.06),
    ("real_eps_growth", 0.030),      // 3.0%
    ("regional_eps_growth", 0.028),  // EM average
    ("reversion_speed", 1.0),
    ("net_buyback_yield", -0.015),   // -1.5% (net dilution from issuance)
    ("revenue_gdp_wedge", 0.005),
    ("margin_change", 0.000),
    ("current_pe", 12.0),
    ("target_pe", 12.0),
];

const ABSOLUTE_RETURN: &[(&str, f64)] = &[
    ("beta_market", 0.30),
    ("beta_size", 0.10),
    ("beta_value", 0.05),
    ("beta_profitability", 0.05),
    ("beta_investment", 0.05),
    ("beta_momentum", 0.10),
    ("trading_alpha", 0.01), // 1% (50% of historical ~2%)
];

/// Long-term historical factor premia, annualized, before the
/// forward-looking discount
pub const HISTORICAL_FACTOR_PREMIA: &[(&str, f64)] = &[
    ("market", 0.05),          // equity risk premium
    ("size", 0.02),            // SMB
    ("value", 0.03),           // HML
    ("profitability", 0.025),  // RMW
    ("investment", 0.025),     // CMA
    ("momentum", 0.06),        // UMD
];

/// Long-term expected volatility by asset class
pub fn expected_volatility(asset: AssetClass) -> f64 {
    match asset {
        AssetClass::Liquidity => 0.01,
        AssetClass::BondsGlobal => 0.06,
        AssetClass::BondsHy => 0.10,
        AssetClass::BondsEm => 0.12,
        AssetClass::EquityUs => 0.16,
        AssetClass::EquityEurope => 0.18,
        AssetClass::EquityJapan => 0.18,
        AssetClass::EquityEm => 0.24,
        AssetClass::AbsoluteReturn => 0.08,
    }
}

/// Access to the compiled-in default assumptions
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInputs;

impl DefaultInputs {
    /// Macro market data for a region, as (field, value) pairs
    pub fn macro_inputs(region: Region) -> &'static [(&'static str, f64)] {
        match region {
            Region::Us => MACRO_US,
            Region::Eurozone => MACRO_EUROZONE,
            Region::Japan => MACRO_JAPAN,
            Region::Em => MACRO_EM,
        }
    }

    /// Asset class market data, as (field, value) pairs
    ///
    /// Liquidity has no market data of its own: it prices directly off the
    /// base currency region's T-Bill forecast.
    pub fn asset_inputs(asset: AssetClass) -> &'static [(&'static str, f64)] {
        match asset {
            AssetClass::Liquidity => &[],
            AssetClass::BondsGlobal => BONDS_GLOBAL,
            AssetClass::BondsHy => BONDS_HY,
            AssetClass::BondsEm => BONDS_EM,
            AssetClass::EquityUs => EQUITY_US,
            AssetClass::EquityEurope => EQUITY_EUROPE,
            AssetClass::EquityJapan => EQUITY_JAPAN,
            AssetClass::EquityEm => EQUITY_EM,
            AssetClass::AbsoluteReturn => ABSOLUTE_RETURN,
        }
    }

    /// Default for one asset field, if the catalog carries it
    pub fn asset_default(asset: AssetClass, field: &str) -> Option<f64> {
        Self::asset_inputs(asset)
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
    }

    /// Default for one macro field, if the catalog carries it
    pub fn macro_default(region: Region, field: &str) -> Option<f64> {
        Self::macro_inputs(region)
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
    }

    /// Historical premium for a hedge-fund factor
    pub fn historical_factor_premium(factor: &str) -> Option<f64> {
        HISTORICAL_FACTOR_PREMIA
            .iter()
            .find(|(name, _)| *name == factor)
            .map(|(_, value)| *value)
    }

    /// EWMA settings for a fair-value series
    pub fn ewma_params(series: &str) -> Option<EwmaParams> {
        EWMA_PARAMS
            .iter()
            .find(|(name, _)| *name == series)
            .map(|(_, params)| *params)
    }

    /// Flat dotted-path catalog of every default, for display and editing
    ///
    /// Keys match the override paths the engine resolves against, e.g.
    /// `macro.us.current_tbill` or `bonds_hy.default_rate`.
    pub fn catalog() -> BTreeMap<String, f64> {
        let mut catalog = BTreeMap::new();

        for region in Region::ALL {
            for (field, value) in Self::macro_inputs(region) {
                catalog.insert(format!("macro.{}.{}", region.as_str(), field), *value);
            }
            catalog.insert(
                format!("macro.{}.long_term_inflation", region.as_str()),
                long_term_inflation(region),
            );
            catalog.insert(
                format!("macro.{}.country_factor", region.as_str()),
                country_factor(region),
            );
        }

        for asset in AssetClass::ALL {
            for (field, value) in Self::asset_inputs(asset) {
                catalog.insert(format!("{}.{}", asset.as_str(), field), *value);
            }
            catalog.insert(
                format!("{}.expected_volatility", asset.as_str()),
                expected_volatility(asset),
            );
        }

        for (factor, premium) in HISTORICAL_FACTOR_PREMIA {
            catalog.insert(
                format!("absolute_return.historical_premium_{}", factor),
                *premium,
            );
        }

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_region_has_full_macro_data() {
        for region in Region::ALL {
            let inputs = DefaultInputs::macro_inputs(region);
            for field in [
                "current_headline_inflation",
                "current_tbill",
                "population_growth",
                "productivity_growth",
                "my_ratio",
            ] {
                assert!(
                    inputs.iter().any(|(name, _)| *name == field),
                    "{} missing {}",
                    region.as_str(),
                    field
                );
            }
        }
    }

    #[test]
    fn test_equity_tables_carry_both_methodologies() {
        for asset in [
            AssetClass::EquityUs,
            AssetClass::EquityEurope,
            AssetClass::EquityJapan,
            AssetClass::EquityEm,
        ] {
            assert!(DefaultInputs::asset_default(asset, "current_caey").is_some());
            assert!(DefaultInputs::asset_default(asset, "current_pe").is_some());
            assert!(DefaultInputs::asset_default(asset, "net_buyback_yield").is_some());
        }
    }

    #[test]
    fn test_asset_default_lookup() {
        assert_eq!(
            DefaultInputs::asset_default(AssetClass::BondsHy, "default_rate"),
            Some(0.055)
        );
        assert_eq!(
            DefaultInputs::asset_default(AssetClass::BondsHy, "no_such_field"),
            None
        );
        assert_eq!(
            DefaultInputs::macro_default(Region::Em, "current_tbill"),
            Some(0.060)
        );
    }

    #[test]
    fn test_ewma_params_for_fair_value_series() {
        let params = DefaultInputs::ewma_params("bond_term_premium").unwrap();
        assert_eq!(params.window_years, 50);
        assert_eq!(params.half_life_years, 20.0);
        assert!(DefaultInputs::ewma_params("unknown_series").is_none());
    }

    #[test]
    fn test_catalog_paths() {
        let catalog = DefaultInputs::catalog();
        assert_eq!(catalog.get("macro.us.current_tbill"), Some(&0.0367));
        assert_eq!(catalog.get("bonds_hy.recovery_rate"), Some(&0.40));
        assert_eq!(catalog.get("macro.japan.country_factor"), Some(&-0.005));
        assert_eq!(catalog.get("equity_em.expected_volatility"), Some(&0.24));
        assert_eq!(
            catalog.get("absolute_return.historical_premium_momentum"),
            Some(&0.06)
        );
    }
}
