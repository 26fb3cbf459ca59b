//! Identifiers, model parameters, and errors shared across the engine
//!
//! All percentage-like parameters are decimals (0.025 = 2.5%). Ratios
//! (`my_ratio`, durations, P/E levels, factor betas) are plain numbers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Forecast horizon for all expected-return calculations, in years
pub const FORECAST_HORIZON_YEARS: u32 = 10;

/// Errors raised by internal identifier lookups
///
/// Unknown regions and asset classes fail fast rather than defaulting:
/// a silent region mismatch would corrupt macro-dependency attribution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown region: {0} (valid: us, eurozone, japan, em)")]
    UnknownRegion(String),

    #[error("unknown asset class: {0}")]
    UnknownAssetClass(String),

    #[error("unknown currency: {0} (valid: usd, eur, jpy, em)")]
    UnknownCurrency(String),
}

/// Macro regions covered by the forecasting model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eurozone,
    Japan,
    Em,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Us, Region::Eurozone, Region::Japan, Region::Em];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eurozone => "eurozone",
            Region::Japan => "japan",
            Region::Em => "em",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eurozone" => Ok(Region::Eurozone),
            "japan" => Ok(Region::Japan),
            "em" => Ok(Region::Em),
            other => Err(EngineError::UnknownRegion(other.to_string())),
        }
    }

    /// Developed-market regions get a smaller skew adjustment than EM
    /// in the output-per-capita decomposition.
    pub fn is_developed(&self) -> bool {
        !matches!(self, Region::Em)
    }
}

/// Supported asset classes (closed set, no dynamic extension)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Liquidity,
    BondsGlobal,
    BondsHy,
    BondsEm,
    EquityUs,
    EquityEurope,
    EquityJapan,
    EquityEm,
    AbsoluteReturn,
}

impl AssetClass {
    pub const ALL: [AssetClass; 9] = [
        AssetClass::Liquidity,
        AssetClass::BondsGlobal,
        AssetClass::BondsHy,
        AssetClass::BondsEm,
        AssetClass::EquityUs,
        AssetClass::EquityEurope,
        AssetClass::EquityJapan,
        AssetClass::EquityEm,
        AssetClass::AbsoluteReturn,
    ];

    /// Override-path key for this asset class
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Liquidity => "liquidity",
            AssetClass::BondsGlobal => "bonds_global",
            AssetClass::BondsHy => "bonds_hy",
            AssetClass::BondsEm => "bonds_em",
            AssetClass::EquityUs => "equity_us",
            AssetClass::EquityEurope => "equity_europe",
            AssetClass::EquityJapan => "equity_japan",
            AssetClass::EquityEm => "equity_em",
            AssetClass::AbsoluteReturn => "absolute_return",
        }
    }

    /// Human-readable name used in formatted output
    pub fn display_name(&self) -> &'static str {
        match self {
            AssetClass::Liquidity => "Liquidity (Cash)",
            AssetClass::BondsGlobal => "Bonds Global (Gov)",
            AssetClass::BondsHy => "Bonds High Yield",
            AssetClass::BondsEm => "Bonds EM (Hard Currency)",
            AssetClass::EquityUs => "Equity US",
            AssetClass::EquityEurope => "Equity Europe",
            AssetClass::EquityJapan => "Equity Japan",
            AssetClass::EquityEm => "Equity EM",
            AssetClass::AbsoluteReturn => "Absolute Return (HF)",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        AssetClass::ALL
            .iter()
            .find(|a| a.as_str() == s.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| EngineError::UnknownAssetClass(s.to_string()))
    }

    /// Currency the asset is denominated in
    ///
    /// `Base`-pegged assets price directly off the base currency region
    /// and never receive an FX adjustment.
    pub fn local_currency(&self) -> Currency {
        match self {
            AssetClass::Liquidity | AssetClass::AbsoluteReturn => Currency::Base,
            AssetClass::BondsGlobal | AssetClass::BondsHy | AssetClass::BondsEm => Currency::Usd,
            AssetClass::EquityUs => Currency::Usd,
            AssetClass::EquityEurope => Currency::Eur,
            AssetClass::EquityJapan => Currency::Jpy,
            AssetClass::EquityEm => Currency::Em,
        }
    }
}

/// Base currency for scenario results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseCurrency {
    #[default]
    Usd,
    Eur,
}

impl BaseCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseCurrency::Usd => "usd",
            BaseCurrency::Eur => "eur",
        }
    }

    /// Macro region whose T-Bill and inflation anchor base-pegged assets
    pub fn region(&self) -> Region {
        match self {
            BaseCurrency::Usd => Region::Us,
            BaseCurrency::Eur => Region::Eurozone,
        }
    }

    pub fn currency(&self) -> Currency {
        match self {
            BaseCurrency::Usd => Currency::Usd,
            BaseCurrency::Eur => Currency::Eur,
        }
    }
}

/// Denomination currencies recognized by the FX model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Pegged to whatever the scenario's base currency is
    Base,
    Usd,
    Eur,
    Jpy,
    Em,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Base => "base",
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Jpy => "jpy",
            Currency::Em => "em",
        }
    }

    /// Macro region backing this currency's rates and inflation
    pub fn region(&self) -> Result<Region, EngineError> {
        match self {
            Currency::Usd => Ok(Region::Us),
            Currency::Eur => Ok(Region::Eurozone),
            Currency::Jpy => Ok(Region::Japan),
            Currency::Em => Ok(Region::Em),
            Currency::Base => Err(EngineError::UnknownCurrency("base".to_string())),
        }
    }
}

/// Equity methodology, chosen once per engine instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquityMethod {
    /// Dividend yield + blended EPS growth + CAEY mean reversion
    #[default]
    Ra,
    /// Grinold-Kroner decomposition with P/E convergence
    Gk,
}

// =============================================================================
// Model parameters
// =============================================================================

/// Weights blending current inflation against the long-term anchor
#[derive(Debug, Clone, Copy)]
pub struct InflationWeights {
    pub current_weight: f64,
    pub long_term_weight: f64,
}

impl Default for InflationWeights {
    fn default() -> Self {
        Self {
            current_weight: 0.30,
            long_term_weight: 0.70,
        }
    }
}

/// T-Bill forecast blending and floor parameters
#[derive(Debug, Clone, Copy)]
pub struct TbillParams {
    pub current_weight: f64,
    pub long_term_weight: f64,
    /// Floor applied to the long-term rate building block
    pub rate_floor: f64,
}

impl Default for TbillParams {
    fn default() -> Self {
        Self {
            current_weight: 0.30,
            long_term_weight: 0.70,
            rate_floor: -0.0075, // -0.75%
        }
    }
}

/// Mean-reversion speeds shared by the valuation models
#[derive(Debug, Clone, Copy)]
pub struct MeanReversionParams {
    /// Convergence per month toward fair value
    pub monthly_convergence_speed: f64,
    /// Years to full CAEY reversion in the equity model
    pub caey_full_reversion_years: u32,
    /// Per-year term-premium reversion speed bounds; the bond model takes
    /// |lower| as its speed. Lower bound is the annualized equivalent of
    /// 3%/month compounding: 1 - (1 - 0.03)^12.
    pub term_premium_speed_bounds: (f64, f64),
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        let annual_speed = 1.0 - (1.0 - 0.03_f64).powi(12);
        Self {
            monthly_convergence_speed: 0.03,
            caey_full_reversion_years: 20,
            term_premium_speed_bounds: (-annual_speed, -0.015),
        }
    }
}

impl MeanReversionParams {
    /// Per-year term-premium reversion speed used by the bond yield path
    pub fn term_premium_speed(&self) -> f64 {
        self.term_premium_speed_bounds.0.abs()
    }

    /// Fraction of the term-premium gap closed over `horizon_years`
    pub fn partial_reversion_fraction(&self, horizon_years: u32) -> f64 {
        let fraction =
            1.0 - (1.0 - self.monthly_convergence_speed).powi(horizon_years as i32 * 12);
        fraction.min(1.0)
    }
}

/// Bond model structural assumptions
#[derive(Debug, Clone, Copy)]
pub struct BondParams {
    /// Assumed average index maturity for the roll-down slope
    pub assumed_maturity_years: f64,
    /// Fraction of the HY credit-spread gap closed over the horizon
    pub hy_spread_reversion_fraction: f64,
}

impl Default for BondParams {
    fn default() -> Self {
        Self {
            assumed_maturity_years: 10.0,
            hy_spread_reversion_fraction: 0.50,
        }
    }
}

/// Credit spread applied over the US T-Bill for EM hard-currency bonds when
/// no EM-specific T-Bill forecast is supplied. The source methodology
/// hardcodes this placeholder rather than deriving it from data.
pub const EM_HARD_CURRENCY_SPREAD: f64 = 0.02;

/// EM inflation premium added in the local-currency bond mode
pub const EM_INFLATION_PREMIUM: f64 = 0.015;

/// Equity model blending weights
#[derive(Debug, Clone, Copy)]
pub struct EquityParams {
    pub country_weight: f64,
    pub regional_weight: f64,
}

impl Default for EquityParams {
    fn default() -> Self {
        Self {
            country_weight: 0.50,
            regional_weight: 0.50,
        }
    }
}

/// Hedge-fund factor model parameters
#[derive(Debug, Clone, Copy)]
pub struct HedgeFundParams {
    /// Forward-looking haircut applied to historical factor premia and alpha
    pub historical_discount: f64,
    /// Historical manager alpha before the discount
    pub historical_alpha: f64,
}

impl Default for HedgeFundParams {
    fn default() -> Self {
        Self {
            historical_discount: 0.50,
            historical_alpha: 0.02,
        }
    }
}

/// Output-per-capita skew adjustment by region class
pub fn rgdp_adjustment(region: Region) -> f64 {
    if region.is_developed() {
        -0.003
    } else {
        -0.005
    }
}

/// Long-term inflation anchor by region (target plus buffer)
pub fn long_term_inflation(region: Region) -> f64 {
    match region {
        Region::Us => 0.022,
        Region::Eurozone => 0.020,
        Region::Japan => 0.015,
        Region::Em => 0.035,
    }
}

/// T-Bill country factor (liquidity premium adjustment) by region
pub fn country_factor(region: Region) -> f64 {
    match region {
        Region::Us => 0.0,
        Region::Eurozone => -0.002,
        Region::Japan => -0.005,
        Region::Em => 0.005,
    }
}

/// GDP weights used for the global growth aggregate
pub fn gdp_weight(region: Region) -> f64 {
    match region {
        Region::Us => 0.26,
        Region::Eurozone => 0.15,
        Region::Japan => 0.05,
        Region::Em => 0.40,
    }
}
