//! Per-asset-class return models and the macro forecasting model

pub mod alternatives;
pub mod bonds;
pub mod currency;
pub mod equities;
pub mod macro_model;

pub use alternatives::{HedgeFundForecast, HedgeFundModel, FACTORS};
pub use bonds::{BondForecast, BondModel, BondSpec, CreditLossPolicy};
pub use currency::{FxAdjustment, FxForecast, FxModel};
pub use equities::{EquityModel, GkForecast, RaForecast};
pub use macro_model::{MacroForecast, MacroModel};
