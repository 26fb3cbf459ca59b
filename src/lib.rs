//! CME Engine - Ten-year capital market expectations with override tracking
//!
//! This library provides:
//! - Building-block macro forecasts (GDP growth, inflation, T-Bill rates)
//! - Per-asset-class expected-return models (bonds, equities, hedge funds)
//! - Currency adjustment via a carry/PPP blend
//! - Full override resolution with per-value provenance tags
//! - Macro-dependency explanations per asset result
//! - Multi-scenario stress testing

pub mod config;
pub mod engine;
pub mod inputs;
pub mod math;
pub mod models;
pub mod output;
pub mod scenario;

// Re-export commonly used types
pub use config::{AssetClass, BaseCurrency, EngineError, EquityMethod, Region};
pub use engine::{CmeEngine, MacroCache};
pub use inputs::{DefaultInputs, InputSource, OverrideManager, OverrideSet, TrackedValue};
pub use output::{AssetClassResult, MacroDependency, ScenarioResult};
pub use scenario::{ScenarioRunner, ScenarioSpec};
