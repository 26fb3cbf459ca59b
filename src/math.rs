//! Averaging and trend utilities behind the fair-value assumptions
//!
//! Exponentially weighted averages and log-linear trend growth are how the
//! long-term anchors in the defaults catalog are estimated from history.
//! The demographic sigmoid feeds the GDP growth model directly.

/// Data frequency for time-series utilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn periods_per_year(&self) -> usize {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annual => 1,
        }
    }
}

/// Exponentially weighted moving average of a series, oldest first
///
/// Weights decay by 50% every `half_life_years`. If `window_years` is set,
/// only the trailing window participates. Returns `None` for an empty series
/// (or an empty window).
pub fn ewma(
    data: &[f64],
    half_life_years: f64,
    window_years: Option<usize>,
    frequency: Frequency,
) -> Option<f64> {
    let periods_per_year = frequency.periods_per_year();
    let half_life_periods = half_life_years * periods_per_year as f64;
    let decay = 0.5_f64.powf(1.0 / half_life_periods);

    let window = window_years.map(|w| w * periods_per_year);
    let data = match window {
        Some(w) if data.len() > w => &data[data.len() - w..],
        _ => data,
    };

    if data.is_empty() {
        return None;
    }

    let n = data.len();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (i, &value) in data.iter().enumerate() {
        let weight = decay.powi((n - 1 - i) as i32);
        weighted_sum += value * weight;
        total_weight += weight;
    }

    Some(weighted_sum / total_weight)
}

/// Rolling EWMA: one value per point, using data up to and including it
pub fn ewma_series(
    data: &[f64],
    half_life_years: f64,
    window_years: Option<usize>,
    frequency: Frequency,
) -> Vec<f64> {
    (1..=data.len())
        .filter_map(|i| ewma(&data[..i], half_life_years, window_years, frequency))
        .collect()
}

/// Annualized log-linear trend growth of a level series, oldest first
///
/// Fits a least-squares line through the logs of the trailing window and
/// annualizes the slope. Non-positive levels are skipped. Returns `None`
/// when fewer than two usable points remain.
pub fn trend_growth(data: &[f64], window_years: usize, frequency: Frequency) -> Option<f64> {
    let periods_per_year = frequency.periods_per_year();
    let window = window_years * periods_per_year;
    let data = if data.len() > window {
        &data[data.len() - window..]
    } else {
        data
    };

    let logs: Vec<f64> = data.iter().filter(|&&d| d > 0.0).map(|d| d.ln()).collect();
    if logs.len() < 2 {
        return None;
    }

    let n = logs.len() as f64;
    let x_mean = (logs.len() - 1) as f64 / 2.0;
    let y_mean = logs.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in logs.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return Some(0.0);
    }

    Some(numerator / denominator * periods_per_year as f64)
}

/// Demographic effect of the Middle/Young population ratio on growth
///
/// Centered logistic transform: zero at `my_ratio == 2.0`, scaled to a
/// +/-1% band. An aging population (high MY ratio) drags on growth.
pub fn demographic_effect(my_ratio: f64) -> f64 {
    demographic_effect_with(my_ratio, 2.0, 2.0)
}

/// Demographic sigmoid with explicit midpoint and steepness
pub fn demographic_effect_with(my_ratio: f64, midpoint: f64, steepness: f64) -> f64 {
    let z = steepness * (midpoint - my_ratio);
    let sigmoid = 1.0 / (1.0 + (-z).exp());
    (sigmoid - 0.5) * 0.02
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_ewma_constant_series() {
        let data = vec![0.03; 24];
        let result = ewma(&data, 5.0, None, Frequency::Monthly).unwrap();
        assert_relative_eq!(result, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_ewma_weights_recent_observations() {
        // Step up at the end: EWMA should sit above the simple mean
        let mut data = vec![0.02; 100];
        data.extend(vec![0.05; 20]);
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let result = ewma(&data, 2.0, None, Frequency::Monthly).unwrap();
        assert!(result > mean);
        assert!(result < 0.05);
    }

    #[test]
    fn test_ewma_window_truncates() {
        let mut data = vec![100.0; 120];
        data.extend(vec![0.04; 12]);
        // 1-year window sees only the trailing 12 points
        let result = ewma(&data, 5.0, Some(1), Frequency::Monthly).unwrap();
        assert_relative_eq!(result, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_ewma_empty() {
        assert!(ewma(&[], 5.0, None, Frequency::Annual).is_none());
    }

    #[test]
    fn test_ewma_series_length() {
        let data = vec![0.01, 0.02, 0.03];
        let series = ewma_series(&data, 5.0, None, Frequency::Annual);
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[0], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_trend_growth_exact_exponential() {
        // 3% compounding: log-linear trend recovers ln(1.03)
        let data: Vec<f64> = (0..50).map(|t| 100.0 * 1.03_f64.powi(t)).collect();
        let growth = trend_growth(&data, 50, Frequency::Annual).unwrap();
        assert_relative_eq!(growth, 1.03_f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_trend_growth_needs_two_points() {
        assert!(trend_growth(&[100.0], 50, Frequency::Annual).is_none());
        assert!(trend_growth(&[-1.0, -2.0, 100.0], 50, Frequency::Annual).is_none());
    }

    #[test]
    fn test_demographic_effect_center_and_band() {
        assert_abs_diff_eq!(demographic_effect(2.0), 0.0, epsilon = 1e-12);
        // Young population boosts, aging drags, both within +/-1%
        assert!(demographic_effect(1.0) > 0.0);
        assert!(demographic_effect(3.0) < 0.0);
        assert!(demographic_effect(0.0) < 0.01);
        assert!(demographic_effect(10.0) > -0.01);
        // Symmetric around the midpoint
        assert_abs_diff_eq!(
            demographic_effect(1.5),
            -demographic_effect(2.5),
            epsilon = 1e-12
        );
    }
}
