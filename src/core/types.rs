use serde::{Deserialize, Serialize};

/// How the contribution annuity behaves when the monthly rate is exactly zero.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroRatePolicy {
    /// Divide by the zero rate and let NaN/infinity flow through every
    /// contribution-derived figure.
    #[default]
    Propagate,
    /// Treat a zero rate as no growth: the stream is worth what was paid in.
    Linear,
}

// Read from the TOML `[defaults]` table (kebab-case keys), echoed as JSON (camelCase).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    rename_all(serialize = "camelCase", deserialize = "kebab-case")
)]
pub struct InputParameters {
    pub lumpsum: f64,
    pub monthly_contribution: f64,
    pub horizon_years: f64,
    pub annual_return_rate_percent: f64,
}

impl Default for InputParameters {
    fn default() -> Self {
        Self {
            lumpsum: 100_000.0,
            monthly_contribution: 10_000.0,
            horizon_years: 10.0,
            annual_return_rate_percent: 10.0,
        }
    }
}

/// Percentages of `total_value`. The contribution share is taken from the
/// full stream value (principal included) while the lumpsum share is gain
/// only, so the three do not sum to 100 when there is a monthly contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shares {
    pub invested: f64,
    pub lumpsum_gain: f64,
    pub contribution_value: f64,
}

impl Shares {
    pub fn total(self) -> f64 {
        self.invested + self.lumpsum_gain + self.contribution_value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub total_monthly_contributed: f64,
    pub total_invested: f64,
    pub lumpsum_gain: f64,
    pub contribution_final_value: f64,
    pub total_gain: f64,
    pub total_value: f64,
    pub shares: Option<Shares>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPoint {
    pub year: f64,
    pub total_invested: f64,
    pub lumpsum_value: f64,
    pub contribution_value: f64,
    pub total_value: f64,
}
