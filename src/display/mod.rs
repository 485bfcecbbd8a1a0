mod chart;
mod currency;

pub use chart::{ChartSection, chart_sections};
pub use currency::{finite_or_zero, format_inr};

use serde::Serialize;

use crate::core::ProjectionResult;

/// The five headline figures, formatted for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySummary {
    pub invested_amount: String,
    pub lumpsum_returns: String,
    pub sip_returns: String,
    pub total_returns: String,
    pub total_value: String,
}

impl DisplaySummary {
    pub fn from_result(result: &ProjectionResult) -> Self {
        Self {
            invested_amount: format_inr(result.total_invested),
            lumpsum_returns: format_inr(result.lumpsum_gain),
            sip_returns: format_inr(result.contribution_final_value),
            total_returns: format_inr(result.total_gain),
            total_value: format_inr(result.total_value),
        }
    }

    pub fn rows(&self) -> [(&'static str, &str); 5] {
        [
            ("Invested amount", self.invested_amount.as_str()),
            ("Lumpsum Est. returns", self.lumpsum_returns.as_str()),
            ("SIP Est. returns", self.sip_returns.as_str()),
            ("Total Est. returns", self.total_returns.as_str()),
            ("Total value", self.total_value.as_str()),
        ]
    }
}
