use serde::Serialize;

use crate::core::ProjectionResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSection {
    pub label: &'static str,
    pub color: &'static str,
    pub value: f64,
}

/// Ring-chart segments for a projection. Nothing is drawn when no money was
/// invested or the total value has no defined split.
pub fn chart_sections(result: &ProjectionResult) -> Vec<ChartSection> {
    if result.total_invested <= 0.0 {
        return Vec::new();
    }
    let Some(shares) = result.shares else {
        return Vec::new();
    };
    vec![
        ChartSection {
            label: "Invested amount",
            color: "indigo",
            value: shares.invested,
        },
        ChartSection {
            label: "Lumpsum returns",
            color: "cyan",
            value: shares.lumpsum_gain,
        },
        ChartSection {
            label: "SIP returns",
            color: "green",
            value: shares.contribution_value,
        },
    ]
}
