use super::types::{InputParameters, ProjectionResult, Shares, YearPoint, ZeroRatePolicy};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Longest horizon `run_yearly_projection` will expand into yearly points.
pub const MAX_SCHEDULE_YEARS: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("yearly schedule is limited to {max} years, got a horizon of {horizon}")]
    HorizonTooLong { horizon: f64, max: u32 },
}

/// Projects the combined lumpsum + SIP position, letting a zero rate produce
/// non-finite contribution figures.
pub fn compute(inputs: &InputParameters) -> ProjectionResult {
    compute_with_policy(inputs, ZeroRatePolicy::Propagate)
}

pub fn compute_with_policy(inputs: &InputParameters, policy: ZeroRatePolicy) -> ProjectionResult {
    let months = inputs.horizon_years * MONTHS_PER_YEAR;
    let monthly_rate = inputs.annual_return_rate_percent / MONTHS_PER_YEAR / 100.0;
    let total_monthly_contributed = inputs.monthly_contribution * months;
    let total_invested = inputs.lumpsum + total_monthly_contributed;

    let contribution_final_value = contribution_future_value(
        inputs.monthly_contribution,
        monthly_rate,
        months,
        total_monthly_contributed,
        policy,
    );
    let lumpsum_gain = lumpsum_future_value(
        inputs.lumpsum,
        inputs.annual_return_rate_percent,
        inputs.horizon_years,
    ) - inputs.lumpsum;

    let total_gain = (contribution_final_value - total_monthly_contributed) + lumpsum_gain;
    let total_value = total_invested + total_gain;

    ProjectionResult {
        total_monthly_contributed,
        total_invested,
        lumpsum_gain,
        contribution_final_value,
        total_gain,
        total_value,
        shares: shares_of(
            total_invested,
            lumpsum_gain,
            contribution_final_value,
            total_value,
        ),
    }
}

/// Evaluates the projection at every whole year up to the horizon, plus the
/// horizon itself when it falls between years. The last point always matches
/// `compute_with_policy` for the full input.
pub fn run_yearly_projection(
    inputs: &InputParameters,
    policy: ZeroRatePolicy,
) -> Result<Vec<YearPoint>, ScheduleError> {
    let horizon = inputs.horizon_years;
    let whole_years = horizon.max(0.0).floor();
    if whole_years > f64::from(MAX_SCHEDULE_YEARS) {
        return Err(ScheduleError::HorizonTooLong {
            horizon,
            max: MAX_SCHEDULE_YEARS,
        });
    }

    // NaN horizons collapse to 0 through `max`, so the cast is in range.
    let last_whole = whole_years as u32;
    let mut points: Vec<YearPoint> = (0..=last_whole)
        .map(|year| year_point(inputs, f64::from(year), policy))
        .collect();
    if horizon > whole_years {
        points.push(year_point(inputs, horizon, policy));
    }
    Ok(points)
}

fn year_point(inputs: &InputParameters, year: f64, policy: ZeroRatePolicy) -> YearPoint {
    let at_year = InputParameters {
        horizon_years: year,
        ..*inputs
    };
    let result = compute_with_policy(&at_year, policy);
    YearPoint {
        year,
        total_invested: result.total_invested,
        lumpsum_value: inputs.lumpsum + result.lumpsum_gain,
        contribution_value: result.contribution_final_value,
        total_value: result.total_value,
    }
}

fn contribution_future_value(
    monthly_contribution: f64,
    monthly_rate: f64,
    months: f64,
    total_monthly_contributed: f64,
    policy: ZeroRatePolicy,
) -> f64 {
    if monthly_rate == 0.0 && policy == ZeroRatePolicy::Linear {
        return total_monthly_contributed;
    }
    (monthly_contribution * ((1.0 + monthly_rate).powf(months) - 1.0)) / monthly_rate
}

// Compounded once a year; fractional horizons use a real exponent.
fn lumpsum_future_value(lumpsum: f64, annual_return_rate_percent: f64, horizon_years: f64) -> f64 {
    lumpsum * (1.0 + annual_return_rate_percent / 100.0).powf(horizon_years)
}

fn shares_of(
    total_invested: f64,
    lumpsum_gain: f64,
    contribution_final_value: f64,
    total_value: f64,
) -> Option<Shares> {
    if !total_value.is_finite() || total_value <= 0.0 {
        return None;
    }
    Some(Shares {
        invested: total_invested / total_value * 100.0,
        lumpsum_gain: lumpsum_gain / total_value * 100.0,
        contribution_value: contribution_final_value / total_value * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn relative_close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0)
    }

    fn sample_inputs() -> InputParameters {
        InputParameters {
            lumpsum: 100_000.0,
            monthly_contribution: 10_000.0,
            horizon_years: 10.0,
            annual_return_rate_percent: 10.0,
        }
    }

    #[test]
    fn ten_year_ten_percent_scenario_matches_closed_form() {
        let result = compute(&sample_inputs());

        assert_approx(result.total_invested, 1_300_000.0);
        assert_approx(result.total_monthly_contributed, 1_200_000.0);
        assert_approx_tol(result.lumpsum_gain, 159_374.246_01, 1e-3);
        assert_approx_tol(result.contribution_final_value, 2_048_449.789_03, 1e-3);
        assert_approx_tol(result.total_gain, 1_007_824.035_04, 1e-3);
        assert_approx_tol(result.total_value, 2_307_824.035_04, 1e-3);
        assert_approx(result.total_value, result.total_invested + result.total_gain);
    }

    #[test]
    fn scenario_shares_follow_reference_split() {
        let result = compute(&sample_inputs());
        let shares = result.shares.expect("positive total value has shares");

        assert_approx_tol(shares.invested, 56.330_117_9, 1e-6);
        assert_approx_tol(shares.lumpsum_gain, 6.905_823_1, 1e-6);
        assert_approx_tol(shares.contribution_value, 88.761_090_9, 1e-6);
        assert_approx_tol(shares.total(), 151.997_031_9, 1e-6);
    }

    #[test]
    fn lumpsum_only_has_zero_contribution_value() {
        let inputs = InputParameters {
            lumpsum: 100_000.0,
            monthly_contribution: 0.0,
            horizon_years: 5.0,
            annual_return_rate_percent: 8.0,
        };
        let result = compute(&inputs);

        assert_eq!(result.contribution_final_value, 0.0);
        assert_eq!(result.total_monthly_contributed, 0.0);
        assert_approx(result.total_value, 100_000.0 * 1.08_f64.powf(5.0));
        let shares = result.shares.expect("shares");
        assert_approx(shares.total(), 100.0);
        assert_approx(shares.contribution_value, 0.0);
    }

    #[test]
    fn zero_rate_propagates_non_finite_values_by_default() {
        let inputs = InputParameters {
            annual_return_rate_percent: 0.0,
            ..sample_inputs()
        };
        let result = compute(&inputs);

        assert_eq!(result.lumpsum_gain, 0.0);
        assert_approx(result.total_invested, 1_300_000.0);
        assert!(!result.contribution_final_value.is_finite());
        assert!(!result.total_gain.is_finite());
        assert!(!result.total_value.is_finite());
        assert!(result.shares.is_none());
    }

    #[test]
    fn zero_rate_linear_policy_returns_paid_in_amount() {
        let inputs = InputParameters {
            annual_return_rate_percent: 0.0,
            ..sample_inputs()
        };
        let result = compute_with_policy(&inputs, ZeroRatePolicy::Linear);

        assert_eq!(result.lumpsum_gain, 0.0);
        assert_eq!(result.contribution_final_value, result.total_monthly_contributed);
        assert_eq!(result.total_gain, 0.0);
        assert_eq!(result.total_value, result.total_invested);
        let shares = result.shares.expect("shares");
        assert_approx(shares.invested, 100.0);
        assert_approx(shares.lumpsum_gain, 0.0);
    }

    #[test]
    fn all_zero_inputs_have_no_shares() {
        let inputs = InputParameters {
            lumpsum: 0.0,
            monthly_contribution: 0.0,
            horizon_years: 0.0,
            annual_return_rate_percent: 0.0,
        };

        let reference = compute(&inputs);
        assert_eq!(reference.total_invested, 0.0);
        assert!(reference.total_value.is_nan());
        assert!(reference.shares.is_none());

        let linear = compute_with_policy(&inputs, ZeroRatePolicy::Linear);
        assert_eq!(linear.total_invested, 0.0);
        assert_eq!(linear.total_value, 0.0);
        assert!(linear.shares.is_none());
    }

    #[test]
    fn policy_only_matters_at_zero_rate() {
        let inputs = sample_inputs();
        assert_eq!(
            compute(&inputs),
            compute_with_policy(&inputs, ZeroRatePolicy::Linear)
        );
    }

    #[test]
    fn fractional_horizon_is_not_truncated() {
        let inputs = InputParameters {
            horizon_years: 2.5,
            ..sample_inputs()
        };
        let result = compute(&inputs);
        assert_approx(result.total_monthly_contributed, 300_000.0);
        assert_approx(result.lumpsum_gain, 100_000.0 * (1.1_f64.powf(2.5) - 1.0));
    }

    #[test]
    fn yearly_projection_covers_each_year_and_ends_at_horizon() {
        let inputs = sample_inputs();
        let points = run_yearly_projection(&inputs, ZeroRatePolicy::Propagate).expect("schedule");

        assert_eq!(points.len(), 11);
        assert_eq!(points[0].year, 0.0);
        assert_approx(points[0].total_invested, 100_000.0);
        assert_approx(points[0].total_value, 100_000.0);
        assert_approx(points[1].lumpsum_value, 110_000.0);

        let last = points.last().expect("points");
        let full = compute(&inputs);
        assert_eq!(last.year, 10.0);
        assert_eq!(last.total_value, full.total_value);
        assert_eq!(last.contribution_value, full.contribution_final_value);
    }

    #[test]
    fn yearly_projection_appends_fractional_horizon() {
        let inputs = InputParameters {
            horizon_years: 3.5,
            ..sample_inputs()
        };
        let points = run_yearly_projection(&inputs, ZeroRatePolicy::Propagate).expect("schedule");

        let years: Vec<f64> = points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![0.0, 1.0, 2.0, 3.0, 3.5]);
    }

    #[test]
    fn yearly_projection_at_zero_horizon_has_single_point() {
        let inputs = InputParameters {
            horizon_years: 0.0,
            ..sample_inputs()
        };
        let points = run_yearly_projection(&inputs, ZeroRatePolicy::Linear).expect("schedule");
        assert_eq!(points.len(), 1);
        assert_approx(points[0].total_value, 100_000.0);
    }

    #[test]
    fn yearly_projection_rejects_horizons_beyond_limit() {
        let huge = InputParameters {
            horizon_years: 1e10,
            ..sample_inputs()
        };
        assert_eq!(
            run_yearly_projection(&huge, ZeroRatePolicy::Linear),
            Err(ScheduleError::HorizonTooLong {
                horizon: 1e10,
                max: MAX_SCHEDULE_YEARS,
            })
        );

        let endless = InputParameters {
            horizon_years: f64::INFINITY,
            ..sample_inputs()
        };
        assert!(run_yearly_projection(&endless, ZeroRatePolicy::Linear).is_err());
    }

    #[test]
    fn yearly_projection_accepts_horizon_at_limit() {
        let inputs = InputParameters {
            horizon_years: f64::from(MAX_SCHEDULE_YEARS),
            annual_return_rate_percent: 1.0,
            ..sample_inputs()
        };
        let points = run_yearly_projection(&inputs, ZeroRatePolicy::Propagate).expect("schedule");
        assert_eq!(points.len(), MAX_SCHEDULE_YEARS as usize + 1);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_total_invested_is_principal_plus_contributions(
            lumpsum in 0u32..100_000_000,
            monthly in 0u32..1_000_000,
            years in 0u32..101,
            rate_tenths in 0u32..1001
        ) {
            let inputs = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: f64::from(rate_tenths) / 10.0,
            };
            let result = compute(&inputs);
            let expected = inputs.lumpsum + inputs.monthly_contribution * inputs.horizon_years * 12.0;
            prop_assert!(relative_close(result.total_invested, expected));
        }

        #[test]
        fn prop_total_value_is_invested_plus_gain(
            lumpsum in 0u32..10_000_000,
            monthly in 0u32..100_000,
            years in 0u32..60,
            rate_tenths in 1u32..400
        ) {
            let inputs = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: f64::from(rate_tenths) / 10.0,
            };
            let result = compute(&inputs);
            prop_assert!(result.total_value == result.total_invested + result.total_gain);
        }

        #[test]
        fn prop_zero_rate_linear_has_no_gain(
            lumpsum in 0u32..10_000_000,
            monthly in 0u32..100_000,
            years in 0u32..101
        ) {
            let inputs = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: 0.0,
            };
            let result = compute_with_policy(&inputs, ZeroRatePolicy::Linear);
            prop_assert!(result.lumpsum_gain == 0.0);
            prop_assert!(result.contribution_final_value == result.total_monthly_contributed);
            prop_assert!(result.total_gain == 0.0);
            prop_assert!(result.total_value == result.total_invested);
        }

        #[test]
        fn prop_higher_rate_grows_both_channels(
            lumpsum in 1u32..10_000_000,
            monthly in 1u32..100_000,
            years in 1u32..60,
            rate_tenths in 1u32..900,
            bump_tenths in 1u32..100
        ) {
            let low = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: f64::from(rate_tenths) / 10.0,
            };
            let high = InputParameters {
                annual_return_rate_percent: f64::from(rate_tenths + bump_tenths) / 10.0,
                ..low
            };
            let low_result = compute(&low);
            let high_result = compute(&high);
            prop_assert!(high_result.lumpsum_gain > low_result.lumpsum_gain);
            prop_assert!(high_result.contribution_final_value > low_result.contribution_final_value);
        }

        #[test]
        fn prop_longer_horizon_grows_total_value(
            lumpsum in 0u32..10_000_000,
            monthly in 0u32..100_000,
            years in 0u32..60,
            extra_years in 1u32..20,
            rate_tenths in 1u32..400
        ) {
            prop_assume!(lumpsum > 0 || monthly > 0);
            let short = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: f64::from(rate_tenths) / 10.0,
            };
            let long = InputParameters {
                horizon_years: f64::from(years + extra_years),
                ..short
            };
            prop_assert!(compute(&long).total_value > compute(&short).total_value);
        }

        #[test]
        fn prop_shares_overcount_by_contributed_principal(
            lumpsum in 0u32..10_000_000,
            monthly in 0u32..100_000,
            years in 1u32..60,
            rate_tenths in 1u32..400
        ) {
            prop_assume!(lumpsum > 0 || monthly > 0);
            let inputs = InputParameters {
                lumpsum: f64::from(lumpsum),
                monthly_contribution: f64::from(monthly),
                horizon_years: f64::from(years),
                annual_return_rate_percent: f64::from(rate_tenths) / 10.0,
            };
            let result = compute(&inputs);
            let shares = result.shares.expect("positive total value has shares");
            let expected = 100.0 + result.total_monthly_contributed / result.total_value * 100.0;
            prop_assert!(relative_close(shares.total(), expected));
        }
    }
}
