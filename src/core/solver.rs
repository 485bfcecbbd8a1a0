use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{InputParameters, ZeroRatePolicy, compute_with_policy};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    /// Smallest monthly contribution that reaches the target.
    RequiredContribution,
    /// Smallest lumpsum that reaches the target.
    RequiredLumpsum,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub zero_rate_policy: ZeroRatePolicy,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub achieved_total_value: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("target value must be finite and > 0, got {value}")]
    InvalidTarget { value: f64 },
    #[error("search bounds must be finite with 0 <= min < max, got min={min}, max={max}")]
    InvalidSearchBounds { min: f64, max: f64 },
    #[error("tolerance must be finite and > 0, got {value}")]
    InvalidTolerance { value: f64 },
    #[error("max iterations must be > 0")]
    ZeroIterations,
    #[error("max iterations must be <= {max}, got {value}")]
    TooManyIterations { value: u32, max: u32 },
    #[error("projection is not finite at candidate {candidate}; check the return rate")]
    NonFiniteProjection { candidate: f64 },
}

// Absorbs rounding when a candidate lands exactly on the target.
const TARGET_SLACK: f64 = 1e-9;

/// Bisection halves the bracket each step, so any f64 span is exhausted well
/// before this many iterations.
pub const MAX_GOAL_ITERATIONS: u32 = 200;

pub fn solve_goal(
    inputs: &InputParameters,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, SolveError> {
    validate_config(config)?;

    let mut iterations = Vec::new();
    let low_value = evaluate_candidate(inputs, config, config.search_min)?;
    let high_value = evaluate_candidate(inputs, config, config.search_max)?;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if meets_target(low_value, config) {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower search bound.".to_string();
    } else if !meets_target(high_value, config) {
        feasible = false;
        message = match config.goal_type {
            GoalType::RequiredContribution => {
                "No feasible monthly contribution found within the search bounds.".to_string()
            }
            GoalType::RequiredLumpsum => {
                "No feasible lumpsum found within the search bounds.".to_string()
            }
        };
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            // Bracket is down to adjacent floats; halving cannot narrow it further.
            if mid <= lo || mid >= hi {
                converged = true;
                break;
            }
            let total_value = evaluate_candidate(inputs, config, mid)?;
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                total_value,
            });

            if meets_target(total_value, config) {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            "Solved goal.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let achieved_total_value = match solved_value {
        Some(value) => Some(evaluate_candidate(inputs, config, value)?),
        None => None,
    };

    debug!(
        goal = ?config.goal_type,
        target = config.target_value,
        solved = ?solved_value,
        iterations = iterations.len(),
        converged,
        "goal solve finished"
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_value: config.target_value,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_total_value,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn meets_target(total_value: f64, config: GoalSolveConfig) -> bool {
    total_value + TARGET_SLACK >= config.target_value
}

fn evaluate_candidate(
    inputs: &InputParameters,
    config: GoalSolveConfig,
    candidate: f64,
) -> Result<f64, SolveError> {
    let trial = match config.goal_type {
        GoalType::RequiredContribution => InputParameters {
            monthly_contribution: candidate,
            ..*inputs
        },
        GoalType::RequiredLumpsum => InputParameters {
            lumpsum: candidate,
            ..*inputs
        },
    };
    let total_value = compute_with_policy(&trial, config.zero_rate_policy).total_value;
    if !total_value.is_finite() {
        return Err(SolveError::NonFiniteProjection { candidate });
    }
    Ok(total_value)
}

fn validate_config(config: GoalSolveConfig) -> Result<(), SolveError> {
    if !config.target_value.is_finite() || config.target_value <= 0.0 {
        return Err(SolveError::InvalidTarget {
            value: config.target_value,
        });
    }
    if !config.search_min.is_finite()
        || !config.search_max.is_finite()
        || config.search_min < 0.0
        || config.search_min >= config.search_max
    {
        return Err(SolveError::InvalidSearchBounds {
            min: config.search_min,
            max: config.search_max,
        });
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance {
            value: config.tolerance,
        });
    }
    if config.max_iterations == 0 {
        return Err(SolveError::ZeroIterations);
    }
    if config.max_iterations > MAX_GOAL_ITERATIONS {
        return Err(SolveError::TooManyIterations {
            value: config.max_iterations,
            max: MAX_GOAL_ITERATIONS,
        });
    }
    Ok(())
}
