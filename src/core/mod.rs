mod engine;
mod solver;
mod types;

pub use engine::{
    MAX_SCHEDULE_YEARS, ScheduleError, compute, compute_with_policy, run_yearly_projection,
};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, MAX_GOAL_ITERATIONS,
    SolveError, solve_goal,
};
pub use types::{InputParameters, ProjectionResult, Shares, YearPoint, ZeroRatePolicy};
