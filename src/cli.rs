use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::api::run_http_server;
use crate::config::Settings;
use crate::core::{
    GoalSolveConfig, GoalSolveResult, GoalType, InputParameters, ProjectionResult, YearPoint,
    ZeroRatePolicy, compute_with_policy, run_yearly_projection, solve_goal,
};
use crate::display::{ChartSection, DisplaySummary, chart_sections, format_inr};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliZeroRatePolicy {
    Propagate,
    Linear,
}

impl From<CliZeroRatePolicy> for ZeroRatePolicy {
    fn from(value: CliZeroRatePolicy) -> Self {
        match value {
            CliZeroRatePolicy::Propagate => ZeroRatePolicy::Propagate,
            CliZeroRatePolicy::Linear => ZeroRatePolicy::Linear,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliGoalType {
    Contribution,
    Lumpsum,
}

impl From<CliGoalType> for GoalType {
    fn from(value: CliGoalType) -> Self {
        match value {
            CliGoalType::Contribution => GoalType::RequiredContribution,
            CliGoalType::Lumpsum => GoalType::RequiredLumpsum,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "sipcalc",
    version,
    about = "Lumpsum + SIP growth projector (monthly-compounded SIP, annually-compounded lumpsum)"
)]
pub struct Cli {
    #[arg(long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project the final value and its breakdown
    Project(ProjectArgs),
    /// Year-by-year projection up to the horizon
    Schedule(ProjectArgs),
    /// Solve for the monthly contribution or lumpsum that reaches a target value
    Goal(GoalArgs),
    /// Serve the web calculator and JSON API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, help = "One-time investment at the start; defaults to the configured value")]
    pub lumpsum: Option<f64>,
    #[arg(long, help = "Monthly contribution (SIP)")]
    pub sip: Option<f64>,
    #[arg(long, help = "Investment horizon in years, fractions allowed")]
    pub years: Option<f64>,
    #[arg(long, help = "Expected annual return in percent, e.g. 10")]
    pub rate: Option<f64>,
    #[arg(
        long,
        value_enum,
        help = "Zero-rate handling: propagate NaN/infinity or treat as no growth"
    )]
    pub zero_rate: Option<CliZeroRatePolicy>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct GoalArgs {
    #[command(flatten)]
    pub base: ProjectArgs,
    #[arg(long, value_enum, default_value_t = CliGoalType::Contribution)]
    pub solve: CliGoalType,
    #[arg(long, help = "Target total value")]
    pub target: f64,
    #[arg(long, help = "Lower search bound; defaults to the field's configured minimum")]
    pub search_min: Option<f64>,
    #[arg(long, help = "Upper search bound; defaults to the field's configured maximum")]
    pub search_max: Option<f64>,
    #[arg(long, default_value_t = 1.0)]
    pub tolerance: f64,
    #[arg(long, default_value_t = 64)]
    pub max_iterations: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on; overrides the settings file")]
    pub port: Option<u16>,
    #[arg(long, help = "Address to bind; overrides the settings file")]
    pub bind: Option<IpAddr>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionReport {
    inputs: InputParameters,
    zero_rate_policy: ZeroRatePolicy,
    result: ProjectionResult,
    display: DisplaySummary,
    chart: Vec<ChartSection>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Project(args) => {
            let (inputs, policy) = resolve_inputs(&settings, &args)?;
            let result = compute_with_policy(&inputs, policy);
            let output = match args.format {
                OutputFormat::Table => render_projection_table(&inputs, &result),
                OutputFormat::Json => serde_json::to_string_pretty(&ProjectionReport {
                    inputs,
                    zero_rate_policy: policy,
                    display: DisplaySummary::from_result(&result),
                    chart: chart_sections(&result),
                    result,
                })?,
            };
            println!("{output}");
        }
        Command::Schedule(args) => {
            let (inputs, policy) = resolve_inputs(&settings, &args)?;
            let points = run_yearly_projection(&inputs, policy)?;
            let output = match args.format {
                OutputFormat::Table => render_schedule_table(&points),
                OutputFormat::Json => serde_json::to_string_pretty(&points)?,
            };
            println!("{output}");
        }
        Command::Goal(args) => {
            let (inputs, policy) = resolve_inputs(&settings, &args.base)?;
            let config = goal_config(&settings, &args, policy);
            let result = solve_goal(&inputs, config).context("goal solve failed")?;
            let output = match args.base.format {
                OutputFormat::Table => render_goal_table(&result),
                OutputFormat::Json => serde_json::to_string_pretty(&result)?,
            };
            println!("{output}");
        }
        Command::Serve(args) => {
            if let Some(port) = args.port {
                settings.server.port = port;
            }
            if let Some(bind) = args.bind {
                settings.server.bind = bind;
            }
            run_http_server(settings)
                .await
                .context("HTTP server stopped")?;
        }
    }
    Ok(())
}

fn resolve_inputs(
    settings: &Settings,
    args: &ProjectArgs,
) -> anyhow::Result<(InputParameters, ZeroRatePolicy)> {
    let defaults = settings.defaults;
    let inputs = InputParameters {
        lumpsum: args.lumpsum.unwrap_or(defaults.lumpsum),
        monthly_contribution: args.sip.unwrap_or(defaults.monthly_contribution),
        horizon_years: args.years.unwrap_or(defaults.horizon_years),
        annual_return_rate_percent: args.rate.unwrap_or(defaults.annual_return_rate_percent),
    };
    settings.bounds.check(&inputs)?;
    let policy = args
        .zero_rate
        .map(ZeroRatePolicy::from)
        .unwrap_or(settings.zero_rate_policy);
    Ok((inputs, policy))
}

fn goal_config(settings: &Settings, args: &GoalArgs, policy: ZeroRatePolicy) -> GoalSolveConfig {
    let goal_type = GoalType::from(args.solve);
    let field_bounds = match goal_type {
        GoalType::RequiredContribution => settings.bounds.monthly_contribution,
        GoalType::RequiredLumpsum => settings.bounds.lumpsum,
    };
    GoalSolveConfig {
        goal_type,
        target_value: args.target,
        search_min: args.search_min.unwrap_or(field_bounds.min),
        search_max: args.search_max.unwrap_or(field_bounds.max),
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
        zero_rate_policy: policy,
    }
}

fn summary_row(label: &str, value: impl std::fmt::Display) -> String {
    format!("{label:<32} {value:>18}\n")
}

fn render_projection_table(inputs: &InputParameters, result: &ProjectionResult) -> String {
    let summary = DisplaySummary::from_result(result);
    let mut out = String::new();
    out.push_str(&summary_row("Lumpsum", format_inr(inputs.lumpsum)));
    out.push_str(&summary_row(
        "Monthly contribution",
        format_inr(inputs.monthly_contribution),
    ));
    out.push_str(&summary_row(
        "Expected rate of return (p.a) %",
        inputs.annual_return_rate_percent,
    ));
    out.push_str(&summary_row("Time period in years", inputs.horizon_years));
    out.push('\n');
    for (label, value) in summary.rows() {
        out.push_str(&summary_row(label, value));
    }

    let sections = chart_sections(result);
    if !sections.is_empty() {
        out.push('\n');
        for section in &sections {
            out.push_str(&format!("{:<32} {:>17.2}%\n", section.label, section.value));
        }
    }
    out.trim_end().to_string()
}

fn render_schedule_table(points: &[YearPoint]) -> String {
    let mut out = format!(
        "{:>6} {:>18} {:>18} {:>18} {:>18}\n",
        "Year", "Invested", "Lumpsum value", "SIP value", "Total value"
    );
    for point in points {
        out.push_str(&format!(
            "{:>6} {:>18} {:>18} {:>18} {:>18}\n",
            point.year,
            format_inr(point.total_invested),
            format_inr(point.lumpsum_value),
            format_inr(point.contribution_value),
            format_inr(point.total_value),
        ));
    }
    out.trim_end().to_string()
}

fn render_goal_table(result: &GoalSolveResult) -> String {
    let subject = match result.goal_type {
        GoalType::RequiredContribution => "Required monthly contribution",
        GoalType::RequiredLumpsum => "Required lumpsum",
    };
    let mut out = summary_row("Target value", format_inr(result.target_value));
    let solved = result
        .solved_value
        .map(format_inr)
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&summary_row(subject, solved));
    if let Some(value) = result.achieved_total_value {
        out.push_str(&summary_row("Projected total value", format_inr(value)));
    }
    out.push_str(&summary_row("Iterations", result.iterations.len()));
    out.push_str(&result.message);
    out.trim_end().to_string()
}
