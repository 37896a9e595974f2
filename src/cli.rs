use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::net::IpAddr;

use crate::api::{
    DEFAULT_GROWTH_STEP, DEFAULT_POINTS_PER_SIDE, DEFAULT_REFERENCE_RATE, DEFAULT_WACC_STEP,
    GrowthRequest, SensitivityPayload, SensitivityRequest, build_growth_response,
    build_sensitivity_response, build_validate_response,
};
use crate::core::{AssumptionSet, Confidence, standard_stage_inputs};
use crate::error::{RequestError, RequestResult};

#[derive(Parser, Debug)]
#[command(
    name = "valuation",
    version,
    about = "DCF assumption checks, GDP-blended growth schedules and sensitivity grids"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve(ServeArgs),
    #[command(flatten)]
    Report(Report),
}

/// Commands that compute once and print JSON to stdout.
#[derive(Subcommand, Debug)]
pub enum Report {
    /// Check a set of assumptions and print the findings.
    Validate(ValidateArgs),
    /// Blend four stage drivers toward a reference rate.
    Blend(BlendArgs),
    /// Print a sensitivity grid for a single- or multi-stage projection.
    Grid(GridArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[arg(long, allow_negative_numbers = true, help = "Revenue growth in percent")]
    pub revenue_growth_rate: f64,
    #[arg(long, allow_negative_numbers = true, help = "EBITDA margin in percent")]
    pub ebitda_margin: f64,
    #[arg(long, default_value_t = 25.0, help = "Tax rate in percent")]
    pub tax_rate: f64,
    #[arg(long, help = "Discount rate in percent")]
    pub wacc: f64,
    #[arg(long, allow_negative_numbers = true, help = "Perpetual growth in percent")]
    pub terminal_growth_rate: f64,
    #[arg(long)]
    pub capex_percentage: Option<f64>,
    #[arg(long)]
    pub working_capital_percentage: Option<f64>,
}

impl From<ValidateArgs> for AssumptionSet {
    fn from(args: ValidateArgs) -> Self {
        AssumptionSet {
            revenue_growth_rate: args.revenue_growth_rate,
            ebitda_margin: args.ebitda_margin,
            tax_rate: args.tax_rate,
            wacc: args.wacc,
            terminal_growth_rate: args.terminal_growth_rate,
            capex_percentage: args.capex_percentage,
            working_capital_percentage: args.working_capital_percentage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliConfidence {
    High,
    Medium,
    Low,
}

impl From<CliConfidence> for Confidence {
    fn from(value: CliConfidence) -> Self {
        match value {
            CliConfidence::High => Confidence::High,
            CliConfidence::Medium => Confidence::Medium,
            CliConfidence::Low => Confidence::Low,
        }
    }
}

#[derive(Args, Debug)]
pub struct BlendArgs {
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Driver growth for years 1-2, 3-5, 6-8 and 9-10, in percent"
    )]
    pub drivers: Vec<f64>,
    #[arg(long, default_value_t = DEFAULT_REFERENCE_RATE, help = "Long-run GDP proxy in percent")]
    pub reference_rate: f64,
    #[arg(long, value_enum, default_value_t = CliConfidence::Medium)]
    pub confidence: CliConfidence,
}

#[derive(Args, Debug)]
pub struct GridArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub free_cash_flow: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub net_debt: f64,
    #[arg(long)]
    pub shares: f64,
    #[arg(long)]
    pub wacc: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub terminal_growth: f64,
    #[arg(long, default_value_t = DEFAULT_WACC_STEP)]
    pub wacc_step: f64,
    #[arg(long, default_value_t = DEFAULT_GROWTH_STEP)]
    pub growth_step: f64,
    #[arg(long, default_value_t = DEFAULT_POINTS_PER_SIDE)]
    pub points_per_side: u32,
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Optional four stage drivers for a multi-stage projection"
    )]
    pub drivers: Option<Vec<f64>>,
    #[arg(long, default_value_t = DEFAULT_REFERENCE_RATE)]
    pub reference_rate: f64,
}

fn four_drivers(drivers: &[f64]) -> RequestResult<[f64; 4]> {
    drivers
        .try_into()
        .map_err(|_| {
            RequestError::invalid("--drivers", "expected exactly four comma-separated values")
        })
}

pub fn growth_request(args: &BlendArgs) -> RequestResult<GrowthRequest> {
    let drivers = four_drivers(&args.drivers)?;
    if !args.reference_rate.is_finite() {
        return Err(RequestError::invalid("--reference-rate", "must be a finite number"));
    }
    Ok(GrowthRequest {
        stages: standard_stage_inputs(drivers, [args.confidence.into(); 4]),
        reference_rate: args.reference_rate,
    })
}

pub fn sensitivity_request(args: &GridArgs) -> RequestResult<SensitivityRequest> {
    let stages = match &args.drivers {
        Some(drivers) => Some(standard_stage_inputs(
            four_drivers(drivers)?,
            [Confidence::Medium; 4],
        )),
        None => None,
    };
    SensitivityRequest::try_from(SensitivityPayload {
        base_free_cash_flow: Some(args.free_cash_flow),
        net_debt: Some(args.net_debt),
        shares_outstanding: Some(args.shares),
        wacc: Some(args.wacc),
        terminal_growth_rate: Some(args.terminal_growth),
        wacc_step: Some(args.wacc_step),
        growth_step: Some(args.growth_step),
        points_per_side: Some(args.points_per_side),
        stages,
        reference_rate: Some(args.reference_rate),
        ..SensitivityPayload::default()
    })
}

/// Runs a report command and returns its pretty-printed JSON output.
pub fn render(report: Report) -> RequestResult<String> {
    match report {
        Report::Validate(args) => to_json(&build_validate_response(&AssumptionSet::from(args))),
        Report::Blend(args) => to_json(&build_growth_response(&growth_request(&args)?)),
        Report::Grid(args) => to_json(&build_sensitivity_response(&sensitivity_request(&args)?)),
    }
}

fn to_json<T: Serialize>(value: &T) -> RequestResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| RequestError::InvalidPayload(e.to_string()))
}
