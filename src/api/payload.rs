use serde::Deserialize;

use crate::core::{
    AssumptionSet, CashFlowProjection, Confidence, StageDriverInput, blend, centered_range,
    standard_stage_inputs,
};
use crate::error::{RequestError, RequestResult};

pub const MAX_GRID_POINTS_PER_AXIS: usize = 25;
pub const MAX_POINTS_PER_SIDE: u32 = 12;
pub const MAX_PROJECTION_YEARS: u32 = 100;

pub const DEFAULT_REFERENCE_RATE: f64 = 3.0;
pub const DEFAULT_WACC_STEP: f64 = 1.0;
pub const DEFAULT_GROWTH_STEP: f64 = 0.5;
pub const DEFAULT_POINTS_PER_SIDE: u32 = 2;

/// Neutral base case used to fill fields a request leaves out.
pub fn default_assumptions() -> AssumptionSet {
    AssumptionSet {
        revenue_growth_rate: 8.0,
        ebitda_margin: 20.0,
        tax_rate: 25.0,
        wacc: 10.0,
        terminal_growth_rate: 2.5,
        capex_percentage: None,
        working_capital_percentage: None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssumptionPayload {
    pub revenue_growth_rate: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub tax_rate: Option<f64>,
    pub wacc: Option<f64>,
    pub terminal_growth_rate: Option<f64>,
    pub capex_percentage: Option<f64>,
    pub working_capital_percentage: Option<f64>,
}

impl From<AssumptionPayload> for AssumptionSet {
    fn from(payload: AssumptionPayload) -> Self {
        let defaults = default_assumptions();
        AssumptionSet {
            revenue_growth_rate: payload
                .revenue_growth_rate
                .unwrap_or(defaults.revenue_growth_rate),
            ebitda_margin: payload.ebitda_margin.unwrap_or(defaults.ebitda_margin),
            tax_rate: payload.tax_rate.unwrap_or(defaults.tax_rate),
            wacc: payload.wacc.unwrap_or(defaults.wacc),
            terminal_growth_rate: payload
                .terminal_growth_rate
                .unwrap_or(defaults.terminal_growth_rate),
            capex_percentage: payload.capex_percentage,
            working_capital_percentage: payload.working_capital_percentage,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrowthPayload {
    pub stages: Option<Vec<StageDriverInput>>,
    /// Shorthand for the standard ten-year layout: one driver per stage.
    pub drivers: Option<[f64; 4]>,
    pub reference_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRequest {
    pub stages: Vec<StageDriverInput>,
    pub reference_rate: f64,
}

impl TryFrom<GrowthPayload> for GrowthRequest {
    type Error = RequestError;

    fn try_from(payload: GrowthPayload) -> RequestResult<Self> {
        let stages = match (payload.stages, payload.drivers) {
            (Some(stages), _) => stages,
            (None, Some(drivers)) => standard_stage_inputs(drivers, [Confidence::Medium; 4]),
            (None, None) => {
                return Err(RequestError::invalid(
                    "stages",
                    "provide either stages or drivers",
                ));
            }
        };
        let reference_rate = payload.reference_rate.unwrap_or(DEFAULT_REFERENCE_RATE);
        check_finite("referenceRate", reference_rate)?;
        check_stage_years(&stages)?;
        Ok(GrowthRequest {
            stages,
            reference_rate,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensitivityPayload {
    pub base_free_cash_flow: Option<f64>,
    pub net_debt: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub wacc: Option<f64>,
    pub terminal_growth_rate: Option<f64>,
    pub wacc_range: Option<Vec<f64>>,
    pub terminal_growth_range: Option<Vec<f64>>,
    pub wacc_step: Option<f64>,
    pub growth_step: Option<f64>,
    pub points_per_side: Option<u32>,
    pub stages: Option<Vec<StageDriverInput>>,
    pub reference_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRequest {
    pub projection: CashFlowProjection,
    pub wacc_range: Vec<f64>,
    pub terminal_growth_range: Vec<f64>,
    pub base_wacc: f64,
    pub base_terminal_growth: f64,
}

impl TryFrom<SensitivityPayload> for SensitivityRequest {
    type Error = RequestError;

    fn try_from(payload: SensitivityPayload) -> RequestResult<Self> {
        let defaults = default_assumptions();
        let base_free_cash_flow = payload.base_free_cash_flow.unwrap_or(100.0);
        let net_debt = payload.net_debt.unwrap_or(0.0);
        let shares_outstanding = payload.shares_outstanding.unwrap_or(1.0);
        let base_wacc = payload.wacc.unwrap_or(defaults.wacc);
        let base_terminal_growth = payload
            .terminal_growth_rate
            .unwrap_or(defaults.terminal_growth_rate);

        check_finite("baseFreeCashFlow", base_free_cash_flow)?;
        check_finite("netDebt", net_debt)?;
        check_finite("wacc", base_wacc)?;
        check_finite("terminalGrowthRate", base_terminal_growth)?;
        let has_shares = shares_outstanding > 0.0;
        if !has_shares {
            return Err(RequestError::invalid(
                "sharesOutstanding",
                "must be greater than zero",
            ));
        }

        let points_per_side = payload.points_per_side.unwrap_or(DEFAULT_POINTS_PER_SIDE);
        if points_per_side > MAX_POINTS_PER_SIDE {
            return Err(RequestError::invalid(
                "pointsPerSide",
                format!("must be at most {MAX_POINTS_PER_SIDE}"),
            ));
        }
        let wacc_range = resolve_range(
            "waccRange",
            payload.wacc_range,
            base_wacc,
            payload.wacc_step.unwrap_or(DEFAULT_WACC_STEP),
            points_per_side,
        )?;
        let terminal_growth_range = resolve_range(
            "terminalGrowthRange",
            payload.terminal_growth_range,
            base_terminal_growth,
            payload.growth_step.unwrap_or(DEFAULT_GROWTH_STEP),
            points_per_side,
        )?;

        let mut projection =
            CashFlowProjection::single_stage(base_free_cash_flow, net_debt, shares_outstanding);
        if let Some(stages) = payload.stages {
            let reference_rate = payload.reference_rate.unwrap_or(DEFAULT_REFERENCE_RATE);
            check_finite("referenceRate", reference_rate)?;
            check_stage_years(&stages)?;
            projection = projection.with_schedule(blend(&stages, reference_rate));
        }

        Ok(SensitivityRequest {
            projection,
            wacc_range,
            terminal_growth_range,
            base_wacc,
            base_terminal_growth,
        })
    }
}

fn resolve_range(
    field: &'static str,
    explicit: Option<Vec<f64>>,
    base: f64,
    step: f64,
    points_per_side: u32,
) -> RequestResult<Vec<f64>> {
    let range = match explicit {
        Some(range) => range,
        None => {
            check_finite(field, step)?;
            centered_range(base, step, points_per_side)
        }
    };
    if range.len() > MAX_GRID_POINTS_PER_AXIS {
        return Err(RequestError::RangeTooLarge {
            field,
            points: range.len(),
            limit: MAX_GRID_POINTS_PER_AXIS,
        });
    }
    if range.iter().any(|v| !v.is_finite()) {
        return Err(RequestError::invalid(field, "values must be finite"));
    }
    if !range.windows(2).all(|w| w[0] < w[1]) {
        return Err(RequestError::invalid(field, "values must be strictly ascending"));
    }
    Ok(range)
}

fn check_finite(field: &'static str, value: f64) -> RequestResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RequestError::invalid(field, "must be a finite number"))
    }
}

fn check_stage_years(stages: &[StageDriverInput]) -> RequestResult<()> {
    for stage in stages {
        if stage.start_year == 0 || stage.end_year < stage.start_year {
            return Err(RequestError::invalid(
                "stages",
                format!(
                    "stage '{}' spans years {}..{}; years start at 1 and must not run backwards",
                    stage.label, stage.start_year, stage.end_year
                ),
            ));
        }
        if stage.end_year > MAX_PROJECTION_YEARS {
            return Err(RequestError::invalid(
                "stages",
                format!(
                    "stage '{}' ends in year {}; projections stop at year {MAX_PROJECTION_YEARS}",
                    stage.label, stage.end_year
                ),
            ));
        }
    }
    if stages
        .windows(2)
        .any(|pair| pair[1].start_year <= pair[0].end_year)
    {
        return Err(RequestError::invalid(
            "stages",
            "stages must be in chronological order without overlap",
        ));
    }
    Ok(())
}
