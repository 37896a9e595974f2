mod growth;
mod projection;
mod sensitivity;
mod types;
mod validator;

pub use growth::{
    STANDARD_BLEND_WEIGHTS, STANDARD_STAGE_YEARS, TERMINAL_STAGE_LABEL, blend, blend_weights,
    standard_stage_inputs, yearly_rates,
};
pub use projection::{CashFlowProjection, ValuationBreakdown};
pub use sensitivity::{TIER_BAND_PERCENT, centered_range, classify_tier, compute, compute_parallel};
pub use types::{
    AssumptionSet, Confidence, FieldName, Finding, GridDiagnostic, GrowthStage, SensitivityCell,
    SensitivityGrid, Severity, StageDriverInput, Tier, YearRate,
};
pub use validator::{has_blocking_findings, suggested, validate, worst_severity};
