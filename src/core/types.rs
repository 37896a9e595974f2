use serde::{Deserialize, Serialize};

/// Candidate DCF assumptions, all expressed in percent (12.5 means 12.5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionSet {
    pub revenue_growth_rate: f64,
    pub ebitda_margin: f64,
    pub tax_rate: f64,
    pub wacc: f64,
    pub terminal_growth_rate: f64,
    pub capex_percentage: Option<f64>,
    pub working_capital_percentage: Option<f64>,
}

impl AssumptionSet {
    pub fn get(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::RevenueGrowthRate => Some(self.revenue_growth_rate),
            FieldName::EbitdaMargin => Some(self.ebitda_margin),
            FieldName::TaxRate => Some(self.tax_rate),
            FieldName::Wacc => Some(self.wacc),
            FieldName::TerminalGrowthRate => Some(self.terminal_growth_rate),
            FieldName::CapexPercentage => self.capex_percentage,
            FieldName::WorkingCapitalPercentage => self.working_capital_percentage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    RevenueGrowthRate,
    EbitdaMargin,
    TaxRate,
    Wacc,
    TerminalGrowthRate,
    CapexPercentage,
    WorkingCapitalPercentage,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::RevenueGrowthRate,
        FieldName::EbitdaMargin,
        FieldName::TaxRate,
        FieldName::Wacc,
        FieldName::TerminalGrowthRate,
        FieldName::CapexPercentage,
        FieldName::WorkingCapitalPercentage,
    ];
}

/// Ordered so that `Error` is the worst: `Info < Warning < Error`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub field: FieldName,
    pub value: f64,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDriverInput {
    pub label: String,
    pub start_year: u32,
    pub end_year: u32,
    pub driver_rate: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthStage {
    pub label: String,
    pub start_year: u32,
    pub end_year: u32,
    pub driver_rate: f64,
    pub blend_weight_to_reference: f64,
    pub confidence: Confidence,
    pub resulting_rate: f64,
    /// Set only on the perpetuity stage appended after the explicit horizon.
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRate {
    pub year: u32,
    pub rate: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Higher,
    Similar,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityCell {
    pub wacc_value: f64,
    pub terminal_growth_value: f64,
    pub result_value: f64,
    pub percent_deviation_from_base: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GridDiagnostic {
    /// Base valuation was exactly zero; every deviation is reported as 0.
    ZeroBaseValue,
    /// Base valuation was NaN or infinite; every deviation is reported as 0.
    NonFiniteBaseValue,
    /// Cells whose valuation came back NaN or infinite.
    NonFiniteCells { count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityGrid {
    pub base_wacc: f64,
    pub base_terminal_growth: f64,
    pub base_value: f64,
    /// Row-major: `cells[r][c]` pairs `wacc_range[r]` with `terminal_growth_range[c]`.
    pub cells: Vec<Vec<SensitivityCell>>,
    pub diagnostics: Vec<GridDiagnostic>,
}

impl SensitivityGrid {
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.cells.len();
        let cols = self.cells.first().map_or(0, Vec::len);
        (rows, cols)
    }

    pub fn base_cell(&self) -> Option<&SensitivityCell> {
        self.cells.iter().flatten().find(|cell| {
            cell.wacc_value == self.base_wacc
                && cell.terminal_growth_value == self.base_terminal_growth
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.diagnostics.iter().any(|d| {
            matches!(
                d,
                GridDiagnostic::ZeroBaseValue | GridDiagnostic::NonFiniteBaseValue
            )
        })
    }
}
