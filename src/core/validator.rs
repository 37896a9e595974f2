use super::types::{AssumptionSet, FieldName, Finding, Severity};

pub const REVENUE_GROWTH_ERROR_ABOVE: f64 = 25.0;
pub const REVENUE_GROWTH_WARNING_ABOVE: f64 = 20.0;
pub const REVENUE_GROWTH_WARNING_BELOW: f64 = -5.0;
pub const REVENUE_GROWTH_INFO_ABOVE: f64 = 15.0;

pub const EBITDA_MARGIN_ERROR_ABOVE: f64 = 40.0;
pub const EBITDA_MARGIN_ERROR_BELOW: f64 = 0.0;
pub const EBITDA_MARGIN_WARNING_ABOVE: f64 = 30.0;
pub const EBITDA_MARGIN_WARNING_BELOW: f64 = 5.0;

pub const WACC_ERROR_ABOVE: f64 = 25.0;
pub const WACC_WARNING_ABOVE: f64 = 20.0;
pub const WACC_WARNING_BELOW: f64 = 6.0;

pub const TERMINAL_GROWTH_ERROR_ABOVE: f64 = 5.0;
pub const TERMINAL_GROWTH_WARNING_ABOVE: f64 = 4.0;
pub const TERMINAL_GROWTH_WARNING_BELOW: f64 = 0.0;

/// Remediation values attached to findings. Fixed per rule, never derived from
/// the offending input.
pub mod suggested {
    pub const REVENUE_GROWTH_ABOVE_ERROR: f64 = 20.0;
    pub const REVENUE_GROWTH_ABOVE_WARNING: f64 = 15.0;
    pub const REVENUE_GROWTH_BELOW_WARNING: f64 = 0.0;

    pub const EBITDA_MARGIN_ABOVE_ERROR: f64 = 30.0;
    pub const EBITDA_MARGIN_BELOW_ERROR: f64 = 10.0;
    pub const EBITDA_MARGIN_ABOVE_WARNING: f64 = 25.0;
    pub const EBITDA_MARGIN_BELOW_WARNING: f64 = 10.0;

    pub const WACC_ABOVE_ERROR: f64 = 12.0;
    pub const WACC_ABOVE_WARNING: f64 = 15.0;
    pub const WACC_BELOW_WARNING: f64 = 8.0;

    pub const TERMINAL_GROWTH_ABOVE_ERROR: f64 = 3.0;
    pub const TERMINAL_GROWTH_AT_OR_ABOVE_WACC: f64 = 2.5;
    pub const TERMINAL_GROWTH_ABOVE_WARNING: f64 = 3.0;
    pub const TERMINAL_GROWTH_BELOW_WARNING: f64 = 2.0;
}

/// Checks an assumption set against the canonical threshold table.
///
/// Each field yields at most one finding: rules are tried Error, then Warning,
/// then Info, and the first match wins. Comparisons involving NaN never match,
/// so non-numeric input produces no finding for that field.
pub fn validate(assumptions: &AssumptionSet) -> Vec<Finding> {
    [
        check_revenue_growth(assumptions.revenue_growth_rate),
        check_ebitda_margin(assumptions.ebitda_margin),
        check_wacc(assumptions.wacc),
        check_terminal_growth(assumptions.terminal_growth_rate, assumptions.wacc),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn worst_severity(findings: &[Finding]) -> Option<Severity> {
    findings.iter().map(|f| f.severity).max()
}

pub fn has_blocking_findings(findings: &[Finding]) -> bool {
    worst_severity(findings) == Some(Severity::Error)
}

fn finding(
    field: FieldName,
    value: f64,
    severity: Severity,
    message: String,
    suggested_value: Option<f64>,
) -> Option<Finding> {
    Some(Finding {
        field,
        value,
        severity,
        message,
        suggested_value,
    })
}

fn check_revenue_growth(v: f64) -> Option<Finding> {
    let field = FieldName::RevenueGrowthRate;
    if v > REVENUE_GROWTH_ERROR_ABOVE {
        return finding(
            field,
            v,
            Severity::Error,
            format!(
                "Revenue growth of {v}% exceeds {}% and is not sustainable",
                REVENUE_GROWTH_ERROR_ABOVE
            ),
            Some(suggested::REVENUE_GROWTH_ABOVE_ERROR),
        );
    }
    if v > REVENUE_GROWTH_WARNING_ABOVE {
        return finding(
            field,
            v,
            Severity::Warning,
            format!(
                "Revenue growth of {v}% is aggressive; few companies sustain more than {}%",
                REVENUE_GROWTH_WARNING_ABOVE
            ),
            Some(suggested::REVENUE_GROWTH_ABOVE_WARNING),
        );
    }
    if v < REVENUE_GROWTH_WARNING_BELOW {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("Revenue decline of {v}% implies a shrinking business"),
            Some(suggested::REVENUE_GROWTH_BELOW_WARNING),
        );
    }
    if v > REVENUE_GROWTH_INFO_ABOVE {
        return finding(
            field,
            v,
            Severity::Info,
            format!(
                "Revenue growth of {v}% is above the {}% long-run norm",
                REVENUE_GROWTH_INFO_ABOVE
            ),
            None,
        );
    }
    None
}

fn check_ebitda_margin(v: f64) -> Option<Finding> {
    let field = FieldName::EbitdaMargin;
    if v > EBITDA_MARGIN_ERROR_ABOVE {
        return finding(
            field,
            v,
            Severity::Error,
            format!("EBITDA margin of {v}% exceeds {EBITDA_MARGIN_ERROR_ABOVE}%"),
            Some(suggested::EBITDA_MARGIN_ABOVE_ERROR),
        );
    }
    if v < EBITDA_MARGIN_ERROR_BELOW {
        return finding(
            field,
            v,
            Severity::Error,
            format!("Negative EBITDA margin of {v}% cannot support a cash flow valuation"),
            Some(suggested::EBITDA_MARGIN_BELOW_ERROR),
        );
    }
    if v > EBITDA_MARGIN_WARNING_ABOVE {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("EBITDA margin of {v}% is well above most industries"),
            Some(suggested::EBITDA_MARGIN_ABOVE_WARNING),
        );
    }
    if v < EBITDA_MARGIN_WARNING_BELOW {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("EBITDA margin of {v}% leaves little room for reinvestment"),
            Some(suggested::EBITDA_MARGIN_BELOW_WARNING),
        );
    }
    None
}

fn check_wacc(v: f64) -> Option<Finding> {
    let field = FieldName::Wacc;
    if v > WACC_ERROR_ABOVE {
        return finding(
            field,
            v,
            Severity::Error,
            format!("WACC of {v}% exceeds {WACC_ERROR_ABOVE}%"),
            Some(suggested::WACC_ABOVE_ERROR),
        );
    }
    if v < WACC_WARNING_BELOW {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("WACC of {v}% is below {WACC_WARNING_BELOW}% and may overstate value"),
            Some(suggested::WACC_BELOW_WARNING),
        );
    }
    if v > WACC_WARNING_ABOVE {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("WACC of {v}% is above {WACC_WARNING_ABOVE}% and may understate value"),
            Some(suggested::WACC_ABOVE_WARNING),
        );
    }
    None
}

fn check_terminal_growth(v: f64, wacc: f64) -> Option<Finding> {
    let field = FieldName::TerminalGrowthRate;
    if v > TERMINAL_GROWTH_ERROR_ABOVE {
        return finding(
            field,
            v,
            Severity::Error,
            format!(
                "Terminal growth of {v}% exceeds long-run GDP growth of {}%",
                TERMINAL_GROWTH_ERROR_ABOVE
            ),
            Some(suggested::TERMINAL_GROWTH_ABOVE_ERROR),
        );
    }
    if v >= wacc {
        return finding(
            field,
            v,
            Severity::Error,
            format!("Terminal growth of {v}% must be below WACC of {wacc}%"),
            Some(suggested::TERMINAL_GROWTH_AT_OR_ABOVE_WACC),
        );
    }
    if v < TERMINAL_GROWTH_WARNING_BELOW {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("Negative terminal growth of {v}% assumes perpetual decline"),
            Some(suggested::TERMINAL_GROWTH_BELOW_WARNING),
        );
    }
    if v > TERMINAL_GROWTH_WARNING_ABOVE {
        return finding(
            field,
            v,
            Severity::Warning,
            format!("Terminal growth of {v}% is at the upper end of sustainable growth"),
            Some(suggested::TERMINAL_GROWTH_ABOVE_WARNING),
        );
    }
    None
}
