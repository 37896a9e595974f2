use rayon::prelude::*;
use tracing::debug;

use super::types::{GridDiagnostic, SensitivityCell, SensitivityGrid, Tier};

/// Deviation, in percent of the base value, beyond which a cell leaves the
/// "similar" tier.
pub const TIER_BAND_PERCENT: f64 = 5.0;

pub fn classify_tier(percent_deviation: f64) -> Tier {
    if percent_deviation > TIER_BAND_PERCENT {
        Tier::Higher
    } else if percent_deviation < -TIER_BAND_PERCENT {
        Tier::Lower
    } else {
        Tier::Similar
    }
}

/// Ascending range of `2 * points_per_side + 1` values stepping `step` away
/// from `base`. The centre value is `base` itself, bit for bit.
pub fn centered_range(base: f64, step: f64, points_per_side: u32) -> Vec<f64> {
    let n = points_per_side as i64;
    let step = step.abs();
    (-n..=n)
        .map(|k| if k == 0 { base } else { base + k as f64 * step })
        .collect()
}

/// Values every `(wacc, terminal_growth)` pair of the two ranges and grades
/// each result against the base case.
///
/// `value_fn` is called once for the base case and once per cell, except the
/// cell that matches the base case exactly, which reuses the base value.
pub fn compute<F>(
    value_fn: F,
    wacc_range: &[f64],
    terminal_growth_range: &[f64],
    base_wacc: f64,
    base_terminal_growth: f64,
) -> SensitivityGrid
where
    F: Fn(f64, f64) -> f64,
{
    let base = BaseCase::evaluate(&value_fn, base_wacc, base_terminal_growth);
    let cells = wacc_range
        .iter()
        .map(|&wacc| base.row(&value_fn, wacc, terminal_growth_range))
        .collect();
    base.finish(cells)
}

/// Same output as [`compute`], with rows valued in parallel. Rows are
/// collected by index, so cell placement does not depend on scheduling.
pub fn compute_parallel<F>(
    value_fn: F,
    wacc_range: &[f64],
    terminal_growth_range: &[f64],
    base_wacc: f64,
    base_terminal_growth: f64,
) -> SensitivityGrid
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    let base = BaseCase::evaluate(&value_fn, base_wacc, base_terminal_growth);
    let cells = wacc_range
        .par_iter()
        .map(|&wacc| base.row(&value_fn, wacc, terminal_growth_range))
        .collect();
    base.finish(cells)
}

#[derive(Debug, Clone, Copy)]
struct BaseCase {
    wacc: f64,
    terminal_growth: f64,
    value: f64,
    degenerate: Option<GridDiagnostic>,
}

impl BaseCase {
    fn evaluate<F>(value_fn: &F, wacc: f64, terminal_growth: f64) -> Self
    where
        F: Fn(f64, f64) -> f64,
    {
        let value = value_fn(wacc, terminal_growth);
        let degenerate = if !value.is_finite() {
            Some(GridDiagnostic::NonFiniteBaseValue)
        } else if value == 0.0 {
            Some(GridDiagnostic::ZeroBaseValue)
        } else {
            None
        };
        Self {
            wacc,
            terminal_growth,
            value,
            degenerate,
        }
    }

    fn is_base(&self, wacc: f64, terminal_growth: f64) -> bool {
        wacc == self.wacc && terminal_growth == self.terminal_growth
    }

    fn row<F>(
        &self,
        value_fn: &F,
        wacc: f64,
        terminal_growth_range: &[f64],
    ) -> Vec<SensitivityCell>
    where
        F: Fn(f64, f64) -> f64,
    {
        terminal_growth_range
            .iter()
            .map(|&terminal_growth| {
                if self.is_base(wacc, terminal_growth) {
                    return SensitivityCell {
                        wacc_value: wacc,
                        terminal_growth_value: terminal_growth,
                        result_value: self.value,
                        percent_deviation_from_base: 0.0,
                        tier: Tier::Similar,
                    };
                }
                let result_value = value_fn(wacc, terminal_growth);
                let percent_deviation_from_base = if self.degenerate.is_some() {
                    0.0
                } else if !result_value.is_finite() {
                    f64::NAN
                } else {
                    (result_value - self.value) / self.value * 100.0
                };
                SensitivityCell {
                    wacc_value: wacc,
                    terminal_growth_value: terminal_growth,
                    result_value,
                    percent_deviation_from_base,
                    tier: classify_tier(percent_deviation_from_base),
                }
            })
            .collect()
    }

    fn finish(self, cells: Vec<Vec<SensitivityCell>>) -> SensitivityGrid {
        let mut diagnostics = Vec::new();
        if let Some(diagnostic) = self.degenerate {
            debug!(
                base_value = self.value,
                ?diagnostic,
                "degenerate base valuation; deviations reported as zero"
            );
            diagnostics.push(diagnostic);
        }
        let non_finite = cells
            .iter()
            .flatten()
            .filter(|cell| !cell.result_value.is_finite())
            .count();
        if non_finite > 0 {
            diagnostics.push(GridDiagnostic::NonFiniteCells { count: non_finite });
        }

        SensitivityGrid {
            base_wacc: self.wacc,
            base_terminal_growth: self.terminal_growth,
            base_value: self.value,
            cells,
            diagnostics,
        }
    }
}
