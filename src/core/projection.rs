use serde::Serialize;

use super::types::GrowthStage;

/// Local stand-in for the authoritative valuation service: compounds a base
/// free cash flow through a blended growth schedule and caps it with a
/// Gordon-growth terminal value. All rates are percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowProjection {
    pub base_free_cash_flow: f64,
    pub net_debt: f64,
    pub shares_outstanding: f64,
    /// Output of `blend`. When empty the model is single-stage Gordon growth.
    pub schedule: Vec<GrowthStage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationBreakdown {
    pub pv_explicit_cash_flows: f64,
    pub pv_terminal_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub per_share_value: f64,
}

impl CashFlowProjection {
    pub fn single_stage(base_free_cash_flow: f64, net_debt: f64, shares_outstanding: f64) -> Self {
        Self {
            base_free_cash_flow,
            net_debt,
            shares_outstanding,
            schedule: Vec::new(),
        }
    }

    pub fn with_schedule(mut self, schedule: Vec<GrowthStage>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Returns `None` when the terminal value is undefined (`wacc <= g`) or
    /// there are no shares to divide by.
    pub fn breakdown(&self, wacc: f64, terminal_growth: f64) -> Option<ValuationBreakdown> {
        let defined = wacc > terminal_growth && self.shares_outstanding > 0.0;
        if !defined {
            return None;
        }
        let discount = 1.0 + wacc / 100.0;

        let mut cash_flow = self.base_free_cash_flow;
        let mut pv_explicit_cash_flows = 0.0;
        let mut last_year = 0u32;
        for stage in self.schedule.iter().filter(|s| !s.terminal) {
            for year in stage.start_year..=stage.end_year {
                cash_flow *= 1.0 + stage.resulting_rate / 100.0;
                pv_explicit_cash_flows += cash_flow / discount.powf(f64::from(year));
                last_year = last_year.max(year);
            }
        }

        let terminal_value =
            cash_flow * (1.0 + terminal_growth / 100.0) / ((wacc - terminal_growth) / 100.0);
        let pv_terminal_value = terminal_value / discount.powf(f64::from(last_year));

        let enterprise_value = pv_explicit_cash_flows + pv_terminal_value;
        let equity_value = enterprise_value - self.net_debt;
        Some(ValuationBreakdown {
            pv_explicit_cash_flows,
            pv_terminal_value,
            enterprise_value,
            equity_value,
            per_share_value: equity_value / self.shares_outstanding,
        })
    }

    /// Per-share value, or NaN where [`Self::breakdown`] is undefined. Suitable
    /// as the valuation function for the sensitivity grid.
    pub fn per_share_value(&self, wacc: f64, terminal_growth: f64) -> f64 {
        self.breakdown(wacc, terminal_growth)
            .map_or(f64::NAN, |b| b.per_share_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Confidence, blend, compute, standard_stage_inputs};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_stage_is_gordon_growth() {
        let model = CashFlowProjection::single_stage(100.0, 200.0, 10.0);
        let b = model.breakdown(10.0, 2.0).expect("defined");
        assert_approx(b.pv_explicit_cash_flows, 0.0);
        assert_approx(b.enterprise_value, 102.0 / 0.08);
        assert_approx(b.per_share_value, (1275.0 - 200.0) / 10.0);
    }

    #[test]
    fn undefined_when_growth_reaches_discount_rate() {
        let model = CashFlowProjection::single_stage(100.0, 0.0, 10.0);
        assert!(model.breakdown(3.0, 3.0).is_none());
        assert!(model.per_share_value(3.0, 4.0).is_nan());
        assert!(model.per_share_value(f64::NAN, 2.0).is_nan());

        let no_shares = CashFlowProjection::single_stage(100.0, 0.0, 0.0);
        assert!(no_shares.per_share_value(10.0, 2.0).is_nan());
    }

    #[test]
    fn explicit_years_are_compounded_and_discounted() {
        let stages = blend(
            &standard_stage_inputs([10.0, 8.0, 6.0, 4.0], [Confidence::Medium; 4]),
            3.0,
        );
        let model = CashFlowProjection::single_stage(100.0, 0.0, 1.0).with_schedule(stages);
        let b = model.breakdown(9.0, 3.0).expect("defined");

        let rates = [8.6, 8.6, 5.5, 5.5, 5.5, 3.75, 3.75, 3.75, 3.0, 3.0];
        let mut cf = 100.0;
        let mut pv = 0.0;
        for (i, r) in rates.iter().enumerate() {
            cf *= 1.0 + r / 100.0;
            pv += cf / 1.09f64.powi(i as i32 + 1);
        }
        let tv = cf * 1.03 / 0.06 / 1.09f64.powi(10);
        assert!((b.pv_explicit_cash_flows - pv).abs() < 1e-6);
        assert!((b.pv_terminal_value - tv).abs() < 1e-6);
        assert_approx(b.per_share_value, b.equity_value);
    }

    #[test]
    fn projection_drives_a_sensitivity_grid() {
        let model = CashFlowProjection::single_stage(50.0, 100.0, 5.0);
        let grid = compute(
            |w, g| model.per_share_value(w, g),
            &[8.0, 10.0, 12.0],
            &[1.5, 2.5, 3.5],
            10.0,
            2.5,
        );
        assert_eq!(grid.shape(), (3, 3));
        assert!(grid.cells[0][2].result_value > grid.cells[2][0].result_value);
        assert_eq!(grid.cells[1][1].percent_deviation_from_base, 0.0);
    }
}
