use tracing::debug;

use super::types::{Confidence, GrowthStage, StageDriverInput, YearRate};

/// Blend weight toward the reference rate for the canonical four-stage,
/// ten-year schedule. The final stage converges fully.
pub const STANDARD_BLEND_WEIGHTS: [f64; 4] = [0.20, 0.50, 0.75, 1.00];

pub const STANDARD_STAGE_YEARS: [(u32, u32); 4] = [(1, 2), (3, 5), (6, 8), (9, 10)];

const STANDARD_STAGE_LABELS: [&str; 4] = [
    "Near-term",
    "Expansion",
    "Maturation",
    "Convergence",
];

pub const TERMINAL_STAGE_LABEL: &str = "Terminal";

/// Weight schedule for `stage_count` stages.
///
/// Four stages use [`STANDARD_BLEND_WEIGHTS`] verbatim. Any other count samples
/// the standard schedule at evenly spaced positions with linear interpolation,
/// so the first stage keeps the lowest weight and the last is always 1.0.
pub fn blend_weights(stage_count: usize) -> Vec<f64> {
    match stage_count {
        0 => Vec::new(),
        1 => vec![1.0],
        n if n == STANDARD_BLEND_WEIGHTS.len() => STANDARD_BLEND_WEIGHTS.to_vec(),
        n => {
            let last_knot = (STANDARD_BLEND_WEIGHTS.len() - 1) as f64;
            let mut weights: Vec<f64> = (0..n)
                .map(|i| {
                    let pos = i as f64 * last_knot / (n - 1) as f64;
                    interpolate_standard(pos)
                })
                .collect();
            weights[n - 1] = 1.0;
            weights
        }
    }
}

fn interpolate_standard(pos: f64) -> f64 {
    let lo = pos.floor() as usize;
    let last = STANDARD_BLEND_WEIGHTS.len() - 1;
    if lo >= last {
        return STANDARD_BLEND_WEIGHTS[last];
    }
    let frac = pos - lo as f64;
    let a = STANDARD_BLEND_WEIGHTS[lo];
    let b = STANDARD_BLEND_WEIGHTS[lo + 1];
    a + (b - a) * frac
}

/// Turns stage drivers into a glide path toward `reference_rate`, then appends
/// the perpetuity stage.
///
/// A NaN driver yields NaN for that stage only; the rest of the schedule is
/// still computed. Empty input yields an empty schedule.
pub fn blend(stages: &[StageDriverInput], reference_rate: f64) -> Vec<GrowthStage> {
    if stages.is_empty() {
        return Vec::new();
    }

    let weights = blend_weights(stages.len());
    let last_index = stages.len() - 1;
    let mut out = Vec::with_capacity(stages.len() + 1);

    for (idx, (stage, weight)) in stages.iter().zip(weights).enumerate() {
        let resulting_rate = if idx == last_index {
            reference_rate
        } else {
            stage.driver_rate * (1.0 - weight) + reference_rate * weight
        };
        if stage.driver_rate.is_nan() && idx != last_index {
            debug!(stage = %stage.label, "NaN growth driver; stage rate is NaN");
        }
        out.push(GrowthStage {
            label: stage.label.clone(),
            start_year: stage.start_year,
            end_year: stage.end_year,
            driver_rate: stage.driver_rate,
            blend_weight_to_reference: weight,
            confidence: stage.confidence,
            resulting_rate,
            terminal: false,
        });
    }

    let perpetuity_year = stages[last_index].end_year.saturating_add(1);
    out.push(GrowthStage {
        label: TERMINAL_STAGE_LABEL.to_string(),
        start_year: perpetuity_year,
        end_year: perpetuity_year,
        driver_rate: reference_rate,
        blend_weight_to_reference: 1.0,
        confidence: Confidence::High,
        resulting_rate: reference_rate,
        terminal: true,
    });

    out
}

/// Builds the canonical ten-year, four-stage layout from per-stage drivers.
pub fn standard_stage_inputs(
    drivers: [f64; 4],
    confidences: [Confidence; 4],
) -> Vec<StageDriverInput> {
    STANDARD_STAGE_YEARS
        .iter()
        .zip(STANDARD_STAGE_LABELS)
        .zip(drivers.into_iter().zip(confidences))
        .map(
            |((&(start_year, end_year), label), (driver_rate, confidence))| StageDriverInput {
                label: label.to_string(),
                start_year,
                end_year,
                driver_rate,
                confidence,
            },
        )
        .collect()
}

/// Expands the explicit stages of a blended schedule into one rate per
/// projection year. The perpetuity stage is not expanded.
pub fn yearly_rates(schedule: &[GrowthStage]) -> Vec<YearRate> {
    schedule
        .iter()
        .filter(|stage| !stage.terminal)
        .flat_map(|stage| {
            (stage.start_year..=stage.end_year).map(move |year| YearRate {
                year,
                rate: stage.resulting_rate,
            })
        })
        .collect()
}
