use super::performance::PerformanceRow;
use crate::numeric::round3;

/// Area under the ROC curve, integrating sensitivity over ascending
/// `back_pct` with the trapezoid rule, rounded to the reporting precision.
///
/// Undefined (None) when the table is empty or any point is NaN.
pub fn auc(rows: &[PerformanceRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    // Rows ascend in threshold, so back_pct descends; walk them backwards.
    let curve: Vec<(f64, f64)> = rows.iter().rev().map(|r| (r.back_pct, r.sensitivity)).collect();
    if curve.iter().any(|(x, y)| x.is_nan() || y.is_nan()) {
        return None;
    }
    let area: f64 = curve
        .windows(2)
        .map(|w| {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            (x1 - x0) * (y0 + y1) / 2.0
        })
        .sum();
    Some(round3(area.clamp(0.0, 1.0)))
}
