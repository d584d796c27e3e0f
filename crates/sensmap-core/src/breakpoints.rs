//! Breakpoint tables: ordered half-open intervals `[from, to)` mapped to weights.
//!
//! A table is validated when it is built (or deserialised): every interval
//! must satisfy `from < to` and intervals must be listed in ascending,
//! non-overlapping order. Gaps are allowed here; a finite value that lands in
//! a gap is reported by [`BreakpointTable::weight_for`] at reclassification time.
//!
//! In JSON an unbounded edge is written as `null`:
//! `{"from": 1000.0, "to": null, "weight": 0.0}`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensError};

/// One class of a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Inclusive lower bound; `-inf` when unbounded.
    pub from: f64,
    /// Exclusive upper bound; `+inf` when unbounded.
    pub to: f64,
    pub weight: f32,
}

impl Interval {
    pub fn new(from: f64, to: f64, weight: f32) -> Self {
        Self { from, to, weight }
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        self.from <= v && v < self.to
    }
}

/// Serialised form of an interval; `None` bounds are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSpec {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub weight: f32,
}

impl From<IntervalSpec> for Interval {
    fn from(spec: IntervalSpec) -> Self {
        Interval {
            from: spec.from.unwrap_or(f64::NEG_INFINITY),
            to: spec.to.unwrap_or(f64::INFINITY),
            weight: spec.weight,
        }
    }
}

impl From<Interval> for IntervalSpec {
    fn from(iv: Interval) -> Self {
        let bound = |b: f64| if b.is_finite() { Some(b) } else { None };
        IntervalSpec {
            from: bound(iv.from),
            to: bound(iv.to),
            weight: iv.weight,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawTable {
    variable: String,
    breakpoints: Vec<IntervalSpec>,
}

/// Reclassification table for a single environmental variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct BreakpointTable {
    variable: String,
    intervals: Vec<Interval>,
}

impl BreakpointTable {
    /// Build a validated table.
    pub fn new(variable: impl Into<String>, intervals: Vec<Interval>) -> Result<Self> {
        let variable = variable.into();
        let invalid = |reason: String| SensError::InvalidBreakpoints {
            variable: variable.clone(),
            reason,
        };

        if intervals.is_empty() {
            return Err(invalid("table has no intervals".into()));
        }
        for (i, iv) in intervals.iter().enumerate() {
            // Also rejects NaN bounds.
            if !(iv.from < iv.to) {
                return Err(invalid(format!("interval {i}: from ({}) must be < to ({})", iv.from, iv.to)));
            }
            if !iv.weight.is_finite() {
                return Err(invalid(format!("interval {i}: weight must be finite")));
            }
        }
        for (i, pair) in intervals.windows(2).enumerate() {
            if pair[1].from < pair[0].to {
                return Err(invalid(format!(
                    "intervals {i} and {} overlap or are out of order: [{}, {}) then [{}, {})",
                    i + 1,
                    pair[0].from,
                    pair[0].to,
                    pair[1].from,
                    pair[1].to
                )));
            }
        }

        Ok(Self { variable, intervals })
    }

    /// Shorthand for `(from, to, weight)` triples.
    pub fn from_triples(variable: impl Into<String>, triples: &[(f64, f64, f32)]) -> Result<Self> {
        let intervals = triples.iter().map(|&(f, t, w)| Interval::new(f, t, w)).collect();
        Self::new(variable, intervals)
    }

    /// Build from serialised interval records.
    pub fn from_specs(variable: impl Into<String>, specs: &[IntervalSpec]) -> Result<Self> {
        Self::new(variable, specs.iter().copied().map(Interval::from).collect())
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Weight of the unique interval containing `value`.
    ///
    /// Every interval is checked; zero or several matches is a `Range` error
    /// rather than a first-match-wins lookup.
    pub fn weight_for(&self, value: f32) -> Result<f32> {
        let v = value as f64;
        let mut hit = None;
        let mut matches = 0usize;
        for iv in &self.intervals {
            if iv.contains(v) {
                matches += 1;
                hit = Some(iv.weight);
            }
        }
        match (matches, hit) {
            (1, Some(w)) => Ok(w),
            _ => Err(SensError::Range {
                variable: self.variable.clone(),
                value,
                matches,
            }),
        }
    }
}

impl TryFrom<RawTable> for BreakpointTable {
    type Error = SensError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::from_specs(raw.variable, &raw.breakpoints)
    }
}

impl From<BreakpointTable> for RawTable {
    fn from(table: BreakpointTable) -> Self {
        RawTable {
            variable: table.variable,
            breakpoints: table.intervals.into_iter().map(IntervalSpec::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope_table() -> BreakpointTable {
        BreakpointTable::from_triples(
            "slope",
            &[(0.0, 5.0, 3.0), (5.0, 15.0, 2.0), (15.0, 90.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn weight_for_respects_half_open_bounds() {
        let t = slope_table();
        assert_eq!(t.weight_for(0.0).unwrap(), 3.0);
        assert_eq!(t.weight_for(4.999).unwrap(), 3.0);
        assert_eq!(t.weight_for(5.0).unwrap(), 2.0);
        assert_eq!(t.weight_for(15.0).unwrap(), 0.0);
    }

    #[test]
    fn value_outside_every_interval_is_range_error() {
        let t = slope_table();
        match t.weight_for(90.0) {
            Err(SensError::Range { variable, value, matches }) => {
                assert_eq!(variable, "slope");
                assert_eq!(value, 90.0);
                assert_eq!(matches, 0);
            }
            other => panic!("expected Range error, got {other:?}"),
        }
        assert!(t.weight_for(-0.5).is_err());
    }

    #[test]
    fn gap_is_accepted_at_build_but_rejected_on_lookup() {
        let t = BreakpointTable::from_triples("d2w", &[(0.0, 100.0, 2.0), (200.0, 500.0, 1.0)]).unwrap();
        assert!(matches!(t.weight_for(150.0), Err(SensError::Range { matches: 0, .. })));
    }

    #[test]
    fn overlapping_or_inverted_intervals_are_rejected() {
        let overlap = BreakpointTable::from_triples("slope", &[(0.0, 10.0, 1.0), (5.0, 20.0, 2.0)]);
        assert!(matches!(overlap, Err(SensError::InvalidBreakpoints { .. })));

        let inverted = BreakpointTable::from_triples("slope", &[(10.0, 0.0, 1.0)]);
        assert!(matches!(inverted, Err(SensError::InvalidBreakpoints { .. })));

        let nan = BreakpointTable::from_triples("slope", &[(f64::NAN, 1.0, 1.0)]);
        assert!(nan.is_err());

        assert!(BreakpointTable::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn json_null_bounds_are_unbounded() {
        let json = r#"{"variable":"elev","breakpoints":[
            {"from":null,"to":0.0,"weight":0.0},
            {"from":0.0,"to":null,"weight":1.0}]}"#;
        let t: BreakpointTable = serde_json::from_str(json).unwrap();
        assert_eq!(t.weight_for(-1.0e6).unwrap(), 0.0);
        assert_eq!(t.weight_for(1.0e6).unwrap(), 1.0);

        let back = serde_json::to_string(&t).unwrap();
        assert!(back.contains("\"from\":null"));
    }

    #[test]
    fn json_overlap_fails_to_deserialize() {
        let json = r#"{"variable":"elev","breakpoints":[
            {"from":0.0,"to":10.0,"weight":0.0},
            {"from":5.0,"to":20.0,"weight":1.0}]}"#;
        assert!(serde_json::from_str::<BreakpointTable>(json).is_err());
    }
}
