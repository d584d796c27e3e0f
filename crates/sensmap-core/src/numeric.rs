/// Decimal places kept on reported metrics.
pub const REPORT_DECIMALS: i32 = 3;

/// Round to `places` decimals. NaN stays NaN.
#[inline]
pub fn round_to(x: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (x * scale).round() / scale
}

/// Round to the reporting precision.
#[inline]
pub fn round3(x: f64) -> f64 {
    round_to(x, REPORT_DECIMALS)
}

/// `num / den`, or NaN when `den` is zero.
#[inline]
pub fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        f64::NAN
    } else {
        num / den
    }
}

/// Index of the first maximum among non-NaN values.
pub fn first_argmax<I: IntoIterator<Item = f64>>(values: I) -> Option<usize> {
    first_best(values, |candidate, best| candidate > best)
}

/// Index of the first minimum among non-NaN values.
pub fn first_argmin<I: IntoIterator<Item = f64>>(values: I) -> Option<usize> {
    first_best(values, |candidate, best| candidate < best)
}

fn first_best<I, F>(values: I, better: F) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Smallest f64 strictly greater than `x`. NaN and +inf map to themselves.
pub fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}
