//! Trend changepoint placement.
//!
//! Changepoints sit on training timestamps, evenly spaced (by index) over the
//! first `range` share of the history. No changepoint is placed on the first
//! observation, since a hinge there would duplicate the base slope.

/// Place up to `requested` changepoints on the normalized times `t`.
///
/// `t` must be sorted. Returns normalized changepoint locations, strictly
/// increasing, possibly fewer than requested on short histories.
pub fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    if requested == 0 || t.len() < 3 {
        return Vec::new();
    }

    let hist = ((t.len() as f64) * range).floor() as usize;
    let hist = hist.min(t.len());
    if hist < 2 {
        return Vec::new();
    }

    // At most one changepoint per eligible observation (excluding the first).
    let k = requested.min(hist - 1);
    let last = (hist - 1) as f64;

    let mut out: Vec<f64> = Vec::with_capacity(k);
    for j in 1..=k {
        let idx = (last * j as f64 / k as f64).round() as usize;
        let c = t[idx];
        if out.last().is_none_or(|&prev| c > prev) {
            out.push(c);
        }
    }
    out
}
