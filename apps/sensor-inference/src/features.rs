//! Lag feature windows for the per-sensor regressors.
//!
//! Lag vectors are oldest-first: element `0` is the reading `n_lags` steps
//! back, the last element is the most recent one. Forecast artifacts must be
//! fitted with lag columns in that same order (`lag_n, ..., lag_1`).

/// Trailing `n_lags` readings, or `None` when the history is too short.
pub fn lag_window(history: &[f64], n_lags: usize) -> Option<&[f64]> {
    if n_lags == 0 || history.len() < n_lags {
        return None;
    }
    Some(&history[history.len() - n_lags..])
}

/// Splits off the most recent reading and returns the lag window that
/// precedes it. Needs at least `n_lags + 1` readings.
pub fn holdout_window(history: &[f64], n_lags: usize) -> Option<(&[f64], f64)> {
    let (last, rest) = history.split_last()?;
    let window = lag_window(rest, n_lags)?;
    Some((window, *last))
}
