//! Rolling-window primitives over price columns.
//!
//! Every function returns a vector aligned with its input; positions inside
//! the warm-up window (or with an undefined value) hold `f64::NAN`.

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut window_sum: f64 = values[..period].iter().sum();
    out[period - 1] = window_sum / period as f64;
    for i in period..values.len() {
        window_sum += values[i] - values[i - period];
        out[i] = window_sum / period as f64;
    }

    out
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    let mut previous = seed;
    for i in period..values.len() {
        previous = (values[i] - previous) * multiplier + previous;
        out[i] = previous;
    }

    out
}

/// EMA over a series that itself starts with NaN warm-up values.
fn ema_skip_nan(values: &[f64], period: usize) -> Vec<f64> {
    let first_valid = values.iter().position(|v| v.is_finite());
    let mut out = vec![f64::NAN; values.len()];
    if let Some(start) = first_valid {
        let tail = ema(&values[start..], period);
        out[start..].copy_from_slice(&tail);
    }
    out
}

/// Population standard deviation over a trailing window.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        out[i] = variance.sqrt();
    }

    out
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = values[i + 1 - period..=i]
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    }
    out
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = values[i + 1 - period..=i]
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b));
    }
    out
}

/// `(value - mean) / std` over a trailing window. A flat window has no
/// z-score.
pub fn rolling_zscore(values: &[f64], period: usize) -> Vec<f64> {
    let means = sma(values, period);
    let stds = rolling_std(values, period);
    values
        .iter()
        .zip(means.iter().zip(stds.iter()))
        .map(|(&value, (&mean, &std))| {
            if std.is_finite() && std > 0.0 {
                (value - mean) / std
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Pearson correlation of two aligned series over a trailing window.
pub fn rolling_corr(left: &[f64], right: &[f64], period: usize) -> Vec<f64> {
    let n = left.len().min(right.len());
    let mut out = vec![f64::NAN; left.len()];
    if period < 2 || n < period {
        return out;
    }

    for i in (period - 1)..n {
        let xs = &left[i + 1 - period..=i];
        let ys = &right[i + 1 - period..=i];
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            continue;
        }
        let mean_x = xs.iter().sum::<f64>() / period as f64;
        let mean_y = ys.iter().sum::<f64>() / period as f64;
        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in xs.iter().zip(ys.iter()) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }
        let denom = (var_x * var_y).sqrt();
        if denom > 0.0 {
            out[i] = cov / denom;
        }
    }

    out
}

/// Share of the trailing window (current value included) that is at or
/// below the current value, in `[0, 1]`.
pub fn rolling_percentile_rank(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let current = values[i];
        let window = &values[i + 1 - period..=i];
        let at_or_below = window.iter().filter(|&&v| v <= current).count();
        out[i] = at_or_below as f64 / period as f64;
    }
    out
}

fn rsi_from_avgs(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Wilder RSI. The first defined value is at index `period`.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period + 1 {
        return out;
    }

    let mut sum_gain = 0.0f64;
    let mut sum_loss = 0.0f64;
    for i in 1..=period {
        let delta = prices[i] - prices[i - 1];
        if delta >= 0.0 {
            sum_gain += delta;
        } else {
            sum_loss += -delta;
        }
    }

    let mut avg_gain = sum_gain / period as f64;
    let mut avg_loss = sum_loss / period as f64;
    out[period] = rsi_from_avgs(avg_gain, avg_loss);

    for i in (period + 1)..prices.len() {
        let delta = prices[i] - prices[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out[i] = rsi_from_avgs(avg_gain, avg_loss);
    }

    out
}

/// Returns `(macd_line, signal_line, histogram)`.
pub fn macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast = ema(prices, fast_period);
    let slow = ema(prices, slow_period);
    let macd_line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal_line = ema_skip_nan(&macd_line, signal_period);
    let histogram = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();
    (macd_line, signal_line, histogram)
}

pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; high.len()];
    for i in 1..high.len() {
        out[i] = (high[i] - low[i])
            .max((high[i] - close[i - 1]).abs())
            .max((low[i] - close[i - 1]).abs());
    }
    out
}

/// ATR as the simple average of true range; first defined at index `period`.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tr = true_range(high, low, close);
    let mut out = vec![f64::NAN; high.len()];
    if period == 0 || high.len() < period + 1 {
        return out;
    }
    let mut window_sum: f64 = tr[1..=period].iter().sum();
    out[period] = window_sum / period as f64;
    for i in (period + 1)..high.len() {
        window_sum += tr[i] - tr[i - period];
        out[i] = window_sum / period as f64;
    }
    out
}

/// Rate of change in percent over `period` bars.
pub fn roc(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; prices.len()];
    if period == 0 {
        return out;
    }
    for i in period..prices.len() {
        let base = prices[i - period];
        if base != 0.0 {
            out[i] = (prices[i] - base) / base * 100.0;
        }
    }
    out
}

/// One-bar fractional change. A zero base leaves the value undefined.
pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    for i in period..values.len() {
        let base = values[i - period];
        if base != 0.0 && base.is_finite() && values[i].is_finite() {
            out[i] = values[i] / base - 1.0;
        }
    }
    out
}

/// Williams %R in `[-100, 0]`; a flat window reads -50.
pub fn williams_r(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let highest = rolling_max(high, period);
    let lowest = rolling_min(low, period);
    let mut out = vec![f64::NAN; close.len()];
    for i in 0..close.len() {
        let (hh, ll) = (highest[i], lowest[i]);
        if !hh.is_finite() || !ll.is_finite() {
            continue;
        }
        out[i] = if hh == ll {
            -50.0
        } else {
            (hh - close[i]) / (hh - ll) * -100.0
        };
    }
    out
}

pub fn crosses_above(series: &[f64], threshold: f64) -> Vec<bool> {
    let mut out = vec![false; series.len()];
    for i in 1..series.len() {
        let (prev, current) = (series[i - 1], series[i]);
        out[i] = prev.is_finite() && current.is_finite() && prev <= threshold && current > threshold;
    }
    out
}

pub fn crosses_below(series: &[f64], threshold: f64) -> Vec<bool> {
    let mut out = vec![false; series.len()];
    for i in 1..series.len() {
        let (prev, current) = (series[i - 1], series[i]);
        out[i] = prev.is_finite() && current.is_finite() && prev >= threshold && current < threshold;
    }
    out
}

/// Element-wise `left > right`; NaN on either side is false.
pub fn above(left: &[f64], right: &[f64]) -> Vec<bool> {
    left.iter().zip(right.iter()).map(|(l, r)| l > r).collect()
}

pub fn below(left: &[f64], right: &[f64]) -> Vec<bool> {
    left.iter().zip(right.iter()).map(|(l, r)| l < r).collect()
}

/// Clamp into `[0, 1]`, substituting `0.5` for undefined values.
pub fn normalize_strength(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}
