//! Special functions and root finding for the Ebisu model.

use crate::error::{Result, SrsError};
use std::f64::consts::PI;

/// Relative width at which `solve_decreasing` stops.
pub const SOLVER_TOLERANCE: f64 = 1e-10;

const MAX_BRACKET_STEPS: usize = 1100;
const MAX_BISECTIONS: usize = 200;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for `x > 0` (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection keeps small arguments accurate.
        return (PI / (PI * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Natural log of the beta function.
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// `ln(sum(w_i * exp(l_i)))` for weights of either sign.
///
/// Returns `None` when the sum is not positive.
pub fn signed_log_sum_exp(terms: &[(f64, f64)]) -> Option<f64> {
    let max = terms
        .iter()
        .filter(|(w, _)| *w != 0.0)
        .map(|(_, l)| *l)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    let sum: f64 = terms
        .iter()
        .filter(|(w, _)| *w != 0.0)
        .map(|(w, l)| w * (l - max).exp())
        .sum();
    if sum > 0.0 && sum.is_finite() {
        Some(max + sum.ln())
    } else {
        None
    }
}

/// Find `x > 0` with `f(x) = target` for a strictly decreasing `f`.
///
/// Brackets geometrically from `guess`, then bisects on a log scale until the
/// bracket's relative width is below [`SOLVER_TOLERANCE`]. Returns the upper
/// end of the final bracket, so `f(x) <= target` holds for the result.
pub fn solve_decreasing<F>(f: F, target: f64, guess: f64) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    let failed = |what: &str| {
        SrsError::Numeric(format!(
            "could not {what} root for target {target} from guess {guess}"
        ))
    };
    if !(guess.is_finite() && guess > 0.0) {
        return Err(failed("start"));
    }

    let mut lo = guess;
    let mut hi = guess;
    let mut steps = 0;
    while f(hi) > target {
        hi *= 2.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS || !hi.is_finite() {
            return Err(failed("bracket"));
        }
    }
    steps = 0;
    while f(lo) < target {
        lo /= 2.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS || lo == 0.0 {
            return Err(failed("bracket"));
        }
    }

    for _ in 0..MAX_BISECTIONS {
        if hi / lo - 1.0 < SOLVER_TOLERANCE {
            break;
        }
        let mid = (lo * hi).sqrt();
        let value = f(mid);
        if value.is_nan() {
            return Err(failed("evaluate"));
        }
        if value > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(hi)
}
