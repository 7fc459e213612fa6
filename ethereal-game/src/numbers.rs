//! Numeric conversion helpers for values that arrive as JSON numbers.

use num_traits::cast::cast;

/// Floor a f64, saturating at the i64 range and returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let floored = value.floor();
    // i64::MAX has no exact f64; anything the cast rejects lies past one end.
    cast::<f64, i64>(floored).unwrap_or(if floored < 0.0 { i64::MIN } else { i64::MAX })
}

/// Floor a f64 and clamp it to the i32 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    let wide = floor_f64_to_i64(value);
    i32::try_from(wide).unwrap_or(if wide < 0 { i32::MIN } else { i32::MAX })
}

/// Ceil a f64 and clamp it to the i32 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = f64::from(i32::MIN);
    let max = f64::from(i32::MAX);
    let clamped = value.clamp(min, max).ceil();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Widen an i32 to f64 for bonus sums.
#[must_use]
pub fn i32_to_f64(value: i32) -> f64 {
    f64::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_negatives_and_non_finite() {
        assert_eq!(floor_f64_to_i64(2.9), 2);
        assert_eq!(floor_f64_to_i64(-2.1), -3);
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
        assert_eq!(floor_f64_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn wide_floor_saturates() {
        assert_eq!(floor_f64_to_i64(1e19), i64::MAX);
        assert_eq!(floor_f64_to_i64(-1e19), i64::MIN);
        assert_eq!(floor_f64_to_i64(2f64.powi(63)), i64::MAX);
        assert_eq!(floor_f64_to_i64(-(2f64.powi(63))), i64::MIN);
    }

    #[test]
    fn narrow_floor_saturates() {
        assert_eq!(floor_f64_to_i32(1e12), i32::MAX);
        assert_eq!(floor_f64_to_i32(-1e12), i32::MIN);
        assert_eq!(floor_f64_to_i32(-0.5), -1);
    }

    #[test]
    fn ceil_rounds_up_fractional_thresholds() {
        assert_eq!(ceil_f64_to_i32(12.5), 13);
        assert_eq!(ceil_f64_to_i32(12.0), 12);
        assert_eq!(ceil_f64_to_i32(f64::NAN), 0);
    }
}
