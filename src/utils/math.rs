//! Математические функции и утилиты

/// Ограничение значения в заданных пределах
#[inline(always)]
pub fn constrain(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Ограничение целочисленного значения в заданных пределах
#[inline(always)]
pub fn constrain_i32(value: i32, min: i32, max: i32) -> i32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Округление до ближайшего целого с насыщением по пределу
///
/// Половины округляются к четному.
#[inline]
pub fn round_to_limit(value: f32, limit: i32) -> i32 {
    let rounded = libm::rintf(constrain(value, -(limit as f32) - 1.0, limit as f32 + 1.0));
    constrain_i32(rounded as i32, -limit, limit)
}

// Модульные тесты
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrain() {
        assert_eq!(constrain(5.0, 0.0, 10.0), 5.0);
        assert_eq!(constrain(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(constrain(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_constrain_i32() {
        assert_eq!(constrain_i32(950, -900, 900), 900);
        assert_eq!(constrain_i32(-950, -900, 900), -900);
        assert_eq!(constrain_i32(12, -900, 900), 12);
    }

    #[test]
    fn test_round_to_limit() {
        assert_eq!(round_to_limit(10.4, 900), 10);
        assert_eq!(round_to_limit(10.6, 900), 11);
        assert_eq!(round_to_limit(-10.6, 900), -11);
        assert_eq!(round_to_limit(1000.0, 900), 900);
        assert_eq!(round_to_limit(-1.0e9, 900), -900);
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to_limit(10.5, 900), 10);
        assert_eq!(round_to_limit(11.5, 900), 12);
        assert_eq!(round_to_limit(-10.5, 900), -10);
        assert_eq!(round_to_limit(0.5, 900), 0);
        assert_eq!(round_to_limit(899.5, 900), 900);
    }
}
