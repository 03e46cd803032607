//! Связь газа с усилением регулятора
//!
//! Резкое изменение газа возмущает положение, поэтому I временно усиливается
//! (обратный TPA), а на большом газе P и D ослабляются (TPA).

use crate::config::flight::{limits, rc, throttle_window};
use crate::utils::math::constrain;

/// Адаптация интегрального усиления по изменению газа за окно ~20 мс
#[derive(Debug, Clone)]
pub struct ThrottleIntegralGain {
    /// Длина окна в тактах
    window_len: u32,
    /// Тактов с начала окна
    loop_count: u32,
    /// Газ в начале окна
    window_start_throttle: Option<u16>,
    /// Текущий множитель I
    gain: f32,
}

impl ThrottleIntegralGain {
    pub fn new(looptime_us: u32) -> Self {
        Self {
            window_len: (throttle_window::PERIOD_US / looptime_us.max(1)).max(1),
            loop_count: 0,
            window_start_throttle: None,
            gain: 1.0,
        }
    }

    /// Учет такта; возвращает множитель I (1.0 при нулевой связи)
    pub fn update(&mut self, throttle: u16, coupling: u8) -> f32 {
        if coupling == 0 {
            self.reset();
            return self.gain;
        }

        let start = *self.window_start_throttle.get_or_insert(throttle);
        self.loop_count += 1;

        if self.loop_count >= self.window_len {
            let factor = f32::from(coupling) * throttle_window::GAIN_SCALE;
            let delta = f32::from(throttle.abs_diff(start));
            self.gain = 1.0 + constrain(delta * factor, 0.0, limits::THROTTLE_ITERM_GAIN);
            self.window_start_throttle = Some(throttle);
            self.loop_count = 0;
        }

        self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn window_len(&self) -> u32 {
        self.window_len
    }

    pub fn reset(&mut self) {
        self.loop_count = 0;
        self.window_start_throttle = None;
        self.gain = 1.0;
    }
}

/// Множитель TPA: 1.0 до точки начала, далее линейно до `1 - dyn_thr_pid/100` на полном газе
pub fn tpa_factor(throttle: u16, breakpoint: u16, dyn_thr_pid: u8) -> f32 {
    let attenuation = f32::from(dyn_thr_pid) / 100.0;

    let factor = if throttle < breakpoint {
        1.0
    } else if throttle < rc::THROTTLE_MAX && breakpoint < rc::THROTTLE_MAX {
        let span = f32::from(rc::THROTTLE_MAX - breakpoint);
        1.0 - attenuation * f32::from(throttle - breakpoint) / span
    } else {
        1.0 - attenuation
    };

    constrain(factor, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length() {
        assert_eq!(ThrottleIntegralGain::new(1000).window_len(), 20);
        assert_eq!(ThrottleIntegralGain::new(125).window_len(), 160);
        assert_eq!(ThrottleIntegralGain::new(50_000).window_len(), 1);
    }

    #[test]
    fn test_disabled_coupling_keeps_unity() {
        let mut adapter = ThrottleIntegralGain::new(1000);
        for n in 0..100u16 {
            assert_eq!(adapter.update(1000 + n * 10, 0), 1.0);
        }
    }

    #[test]
    fn test_gain_after_window() {
        let mut adapter = ThrottleIntegralGain::new(1000);
        // Окно начинается на 1200, завершается на 1300: |Δ| = 100, коэффициент 0.001
        assert_eq!(adapter.update(1200, 1), 1.0);
        for _ in 0..18 {
            assert_eq!(adapter.update(1250, 1), 1.0);
        }
        let gain = adapter.update(1300, 1);
        assert!((gain - 1.1).abs() < 1e-6);

        // Между окнами множитель держится
        assert!((adapter.update(1300, 1) - 1.1).abs() < 1e-6);
        assert!((adapter.gain() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_gain_is_capped() {
        let mut adapter = ThrottleIntegralGain::new(1000);
        adapter.update(1000, 255);
        let mut gain = 0.0;
        for _ in 0..19 {
            gain = adapter.update(2000, 255);
        }
        assert!((gain - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_steady_throttle_returns_to_unity() {
        let mut adapter = ThrottleIntegralGain::new(1000);
        adapter.update(1000, 10);
        for _ in 0..19 {
            adapter.update(1500, 10);
        }
        assert!(adapter.gain() > 1.0);
        for _ in 0..20 {
            adapter.update(1500, 10);
        }
        assert_eq!(adapter.gain(), 1.0);
    }

    #[test]
    fn test_tpa_factor() {
        assert_eq!(tpa_factor(1500, 1700, 45), 1.0);
        assert_eq!(tpa_factor(1700, 1700, 45), 1.0);
        assert!((tpa_factor(1850, 1700, 45) - (1.0 - 0.45 * 0.5)).abs() < 1e-6);
        assert!((tpa_factor(2000, 1700, 45) - 0.55).abs() < 1e-6);
        assert!((tpa_factor(2100, 1700, 45) - 0.55).abs() < 1e-6);
        assert_eq!(tpa_factor(2000, 1700, 0), 1.0);
    }
}
