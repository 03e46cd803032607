//! Контекст цикла стабилизации
//!
//! Владеет состоянием всех осей, кэшем коэффициентов и адаптацией по газу.
//! Вызывается планировщиком строго один раз за такт, без аллокаций и блокировок.

use crate::config::flight::{conversions, gyro};
use crate::config::profile::TunableProfile;
use crate::control::gains::{GainCache, GainSet};
use crate::control::pid::{AxisInput, AxisState};
use crate::control::setpoint::{error_angle, limit_velocity, SetpointShaper};
use crate::control::throttle::{tpa_factor, ThrottleIntegralGain};
use crate::data::{Axis, FlightMode, PidBreakdown, TickInputs, TickOutput};
use crate::utils::filters::DtermFilterSettings;

/// Ошибки конфигурации регулятора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Нулевой период цикла
    ZeroLooptime,
}

// Реализация Format для defmt
#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConfigError::ZeroLooptime => defmt::write!(fmt, "Zero control loop period"),
        }
    }
}

/// Регулятор стабилизации по трем осям
pub struct Stabilizer {
    /// Период цикла (мкс)
    looptime_us: u32,
    /// Период цикла (с)
    dt: f32,
    gain_cache: GainCache,
    /// Параметры, по которым собраны фильтры (D и ФНЧ рыскания)
    filter_settings: Option<(DtermFilterSettings, u16)>,
    throttle_gain: ThrottleIntegralGain,
    axes: [AxisState; 3],
}

impl Stabilizer {
    /// Создание регулятора для периода цикла `looptime_us`
    pub fn new(looptime_us: u32) -> Result<Self, ConfigError> {
        if looptime_us == 0 {
            return Err(ConfigError::ZeroLooptime);
        }

        let dt = conversions::looptime_to_secs(looptime_us);
        let no_filters = DtermFilterSettings {
            lpf_hz: 0,
            lpf_type: crate::config::profile::DtermFilterType::Pt1,
            notch_hz: 0,
            notch_cutoff_hz: 0,
        };

        info!("Регулятор стабилизации: период цикла {} мкс", looptime_us);

        Ok(Self {
            looptime_us,
            dt,
            gain_cache: GainCache::new(dt),
            filter_settings: None,
            throttle_gain: ThrottleIntegralGain::new(looptime_us),
            axes: Axis::ALL.map(|axis| AxisState::new(axis, &no_filters, 0, dt)),
        })
    }

    pub fn looptime_us(&self) -> u32 {
        self.looptime_us
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Последние вычисленные коэффициенты
    pub fn gains(&self) -> &GainSet {
        self.gain_cache.gains()
    }

    pub fn axis_state(&self, axis: Axis) -> &AxisState {
        &self.axes[axis.index()]
    }

    /// Текущий множитель I от газа
    pub fn throttle_iterm_gain(&self) -> f32 {
        self.throttle_gain.gain()
    }

    /// Обнуление интеграторов всех осей
    pub fn reset_integrators(&mut self) {
        for state in self.axes.iter_mut() {
            state.reset_integral();
        }
        trace!("Интеграторы сброшены");
    }

    /// Пересборка фильтров при изменении их параметров в профиле
    fn refresh_filters(&mut self, profile: &TunableProfile) {
        let settings = (DtermFilterSettings::from_profile(profile), profile.yaw_lpf_hz);
        if self.filter_settings == Some(settings) {
            return;
        }

        for state in self.axes.iter_mut() {
            state.configure_filters(&settings.0, settings.1, self.dt);
        }
        self.filter_settings = Some(settings);

        debug!(
            "Фильтры D: ФНЧ {} Гц, режекторный {} Гц, ФНЧ рыскания {} Гц",
            settings.0.lpf_hz,
            settings.0.notch_hz,
            settings.1
        );
    }

    /// Один такт: уставки и гироскоп -> поправки по осям
    pub fn update(&mut self, profile: &TunableProfile, inputs: &TickInputs) -> TickOutput {
        self.refresh_filters(profile);

        let gains = self.gain_cache.refresh(profile);
        let shaper = SetpointShaper::from_profile(profile);

        let tpa = tpa_factor(inputs.throttle, profile.tpa_breakpoint, profile.dyn_thr_pid);
        let throttle_iterm_gain = self
            .throttle_gain
            .update(inputs.throttle, profile.iterm_throttle_gain);
        let horizon_strength = shaper.horizon_strength(
            inputs.mode,
            [inputs.stick_deflection.x, inputs.stick_deflection.y],
        );

        let mut output = TickOutput::default();

        for axis in Axis::ALL {
            let i = axis.index();
            let state = &mut self.axes[i];

            // Уставка: самовыравнивание, затем ограничение скорости изменения
            let mut setpoint = inputs.setpoint_rate[i];
            if axis.is_levelled() && inputs.mode != FlightMode::Acro {
                let angle_error = error_angle(
                    inputs.rc_command[i],
                    inputs.angle_bias[i],
                    inputs.attitude[i],
                    inputs.trim[i],
                    shaper.max_inclination(),
                );
                setpoint = shaper.level(axis, inputs.mode, setpoint, angle_error, horizon_strength);
            }
            let setpoint =
                limit_velocity(setpoint, &mut state.previous_setpoint, gains.max_velocity(axis));

            let input = AxisInput {
                setpoint,
                gyro_rate: inputs.gyro_adc[i] / gyro::LSB_PER_DPS,
                rc_input: inputs.rc_input[i],
                tpa_factor: tpa,
                throttle_iterm_gain,
            };
            let mut terms = state.update(gains.axis(axis), gains.tolerance.as_ref(), &input, self.dt);

            // Без взведения интегратор держится на нуле
            if !inputs.armed {
                state.reset_integral();
                terms.i = 0.0;
            }

            // Выключенная стабилизация обнуляет только выход, состояние обновлено выше
            output.axis[i] = if inputs.stabilization_enabled {
                terms.output()
            } else {
                0
            };
            output.breakdown[i] = PidBreakdown {
                p: terms.p,
                i: terms.i,
                d: terms.d,
                dterm_unfiltered: terms.dterm_unfiltered,
                setpoint,
            };
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::DtermFilterType;
    use crate::utils::filters::DtermFilterChain;
    use nalgebra::{Vector2, Vector3};

    const LOOPTIME_US: u32 = 1000;

    fn plain_profile() -> TunableProfile {
        TunableProfile {
            dyn_thr_pid: 0,
            dterm_lpf_hz: 0,
            dterm_notch_hz: 0,
            yaw_lpf_hz: 0,
            rate_accel_limit: 0,
            yaw_rate_accel_limit: 0,
            tolerance_band: 0,
            iterm_throttle_gain: 0,
            ..TunableProfile::default()
        }
    }

    fn armed_inputs(setpoint: [f32; 3], gyro_dps: [f32; 3]) -> TickInputs {
        TickInputs {
            gyro_adc: Vector3::from(gyro_dps) * gyro::LSB_PER_DPS,
            setpoint_rate: Vector3::from(setpoint),
            throttle: 1500,
            armed: true,
            stabilization_enabled: true,
            ..TickInputs::default()
        }
    }

    #[test]
    fn test_zero_looptime_rejected() {
        assert_eq!(Stabilizer::new(0).err(), Some(ConfigError::ZeroLooptime));
        let stabilizer = Stabilizer::new(125).unwrap();
        assert!((stabilizer.dt() - 0.000125).abs() < 1e-9);
        assert_eq!(stabilizer.looptime_us(), 125);
    }

    #[test]
    fn test_output_and_integral_bounds() {
        let profile = TunableProfile {
            p: [200, 200, 200],
            i: [200, 200, 200],
            d: [200, 200, 0],
            ..TunableProfile::default()
        };
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();

        for n in 0..2000 {
            let sign = if (n / 37) % 2 == 0 { 1.0 } else { -1.0 };
            let inputs = TickInputs {
                throttle: 1000 + (n % 1000) as u16,
                ..armed_inputs(
                    [sign * 900.0, -sign * 600.0, sign * 300.0],
                    [-sign * 400.0, sign * 800.0, 0.0],
                )
            };
            let out = stabilizer.update(&profile, &inputs);
            for axis in Axis::ALL {
                assert!((-900..=900).contains(&out.get(axis)));
                let integral = stabilizer.axis_state(axis).integral();
                assert!((-250.0..=250.0).contains(&integral));
            }
        }
    }

    #[test]
    fn test_disabled_stabilization_keeps_state_continuity() {
        let profile = plain_profile();
        let mut enabled = Stabilizer::new(LOOPTIME_US).unwrap();
        let mut disabled = Stabilizer::new(LOOPTIME_US).unwrap();

        let inputs = armed_inputs([50.0, -30.0, 20.0], [10.0, 5.0, -5.0]);
        let off = TickInputs {
            stabilization_enabled: false,
            ..inputs
        };

        for _ in 0..100 {
            enabled.update(&profile, &inputs);
            let out = disabled.update(&profile, &off);
            assert_eq!(out.axis, [0, 0, 0]);
        }

        for axis in Axis::ALL {
            let a = enabled.axis_state(axis).integral();
            let b = disabled.axis_state(axis).integral();
            assert!(a != 0.0);
            assert_eq!(a, b);
        }

        // После включения выходы совпадают с непрерывно работавшим регулятором
        let a = enabled.update(&profile, &inputs);
        let b = disabled.update(&profile, &inputs);
        assert_eq!(a, b);
        assert_ne!(b.axis, [0, 0, 0]);
    }

    #[test]
    fn test_disarmed_holds_integral_at_zero() {
        let profile = plain_profile();
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = TickInputs {
            armed: false,
            ..armed_inputs([100.0, 100.0, 100.0], [0.0; 3])
        };
        for _ in 0..50 {
            let out = stabilizer.update(&profile, &inputs);
            assert!(out.breakdown.iter().all(|b| b.i == 0.0));
        }
        for axis in Axis::ALL {
            assert_eq!(stabilizer.axis_state(axis).integral(), 0.0);
        }
    }

    #[test]
    fn test_reset_integrators() {
        let profile = plain_profile();
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = armed_inputs([100.0, 100.0, 100.0], [0.0; 3]);
        for _ in 0..10 {
            stabilizer.update(&profile, &inputs);
        }
        assert!(stabilizer.axis_state(Axis::Roll).integral() > 0.0);
        stabilizer.reset_integrators();
        for axis in Axis::ALL {
            assert_eq!(stabilizer.axis_state(axis).integral(), 0.0);
        }
    }

    #[test]
    fn test_setpoint_velocity_limit_per_axis_class() {
        let profile = TunableProfile {
            rate_accel_limit: 5,
            yaw_rate_accel_limit: 2,
            ..plain_profile()
        };
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let roll_pitch_limit = 5.0 * 1000.0 * 0.001;
        let yaw_limit = 2.0 * 1000.0 * 0.001;

        let mut previous = [0.0f32; 3];
        for n in 0..300 {
            let target = if (n / 40) % 2 == 0 { 600.0 } else { -600.0 };
            let out = stabilizer.update(&profile, &armed_inputs([target, -target, target], [0.0; 3]));
            for axis in Axis::ALL {
                let limit = if axis == Axis::Yaw { yaw_limit } else { roll_pitch_limit };
                let sp = out.breakdown[axis.index()].setpoint;
                assert!((sp - previous[axis.index()]).abs() <= limit + 1e-3);
                previous[axis.index()] = sp;
            }
        }
    }

    #[test]
    fn test_angle_mode_levels_roll_pitch_only() {
        let profile = TunableProfile {
            level_angle_gain: 50,
            max_angle_inclination: 700,
            ..plain_profile()
        };
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = TickInputs {
            mode: FlightMode::Angle,
            rc_command: Vector3::new(100.0, 0.0, 0.0),
            attitude: Vector2::new(0.0, 50.0),
            ..armed_inputs([300.0, 300.0, 120.0], [0.0; 3])
        };
        let out = stabilizer.update(&profile, &inputs);

        // Крен: 2 * 100 = 200 децеградусов -> 20° * 50 / 10
        assert!((out.breakdown[0].setpoint - 100.0).abs() < 1e-4);
        // Тангаж: -50 децеградусов -> -5° * 50 / 10
        assert!((out.breakdown[1].setpoint + 25.0).abs() < 1e-4);
        // Рыскание не выравнивается
        assert_eq!(out.breakdown[2].setpoint, 120.0);
    }

    #[test]
    fn test_horizon_mode_assist_fades_with_stick() {
        let profile = TunableProfile {
            level_horizon_gain: 40,
            horizon_transition: 100,
            ..plain_profile()
        };
        let base = TickInputs {
            mode: FlightMode::Horizon,
            attitude: Vector2::new(-100.0, 0.0),
            ..armed_inputs([0.0; 3], [0.0; 3])
        };

        let mut centred = Stabilizer::new(LOOPTIME_US).unwrap();
        let out = centred.update(&profile, &base);
        // 10° * 40 * 1.0 / 10
        assert!((out.breakdown[0].setpoint - 40.0).abs() < 1e-4);

        let mut deflected = Stabilizer::new(LOOPTIME_US).unwrap();
        let out = deflected.update(
            &profile,
            &TickInputs {
                stick_deflection: Vector2::new(500.0, 0.0),
                ..base
            },
        );
        assert_eq!(out.breakdown[0].setpoint, 0.0);
    }

    #[test]
    fn test_throttle_coupling_through_loop() {
        let profile = TunableProfile {
            iterm_throttle_gain: 1,
            ..plain_profile()
        };
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let mut inputs = armed_inputs([0.0; 3], [0.0; 3]);
        inputs.throttle = 1200;
        for _ in 0..19 {
            stabilizer.update(&profile, &inputs);
        }
        assert_eq!(stabilizer.throttle_iterm_gain(), 1.0);
        inputs.throttle = 1300;
        stabilizer.update(&profile, &inputs);
        assert!((stabilizer.throttle_iterm_gain() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_profile_changes_reach_gains_and_filters() {
        let mut profile = plain_profile();
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = armed_inputs([0.0; 3], [0.0; 3]);

        stabilizer.update(&profile, &inputs);
        assert_eq!(*stabilizer.axis_state(Axis::Roll).dterm_filter(), DtermFilterChain::None);
        let kp_before = stabilizer.gains().axis(Axis::Roll).kp;

        profile.p[0] = 90;
        profile.dterm_lpf_hz = 100;
        profile.dterm_filter_type = DtermFilterType::Pt1;
        stabilizer.update(&profile, &inputs);

        assert!(stabilizer.gains().axis(Axis::Roll).kp > kp_before);
        assert!(matches!(
            stabilizer.axis_state(Axis::Roll).dterm_filter(),
            DtermFilterChain::LowPass(_)
        ));
        assert_eq!(*stabilizer.axis_state(Axis::Yaw).dterm_filter(), DtermFilterChain::None);
    }

    #[test]
    fn test_zero_notch_cutoff_keeps_roll_output_alive() {
        let profile = TunableProfile {
            dterm_notch_hz: 200,
            dterm_notch_cutoff: 0,
            ..plain_profile()
        };
        let mut stabilizer = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = armed_inputs([300.0, 0.0, 0.0], [0.0; 3]);

        for _ in 0..5 {
            let out = stabilizer.update(&profile, &inputs);
            assert!(out.breakdown[0].d.is_finite());
            assert!(out.breakdown[0].p > 0.0);
            assert!(out.get(Axis::Roll) > 0);
        }
        assert_eq!(*stabilizer.axis_state(Axis::Roll).dterm_filter(), DtermFilterChain::None);
    }

    #[test]
    fn test_tpa_attenuates_pterm_at_full_throttle() {
        let profile = TunableProfile {
            dyn_thr_pid: 50,
            tpa_breakpoint: 1500,
            ..plain_profile()
        };
        let mut low = Stabilizer::new(LOOPTIME_US).unwrap();
        let mut high = Stabilizer::new(LOOPTIME_US).unwrap();
        let inputs = armed_inputs([100.0, 0.0, 0.0], [0.0; 3]);

        let p_low = low.update(&profile, &TickInputs { throttle: 1400, ..inputs }).breakdown[0].p;
        let p_high = high.update(&profile, &TickInputs { throttle: 2000, ..inputs }).breakdown[0].p;
        assert!((p_high - p_low * 0.5).abs() < 1e-4);
    }
}
