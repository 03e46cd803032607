//! Кэш рабочих коэффициентов регулятора
//!
//! Сырые целые значения профиля масштабируются в рабочие коэффициенты только
//! при изменении соответствующих полей профиля.

use crate::config::flight::{scale, velocity};
use crate::config::profile::TunableProfile;
use crate::control::deadband::ToleranceBand;
use crate::data::Axis;

/// Рабочие коэффициенты одной оси
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Вес уставки в P-канале (b)
    pub pterm_setpoint_weight: f32,
    /// Вес уставки в D-канале (c)
    pub dterm_setpoint_weight: f32,
    /// Порог уставки для подавления накопления I (°/s, 0 - без подавления)
    pub iterm_ignore_rate: f32,
}

/// Полный набор рабочих коэффициентов
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainSet {
    pub axes: [AxisGains; 3],
    /// Предел изменения уставки крена/тангажа за такт (°/s, 0 - без ограничения)
    pub roll_pitch_max_velocity: f32,
    /// Предел изменения уставки рыскания за такт
    pub yaw_max_velocity: f32,
    /// Зона подавления колебаний, если включена
    pub tolerance: Option<ToleranceBand>,
}

impl GainSet {
    /// Масштабирование профиля для периода цикла `dt` (с)
    pub fn from_source(source: &GainSource, dt: f32) -> Self {
        let mut axes = [AxisGains::default(); 3];
        for axis in Axis::ALL {
            let i = axis.index();
            axes[i] = AxisGains {
                kp: scale::PTERM * f32::from(source.p[i]),
                ki: scale::ITERM * f32::from(source.i[i]),
                kd: scale::DTERM * f32::from(source.d[i]),
                pterm_setpoint_weight: f32::from(source.pterm_setpoint_weight)
                    / scale::SETPOINT_WEIGHT,
                dterm_setpoint_weight: f32::from(source.dterm_setpoint_weight)
                    / scale::SETPOINT_WEIGHT,
                iterm_ignore_rate: f32::from(match axis {
                    Axis::Yaw => source.yaw_iterm_ignore_rate,
                    _ => source.roll_pitch_iterm_ignore_rate,
                }),
            };
        }

        Self {
            axes,
            roll_pitch_max_velocity: f32::from(source.rate_accel_limit) * velocity::ACCEL_SCALE * dt,
            yaw_max_velocity: f32::from(source.yaw_rate_accel_limit) * velocity::ACCEL_SCALE * dt,
            tolerance: ToleranceBand::new(
                source.tolerance_band,
                source.tolerance_band_reduction,
                source.zero_cross_allowance_count,
            ),
        }
    }

    #[inline(always)]
    pub fn axis(&self, axis: Axis) -> &AxisGains {
        &self.axes[axis.index()]
    }

    /// Предел изменения уставки для класса оси
    #[inline(always)]
    pub fn max_velocity(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Yaw => self.yaw_max_velocity,
            _ => self.roll_pitch_max_velocity,
        }
    }
}

/// Поля профиля, от которых зависит [`GainSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainSource {
    pub p: [u8; 3],
    pub i: [u8; 3],
    pub d: [u8; 3],
    pub pterm_setpoint_weight: u8,
    pub dterm_setpoint_weight: u8,
    pub rate_accel_limit: u16,
    pub yaw_rate_accel_limit: u16,
    pub roll_pitch_iterm_ignore_rate: u16,
    pub yaw_iterm_ignore_rate: u16,
    pub tolerance_band: u8,
    pub tolerance_band_reduction: u8,
    pub zero_cross_allowance_count: u8,
}

impl GainSource {
    pub fn from_profile(profile: &TunableProfile) -> Self {
        Self {
            p: profile.p,
            i: profile.i,
            d: profile.d,
            pterm_setpoint_weight: profile.pterm_setpoint_weight,
            dterm_setpoint_weight: profile.dterm_setpoint_weight,
            rate_accel_limit: profile.rate_accel_limit,
            yaw_rate_accel_limit: profile.yaw_rate_accel_limit,
            roll_pitch_iterm_ignore_rate: profile.roll_pitch_iterm_ignore_rate,
            yaw_iterm_ignore_rate: profile.yaw_iterm_ignore_rate,
            tolerance_band: profile.tolerance_band,
            tolerance_band_reduction: profile.tolerance_band_reduction,
            zero_cross_allowance_count: profile.zero_cross_allowance_count,
        }
    }
}

/// Мемоизированный [`GainSet`]: снимок исходных полей и производные коэффициенты
#[derive(Debug, Clone)]
pub struct GainCache {
    dt: f32,
    source: Option<GainSource>,
    gains: GainSet,
}

impl GainCache {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            source: None,
            gains: GainSet::default(),
        }
    }

    /// Актуальные коэффициенты для профиля; пересчет только при изменении полей
    pub fn refresh(&mut self, profile: &TunableProfile) -> &GainSet {
        let source = GainSource::from_profile(profile);
        if self.source != Some(source) {
            self.gains = GainSet::from_source(&source, self.dt);
            self.source = Some(source);
            debug!(
                "PID коэффициенты пересчитаны: P {} {} {}",
                source.p[0],
                source.p[1],
                source.p[2]
            );
        }
        &self.gains
    }

    /// Последние вычисленные коэффициенты
    pub fn gains(&self) -> &GainSet {
        &self.gains
    }

    /// Сброс снимка: следующий `refresh` пересчитает коэффициенты
    pub fn invalidate(&mut self) {
        self.source = None;
    }
}
