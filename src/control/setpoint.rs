//! Формирование уставки угловой скорости
//!
//! Самовыравнивание в режимах ANGLE/HORIZON и ограничение скорости
//! изменения уставки.

use crate::config::flight::{level, rc};
use crate::config::profile::TunableProfile;
use crate::data::{Axis, FlightMode};
use crate::utils::math::constrain;
#[allow(unused_imports)]
use num_traits::Float;

/// Сила самовыравнивания HORIZON: 1.0 при стике в центре, к 0 при полном отклонении
///
/// `transition` задает, как быстро сила спадает; 0 отключает самовыравнивание.
pub fn horizon_level_strength(most_deflected: f32, transition: u8) -> f32 {
    if transition == 0 {
        return 0.0;
    }

    let deflection = constrain(most_deflected.abs(), 0.0, rc::STICK_RANGE);
    let strength = (rc::STICK_RANGE - deflection) / rc::STICK_RANGE;
    constrain((strength - 1.0) * (100.0 / f32::from(transition)) + 1.0, 0.0, 1.0)
}

/// Ошибка угла в градусах
///
/// Угол от стика (плюс смещение навигации) ограничивается максимальным
/// наклоном; все входы в децеградусах.
pub fn error_angle(rc_command: f32, bias: f32, attitude: f32, trim: f32, max_inclination: f32) -> f32 {
    let commanded = constrain(
        level::STICK_TO_ANGLE * rc_command + bias,
        -max_inclination,
        max_inclination,
    );
    (commanded - attitude + trim) / level::DECIDEGREES_PER_DEGREE
}

/// Ограничение изменения уставки за такт
///
/// `previous` всегда обновляется результатом; нулевой предел отключает ограничение.
#[inline]
pub fn limit_velocity(setpoint: f32, previous: &mut f32, max_velocity: f32) -> f32 {
    let limited = if max_velocity > 0.0 {
        constrain(setpoint, *previous - max_velocity, *previous + max_velocity)
    } else {
        setpoint
    };
    *previous = limited;
    limited
}

/// Самовыравнивание по параметрам уровня из профиля
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointShaper {
    angle_gain: f32,
    horizon_gain: f32,
    horizon_transition: u8,
    max_inclination: f32,
}

impl SetpointShaper {
    pub fn from_profile(profile: &TunableProfile) -> Self {
        Self {
            angle_gain: f32::from(profile.level_angle_gain),
            horizon_gain: f32::from(profile.level_horizon_gain),
            horizon_transition: profile.horizon_transition,
            max_inclination: f32::from(profile.max_angle_inclination),
        }
    }

    /// Сила самовыравнивания для режима; вне HORIZON не используется
    pub fn horizon_strength(&self, mode: FlightMode, stick_deflection: [f32; 2]) -> f32 {
        match mode {
            FlightMode::Horizon => {
                let most_deflected = stick_deflection[0].abs().max(stick_deflection[1].abs());
                horizon_level_strength(most_deflected, self.horizon_transition)
            }
            _ => 1.0,
        }
    }

    pub fn max_inclination(&self) -> f32 {
        self.max_inclination
    }

    /// Уставка оси с учетом режима; рыскание и ACRO проходят без изменений
    pub fn level(
        &self,
        axis: Axis,
        mode: FlightMode,
        rate_setpoint: f32,
        error_angle: f32,
        horizon_strength: f32,
    ) -> f32 {
        if !axis.is_levelled() {
            return rate_setpoint;
        }

        match mode {
            FlightMode::Acro => rate_setpoint,
            FlightMode::Angle => error_angle * self.angle_gain / level::GAIN_DIVIDER,
            FlightMode::Horizon => {
                rate_setpoint
                    + error_angle * self.horizon_gain * horizon_strength / level::GAIN_DIVIDER
            }
        }
    }
}
