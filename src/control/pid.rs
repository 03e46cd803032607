//! PID регулятор угловой скорости с двумя степенями свободы
//!
//! P и D каналы используют уставку со своими весами (b и c), I работает по
//! полной ошибке. D по рысканию не вычисляется.

use crate::config::flight::limits;
use crate::control::deadband::{HuntingSuppressor, ToleranceBand};
use crate::control::gains::AxisGains;
use crate::data::Axis;
use crate::utils::filters::{DtermFilterChain, DtermFilterSettings, Pt1Filter};
use crate::utils::math::{constrain, round_to_limit};
#[allow(unused_imports)]
use num_traits::Float;

/// Входы оси на текущем такте
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisInput {
    /// Сформированная уставка (°/s)
    pub setpoint: f32,
    /// Измеренная угловая скорость (°/s)
    pub gyro_rate: f32,
    /// Доля полной ошибки, возвращаемая в P-канал (0.0 - 1.0)
    pub rc_input: f32,
    /// Множитель TPA
    pub tpa_factor: f32,
    /// Множитель I от изменения газа
    pub throttle_iterm_gain: f32,
}

/// Составляющие выхода оси
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisTerms {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// D до фильтрации (для отладки фильтров)
    pub dterm_unfiltered: f32,
}

impl AxisTerms {
    /// Округленный и ограниченный выход оси; рыскание ограничивается тем же ±900
    #[inline]
    pub fn output(&self) -> i16 {
        round_to_limit(self.p + self.i + self.d, limits::OUTPUT) as i16
    }
}

/// Состояние одной оси, живет все время работы регулятора
#[derive(Debug, Clone)]
pub struct AxisState {
    axis: Axis,
    /// Уставка прошлого такта после ограничения скорости
    pub previous_setpoint: f32,
    /// Сигнал D-канала прошлого такта
    last_rate_error: f32,
    /// Накопитель I, всегда в [-250, 250]
    integral: f32,
    hunting: HuntingSuppressor,
    dterm_filter: DtermFilterChain,
    /// ФНЧ P-составляющей рыскания
    yaw_filter: Option<Pt1Filter>,
}

impl AxisState {
    pub fn new(axis: Axis, settings: &DtermFilterSettings, yaw_lpf_hz: u16, dt: f32) -> Self {
        let mut state = Self {
            axis,
            previous_setpoint: 0.0,
            last_rate_error: 0.0,
            integral: 0.0,
            hunting: HuntingSuppressor::default(),
            dterm_filter: DtermFilterChain::None,
            yaw_filter: None,
        };
        state.configure_filters(settings, yaw_lpf_hz, dt);
        state
    }

    /// Пересборка фильтров под новые параметры профиля
    pub fn configure_filters(&mut self, settings: &DtermFilterSettings, yaw_lpf_hz: u16, dt: f32) {
        match self.axis {
            Axis::Yaw => {
                self.dterm_filter = DtermFilterChain::None;
                self.yaw_filter =
                    (yaw_lpf_hz != 0).then(|| Pt1Filter::new(f32::from(yaw_lpf_hz), dt));
            }
            _ => {
                self.dterm_filter = DtermFilterChain::new(settings, dt);
                self.yaw_filter = None;
            }
        }
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn dterm_filter(&self) -> &DtermFilterChain {
        &self.dterm_filter
    }

    /// Один такт регулятора оси
    pub fn update(
        &mut self,
        gains: &AxisGains,
        tolerance: Option<&ToleranceBand>,
        input: &AxisInput,
        dt: f32,
    ) -> AxisTerms {
        let setpoint = input.setpoint;
        let pv = input.gyro_rate;

        // r - y
        let error = setpoint - pv;

        // b*r - y, с постепенным возвратом полной ошибки при отклонении стика
        let mut p_path = gains.pterm_setpoint_weight * setpoint - pv;
        p_path += (error - p_path) * constrain(input.rc_input, 0.0, 1.0);

        // Ослабление P и D: TPA и подавление колебаний около уставки
        let mut dyn_reduction = input.tpa_factor;
        if let Some(band) = tolerance {
            dyn_reduction *= self.hunting.reduction(error, band);
        }
        let dyn_reduction = constrain(dyn_reduction, 0.0, 1.0);

        let mut p = gains.kp * p_path * dyn_reduction;

        // I: подавление накопления при больших уставках и усиление от газа
        let setpoint_scaler = if gains.iterm_ignore_rate > 0.0 {
            constrain(
                1.0 - limits::ITERM_IGNORE_SLOPE * setpoint.abs() / gains.iterm_ignore_rate,
                0.0,
                1.0,
            )
        } else {
            1.0
        };
        let iterm_scaler = setpoint_scaler * input.throttle_iterm_gain;
        self.integral = constrain(
            self.integral + gains.ki * error * dt * iterm_scaler,
            -limits::ITERM,
            limits::ITERM,
        );
        let i = self.integral;

        if self.axis == Axis::Yaw {
            if let Some(filter) = self.yaw_filter.as_mut() {
                p = filter.apply(p);
            }
            return AxisTerms {
                p,
                i,
                d: 0.0,
                dterm_unfiltered: 0.0,
            };
        }

        // c*r - y, дискретная производная
        let d_path = gains.dterm_setpoint_weight * setpoint - pv;
        let delta = (d_path - self.last_rate_error) / dt;
        self.last_rate_error = d_path;

        let dterm_unfiltered = gains.kd * delta * dyn_reduction;
        let delta = self.dterm_filter.apply(delta);

        AxisTerms {
            p,
            i,
            d: gains.kd * delta * dyn_reduction,
            dterm_unfiltered,
        }
    }
}
