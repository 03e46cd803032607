//! Данные, которыми ядро обменивается с внешними модулями за один такт

use nalgebra::{Vector2, Vector3};

/// Ось управления
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Roll = 0,
    Pitch = 1,
    Yaw = 2,
}

impl Axis {
    /// Все оси в порядке обработки
    pub const ALL: [Axis; 3] = [Axis::Roll, Axis::Pitch, Axis::Yaw];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Оси, к которым применяется самовыравнивание
    #[inline(always)]
    pub const fn is_levelled(self) -> bool {
        !matches!(self, Axis::Yaw)
    }
}

/// Режим полета, вычисляемый один раз за такт
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightMode {
    /// Чистое управление угловыми скоростями
    #[default]
    Acro,
    /// Стик задает угол
    Angle,
    /// Скорости со стика плюс самовыравнивание у центра стика
    Horizon,
}

impl FlightMode {
    /// Разрешение флагов режимов: ANGLE имеет приоритет над HORIZON
    pub const fn resolve(angle_mode: bool, horizon_mode: bool) -> Self {
        if angle_mode {
            FlightMode::Angle
        } else if horizon_mode {
            FlightMode::Horizon
        } else {
            FlightMode::Acro
        }
    }
}

/// Входные данные одного такта (снимок на начало такта)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickInputs {
    /// Отфильтрованный гироскоп (LSB, 16.4 LSB = 1°/s)
    pub gyro_adc: Vector3<f32>,
    /// Уставка угловой скорости (°/s)
    pub setpoint_rate: Vector3<f32>,
    /// Команда стика (±500)
    pub rc_command: Vector3<f32>,
    /// Коэффициент восстановления полной ошибки в P-канале (0.0 - 1.0)
    pub rc_input: Vector3<f32>,
    /// Отклонение стиков крена/тангажа от центра (0 - 500)
    pub stick_deflection: Vector2<f32>,
    /// Измеренные углы крена/тангажа (децеградусы)
    pub attitude: Vector2<f32>,
    /// Триммеры углов (децеградусы)
    pub trim: Vector2<f32>,
    /// Дополнительное смещение угла от навигации (децеградусы)
    pub angle_bias: Vector2<f32>,
    /// Газ (1000 - 2000)
    pub throttle: u16,
    pub mode: FlightMode,
    pub armed: bool,
    /// Выключение стабилизации обнуляет выход, но не состояние
    pub stabilization_enabled: bool,
}

impl Default for TickInputs {
    fn default() -> Self {
        Self {
            gyro_adc: Vector3::zeros(),
            setpoint_rate: Vector3::zeros(),
            rc_command: Vector3::zeros(),
            rc_input: Vector3::zeros(),
            stick_deflection: Vector2::zeros(),
            attitude: Vector2::zeros(),
            trim: Vector2::zeros(),
            angle_bias: Vector2::zeros(),
            throttle: 1000,
            mode: FlightMode::Acro,
            armed: false,
            stabilization_enabled: false,
        }
    }
}

/// Составляющие PID по оси (для blackbox и отладки)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidBreakdown {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// D до фильтрации
    pub dterm_unfiltered: f32,
    /// Уставка после формирования (°/s)
    pub setpoint: f32,
}

/// Результат такта
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutput {
    /// Поправка по осям для микшера (±900)
    pub axis: [i16; 3],
    pub breakdown: [PidBreakdown; 3],
}

impl TickOutput {
    #[inline(always)]
    pub fn get(&self, axis: Axis) -> i16 {
        self.axis[axis.index()]
    }
}
