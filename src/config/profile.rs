//! Профиль настраиваемых параметров регулятора
//!
//! Профиль хранится и загружается внешним модулем конфигурации; ядро его только читает.

use crate::config::flight::rc;

/// Тип фильтра нижних частот D-составляющей
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DtermFilterType {
    /// Однополюсный RC-фильтр
    Pt1,
    /// Биквадратный фильтр Баттерворта
    Biquad,
}

/// Сырые значения профиля PID
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunableProfile {
    /// P по осям (крен, тангаж, рыскание)
    pub p: [u8; 3],
    /// I по осям
    pub i: [u8; 3],
    /// D по осям (D рыскания не используется)
    pub d: [u8; 3],

    /// Усиление уровня в режиме ANGLE
    pub level_angle_gain: u8,
    /// Усиление самовыравнивания в режиме HORIZON
    pub level_horizon_gain: u8,
    /// Чувствительность перехода HORIZON (0 - самовыравнивание выключено)
    pub horizon_transition: u8,
    /// Максимальный наклон в режимах уровня (децеградусы)
    pub max_angle_inclination: u16,

    /// Вес уставки в P-канале (%)
    pub pterm_setpoint_weight: u8,
    /// Вес уставки в D-канале (%)
    pub dterm_setpoint_weight: u8,

    /// Предел ускорения уставки крена/тангажа (0 - без ограничения)
    pub rate_accel_limit: u16,
    /// Предел ускорения уставки рыскания (0 - без ограничения)
    pub yaw_rate_accel_limit: u16,

    /// Порог уставки, выше которого I не накапливается, крен/тангаж (°/s)
    pub roll_pitch_iterm_ignore_rate: u16,
    /// То же для рыскания
    pub yaw_iterm_ignore_rate: u16,

    /// Связь газа и I (×0.001, 0 - выключено)
    pub iterm_throttle_gain: u8,

    /// Зона подавления колебаний около уставки (°/s, 0 - выключено)
    pub tolerance_band: u8,
    /// Минимальный множитель усиления внутри зоны (%)
    pub tolerance_band_reduction: u8,
    /// Сколько пересечений нуля допускается до ослабления
    pub zero_cross_allowance_count: u8,

    /// Частота среза ФНЧ P-составляющей рыскания (Гц, 0 - выключен)
    pub yaw_lpf_hz: u16,
    /// Частота среза ФНЧ D-составляющей (Гц, 0 - выключен)
    pub dterm_lpf_hz: u16,
    /// Тип ФНЧ D-составляющей
    pub dterm_filter_type: DtermFilterType,
    /// Центр режекторного фильтра D (Гц, 0 - выключен)
    pub dterm_notch_hz: u16,
    /// Нижняя граница режекторного фильтра D (Гц)
    pub dterm_notch_cutoff: u16,

    /// Ослабление PID на полном газе (%), TPA
    pub dyn_thr_pid: u8,
    /// Газ, с которого начинается ослабление
    pub tpa_breakpoint: u16,
}

impl Default for TunableProfile {
    fn default() -> Self {
        Self {
            p: [45, 58, 70],
            i: [40, 50, 45],
            d: [20, 22, 0],
            level_angle_gain: 50,
            level_horizon_gain: 50,
            horizon_transition: 100,
            max_angle_inclination: 700,
            pterm_setpoint_weight: 80,
            dterm_setpoint_weight: 50,
            rate_accel_limit: 0,
            yaw_rate_accel_limit: 220,
            roll_pitch_iterm_ignore_rate: 200,
            yaw_iterm_ignore_rate: 50,
            iterm_throttle_gain: 0,
            tolerance_band: 0,
            tolerance_band_reduction: 40,
            zero_cross_allowance_count: 2,
            yaw_lpf_hz: 0,
            dterm_lpf_hz: 100,
            dterm_filter_type: DtermFilterType::Biquad,
            dterm_notch_hz: 260,
            dterm_notch_cutoff: 160,
            dyn_thr_pid: 45,
            tpa_breakpoint: 1700,
        }
    }
}

/// Ошибки проверки профиля
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// Вес уставки больше 100%
    SetpointWeight,
    /// Минимальный множитель зоны больше 100%
    ToleranceReduction,
    /// Нижняя граница режекторного фильтра нулевая или не ниже центра
    NotchCutoff,
    /// Частота среза не ниже частоты Найквиста цикла
    AboveNyquist(u16),
    /// Точка начала TPA вне диапазона газа
    TpaBreakpoint,
}

// Реализация Format для defmt
#[cfg(feature = "defmt")]
impl defmt::Format for ProfileError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ProfileError::SetpointWeight => defmt::write!(fmt, "Setpoint weight above 100%"),
            ProfileError::ToleranceReduction => {
                defmt::write!(fmt, "Tolerance band reduction above 100%")
            }
            ProfileError::NotchCutoff => defmt::write!(fmt, "Notch cutoff zero or not below notch centre"),
            ProfileError::AboveNyquist(hz) => {
                defmt::write!(fmt, "Filter cutoff {} Hz above Nyquist", hz)
            }
            ProfileError::TpaBreakpoint => defmt::write!(fmt, "TPA breakpoint out of range"),
        }
    }
}

impl TunableProfile {
    /// Проверка профиля для заданного периода цикла (мкс)
    ///
    /// Вызывается при загрузке профиля, вне такта управления.
    pub fn validate(&self, looptime_us: u32) -> Result<(), ProfileError> {
        if self.pterm_setpoint_weight > 100 || self.dterm_setpoint_weight > 100 {
            return Err(ProfileError::SetpointWeight);
        }

        if self.tolerance_band_reduction > 100 {
            return Err(ProfileError::ToleranceReduction);
        }

        if self.dterm_notch_hz != 0
            && (self.dterm_notch_cutoff == 0 || self.dterm_notch_cutoff >= self.dterm_notch_hz)
        {
            return Err(ProfileError::NotchCutoff);
        }

        // Частота Найквиста: половина частоты цикла
        let nyquist_hz = if looptime_us == 0 {
            0
        } else {
            500_000 / looptime_us
        };
        for hz in [self.yaw_lpf_hz, self.dterm_lpf_hz, self.dterm_notch_hz] {
            if hz != 0 && u32::from(hz) >= nyquist_hz {
                return Err(ProfileError::AboveNyquist(hz));
            }
        }

        if !(rc::THROTTLE_MIN..=rc::THROTTLE_MAX).contains(&self.tpa_breakpoint) {
            return Err(ProfileError::TpaBreakpoint);
        }

        Ok(())
    }
}
