//! Подавление колебаний около уставки
//!
//! Пока ошибка внутри зоны, допускается заданное число смен знака ошибки;
//! после этого усиление P и D снижается пропорционально величине ошибки.

use crate::utils::math::constrain;
#[allow(unused_imports)]
use num_traits::Float;

/// Параметры зоны (из профиля)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    /// Порог ошибки (°/s)
    pub threshold: f32,
    /// Нижняя граница множителя усиления
    pub min_reduction: f32,
    /// Сколько смен знака ошибки допускается без ослабления
    pub allowance: u8,
}

impl ToleranceBand {
    /// Нулевой порог выключает подавление
    pub fn new(threshold: u8, reduction_percent: u8, allowance: u8) -> Option<Self> {
        (threshold != 0).then(|| Self {
            threshold: f32::from(threshold),
            min_reduction: constrain(f32::from(reduction_percent) / 100.0, 0.0, 1.0),
            allowance,
        })
    }
}

/// Знак ошибки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorPolarity {
    #[default]
    Positive,
    Negative,
}

impl ErrorPolarity {
    #[inline]
    fn of(error: f32) -> Self {
        if error > 0.0 {
            ErrorPolarity::Positive
        } else {
            ErrorPolarity::Negative
        }
    }
}

/// Состояние подавления по одной оси
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HuntingSuppressor {
    zero_cross_count: u8,
    polarity: ErrorPolarity,
}

impl HuntingSuppressor {
    /// Множитель усиления для текущей ошибки, в диапазоне [min_reduction, 1.0]
    pub fn reduction(&mut self, error: f32, band: &ToleranceBand) -> f32 {
        let magnitude = error.abs();

        if magnitude >= band.threshold {
            self.zero_cross_count = band.allowance;
            self.polarity = ErrorPolarity::of(error);
            return 1.0;
        }

        if self.zero_cross_count > 0 {
            match self.polarity {
                ErrorPolarity::Positive if error < 0.0 => {
                    self.zero_cross_count -= 1;
                    self.polarity = ErrorPolarity::Negative;
                }
                ErrorPolarity::Negative if error > 0.0 => {
                    self.zero_cross_count -= 1;
                    self.polarity = ErrorPolarity::Positive;
                }
                _ => {}
            }
            1.0
        } else {
            constrain(magnitude / band.threshold, band.min_reduction, 1.0)
        }
    }

    pub fn zero_cross_count(&self) -> u8 {
        self.zero_cross_count
    }

    pub fn polarity(&self) -> ErrorPolarity {
        self.polarity
    }
}
