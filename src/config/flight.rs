//! Константы регулятора угловых скоростей

/// Масштабы коэффициентов PID (сырое значение профиля -> рабочий коэффициент)
pub mod scale {
    /// Пропорциональный коэффициент
    pub const PTERM: f32 = 0.032029;
    /// Интегральный коэффициент
    pub const ITERM: f32 = 0.244381;
    /// Дифференциальный коэффициент
    pub const DTERM: f32 = 0.000529;
    /// Весовые коэффициенты уставки задаются в процентах
    pub const SETPOINT_WEIGHT: f32 = 100.0;
}

/// Параметры гироскопа
pub mod gyro {
    /// Чувствительность при диапазоне ±2000°/s (LSB на °/s)
    pub const LSB_PER_DPS: f32 = 16.4;
}

/// Ограничения выходов регулятора
pub mod limits {
    /// Предел интегральной составляющей
    pub const ITERM: f32 = 250.0;
    /// Предел суммарного выхода по оси
    pub const OUTPUT: i32 = 900;
    /// Предел множителя усиления I от газа (сверх единицы)
    pub const THROTTLE_ITERM_GAIN: f32 = 5.0;
    /// Коэффициент подавления I при больших уставках
    pub const ITERM_IGNORE_SLOPE: f32 = 1.5;
}

/// Параметры стиков и газа
pub mod rc {
    /// Максимальное отклонение стика от центра
    pub const STICK_RANGE: f32 = 500.0;
    /// Минимальное значение газа
    pub const THROTTLE_MIN: u16 = 1000;
    /// Максимальное значение газа
    pub const THROTTLE_MAX: u16 = 2000;
}

/// Параметры режимов самовыравнивания
pub mod level {
    /// Углы передаются в децеградусах
    pub const DECIDEGREES_PER_DEGREE: f32 = 10.0;
    /// Делитель усиления уровня (ANGLE/HORIZON)
    pub const GAIN_DIVIDER: f32 = 10.0;
    /// Команда стика переводится в угол с этим множителем
    pub const STICK_TO_ANGLE: f32 = 2.0;
}

/// Окно адаптации интегрального усиления по газу
pub mod throttle_window {
    /// Длительность окна (мкс), ~50 Гц
    pub const PERIOD_US: u32 = 20_000;
    /// Масштаб коэффициента связи газа и I
    pub const GAIN_SCALE: f32 = 0.001;
}

/// Ограничения скорости изменения уставки
pub mod velocity {
    /// Предел ускорения задается в единицах по 1000 °/s²
    pub const ACCEL_SCALE: f32 = 1000.0;
}

/// Преобразование единиц измерения
pub mod conversions {
    /// Период цикла в секундах по периоду в микросекундах
    pub const fn looptime_to_secs(looptime_us: u32) -> f32 {
        looptime_us as f32 * 1e-6
    }
}
