// src/data/mod.rs
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use nalgebra::{Vector2, Vector3};
use rate_stabilizer::{FlightMode, TickInputs, TickOutput, TunableProfile};

/// Размер буфера канала диагностики
const DIAGNOSTICS_CHANNEL_SIZE: usize = 8;

/// Снимок датчиков, публикуемый модулем оценки положения
#[derive(Clone, Copy, Debug)]
pub struct SensorSnapshot {
    pub gyro_adc: [f32; 3],    // Гироскоп (LSB)
    pub attitude: [f32; 2],    // Крен/тангаж (децеградусы)
}

/// Снимок команд приемника
#[derive(Clone, Copy, Debug)]
pub struct RcSnapshot {
    pub setpoint_rate: [f32; 3],    // Уставка скорости (°/s)
    pub rc_command: [f32; 3],       // Команда стика (±500)
    pub rc_input: [f32; 3],         // Доля восстановления ошибки (0.0 - 1.0)
    pub stick_deflection: [f32; 2], // Отклонение стиков от центра
    pub throttle: u16,              // Газ (1000 - 2000)
}

/// Опорные углы самовыравнивания: триммеры и смещение от навигации
#[derive(Clone, Copy, Debug)]
pub struct LevelReference {
    pub trim: [f32; 2],       // Децеградусы
    pub angle_bias: [f32; 2], // Децеградусы
}

/// Флаги режимов от модуля управления режимами
#[derive(Clone, Copy, Debug)]
pub struct ModeFlags {
    pub angle_mode: bool,
    pub horizon_mode: bool,
    pub stabilization_enabled: bool,
}

/// Кадр диагностики из цикла стабилизации
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticsFrame {
    pub output: TickOutput,
    pub elapsed_us: u32,
}

/// Общее состояние системы: последние снимки входов, читаемые в начале такта
pub struct SystemState {
    pub armed: AtomicBool,
    pub overruns: AtomicU32,
    sensors: Mutex<CriticalSectionRawMutex, Cell<SensorSnapshot>>,
    rc: Mutex<CriticalSectionRawMutex, Cell<RcSnapshot>>,
    modes: Mutex<CriticalSectionRawMutex, Cell<ModeFlags>>,
    level: Mutex<CriticalSectionRawMutex, Cell<LevelReference>>,
    profile: Mutex<CriticalSectionRawMutex, Cell<Option<TunableProfile>>>,
}

impl SystemState {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
            sensors: Mutex::new(Cell::new(SensorSnapshot {
                gyro_adc: [0.0; 3],
                attitude: [0.0; 2],
            })),
            rc: Mutex::new(Cell::new(RcSnapshot {
                setpoint_rate: [0.0; 3],
                rc_command: [0.0; 3],
                rc_input: [0.0; 3],
                stick_deflection: [0.0; 2],
                throttle: 1000,
            })),
            modes: Mutex::new(Cell::new(ModeFlags {
                angle_mode: false,
                horizon_mode: false,
                stabilization_enabled: false,
            })),
            level: Mutex::new(Cell::new(LevelReference {
                trim: [0.0; 2],
                angle_bias: [0.0; 2],
            })),
            profile: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish_sensors(&self, snapshot: SensorSnapshot) {
        self.sensors.lock(|cell| cell.set(snapshot));
    }

    pub fn publish_rc(&self, snapshot: RcSnapshot) {
        self.rc.lock(|cell| cell.set(snapshot));
    }

    pub fn publish_modes(&self, flags: ModeFlags) {
        self.modes.lock(|cell| cell.set(flags));
    }

    pub fn publish_level_reference(&self, level: LevelReference) {
        self.level.lock(|cell| cell.set(level));
    }

    /// Замена активного профиля (применяется со следующего такта)
    pub fn set_profile(&self, profile: TunableProfile) {
        self.profile.lock(|cell| cell.set(Some(profile)));
    }

    /// Активный профиль
    pub fn profile(&self) -> TunableProfile {
        self.profile.lock(|cell| cell.get()).unwrap_or_default()
    }

    /// Сборка входов такта из последних снимков
    pub fn tick_inputs(&self) -> TickInputs {
        let sensors = self.sensors.lock(|cell| cell.get());
        let rc = self.rc.lock(|cell| cell.get());
        let modes = self.modes.lock(|cell| cell.get());
        let level = self.level.lock(|cell| cell.get());

        TickInputs {
            gyro_adc: Vector3::from(sensors.gyro_adc),
            setpoint_rate: Vector3::from(rc.setpoint_rate),
            rc_command: Vector3::from(rc.rc_command),
            rc_input: Vector3::from(rc.rc_input),
            stick_deflection: Vector2::from(rc.stick_deflection),
            attitude: Vector2::from(sensors.attitude),
            trim: Vector2::from(level.trim),
            angle_bias: Vector2::from(level.angle_bias),
            throttle: rc.throttle,
            mode: FlightMode::resolve(modes.angle_mode, modes.horizon_mode),
            armed: self.armed.load(Ordering::Relaxed),
            stabilization_enabled: modes.stabilization_enabled,
        }
    }
}

/// Каналы для передачи данных между задачами
pub struct DataChannels {
    /// Последние поправки для микшера моторов
    pub output: Signal<CriticalSectionRawMutex, TickOutput>,
    /// Прореженные кадры для диагностики
    pub diagnostics: Channel<CriticalSectionRawMutex, DiagnosticsFrame, DIAGNOSTICS_CHANNEL_SIZE>,
}

impl DataChannels {
    pub const fn new() -> Self {
        Self {
            output: Signal::new(),
            diagnostics: Channel::new(),
        }
    }
}

// Статические экземпляры для глобального доступа
pub static CHANNELS: DataChannels = DataChannels::new();
pub static SYSTEM_STATE: SystemState = SystemState::new();
