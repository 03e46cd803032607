#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Duration, Timer};
use rate_stabilizer::TunableProfile;
use {defmt_rtt as _, panic_probe as _};

mod config;
mod data;
mod tasks;
mod utils;

use crate::config::hardware::system::{CONTROL_LOOPTIME_US, HEARTBEAT_MS};
use crate::data::{LevelReference, ModeFlags, RcSnapshot, SensorSnapshot, SYSTEM_STATE};
use crate::tasks::*;
use utils::system_info;

/// Точка входа в программу
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Инициализация HAL Raspberry Pi Pico
    let p = embassy_rp::init(Default::default());

    defmt::info!("=== Стабилизатор угловых скоростей v0.1.0 ===");
    defmt::info!("Инициализация системы...");
    system_info::print_clock_info();

    if let Err(e) = system_info::validate_clocks() {
        defmt::error!("Ошибка конфигурации частот: {}", e);
        panic!("Invalid clock configuration");
    }

    // Светодиод индикации состояния
    let mut led = Output::new(p.PIN_25, Level::Low);

    for _ in 0..3 {
        led.set_high();
        Timer::after(Duration::from_millis(100)).await;
        led.set_low();
        Timer::after(Duration::from_millis(100)).await;
    }

    // Профиль настройки
    let profile = TunableProfile::default();
    match profile.validate(CONTROL_LOOPTIME_US) {
        Ok(()) => SYSTEM_STATE.set_profile(profile),
        Err(e) => {
            // Без профиля стабилизатор работает на значениях по умолчанию
            defmt::error!("Профиль отклонен: {}", e);
        }
    }

    // Стартовое состояние: газ в минимуме, без стабилизации, пока ее не включит
    // модуль режимов
    SYSTEM_STATE.publish_sensors(SensorSnapshot {
        gyro_adc: [0.0; 3],
        attitude: [0.0; 2],
    });
    SYSTEM_STATE.publish_rc(RcSnapshot {
        setpoint_rate: [0.0; 3],
        rc_command: [0.0; 3],
        rc_input: [0.0; 3],
        stick_deflection: [0.0; 2],
        throttle: 1000,
    });
    SYSTEM_STATE.publish_modes(ModeFlags {
        angle_mode: false,
        horizon_mode: false,
        stabilization_enabled: false,
    });
    SYSTEM_STATE.publish_level_reference(LevelReference {
        trim: [0.0; 2],
        angle_bias: [0.0; 2],
    });

    defmt::info!("Запуск задач...");

    // Цикл стабилизации на высокоприоритетном исполнителе
    let control_spawner = config::hardware::interrupt_executor!(SWI_IRQ_1, P1);
    control_spawner.spawn(control_task::task()).unwrap();

    spawner.spawn(diagnostics_task::task()).unwrap();

    defmt::info!("Система инициализирована");

    loop {
        led.toggle();
        Timer::after(Duration::from_millis(HEARTBEAT_MS)).await;
    }
}
