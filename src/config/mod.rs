//! Конфигурация ядра стабилизации

pub mod flight;
pub mod profile;
