//! Конфигурация прошивки

pub mod hardware;
