//! Вспомогательные функции и фильтры

pub mod filters;
pub mod math;
