//! Ядро стабилизации мультикоптера по угловым скоростям
//!
//! Один вызов [`Stabilizer::update`] на каждый такт цикла управления:
//! уставки и показания гироскопа превращаются в ограниченные поправки
//! по осям крена, тангажа и рыскания для микшера моторов.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod data;
pub mod utils;

pub use config::profile::{DtermFilterType, ProfileError, TunableProfile};
pub use control::stabilizer::{ConfigError, Stabilizer};
pub use data::{Axis, FlightMode, PidBreakdown, TickInputs, TickOutput};
