//! Контур стабилизации по угловым скоростям

pub mod deadband;
pub mod gains;
pub mod pid;
pub mod setpoint;
pub mod stabilizer;
pub mod throttle;
