pub mod control_task;
pub mod diagnostics_task;
