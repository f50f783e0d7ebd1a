pub mod commands;
pub mod layout;
pub mod telemetry;
