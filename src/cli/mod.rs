pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod globals;
mod start;
pub mod telemetry;

pub use self::start::start;
