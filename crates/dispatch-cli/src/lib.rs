pub mod config;
pub mod input;

pub use config::{Config, CorridorMargin};
