pub mod config;
pub mod round;
pub mod stats;
pub mod validation;
