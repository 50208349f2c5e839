pub mod color;
pub mod config;
pub mod constants;
pub mod diff;
pub mod geo;
pub mod options;
