pub mod cell;
pub mod config;
pub mod day;
pub mod grid;

pub use cell::*;
pub use config::*;
pub use day::*;
pub use grid::*;
