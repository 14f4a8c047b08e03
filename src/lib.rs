
// Crate-wide error type and Result alias
pub mod error;

// Legal-value tables and the round-up resolution used for range-limited settings
pub mod range;

// The text session an instrument is reached through: serial port, or an in-memory stand-in for tests
pub mod transport;

// Drivers for instruments reached over a transport
pub mod devices;

// Capacitance/impedance formulas and least squares fitting
pub mod utils;

// Frequency plans and the sweep loop
pub mod sweep;

// CSV and JSON output of sweep results
pub mod export;

// TOML measurement settings
pub mod config;

pub use crate::devices::sr830::Sr830;
pub use crate::error::{Error, Result};
