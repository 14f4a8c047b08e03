
// Command table for the SR830, from the programming section of the manual. Commands that take
// an argument are listed without it; the driver appends a single space and the value.

use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::range::{ContinuousRange, DiscreteRange};

// General
pub const IDENTIFY:&str     = "*IDN?";
pub const RESET:&str        = "*RST";
pub const CLEAR_STATUS:&str = "*CLS";

// Where the instrument sends its responses
pub const OUTPUT_TO_RS232:&str = "OUTX 0";
pub const OUTPUT_TO_GPIB:&str  = "OUTX 1";

// Reference oscillator
pub const REFERENCE_EXTERNAL:&str    = "FMOD 0";
pub const REFERENCE_INTERNAL:&str    = "FMOD 1";
pub const REFERENCE_FREQUENCY:&str   = "FREQ";
pub const REFERENCE_PHASE_QUERY:&str = "PHAS?";
pub const SINE_OUTPUT_LEVEL:&str     = "SLVL";

// Input
pub const INPUT_A:&str             = "ISRC 0";
pub const INPUT_A_MINUS_B:&str     = "ISRC 1";
pub const INPUT_I_1M:&str          = "ISRC 2";
pub const INPUT_I_100M:&str        = "ISRC 3";
pub const INPUT_SHIELD_FLOAT:&str  = "IGND 0";
pub const INPUT_SHIELD_GROUND:&str = "IGND 1";
pub const INPUT_COUPLING_AC:&str   = "ICPL 0";
pub const INPUT_COUPLING_DC:&str   = "ICPL 1";
pub const LINE_FILTERS_OFF:&str    = "ILIN 0";
pub const LINE_FILTERS_ON:&str     = "ILIN 3";   // line and 2x line notch

// Gain and time constant
pub const SENSITIVITY:&str         = "SENS";
pub const RESERVE_HIGH:&str        = "RMOD 0";
pub const RESERVE_NORMAL:&str      = "RMOD 1";
pub const RESERVE_LOW_NOISE:&str   = "RMOD 2";
pub const TIME_CONSTANT:&str       = "OFLT";
pub const FILTER_SLOPE:&str        = "OFSL";

// Front panel displays
pub const DISPLAY_CH1_X:&str   = "DDEF 1, 0, 0";
pub const DISPLAY_CH1_R:&str   = "DDEF 1, 1, 0";
pub const DISPLAY_CH2_Y:&str   = "DDEF 2, 0, 0";
pub const DISPLAY_CH2_PHI:&str = "DDEF 2, 1, 0";

// Auto functions
pub const AUTO_GAIN:&str     = "AGAN";
pub const AUTO_RESERVE:&str  = "ARSV";
pub const AUTO_PHASE:&str    = "APHS";
pub const AUTO_OFFSET_X:&str = "AOFF 1";
pub const AUTO_OFFSET_Y:&str = "AOFF 2";
pub const AUTO_OFFSET_R:&str = "AOFF 3";

// Data transfer
pub const READ_X:&str   = "OUTP? 1";
pub const READ_Y:&str   = "OUTP? 2";
pub const READ_R:&str   = "OUTP? 3";
pub const READ_PHI:&str = "OUTP? 4";

// All four outputs sampled at the same instant
pub const READ_SNAPSHOT:&str = "SNAP? 1,2,3,4";

pub const REFERENCE_FREQUENCY_RANGE:ContinuousRange = ContinuousRange::new("Reference frequency", 0.001, 102000.0);
pub const SINE_OUTPUT_LEVEL_RANGE:ContinuousRange   = ContinuousRange::new("Sine output level", 0.004, 5.0);

// Full scale sensitivity in volts, in SENS index order
pub const SENSITIVITY_RANGE:DiscreteRange = DiscreteRange::new("Sensitivity", &[
	2e-9, 5e-9, 10e-9, 20e-9, 50e-9, 100e-9, 200e-9, 500e-9, 1000e-9,
	2e-6, 5e-6, 10e-6, 20e-6, 50e-6, 100e-6, 200e-6, 500e-6, 1000e-6,
	2e-3, 5e-3, 10e-3, 20e-3, 50e-3, 100e-3, 200e-3, 500e-3, 1000e-3,
]);

// Seconds, in OFLT index order
pub const TIME_CONSTANT_RANGE:DiscreteRange = DiscreteRange::new("Time constant", &[
	10e-6, 30e-6, 100e-6, 300e-6,
	1e-3, 3e-3, 10e-3, 30e-3, 100e-3, 300e-3,
	1.0, 3.0, 10.0, 30.0, 100.0, 300.0,
	1e3, 3e3, 10e3, 30e3,
]);

// dB per octave, in OFSL index order
pub const FILTER_SLOPE_RANGE:DiscreteRange = DiscreteRange::new("Filter slope", &[6.0, 12.0, 18.0, 24.0]);

// Which physical interface the instrument should answer on. A serial-attached GPIB adapter looks
// like a serial port to the host, so this can't be worked out from the resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
	Gpib,
	Rs232,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
	Internal,
	External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
	A,
	AMinusB,
	#[serde(rename = "current_1m")]
	Current1M,
	#[serde(rename = "current_100m")]
	Current100M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShield {
	Float,
	Ground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputCoupling {
	Ac,
	Dc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveMode {
	HighReserve,
	Normal,
	LowNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel1Display {
	X,
	R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel2Display {
	Y,
	Phi,
}

// Outputs that can be read with OUTP?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
	X,
	Y,
	R,
	Phi,
}

// Outputs AOFF can zero; there is no auto offset for the phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
	X,
	Y,
	R,
}

impl Interface {
	pub fn command(self) -> &'static str {
		match self {
			Interface::Gpib  => OUTPUT_TO_GPIB,
			Interface::Rs232 => OUTPUT_TO_RS232,
		}
	}
}

impl FromStr for Interface {
	type Err = String;

	fn from_str(s:&str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"gpib"            => Ok(Interface::Gpib),
			"rs232" | "serial" => Ok(Interface::Rs232),
			_ => Err(format!("Unknown interface '{}', expected gpib or rs232", s)),
		}
	}
}

impl ReferenceSource {
	pub fn command(self) -> &'static str {
		match self {
			ReferenceSource::Internal => REFERENCE_INTERNAL,
			ReferenceSource::External => REFERENCE_EXTERNAL,
		}
	}
}

impl InputSource {
	pub fn command(self) -> &'static str {
		match self {
			InputSource::A           => INPUT_A,
			InputSource::AMinusB     => INPUT_A_MINUS_B,
			InputSource::Current1M   => INPUT_I_1M,
			InputSource::Current100M => INPUT_I_100M,
		}
	}
}

impl InputShield {
	pub fn command(self) -> &'static str {
		match self {
			InputShield::Float  => INPUT_SHIELD_FLOAT,
			InputShield::Ground => INPUT_SHIELD_GROUND,
		}
	}
}

impl InputCoupling {
	pub fn command(self) -> &'static str {
		match self {
			InputCoupling::Ac => INPUT_COUPLING_AC,
			InputCoupling::Dc => INPUT_COUPLING_DC,
		}
	}
}

impl ReserveMode {
	pub fn command(self) -> &'static str {
		match self {
			ReserveMode::HighReserve => RESERVE_HIGH,
			ReserveMode::Normal      => RESERVE_NORMAL,
			ReserveMode::LowNoise    => RESERVE_LOW_NOISE,
		}
	}
}

impl Channel1Display {
	pub fn command(self) -> &'static str {
		match self {
			Channel1Display::X => DISPLAY_CH1_X,
			Channel1Display::R => DISPLAY_CH1_R,
		}
	}
}

impl Channel2Display {
	pub fn command(self) -> &'static str {
		match self {
			Channel2Display::Y   => DISPLAY_CH2_Y,
			Channel2Display::Phi => DISPLAY_CH2_PHI,
		}
	}
}

impl Output {
	pub fn read_command(self) -> &'static str {
		match self {
			Output::X   => READ_X,
			Output::Y   => READ_Y,
			Output::R   => READ_R,
			Output::Phi => READ_PHI,
		}
	}
}

impl Offset {
	pub fn command(self) -> &'static str {
		match self {
			Offset::X => AUTO_OFFSET_X,
			Offset::Y => AUTO_OFFSET_Y,
			Offset::R => AUTO_OFFSET_R,
		}
	}
}
