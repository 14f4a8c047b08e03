
// Measurement settings, loaded from a TOML file.
//
// Every field has a default, so a settings file only needs to name what
// differs from the standard capacitance setup:
//
// [connection]
// resource = "ASRL3::INSTR"
// interface = "gpib"
//
// [lockin]
// time_constant_s = 1.0
// sensitivity_v = 0.2
//
// [sweep]
// amplitude_v = 0.004
// settle_ms = 4000
// frequencies = { kind = "log", start = 100.0, stop = 100000.0, points = 10 }
//
// [output]
// csv = "capacitance.csv"

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::devices::sr830::commands::{
    Channel1Display, Channel2Display, InputCoupling, InputShield, InputSource, Interface,
    ReferenceSource, ReserveMode, FILTER_SLOPE_RANGE, REFERENCE_FREQUENCY_RANGE,
    SENSITIVITY_RANGE, SINE_OUTPUT_LEVEL_RANGE, TIME_CONSTANT_RANGE,
};
use crate::devices::sr830::Sr830;
use crate::error::{Error, Result};
use crate::sweep::{self, FrequencyPlan, SweepPlan};
use crate::transport::{serial::DEFAULT_BAUD_RATE, Transport, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub connection: ConnectionSettings,
    pub lockin: LockinSettings,
    pub sweep: SweepSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSettings {
    pub resource: String,
    pub interface: Interface,
    pub baud_rate: u32,
    pub timeout_ms: u64,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockinSettings {
    pub reference: ReferenceSource,
    pub input: InputSource,
    pub shield: InputShield,
    pub coupling: InputCoupling,
    pub line_filters: bool,
    pub reserve: ReserveMode,
    pub time_constant_s: f64,
    pub sensitivity_v: f64,
    pub filter_slope_db: f64,
    pub channel1_display: Channel1Display,
    pub channel2_display: Channel2Display,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSettings {
    pub amplitude_v: f64,
    pub settle_ms: u64,
    // When set, the wait is this many time constants and settle_ms is ignored
    pub settle_time_constants: Option<f64>,
    pub auto_phase: bool,
    pub frequencies: FrequencyPlan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            resource: "ASRL3::INSTR".to_owned(),
            interface: Interface::Rs232,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
        }
    }
}

impl Default for LockinSettings {
    fn default() -> Self {
        Self {
            reference: ReferenceSource::Internal,
            input: InputSource::Current100M,
            shield: InputShield::Float,
            coupling: InputCoupling::Dc,
            line_filters: true,
            reserve: ReserveMode::Normal,
            time_constant_s: 0.3,
            sensitivity_v: 0.05,
            filter_slope_db: 12.0,
            channel1_display: Channel1Display::X,
            channel2_display: Channel2Display::Y,
        }
    }
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            amplitude_v: 0.004,
            settle_ms: 4000,
            settle_time_constants: None,
            auto_phase: true,
            frequencies: FrequencyPlan::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Unable to read {}: {}", path.display(), e)))?;
        let settings = Self::from_toml_str(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    // Catches anything the instrument would refuse before a port is opened
    pub fn validate(&self) -> Result<()> {
        let time_constant_s = TIME_CONSTANT_RANGE.resolve(self.lockin.time_constant_s)?;
        SENSITIVITY_RANGE.resolve(self.lockin.sensitivity_v)?;
        FILTER_SLOPE_RANGE.resolve(self.lockin.filter_slope_db)?;
        SINE_OUTPUT_LEVEL_RANGE.check(self.sweep.amplitude_v)?;
        for f in self.sweep.frequencies.frequencies()? {
            REFERENCE_FREQUENCY_RANGE.check(f)?;
        }
        self.sweep.settle(time_constant_s)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.connection.timeout_ms) }
}

/// The discrete settings the instrument actually ended up at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedSetup {
    pub time_constant_s: f64,
    pub sensitivity_v: f64,
    pub filter_slope_db: f64,
}

impl LockinSettings {
    // Reference source goes first, the frequency commands that follow depend on it
    pub fn apply<T: Transport>(&self, lockin: &mut Sr830<T>) -> Result<AppliedSetup> {
        lockin.set_reference_source(self.reference)?;
        lockin.set_line_filters(self.line_filters)?;
        lockin.set_input_source(self.input)?;
        lockin.set_input_shield(self.shield)?;
        lockin.set_input_coupling(self.coupling)?;
        let filter_slope_db = lockin.set_filter_slope(self.filter_slope_db)?;
        lockin.set_reserve_mode(self.reserve)?;
        let time_constant_s = lockin.set_time_constant(self.time_constant_s)?;
        let sensitivity_v = lockin.set_sensitivity(self.sensitivity_v)?;
        lockin.set_channel1_display(self.channel1_display)?;
        lockin.set_channel2_display(self.channel2_display)?;

        Ok(AppliedSetup { time_constant_s, sensitivity_v, filter_slope_db })
    }
}

impl SweepSettings {
    pub fn settle(&self, time_constant_s: f64) -> Result<Duration> {
        match self.settle_time_constants {
            Some(multiple) => sweep::settle_for(time_constant_s, multiple),
            None => Ok(Duration::from_millis(self.settle_ms)),
        }
    }

    pub fn plan(&self, time_constant_s: f64) -> Result<SweepPlan> {
        Ok(SweepPlan {
            frequencies: self.frequencies.frequencies()?,
            amplitude_v: self.amplitude_v,
            settle: self.settle(time_constant_s)?,
            auto_phase: self.auto_phase,
        })
    }
}
