
use std::ops::Drop;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::{Match, Regex};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::range::DiscreteRange;
use crate::transport::Transport;

pub mod commands;

use self::commands::*;

lazy_static! {
	static ref IDN_RE: Regex = Regex::new("([^,]+),([^,]+),([^,]+),([^,\\s]+)").unwrap();
}

const TERMINATION:&str = "\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub serial_num: String,
	pub fw_version: String,
}

// X, Y, R and phase as sampled together by SNAP?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	pub x: f64,
	pub y: f64,
	pub r: f64,
	pub phi: f64,
}

impl Snapshot {
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) { (self.x, self.y, self.r, self.phi) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traffic {
	Write,
	Query,
}

// Receives every command right before it goes out on the transport
pub trait CommandSink {
	fn record(&mut self, traffic:Traffic, command:&str);
}

impl<F: FnMut(Traffic, &str)> CommandSink for F {
	fn record(&mut self, traffic:Traffic, command:&str) { self(traffic, command) }
}

// Default sink, traces through the log facade at debug level
pub struct LogSink;

impl CommandSink for LogSink {
	fn record(&mut self, traffic:Traffic, command:&str) {
		match traffic {
			Traffic::Write => debug!("Write cmd: {}", command),
			Traffic::Query => debug!("Query cmd: {}", command),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Disconnected,
	Connected,
	Closed,
}

pub struct Sr830<T: Transport> {
	transport: T,
	state: State,
	sink: Option<Box<dyn CommandSink>>,
}

fn match_str(opt_match:Option<Match>, command:&str, response:&str) -> Result<String> {
	match opt_match {
		Some(m) => Ok(m.as_str().to_owned()),
		None    => Err(Error::malformed(command, response)),
	}
}

fn parse_value(command:&str, response:&str) -> Result<f64> {
	response.trim().parse::<f64>().map_err(|_| Error::malformed(command, response))
}

fn parse_snapshot(command:&str, response:&str) -> Result<Snapshot> {
	let tokens:Vec<&str> = response.trim().split(',').collect();
	if tokens.len() != 4 {
		return Err(Error::malformed(command, response));
	}

	let mut values = [0.0f64; 4];
	for (value, token) in values.iter_mut().zip(tokens.iter()) {
		*value = parse_value(command, token).map_err(|_| Error::malformed(command, response))?;
	}

	Ok(Snapshot{ x: values[0], y: values[1], r: values[2], phi: values[3] })
}

impl<T: Transport> Sr830<T> {

	pub fn new(transport:T) -> Self { Self{ transport, state: State::Disconnected, sink: None } }

	pub fn enable_debug_output(&mut self) { self.sink = Some(Box::new(LogSink)); }

	pub fn disable_debug_output(&mut self) { self.sink = None; }

	pub fn set_debug_sink<S: CommandSink + 'static>(&mut self, sink:S) { self.sink = Some(Box::new(sink)); }

	pub fn is_debug_enabled(&self) -> bool { self.sink.is_some() }

	pub fn is_connected(&self) -> bool { self.state == State::Connected }

	pub fn transport(&self) -> &T { &self.transport }

	pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }

	pub fn connect(&mut self, resource:&str, interface:Interface) -> Result<()> {
		match self.state {
			State::Connected    => return Err(Error::AlreadyConnected),
			State::Closed       => return Err(Error::SessionClosed),
			State::Disconnected => { /* Expected */ },
		}

		self.transport.open(resource)?;
		self.state = State::Connected;

		if let Err(e) = self.prepare_session(interface) {
			if let Err(close_err) = self.transport.close() {
				warn!("Unable to close {} after a failed connect: {}", resource, close_err);
			}
			self.state = State::Disconnected;
			return Err(e);
		}

		info!("Connected to SR830 at {} ({:?})", resource, interface);
		Ok(())
	}

	fn prepare_session(&mut self, interface:Interface) -> Result<()> {
		self.transport.set_read_termination(TERMINATION);
		self.transport.set_write_termination(TERMINATION);

		// Anything left over in the buffers from a previous session is lost here
		self.transport.clear()?;

		self.write(interface.command())
	}

	pub fn disconnect(&mut self) -> Result<()> {
		self.ensure_connected()?;
		self.state = State::Closed;
		self.transport.close()?;
		info!("Disconnected from SR830");
		Ok(())
	}

	pub fn set_timeout(&mut self, timeout:Duration) -> Result<()> { Ok(self.transport.set_timeout(timeout)?) }

	pub fn identify(&mut self) -> Result<Identity> {
		let res:String = self.query(IDENTIFY)?;
		let caps = IDN_RE.captures(&res).ok_or_else(|| Error::malformed(IDENTIFY, &res))?;

		Ok(Identity {
			manufacturer: match_str(caps.get(1), IDENTIFY, &res)?,
			model:        match_str(caps.get(2), IDENTIFY, &res)?,
			serial_num:   match_str(caps.get(3), IDENTIFY, &res)?,
			fw_version:   match_str(caps.get(4), IDENTIFY, &res)?,
		})
	}

	pub fn reset(&mut self) -> Result<()> {
		self.write(RESET)?;
		self.write(CLEAR_STATUS)?;
		info!("SR830 reset");
		Ok(())
	}

	// Reference and oscillator

	pub fn set_reference_source(&mut self, source:ReferenceSource) -> Result<()> { self.write(source.command()) }

	pub fn set_reference_frequency(&mut self, hz:f64) -> Result<()> {
		self.ensure_connected()?;
		let hz:f64 = REFERENCE_FREQUENCY_RANGE.check(hz)?;
		self.write(&format!("{} {}", REFERENCE_FREQUENCY, hz))
	}

	pub fn set_sine_output_level(&mut self, volts:f64) -> Result<()> {
		self.ensure_connected()?;
		let volts:f64 = SINE_OUTPUT_LEVEL_RANGE.check(volts)?;
		self.write(&format!("{} {}", SINE_OUTPUT_LEVEL, volts))
	}

	// Input

	pub fn set_input_source(&mut self, source:InputSource) -> Result<()> { self.write(source.command()) }

	pub fn set_input_shield(&mut self, shield:InputShield) -> Result<()> { self.write(shield.command()) }

	pub fn set_input_coupling(&mut self, coupling:InputCoupling) -> Result<()> { self.write(coupling.command()) }

	pub fn set_line_filters(&mut self, enabled:bool) -> Result<()> {
		self.write(if enabled { LINE_FILTERS_ON } else { LINE_FILTERS_OFF })
	}

	// Gain and filtering. These return the setting the instrument actually ends up at.

	pub fn set_sensitivity(&mut self, volts:f64) -> Result<f64> { self.set_discrete(SENSITIVITY, &SENSITIVITY_RANGE, volts) }

	pub fn set_time_constant(&mut self, seconds:f64) -> Result<f64> { self.set_discrete(TIME_CONSTANT, &TIME_CONSTANT_RANGE, seconds) }

	pub fn set_filter_slope(&mut self, db_per_octave:f64) -> Result<f64> { self.set_discrete(FILTER_SLOPE, &FILTER_SLOPE_RANGE, db_per_octave) }

	pub fn set_reserve_mode(&mut self, mode:ReserveMode) -> Result<()> { self.write(mode.command()) }

	fn set_discrete(&mut self, command:&str, range:&DiscreteRange, requested:f64) -> Result<f64> {
		self.ensure_connected()?;
		let (idx, value) = range.resolve_index(requested)?;
		if value != requested {
			debug!("{} {} not available, using {}", range.name, requested, value);
		}
		self.write(&format!("{} {}", command, idx))?;
		Ok(value)
	}

	// Displays

	pub fn set_channel1_display(&mut self, display:Channel1Display) -> Result<()> { self.write(display.command()) }

	pub fn set_channel2_display(&mut self, display:Channel2Display) -> Result<()> { self.write(display.command()) }

	// Auto functions

	pub fn auto_gain(&mut self) -> Result<()> { self.write(AUTO_GAIN) }

	pub fn auto_reserve(&mut self) -> Result<()> { self.write(AUTO_RESERVE) }

	pub fn auto_phase(&mut self) -> Result<()> { self.write(AUTO_PHASE) }

	pub fn auto_offset(&mut self, offset:Offset) -> Result<()> { self.write(offset.command()) }

	// Data transfer

	pub fn read_output(&mut self, output:Output) -> Result<f64> {
		let command:&str = output.read_command();
		let res:String = self.query(command)?;
		parse_value(command, &res)
	}

	pub fn read_x(&mut self) -> Result<f64> { self.read_output(Output::X) }

	pub fn read_y(&mut self) -> Result<f64> { self.read_output(Output::Y) }

	pub fn read_r(&mut self) -> Result<f64> { self.read_output(Output::R) }

	pub fn read_phi(&mut self) -> Result<f64> { self.read_output(Output::Phi) }

	pub fn read_reference_phase(&mut self) -> Result<f64> {
		let res:String = self.query(REFERENCE_PHASE_QUERY)?;
		parse_value(REFERENCE_PHASE_QUERY, &res)
	}

	// One query for all four outputs, so they can't straddle a settings change or a short time constant
	pub fn read_snapshot(&mut self) -> Result<Snapshot> {
		let res:String = self.query(READ_SNAPSHOT)?;
		parse_snapshot(READ_SNAPSHOT, &res)
	}

	// Raw access for commands without a typed wrapper
	pub fn ask(&mut self, command:&str) -> Result<String> { self.query(command) }

	fn ensure_connected(&self) -> Result<()> {
		match self.state {
			State::Connected => Ok(()),
			_ => Err(Error::NotConnected),
		}
	}

	fn trace(&mut self, traffic:Traffic, command:&str) {
		if let Some(sink) = self.sink.as_mut() { sink.record(traffic, command); }
	}

	fn write(&mut self, command:&str) -> Result<()> {
		self.ensure_connected()?;
		self.trace(Traffic::Write, command);
		Ok(self.transport.write(command)?)
	}

	fn query(&mut self, command:&str) -> Result<String> {
		self.ensure_connected()?;
		self.trace(Traffic::Query, command);
		Ok(self.transport.query(command)?)
	}

}

impl<T: Transport> Drop for Sr830<T> {

	fn drop(&mut self) {
		if self.state == State::Connected {
			if let Err(e) = self.transport.close() {
				warn!("Unable to close SR830 session on drop: {}", e);
			}
		}
	}

}
