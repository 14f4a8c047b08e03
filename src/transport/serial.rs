
use std::io::{self, Error, ErrorKind, Read, Write};
use std::time::Duration;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};

use super::{Transport, DEFAULT_TERMINATION, DEFAULT_TIMEOUT_MS};

lazy_static! {
    static ref ASRL_RE: Regex = Regex::new("^ASRL(\\d+)::INSTR$").unwrap();
}

// Factory setting of the SR830 RS232 interface
pub const DEFAULT_BAUD_RATE:u32 = 9600;
const DATABITS:DataBits = DataBits::Eight;
const PARITY:Parity     = Parity::None;
const STOPBITS:StopBits = StopBits::One;

fn err(kind:ErrorKind, msg:&str) -> io::Error { Error::new(kind, msg) }

// Accepts either a plain port name ("/dev/ttyUSB0", "COM3") or a VISA-style serial resource ("ASRL3::INSTR")
pub fn port_name(resource:&str) -> io::Result<String> {
	match ASRL_RE.captures(resource) {
		Some(caps) => {
			let n:u32 = caps[1].parse::<u32>()
				.map_err(|_| err(ErrorKind::InvalidInput, "Serial resource number is not a valid integer"))?;
			if n == 0 { return Err(err(ErrorKind::InvalidInput, "Serial resource numbers start at 1")); }

			if cfg!(windows) { Ok(format!("COM{}", n)) }
			else { Ok(format!("/dev/ttyS{}", n - 1)) }
		},
		None => Ok(resource.to_owned()),
	}
}

pub struct SerialTransport {
	baud_rate: u32,
	timeout: Duration,
	read_termination: String,
	write_termination: String,
	port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {

	pub fn new(baud_rate:u32, timeout:Duration) -> Self {
		Self {
			baud_rate,
			timeout,
			read_termination: DEFAULT_TERMINATION.to_owned(),
			write_termination: DEFAULT_TERMINATION.to_owned(),
			port: None,
		}
	}

	fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
		self.port.as_mut().ok_or_else(|| err(ErrorKind::NotConnected, "Serial port is not open"))
	}

	fn send(&mut self, command:&str) -> io::Result<()> {
		let framed:String = format!("{}{}", command, self.write_termination);
		let port = self.port()?;
		port.write_all(framed.as_bytes())?;
		port.flush()
	}

	fn read_until_terminator(&mut self) -> io::Result<String> {
		if self.read_termination.is_empty() {
			return Err(err(ErrorKind::InvalidInput, "No read termination configured"));
		}

		let term:Vec<u8> = self.read_termination.as_bytes().to_vec();
		let port = self.port()?;

		let mut response:Vec<u8> = Vec::new();
		let mut byte = [0u8; 1];
		loop {
			// The port's own timeout surfaces here as ErrorKind::TimedOut
			if port.read(&mut byte)? == 0 {
				return Err(err(ErrorKind::UnexpectedEof, "Serial port closed while reading a response"));
			}
			response.push(byte[0]);

			if response.ends_with(&term) {
				response.truncate(response.len() - term.len());
				break;
			}
		}

		String::from_utf8(response).map_err(|_| err(ErrorKind::InvalidData, "Unable to parse response as UTF-8"))
	}

}

impl Default for SerialTransport {
	fn default() -> Self { Self::new(DEFAULT_BAUD_RATE, Duration::from_millis(DEFAULT_TIMEOUT_MS)) }
}

impl Transport for SerialTransport {

	fn open(&mut self, resource:&str) -> io::Result<()> {
		if self.port.is_some() {
			return Err(err(ErrorKind::AlreadyExists, "Serial port is already open"));
		}

		let name:String = port_name(resource)?;
		debug!("Opening serial port {} at {} baud", name, self.baud_rate);

		let port = serialport::new(name.as_str(), self.baud_rate)
			.data_bits(DATABITS)
			.parity(PARITY)
			.stop_bits(STOPBITS)
			.timeout(self.timeout)
			.open()?;

		self.port = Some(port);
		Ok(())
	}

	fn set_read_termination(&mut self, term:&str) { self.read_termination = term.to_owned(); }

	fn set_write_termination(&mut self, term:&str) { self.write_termination = term.to_owned(); }

	fn set_timeout(&mut self, timeout:Duration) -> io::Result<()> {
		self.timeout = timeout;
		match self.port.as_mut() {
			Some(port) => Ok(port.set_timeout(timeout)?),
			None => Ok(()),
		}
	}

	fn clear(&mut self) -> io::Result<()> { Ok(self.port()?.clear(ClearBuffer::All)?) }

	fn write(&mut self, command:&str) -> io::Result<()> { self.send(command) }

	fn query(&mut self, command:&str) -> io::Result<String> {
		self.send(command)?;
		self.read_until_terminator()
	}

	fn close(&mut self) -> io::Result<()> {
		match self.port.take() {
			Some(_) => Ok(()),
			None => Err(err(ErrorKind::NotConnected, "Serial port is not open")),
		}
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_port_names_pass_through() {
		assert_eq!(port_name("/dev/ttyUSB0").unwrap(), "/dev/ttyUSB0");
		assert_eq!(port_name("COM4").unwrap(), "COM4");
	}

	#[test]
	fn visa_serial_resources_map_to_ports() {
		let name = port_name("ASRL3::INSTR").unwrap();
		if cfg!(windows) { assert_eq!(name, "COM3"); }
		else { assert_eq!(name, "/dev/ttyS2"); }
	}

	#[test]
	fn serial_resource_zero_is_rejected() {
		assert_eq!(port_name("ASRL0::INSTR").unwrap_err().kind(), ErrorKind::InvalidInput);
	}

	#[test]
	fn io_before_open_fails() {
		let mut transport = SerialTransport::default();
		assert_eq!(transport.write("*IDN?").unwrap_err().kind(), ErrorKind::NotConnected);
		assert_eq!(transport.close().unwrap_err().kind(), ErrorKind::NotConnected);
		assert!(transport.set_timeout(Duration::from_millis(100)).is_ok());
	}
}
