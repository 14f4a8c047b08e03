
// In-memory transport for tests and dry runs. Every command written or queried is recorded in
// order; query responses come from a queue, and an empty queue behaves like a read timeout.

use std::collections::VecDeque;
use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use super::{Transport, DEFAULT_TIMEOUT_MS};

#[derive(Debug)]
pub struct MockTransport {
	pub resource: Option<String>,
	pub read_termination: Option<String>,
	pub write_termination: Option<String>,
	pub timeout: Duration,
	pub clears: usize,
	pub commands: Vec<String>,
	responses: VecDeque<String>,
	open: bool,
	refuse_open: bool,
}

impl Default for MockTransport {
	fn default() -> Self {
		Self {
			resource: None,
			read_termination: None,
			write_termination: None,
			timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
			clears: 0,
			commands: Vec::new(),
			responses: VecDeque::new(),
			open: false,
			refuse_open: false,
		}
	}
}

impl MockTransport {

	pub fn new() -> Self { Self::default() }

	pub fn with_responses<I, S>(responses:I) -> Self
	where I: IntoIterator<Item = S>, S: Into<String> {
		let mut mock = Self::default();
		mock.responses.extend(responses.into_iter().map(Into::into));
		mock
	}

	// A transport whose open() fails, as if the port didn't exist
	pub fn unreachable() -> Self { Self { refuse_open: true, ..Self::default() } }

	pub fn push_response<S: Into<String>>(&mut self, response:S) { self.responses.push_back(response.into()); }

	pub fn is_open(&self) -> bool { self.open }

	pub fn pending_responses(&self) -> usize { self.responses.len() }

	pub fn last_command(&self) -> Option<&str> { self.commands.last().map(String::as_str) }

	fn ensure_open(&self) -> io::Result<()> {
		if self.open { Ok(()) }
		else { Err(Error::new(ErrorKind::NotConnected, "Mock transport is not open")) }
	}

}

impl Transport for MockTransport {

	fn open(&mut self, resource:&str) -> io::Result<()> {
		if self.refuse_open {
			return Err(Error::new(ErrorKind::NotFound, format!("No such resource: {}", resource)));
		}
		self.resource = Some(resource.to_owned());
		self.open = true;
		Ok(())
	}

	fn set_read_termination(&mut self, term:&str) { self.read_termination = Some(term.to_owned()); }

	fn set_write_termination(&mut self, term:&str) { self.write_termination = Some(term.to_owned()); }

	fn set_timeout(&mut self, timeout:Duration) -> io::Result<()> {
		self.timeout = timeout;
		Ok(())
	}

	fn clear(&mut self) -> io::Result<()> {
		self.ensure_open()?;
		self.clears += 1;
		Ok(())
	}

	fn write(&mut self, command:&str) -> io::Result<()> {
		self.ensure_open()?;
		self.commands.push(command.to_owned());
		Ok(())
	}

	fn query(&mut self, command:&str) -> io::Result<String> {
		self.write(command)?;
		self.responses.pop_front()
			.ok_or_else(|| Error::new(ErrorKind::TimedOut, format!("No response queued for '{}'", command)))
	}

	fn close(&mut self) -> io::Result<()> {
		self.ensure_open()?;
		self.open = false;
		Ok(())
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_commands_and_serves_responses_in_order() {
		let mut mock = MockTransport::with_responses(vec!["first", "second"]);
		mock.open("ASRL1::INSTR").unwrap();
		mock.write("*RST").unwrap();
		assert_eq!(mock.query("A?").unwrap(), "first");
		assert_eq!(mock.query("B?").unwrap(), "second");
		assert_eq!(mock.commands, vec!["*RST", "A?", "B?"]);
		assert_eq!(mock.pending_responses(), 0);
		assert_eq!(mock.query("C?").unwrap_err().kind(), ErrorKind::TimedOut);
		assert_eq!(mock.last_command(), Some("C?"));

		mock.push_response("late");
		assert_eq!(mock.pending_responses(), 1);
		assert_eq!(mock.query("D?").unwrap(), "late");
	}

	#[test]
	fn refuses_io_while_closed() {
		let mut mock = MockTransport::new();
		assert_eq!(mock.write("*CLS").unwrap_err().kind(), ErrorKind::NotConnected);
		assert!(MockTransport::unreachable().open("COM9").is_err());
	}
}
