
// The session an instrument driver talks through. Implementations only move
// text; command framing beyond the termination characters is not their job.

use std::io;
use std::time::Duration;

pub mod mock;
pub mod serial;

pub use self::mock::MockTransport;
pub use self::serial::SerialTransport;

pub const DEFAULT_TERMINATION:&str = "\n";
pub const DEFAULT_TIMEOUT_MS:u64 = 5000;

pub trait Transport {

    fn open(&mut self, resource:&str) -> io::Result<()>;

    fn set_read_termination(&mut self, term:&str);

    fn set_write_termination(&mut self, term:&str);

    fn set_timeout(&mut self, timeout:Duration) -> io::Result<()>;

    // Discard anything waiting in the input and output buffers
    fn clear(&mut self) -> io::Result<()>;

    fn write(&mut self, command:&str) -> io::Result<()>;

    // Write the command, then block until a terminated response arrives or the read timeout expires.
    // The returned text has the read termination stripped.
    fn query(&mut self, command:&str) -> io::Result<String>;

    fn close(&mut self) -> io::Result<()>;

}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, resource:&str) -> io::Result<()> { (**self).open(resource) }
    fn set_read_termination(&mut self, term:&str) { (**self).set_read_termination(term) }
    fn set_write_termination(&mut self, term:&str) { (**self).set_write_termination(term) }
    fn set_timeout(&mut self, timeout:Duration) -> io::Result<()> { (**self).set_timeout(timeout) }
    fn clear(&mut self) -> io::Result<()> { (**self).clear() }
    fn write(&mut self, command:&str) -> io::Result<()> { (**self).write(command) }
    fn query(&mut self, command:&str) -> io::Result<String> { (**self).query(command) }
    fn close(&mut self) -> io::Result<()> { (**self).close() }
}
