
// Single measurement: drive the sample at one frequency, wait for the filters to settle and
// read X, Y, R and phase in one snapshot

use std::thread;
use std::time::Duration;

use clap::Parser;

use sr830::devices::sr830::commands::{Interface, ReferenceSource};
use sr830::transport::serial::{SerialTransport, DEFAULT_BAUD_RATE};
use sr830::transport::DEFAULT_TIMEOUT_MS;
use sr830::utils::{capacitance_pf, impedance_ohm};
use sr830::Sr830;

#[derive(Parser, Debug)]
#[command(version, about = "Read one X/Y/R/phase snapshot from an SR830 and derive the capacitance")]
struct Args {
	/// Serial port or VISA-style serial resource (ASRL3::INSTR)
	#[arg(short, long, default_value = "ASRL3::INSTR")]
	resource: String,

	/// Interface the instrument should answer on: gpib or rs232
	#[arg(short, long, default_value = "rs232")]
	interface: Interface,

	#[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
	baud_rate: u32,

	#[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
	timeout_ms: u64,

	/// Reference frequency in Hz
	#[arg(short, long, default_value_t = 1000.0)]
	frequency: f64,

	/// Sine output amplitude in V
	#[arg(short, long, default_value_t = 0.004)]
	amplitude: f64,

	/// Wait after setting the frequency, in ms
	#[arg(long, default_value_t = 5000)]
	settle_ms: u64,

	#[arg(long)]
	auto_phase: bool,

	/// Reset the instrument before measuring
	#[arg(long)]
	reset: bool,

	/// Trace every command sent to the instrument
	#[arg(short, long)]
	debug: bool,
}

fn main() -> sr830::Result<()> {
	let args = Args::parse();

	let filter = if args.debug { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

	let transport = SerialTransport::new(args.baud_rate, Duration::from_millis(args.timeout_ms));
	let mut lockin = Sr830::new(transport);
	if args.debug { lockin.enable_debug_output(); }

	lockin.connect(&args.resource, args.interface)?;
	println!("{:?}", lockin.identify()?);

	if args.reset { lockin.reset()?; }

	lockin.set_reference_source(ReferenceSource::Internal)?;
	lockin.set_sine_output_level(args.amplitude)?;
	lockin.set_reference_frequency(args.frequency)?;
	if args.auto_phase { lockin.auto_phase()?; }

	thread::sleep(Duration::from_millis(args.settle_ms));

	let ref_phase:f64 = lockin.read_reference_phase()?;
	let snap = lockin.read_snapshot()?;

	println!("Reference phase: {:.3} [deg]", ref_phase);
	println!("X {:e}  Y {:e}  R {:e}  Phi {:.3}", snap.x, snap.y, snap.r, snap.phi);
	println!("|I|: {:e}", snap.x.hypot(snap.y));
	match impedance_ohm(snap.r, args.amplitude) {
		Some(z) => println!("Z: {:.4e} [Ohm]", z),
		None    => println!("Z: open circuit"),
	}
	println!("C: {:.3} [pF]", capacitance_pf(snap.r, args.frequency, args.amplitude));

	lockin.disconnect()
}
