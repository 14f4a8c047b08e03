
// Capacitance sweep: configure the lock-in from a settings file, step the internal reference across
// the planned frequencies and export the results

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use sr830::config::Settings;
use sr830::devices::sr830::commands::Interface;
use sr830::export;
use sr830::sweep;
use sr830::transport::serial::SerialTransport;
use sr830::Sr830;

#[derive(Parser, Debug)]
#[command(version, about = "Sweep the SR830 reference frequency and derive capacitance at each step")]
struct Args {
	/// TOML settings file; built-in defaults are used when omitted
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Overrides connection.resource
	#[arg(short, long)]
	resource: Option<String>,

	/// Overrides connection.interface (gpib or rs232)
	#[arg(short, long)]
	interface: Option<Interface>,

	/// Overrides output.csv
	#[arg(long)]
	csv: Option<PathBuf>,

	/// Overrides output.json
	#[arg(long)]
	json: Option<PathBuf>,

	/// Keep the instrument's current state instead of resetting first
	#[arg(long)]
	no_reset: bool,

	/// Trace every command sent to the instrument
	#[arg(short, long)]
	debug: bool,
}

fn main() -> sr830::Result<()> {
	let args = Args::parse();

	let mut settings = match args.config {
		Some(ref path) => Settings::load(path)?,
		None => Settings::default(),
	};
	if let Some(resource) = args.resource { settings.connection.resource = resource; }
	if let Some(interface) = args.interface { settings.connection.interface = interface; }
	if args.csv.is_some() { settings.output.csv = args.csv; }
	if args.json.is_some() { settings.output.json = args.json; }
	settings.connection.debug |= args.debug;

	let filter = if settings.connection.debug { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

	settings.validate()?;

	let transport = SerialTransport::new(settings.connection.baud_rate, settings.timeout());
	let mut lockin = Sr830::new(transport);
	if settings.connection.debug { lockin.enable_debug_output(); }

	lockin.connect(&settings.connection.resource, settings.connection.interface)?;
	info!("{:?}", lockin.identify()?);

	if !args.no_reset { lockin.reset()?; }

	let applied = settings.lockin.apply(&mut lockin)?;
	info!("Time constant {} s, sensitivity {} V, slope {} dB/oct", applied.time_constant_s, applied.sensitivity_v, applied.filter_slope_db);

	let plan = settings.sweep.plan(applied.time_constant_s)?;
	let result = sweep::run(&mut lockin, &plan)?;

	println!("{:>12} {:>14} {:>12}", "f [Hz]", "C [pF]", "phi [deg]");
	for (f, c, phi) in result.rows() {
		println!("{:>12.1} {:>14.3} {:>12.3}", f, c, phi);
	}

	match result.fit_capacitance() {
		Ok(fit) => println!("Fitted capacitance: {:.3} [pF], offset {:e}", fit.slope, fit.intercept),
		Err(e)  => warn!("No capacitance fit: {}", e),
	}

	if let Some(ref path) = settings.output.csv { export::save_csv(path, &result)?; }
	if let Some(ref path) = settings.output.json { export::save_json(path, &result)?; }

	lockin.disconnect()
}
