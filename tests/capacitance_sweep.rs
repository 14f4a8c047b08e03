use std::fs;
use std::time::Duration;

use sr830::config::Settings;
use sr830::devices::sr830::commands::{Interface, ReferenceSource};
use sr830::devices::sr830::Traffic;
use sr830::transport::MockTransport;
use sr830::utils::capacitance_pf;
use sr830::{export, sweep, Error, Sr830};

#[test]
fn single_point_measurement() {
    let mock = MockTransport::with_responses(vec!["0,0,0.05,0"]);
    let mut lockin = Sr830::new(mock);

    lockin.connect("ASRL3::INSTR", Interface::Rs232).unwrap();
    lockin.set_reference_source(ReferenceSource::Internal).unwrap();
    lockin.set_sine_output_level(0.004).unwrap();
    lockin.set_reference_frequency(1000.0).unwrap();
    let snap = lockin.read_snapshot().unwrap();
    lockin.disconnect().unwrap();

    assert_eq!(snap.as_tuple(), (0.0, 0.0, 0.05, 0.0));
    let c = capacitance_pf(snap.r, 1000.0, 0.004);
    assert!((c - 1.989e9).abs() / 1.989e9 < 1e-3, "C = {}", c);

    let t = lockin.transport();
    assert_eq!(t.commands, vec!["OUTX 0", "FMOD 1", "SLVL 0.004", "FREQ 1000", "SNAP? 1,2,3,4"]);
    assert_eq!(t.clears, 1);
    assert!(!t.is_open());
}

#[test]
fn a_closed_session_stays_closed() {
    let mut lockin = Sr830::new(MockTransport::new());
    lockin.connect("COM3", Interface::Gpib).unwrap();
    lockin.disconnect().unwrap();

    assert!(matches!(lockin.connect("COM3", Interface::Gpib), Err(Error::SessionClosed)));
    assert!(matches!(lockin.read_x(), Err(Error::NotConnected)));
    assert_eq!(lockin.transport().commands, vec!["OUTX 1"]);
}

#[test]
fn traffic_reaches_a_custom_sink() {
    use std::sync::{Arc, Mutex};

    let seen:Arc<Mutex<Vec<(Traffic, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut lockin = Sr830::new(MockTransport::with_responses(vec!["12.5"]));
    lockin.set_debug_sink(move |traffic:Traffic, cmd:&str| sink.lock().unwrap().push((traffic, cmd.to_owned())));
    lockin.connect("COM3", Interface::Rs232).unwrap();
    assert_eq!(lockin.read_reference_phase().unwrap(), 12.5);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![
        (Traffic::Write, "OUTX 0".to_owned()),
        (Traffic::Query, "PHAS?".to_owned()),
    ]);
}

#[test]
fn configured_sweep_is_exported() {
    let settings = Settings::from_toml_str(r#"
        [lockin]
        time_constant_s = 0.25
        sensitivity_v = 0.04

        [sweep]
        amplitude_v = 0.004
        settle_time_constants = 0.0
        auto_phase = false
        frequencies = { kind = "list", values = [1000.0, 2000.0, 4000.0] }
    "#).unwrap();
    settings.validate().unwrap();

    // Ideal 100 pF capacitor: R = 2 pi f V C
    let c_farad = 100e-12;
    let responses:Vec<String> = [1000.0, 2000.0, 4000.0].iter()
        .map(|f:&f64| format!("0,0,{:e},-90", 2.0 * std::f64::consts::PI * f * 0.004 * c_farad))
        .collect();

    let mut lockin = Sr830::new(MockTransport::with_responses(responses));
    lockin.connect("COM3", settings.connection.interface).unwrap();

    let applied = settings.lockin.apply(&mut lockin).unwrap();
    assert_eq!(applied.time_constant_s, 0.3);
    assert_eq!(applied.sensitivity_v, 0.05);

    let plan = settings.sweep.plan(applied.time_constant_s).unwrap();
    assert_eq!(plan.settle, Duration::ZERO);

    let result = sweep::run(&mut lockin, &plan).unwrap();
    lockin.disconnect().unwrap();

    assert_eq!(result.points.len(), 3);
    for (_, c, phi) in result.rows() {
        assert!((c - 100.0).abs() < 1e-6, "C = {}", c);
        assert_eq!(phi, -90.0);
    }
    let fit = result.fit_capacitance().unwrap();
    assert!((fit.slope - 100.0).abs() < 1e-3, "fit {}", fit.slope);

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("sweep.csv");
    let json_path = dir.path().join("sweep.json");
    export::save_csv(&csv_path, &result).unwrap();
    export::save_json(&json_path, &result).unwrap();

    let csv_text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv_text.lines().count(), 4);
    assert!(csv_text.starts_with("Frequency / Hz;"));

    let back:sweep::Sweep = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back.amplitude_v, 0.004);
    let freqs:Vec<f64> = back.points.iter().map(|p| p.frequency_hz).collect();
    assert_eq!(freqs, vec![1000.0, 2000.0, 4000.0]);
}

#[test]
fn export_to_a_missing_directory_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("sweep.csv");
    let result = sweep::Sweep { amplitude_v: 0.004, points: vec![] };

    match export::save_csv(&path, &result) {
        Err(Error::Export { path: p, .. }) => assert_eq!(p, path),
        other => panic!("unexpected {:?}", other),
    }
}
