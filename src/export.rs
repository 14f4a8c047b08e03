
// Flat-file output of sweep results: ';'-delimited CSV for spreadsheets and plotting tools, and
// pretty JSON of the full sweep.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::sweep::{Sweep, SweepPoint};

pub const CSV_DELIMITER:u8 = b';';

#[derive(Debug, Serialize)]
struct CsvRow {
    #[serde(rename = "Frequency / Hz")]
    frequency_hz: f64,
    #[serde(rename = "Impedance / Ohm")]
    impedance_ohm: Option<f64>,
    #[serde(rename = "Capacitance / pF")]
    capacitance_pf: f64,
    #[serde(rename = "Phase / deg")]
    phase_deg: f64,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "R")]
    r: f64,
}

impl From<&SweepPoint> for CsvRow {
    fn from(p:&SweepPoint) -> Self {
        CsvRow {
            frequency_hz: p.frequency_hz,
            impedance_ohm: p.impedance_ohm,
            capacitance_pf: p.capacitance_pf,
            phase_deg: p.snapshot.phi,
            x: p.snapshot.x,
            y: p.snapshot.y,
            r: p.snapshot.r,
        }
    }
}

pub fn write_csv<W: Write>(writer:W, sweep:&Sweep) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(CSV_DELIMITER).from_writer(writer);
    for point in &sweep.points {
        wtr.serialize(CsvRow::from(point))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_json<W: Write>(writer:W, sweep:&Sweep) -> Result<()> {
    serde_json::to_writer_pretty(writer, sweep)?;
    Ok(())
}

fn create(path:&Path) -> Result<File> {
    File::create(path).map_err(|source| Error::Export { path: path.to_owned(), source })
}

pub fn save_csv<P: AsRef<Path>>(path:P, sweep:&Sweep) -> Result<()> {
    let path = path.as_ref();
    write_csv(create(path)?, sweep)?;
    info!("Wrote {} points to {}", sweep.points.len(), path.display());
    Ok(())
}

pub fn save_json<P: AsRef<Path>>(path:P, sweep:&Sweep) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, serde_json::to_string_pretty(sweep)?.as_bytes())
        .map_err(|source| Error::Export { path: path.to_owned(), source })?;
    info!("Wrote {} points to {}", sweep.points.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::sr830::Snapshot;

    fn sweep() -> Sweep {
        Sweep {
            amplitude_v: 0.004,
            points: vec![
                SweepPoint {
                    frequency_hz: 1000.0,
                    snapshot: Snapshot { x: 0.5, y: -0.25, r: 0.5, phi: -30.0 },
                    capacitance_pf: 2.0,
                    impedance_ohm: Some(0.008),
                },
                SweepPoint {
                    frequency_hz: 2000.0,
                    snapshot: Snapshot { x: 0.0, y: 0.0, r: 0.0, phi: 0.0 },
                    capacitance_pf: 0.0,
                    impedance_ohm: None,
                },
            ],
        }
    }

    #[test]
    fn csv_has_a_header_and_one_line_per_point() {
        let mut buf:Vec<u8> = Vec::new();
        write_csv(&mut buf, &sweep()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines:Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Frequency / Hz;Impedance / Ohm;Capacitance / pF;Phase / deg;X;Y;R");

        let first:Vec<f64> = lines[1].split(';').map(|s| s.parse::<f64>().unwrap()).collect();
        assert_eq!(first, vec![1000.0, 0.008, 2.0, -30.0, 0.5, -0.25, 0.5]);

        // Open circuit: the impedance column is left empty
        let second:Vec<&str> = lines[2].split(';').collect();
        assert_eq!(second.len(), 7);
        assert_eq!(second[1], "");
    }

    #[test]
    fn json_round_trips_the_sweep() {
        let mut buf:Vec<u8> = Vec::new();
        write_json(&mut buf, &sweep()).unwrap();
        let back:Sweep = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back, sweep());
    }
}
