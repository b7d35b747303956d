//! Input tables and flight output files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use apogee_core::state::STATE_LEN;
use apogee_sim::FlightResult;
use serde::Serialize;

/// Contents of a RASP `.eng` thrust file.
#[derive(Debug, Clone, PartialEq)]
pub struct EngMotor {
    pub name: String,
    pub diameter: f64,
    pub length: f64,
    pub propellant_mass: f64,
    pub total_mass: f64,
    /// `(time, thrust)`, starting at `(0, 0)`.
    pub points: Vec<(f64, f64)>,
}

pub fn read_eng(path: &Path) -> Result<EngMotor> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading thrust curve {}", path.display()))?;
    parse_eng(&text).with_context(|| format!("parsing thrust curve {}", path.display()))
}

/// Parse RASP text: `;` comments, one header line
/// (`name diameter_mm length_mm delays propellant_kg total_kg maker`),
/// then `time thrust` pairs.
pub fn parse_eng(text: &str) -> Result<EngMotor> {
    let mut lines = text
        .lines()
        .map(|l| l.split(';').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty());

    let header = match lines.next() {
        Some(h) => h,
        None => bail!("empty thrust file"),
    };
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() < 6 {
        bail!("malformed header line '{header}'");
    }
    let number = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("header field {} ('{}') is not a number", i + 1, fields[i]))
    };

    let mut points = vec![(0.0, 0.0)];
    for line in lines {
        let mut cols = line.split_whitespace();
        let (Some(t), Some(f)) = (cols.next(), cols.next()) else {
            bail!("malformed data line '{line}'");
        };
        let t: f64 = t.parse().with_context(|| format!("bad time in '{line}'"))?;
        let f: f64 = f.parse().with_context(|| format!("bad thrust in '{line}'"))?;
        if t == 0.0 {
            points[0].1 = f;
        } else {
            points.push((t, f));
        }
    }
    if points.len() < 2 {
        bail!("thrust file has no data points");
    }

    Ok(EngMotor {
        name: fields[0].to_string(),
        diameter: number(1)? / 1000.0,
        length: number(2)? / 1000.0,
        propellant_mass: number(4)?,
        total_mass: number(5)?,
        points,
    })
}

/// Read `(mach, cd)` rows. A header row and `#` comments are skipped.
pub fn read_drag_csv(path: &Path) -> Result<Vec<(f64, f64)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening drag curve {}", path.display()))?;

    let mut points = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let parsed = (
            record.get(0).and_then(|v| v.parse::<f64>().ok()),
            record.get(1).and_then(|v| v.parse::<f64>().ok()),
        );
        match parsed {
            (Some(mach), Some(cd)) => points.push((mach, cd)),
            _ if i == 0 => continue,
            _ => bail!("{}: row {} is not a (mach, cd) pair", path.display(), i + 1),
        }
    }
    Ok(points)
}

pub const STATE_COLUMNS: [&str; STATE_LEN] = [
    "x", "y", "z", "vx", "vy", "vz", "e0", "e1", "e2", "e3", "w1", "w2", "w3",
];

/// Time series as CSV: time, then the 13 state components.
pub fn write_flight_csv(path: &Path, result: &FlightResult) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["time"];
    header.extend(STATE_COLUMNS);
    wtr.write_record(&header)?;

    for sample in &result.samples {
        let mut row = Vec::with_capacity(STATE_LEN + 1);
        row.push(format!("{:.6}", sample.time));
        row.extend(sample.state.as_slice().iter().map(|v| format!("{v:.6}")));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENG: &str = "\
; Cesaroni M1670 approximation
M1670 75 757 0 3.101 5.231 CTI
0.055 100.0
0.092 1500.0 ; ignition spike
0.1 2000.0
3.0 1650.0
3.9 0.0
";

    #[test]
    fn test_parse_eng() {
        let eng = parse_eng(ENG).unwrap();
        assert_eq!(eng.name, "M1670");
        assert_eq!(eng.diameter, 0.075);
        assert_eq!(eng.propellant_mass, 3.101);
        assert_eq!(eng.total_mass, 5.231);
        assert_eq!(eng.points.first(), Some(&(0.0, 0.0)));
        assert_eq!(eng.points.last(), Some(&(3.9, 0.0)));
        assert_eq!(eng.points.len(), 6);
    }

    #[test]
    fn test_parse_eng_rejects_garbage() {
        assert!(parse_eng("").is_err());
        assert!(parse_eng("M1670 75 757 0 3.1 5.2 CTI\n").is_err());
        assert!(parse_eng("M1670 75 757 0 3.1 5.2 CTI\n0.1 lots\n").is_err());
    }

    #[test]
    fn test_read_drag_csv_skips_header() {
        let path = std::env::temp_dir().join(format!("apogee-drag-{}.csv", std::process::id()));
        std::fs::write(&path, "mach, cd\n# subsonic\n0.0, 0.45\n0.9, 0.5\n1.2, 0.6\n").unwrap();
        let points = read_drag_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(points, vec![(0.0, 0.45), (0.9, 0.5), (1.2, 0.6)]);
    }
}
