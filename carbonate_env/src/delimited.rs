//! Readers for headerless delimited text inputs.
//!
//! Rows may be separated by commas, semicolons, tabs or runs of spaces.
//! Blank lines and lines starting with `#` are skipped. Line numbers in
//! errors are 1-based.

use crate::error::{CarbonateError, Result};
use std::path::Path;

/// One sparse elevation sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BathymetrySample {
    pub x: usize,
    pub y: usize,
    pub z: f64,
}

impl BathymetrySample {
    pub fn new(x: usize, y: usize, z: f64) -> Self {
        Self { x, y, z }
    }
}

fn fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c == ';' || c == '\t' || c == ' ')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parses `X,Y,Z` rows (integer, integer, real).
pub fn parse_bathymetry(text: &str, origin: &str) -> Result<Vec<BathymetrySample>> {
    let mut samples = Vec::new();
    for (line_no, line) in data_lines(text) {
        let cols = fields(line);
        if cols.len() != 3 {
            return Err(CarbonateError::format(
                origin,
                line_no,
                line,
                format!("expected 3 columns (X, Y, Z), found {}", cols.len()),
            ));
        }
        let x = cols[0].parse::<usize>().map_err(|_| {
            CarbonateError::format(origin, line_no, line, format!("X {:?} is not a non-negative integer", cols[0]))
        })?;
        let y = cols[1].parse::<usize>().map_err(|_| {
            CarbonateError::format(origin, line_no, line, format!("Y {:?} is not a non-negative integer", cols[1]))
        })?;
        let z = cols[2].parse::<f64>().map_err(|_| {
            CarbonateError::format(origin, line_no, line, format!("Z {:?} is not a number", cols[2]))
        })?;
        if !z.is_finite() {
            return Err(CarbonateError::format(origin, line_no, line, "Z must be finite"));
        }
        samples.push(BathymetrySample::new(x, y, z));
    }
    Ok(samples)
}

/// Parses `time,level` rows.
pub fn parse_sea_level_curve(text: &str, origin: &str) -> Result<Vec<(f64, f64)>> {
    let mut points = Vec::new();
    for (line_no, line) in data_lines(text) {
        let cols = fields(line);
        if cols.len() != 2 {
            return Err(CarbonateError::format(
                origin,
                line_no,
                line,
                format!("expected 2 columns (time, level), found {}", cols.len()),
            ));
        }
        let mut values = [0.0f64; 2];
        for (slot, (name, raw)) in values.iter_mut().zip(["time", "level"].iter().zip(&cols)) {
            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    CarbonateError::format(origin, line_no, line, format!("{} {:?} is not a finite number", name, raw))
                })?;
        }
        points.push((values[0], values[1]));
    }
    Ok(points)
}

/// Reads a bathymetry sample file.
pub fn read_bathymetry(path: impl AsRef<Path>) -> Result<Vec<BathymetrySample>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| CarbonateError::io(path, e))?;
    parse_bathymetry(&text, &path.display().to_string())
}

/// Reads a sea-level curve file.
pub fn read_sea_level_curve(path: impl AsRef<Path>) -> Result<Vec<(f64, f64)>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| CarbonateError::io(path, e))?;
    parse_sea_level_curve(&text, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bathymetry_rows() {
        let text = "0,0,-5\n1, 0, -4.5\n\n# comment\n1\t1\t-3e1\n";
        let samples = parse_bathymetry(text, "bathy").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1], BathymetrySample::new(1, 0, -4.5));
        assert_eq!(samples[2].z, -30.0);
    }

    #[test]
    fn test_bad_row_reports_line_and_value() {
        let text = "0,0,-5\n1,-1,2.0\n";
        match parse_bathymetry(text, "bathy.csv").unwrap_err() {
            CarbonateError::Format { origin, line, row, message } => {
                assert_eq!(origin, "bathy.csv");
                assert_eq!(line, 2);
                assert_eq!(row, "1,-1,2.0");
                assert!(message.contains("-1"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_column_count() {
        let err = parse_bathymetry("1,2\n", "bathy").unwrap_err();
        assert!(err.to_string().contains("expected 3 columns"));
    }

    #[test]
    fn test_parse_sea_level_curve() {
        let points = parse_sea_level_curve("0 0.0\n10 5.5\n20 -1\n", "curve").unwrap();
        assert_eq!(points, vec![(0.0, 0.0), (10.0, 5.5), (20.0, -1.0)]);

        let err = parse_sea_level_curve("0 0.0\n10 nan\n", "curve").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_bathymetry("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, CarbonateError::Io { .. }));
    }
}
