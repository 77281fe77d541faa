use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};

use crate::error::Result;
use crate::report::ResultRow;

/// CSV column names, in column order.
pub const CSV_HEADER: [&str; 5] = [
    "run_id",
    "run_date",
    "job_name",
    "duration_seconds",
    "duration_minutes",
];

/// Writes `rows` as CSV to `path`, creating missing parent directories.
///
/// The header row is always written, even when there are no rows.
pub fn write_csv(path: &Path, rows: &[ResultRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    write_rows(File::create(path)?, rows)
}

/// Writes the header and `rows` to `output` with line-feed line endings.
pub fn write_rows<W: Write>(output: W, rows: &[ResultRow]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output);

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(run_id: u64, job_name: &str, seconds: f64) -> ResultRow {
        ResultRow {
            run_id,
            run_date: Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap(),
            job_name: job_name.to_string(),
            duration_seconds: seconds,
            duration_minutes: seconds / 60.0,
        }
    }

    #[test]
    fn test_write_rows_format() {
        let mut output = Vec::new();
        write_rows(
            &mut output,
            &[row(11, "tests (windows-latest, 3.12)", 125.0), row(12, "win", 90.0)],
        )
        .unwrap();

        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "run_id,run_date,job_name,duration_seconds,duration_minutes"
        );
        assert!(lines[1].starts_with("11,2024-06-01T08:30:00Z,\"tests (windows-latest, 3.12)\",125.0,2.08333"));
        assert_eq!(lines[2], "12,2024-06-01T08:30:00Z,win,90.0,1.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_rows_uses_line_feeds_only() {
        let mut output = Vec::new();
        write_rows(&mut output, &[row(1, "windows", 60.0)]).unwrap();

        let csv = String::from_utf8(output).unwrap();
        assert!(!csv.contains('\r'));
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_write_rows_header_without_rows() {
        let mut output = Vec::new();
        write_rows(&mut output, &[]).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "run_id,run_date,job_name,duration_seconds,duration_minutes\n"
        );
    }

    #[test]
    fn test_write_csv_creates_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data").join("windows_ci_times.csv");

        write_csv(&path, &[row(5, "windows", 30.0)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("5,2024-06-01T08:30:00Z,windows,30.0,0.5"));
    }
}
