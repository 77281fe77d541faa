use std::fmt::Write;

use comfy_table::Cell;

use crate::report::{job_stats, JobTimesReport};

use super::style::{bright, bright_yellow, create_table, cyan, dim, header_cells, minutes_cell};

/// Prints a human-readable summary of the collected job durations to stdout.
///
/// Shows the analysed window and counts, then one table row per job name with
/// count, mean, P50, P95, min and max duration in minutes.
pub fn print_summary(report: &JobTimesReport) {
    println!("{}", render_summary(report));
}

fn render_summary(report: &JobTimesReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} {}", bright("📊"), bright("Overview").underlined());
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {} → {}\n  {} {}\n  {} {}\n",
        dim("Repository:"),
        cyan(&report.repository),
        dim("Workflow:"),
        cyan(&report.workflow),
        dim("Window:"),
        report.since.format("%Y-%m-%d %H:%M UTC"),
        report.until.format("%Y-%m-%d %H:%M UTC"),
        dim("Successful runs analyzed:"),
        bright_yellow(report.runs_analyzed),
        dim(format!("'{}' job results:", report.platform)),
        bright_yellow(report.rows.len()),
    );

    let stats = job_stats(&report.rows);
    if stats.is_empty() {
        return output;
    }

    let _ = writeln!(output, "{} {}", bright("⏱️"), bright("Job durations").underlined());

    let mut table = create_table();
    table.set_header(header_cells(&["Job", "Runs", "Mean", "P50", "P95", "Min", "Max"]));
    for job in &stats {
        table.add_row(vec![
            Cell::new(&job.name),
            Cell::new(job.count),
            minutes_cell(job.mean),
            minutes_cell(job.p50),
            minutes_cell(job.p95),
            minutes_cell(job.min),
            minutes_cell(job.max),
        ]);
    }
    let _ = writeln!(output, "{table}");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ResultRow;
    use chrono::{TimeZone, Utc};

    fn report(rows: Vec<ResultRow>) -> JobTimesReport {
        JobTimesReport {
            repository: "conda/conda".to_string(),
            workflow: "tests.yml".to_string(),
            platform: "windows".to_string(),
            since: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            until: Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap(),
            runs_analyzed: 2,
            rows,
        }
    }

    #[test]
    fn test_render_summary_lists_jobs() {
        let rows = vec![ResultRow {
            run_id: 1,
            run_date: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            job_name: "tests (windows-latest, 3.12)".to_string(),
            duration_seconds: 750.0,
            duration_minutes: 12.5,
        }];

        let rendered = console::strip_ansi_codes(&render_summary(&report(rows))).to_string();

        assert!(rendered.contains("conda/conda"));
        assert!(rendered.contains("2024-03-01 00:00 UTC"));
        assert!(rendered.contains("tests (windows-latest, 3.12)"));
        assert!(rendered.contains("12.5min"));
    }

    #[test]
    fn test_render_summary_without_rows_has_no_table() {
        let rendered = console::strip_ansi_codes(&render_summary(&report(vec![]))).to_string();

        assert!(rendered.contains("'windows' job results: 0"));
        assert!(!rendered.contains("Job durations"));
    }
}
