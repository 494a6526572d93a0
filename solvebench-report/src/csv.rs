//! CSV Persistence
//!
//! Serializes the results table to a header-plus-rows CSV file and
//! parses it back. Quoting follows the usual convention: fields
//! containing a comma, quote, or newline are wrapped in double quotes
//! with embedded quotes doubled, so solver output embeds losslessly.

use std::fs;
use std::path::Path;

use crate::ReportError;
use crate::table::ResultsTable;

/// Column set of the raw results table, in order
pub const RAW_TABLE_COLUMNS: [&str; 9] = [
    "level",
    "run",
    "duration_secs",
    "cpu_time_secs",
    "peak_memory_bytes",
    "exit_code",
    "timed_out",
    "stdout",
    "stderr",
];

/// Serialize a table to CSV text (header + one row per trial)
pub fn table_to_csv(table: &ResultsTable) -> String {
    let mut out = String::new();
    out.push_str(&RAW_TABLE_COLUMNS.join(","));
    out.push('\n');

    for trial in table.rows() {
        let fields = [
            escape_field(&trial.level),
            trial.run.to_string(),
            format!("{:.6}", trial.duration.as_secs_f64()),
            trial
                .cpu_time
                .map(|d| format!("{:.6}", d.as_secs_f64()))
                .unwrap_or_default(),
            trial
                .peak_memory_bytes
                .map(|b| b.to_string())
                .unwrap_or_default(),
            trial
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_default(),
            trial.timed_out.to_string(),
            escape_field(&trial.stdout),
            escape_field(&trial.stderr),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Write a table to `path` as CSV
pub fn write_table(table: &ResultsTable, path: &Path) -> Result<(), ReportError> {
    fs::write(path, table_to_csv(table)).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A parsed CSV file: header row plus data rows
#[derive(Debug, Clone)]
pub struct CsvDocument {
    /// Column names from the header row
    pub header: Vec<String>,
    /// Data rows, each with one string per column
    pub rows: Vec<Vec<String>>,
}

/// Parse CSV text produced by [`table_to_csv`]
pub fn parse_csv(text: &str) -> Result<CsvDocument, ReportError> {
    let mut records = parse_records(text)?;
    if records.is_empty() {
        return Err(ReportError::MalformedCsv("missing header row".to_string()));
    }

    let header = records.remove(0);
    for (i, row) in records.iter().enumerate() {
        if row.len() != header.len() {
            return Err(ReportError::MalformedCsv(format!(
                "row {} has {} fields, expected {}",
                i + 1,
                row.len(),
                header.len()
            )));
        }
    }

    Ok(CsvDocument {
        header,
        rows: records,
    })
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_records(text: &str) -> Result<Vec<Vec<String>>, ReportError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ReportError::MalformedCsv(
            "unterminated quoted field".to_string(),
        ));
    }

    // Final record without a trailing newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solvebench_core::Trial;
    use std::time::Duration;

    fn trial(level: &str, run: u32) -> Trial {
        Trial {
            level: level.to_string(),
            run,
            duration: Duration::from_millis(125),
            cpu_time: Some(Duration::from_millis(100)),
            peak_memory_bytes: Some(2 * 1024 * 1024),
            exit_code: Some(0),
            timed_out: false,
            stdout: "solved".to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_header_matches_column_set() {
        let table = ResultsTable::new();
        let csv = table_to_csv(&table);
        assert_eq!(csv.trim_end(), RAW_TABLE_COLUMNS.join(","));
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let mut table = ResultsTable::new();
        for run in 1..=3 {
            table.push(trial("easy", run));
        }
        for run in 1..=3 {
            table.push(trial("hard", run));
        }

        let doc = parse_csv(&table_to_csv(&table)).unwrap();

        assert_eq!(doc.header, RAW_TABLE_COLUMNS);
        assert_eq!(doc.rows.len(), table.len());
        assert_eq!(doc.rows[0][0], "easy");
        assert_eq!(doc.rows[3][0], "hard");
        assert_eq!(doc.rows[3][1], "1");
    }

    #[test]
    fn test_missing_metrics_are_empty_fields() {
        let mut t = trial("easy", 1);
        t.cpu_time = None;
        t.peak_memory_bytes = None;
        let mut table = ResultsTable::new();
        table.push(t);

        let doc = parse_csv(&table_to_csv(&table)).unwrap();
        assert_eq!(doc.rows[0][3], "");
        assert_eq!(doc.rows[0][4], "");
    }

    #[test]
    fn test_quoting_survives_awkward_output() {
        let mut t = trial("easy", 1);
        t.stdout = "line one\nline \"two\", with commas".to_string();
        t.stderr = "warning: , odd".to_string();
        let mut table = ResultsTable::new();
        table.push(t);

        let doc = parse_csv(&table_to_csv(&table)).unwrap();
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0][7], "line one\nline \"two\", with commas");
        assert_eq!(doc.rows[0][8], "warning: , odd");
    }

    #[test]
    fn test_negative_exit_code_round_trips() {
        let mut t = trial("crashy", 1);
        t.exit_code = Some(-9);
        let mut table = ResultsTable::new();
        table.push(t);

        let doc = parse_csv(&table_to_csv(&table)).unwrap();
        assert_eq!(doc.rows[0][5], "-9");
    }

    #[test]
    fn test_unterminated_quote_is_an_error() {
        let err = parse_csv("a,b\n\"oops,1\n").unwrap_err();
        assert!(matches!(err, ReportError::MalformedCsv(_)));
    }

    #[test]
    fn test_write_table_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solver_times.csv");

        let mut table = ResultsTable::new();
        table.push(trial("easy", 1));
        write_table(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let doc = parse_csv(&text).unwrap();
        assert_eq!(doc.rows.len(), 1);
    }
}
