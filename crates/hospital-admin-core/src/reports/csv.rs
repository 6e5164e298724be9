//! CSV export for reports.

use super::{ReportBody, ReportModel};

impl ReportModel {
    /// Export to CSV format.
    ///
    /// Scalar reports produce one `label,value` line per metric with no
    /// header. Tabular reports produce a header line and one line per row.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        match &self.body {
            ReportBody::Scalar(metrics) => {
                for metric in metrics {
                    csv.push_str(&format!(
                        "{},{}\n",
                        escape_csv(&metric.label),
                        metric.value
                    ));
                }
            }
            ReportBody::Table(table) => {
                push_row(&mut csv, &table.columns);
                for row in &table.rows {
                    push_row(&mut csv, row);
                }
            }
        }

        csv
    }

    /// Suggested download name, e.g. `revenue_2024-04-01_2024-04-30.csv`.
    pub fn csv_file_name(&self) -> String {
        format!("{}_{}_{}.csv", self.kind, self.range.from, self.range.to)
    }
}

fn push_row(csv: &mut String, cells: &[String]) {
    let line = cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",");
    csv.push_str(&line);
    csv.push('\n');
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
