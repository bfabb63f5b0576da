//! CSV rendering of employee rows.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Number;

use crate::store::Employee;

/// Fixed column order of the export.
pub const CSV_HEADER: [&str; 6] = ["emp_id", "name", "email", "department", "salary", "created_at"];

/// Render `employees` as CSV with a header row. Missing values are empty cells.
pub fn render_csv(employees: &[Employee]) -> Result<Vec<u8>, ::csv::Error> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for employee in employees {
        let salary = employee.salary.as_ref().map(Number::to_string).unwrap_or_default();
        let created_at = employee
            .created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            .unwrap_or_default();

        writer.write_record([
            employee.emp_id.as_str(),
            employee.name.as_deref().unwrap_or(""),
            employee.email.as_deref().unwrap_or(""),
            employee.department.as_deref().unwrap_or(""),
            salary.as_str(),
            created_at.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Attachment name for an export taken at `at`.
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("employees_{}.csv", at.format("%Y%m%d_%H%M%S"))
}
