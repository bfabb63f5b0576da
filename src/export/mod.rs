//! Export formats for the employee table.

pub mod csv;

pub use self::csv::{export_filename, render_csv, CSV_HEADER};
