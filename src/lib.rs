//! Fixed-layout PDF engine for daily site activity reports: header,
//! work-item table and a paginated photo grid on A4 pages. The HTTP
//! surface lives in the binary; this crate is the synchronous core.

pub mod composer;
pub mod draw;
pub mod error;
pub mod font_metrics;
pub mod layout;
pub mod report;
pub mod text;

pub use composer::build_report;
pub use error::ReportError;
pub use font_metrics::FontPaths;
pub use report::{parse_report_text, ReportRecord};
