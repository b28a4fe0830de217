//! Transport types shared by the compute crate and the HTTP server.
//! The aggregation report is produced in `compute` and serialized as-is by
//! the `/aggregation` handler, so its shape lives here once.

mod period;
mod report;

pub use period::{DateRange, ParsePeriodError, Period};
pub use report::{AggregationReport, KpiBlock};
