//! Lab series interpretation: ordering, trends, urate goal checks and
//! renal function derived from creatinine.

pub mod renal;
pub mod series;
pub mod urate;

pub use renal::{ckd_status, renal_function, CkdStatus, RenalFunction};
pub use series::{LabSeries, SeriesNotice, DEFAULT_TREND_WINDOW};
