//! # Holdings Pipeline
//!
//! Turns a raw fund-holdings export into consolidated positions and the views
//! derived from them.
//!
//! ```text
//! RawTable -> columns::map_columns -> normalize::normalize_rows
//!          -> consolidate::consolidate -> consolidate::rank
//!          -> distribution::bucket | range::select_range | kpis::compute_kpis
//! ```
//!
//! The crate performs no I/O. Raw tables come from a [`HoldingsSource`]
//! implementation supplied by the caller.
//!
//! ```rust,no_run
//! use holdings_pipeline::{HoldingsPipeline, InMemorySource};
//! use models::RawTable;
//!
//! let source = InMemorySource::new("example", RawTable::default());
//! let report = HoldingsPipeline::default().load(&source)?;
//! println!("{} positions", report.kpis.position_count);
//! # Ok::<(), holdings_pipeline::HoldingsError>(())
//! ```

pub mod columns;
pub mod consolidate;
pub mod distribution;
pub mod error;
pub mod export;
pub mod kpis;
pub mod normalize;
pub mod number;
pub mod pipeline;
pub mod range;
pub mod source;

pub use crate::columns::{ColumnAssignment, ColumnMapping, map_columns};
pub use crate::consolidate::{consolidate, rank};
pub use crate::distribution::{DEFAULT_THRESHOLD, bucket, residual_label};
pub use crate::error::{HoldingsError, Result};
pub use crate::export::{positions_to_csv_string, write_positions_csv, write_rows_csv};
pub use crate::kpis::{compute_kpis, format_exposure};
pub use crate::normalize::{NormalizedTable, normalize_rows};
pub use crate::number::{WeightParseError, parse_weight, parse_weight_str, try_parse_weight};
pub use crate::pipeline::{HoldingsPipeline, PipelineOptions};
pub use crate::range::{RankRange, select_range, top_positions};
pub use crate::source::{HoldingsSource, InMemorySource};
