//! Callsign lookups across the supported callbooks.

pub mod acma;
pub mod callook;
pub mod enrichment;
pub mod error;
pub mod hamqth;
pub mod ic;
pub mod nkom;
pub mod pipeline;
pub mod renderer;
pub mod source;
pub mod types;

pub use error::LookupError;
pub use pipeline::{CallbookPipeline, CallbookSources, Resolution, Resolved};
pub use source::{CachedCallbook, CallbookSource};
pub use types::{CallbookRecord, Source, UnknownCallsign};
