// Domain data shapes shared across layers

pub mod record;

pub use record::{coerce_latitude, RawRecord, Record, RecordId};
