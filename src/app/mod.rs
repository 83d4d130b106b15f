// Application layer: use cases and the ports they depend on

pub mod ingest_use_case;
pub mod ports;
pub mod quality_gate_use_case;

pub use ingest_use_case::{IngestUseCase, PaginationSettings};
pub use quality_gate_use_case::{QualityGateUseCase, RunSummary, TableNames};
