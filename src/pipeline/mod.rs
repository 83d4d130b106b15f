// Data processing pipeline

pub mod processing;
