// Pipeline processing: validation and cleaning

pub mod quality_gate;
