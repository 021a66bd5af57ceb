// Domain layer - Core types and algorithms, free of I/O
pub mod dashboard;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod settings;
pub mod telemetry;
