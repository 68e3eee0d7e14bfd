//! Report ingestion and partition output layer.

pub mod reports;
pub mod summary;
pub mod writer;

pub use reports::{load_reports, Report};
pub use writer::{write_partitions, OutputFormat, WriteReport};
