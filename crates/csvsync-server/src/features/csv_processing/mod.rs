pub mod commands;
pub mod routes;

pub use commands::{ProcessCsvCommand, ProcessCsvError, ProcessCsvReport};

pub use routes::csv_processing_routes;
