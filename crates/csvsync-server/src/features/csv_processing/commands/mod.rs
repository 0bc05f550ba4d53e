pub mod process;

pub use process::{ProcessCsvCommand, ProcessCsvError, ProcessCsvReport};
