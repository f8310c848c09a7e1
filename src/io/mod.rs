pub mod csv_export;
pub mod fetch;
pub mod file;

pub use fetch::{DataSource, Loader};
