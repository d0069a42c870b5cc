// src/process/mod.rs
pub mod table;
pub mod write;
pub mod xml;

pub use table::Table;
pub use write::{read_snapshot, snapshot_file_name, write_snapshot, FILE_PREFIX, OUTPUT_DIR};
pub use xml::parse_sites;
