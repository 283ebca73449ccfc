pub mod csv_source;
pub mod in_memory;
pub mod sheet;

pub use csv_source::CsvTableSource;
pub use in_memory::InMemoryTableSource;
pub use sheet::trim_to_header;
