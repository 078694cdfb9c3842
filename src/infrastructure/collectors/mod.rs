pub mod json_file_collector;
pub mod mock_collector;

pub use json_file_collector::{read_records, JsonFileCollector};
pub use mock_collector::MockCollector;
