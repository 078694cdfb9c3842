pub mod analysis;
pub mod collection;
pub mod report;
