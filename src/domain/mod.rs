pub mod engines;
pub mod entities;
pub mod ports;
pub mod stats;
pub mod value_objects;
