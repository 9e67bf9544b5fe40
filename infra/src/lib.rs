pub mod cosmos;
pub mod documents;
pub mod ids;
pub mod memory;
pub mod persistence;
