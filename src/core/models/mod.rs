pub mod range;
pub mod stats;
pub mod trend;
