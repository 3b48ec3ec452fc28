pub mod dataset;
pub mod types;

pub use dataset::load_dataset;
pub use types::TaskRecord;
