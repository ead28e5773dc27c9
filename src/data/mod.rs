pub mod dataset;
pub mod decode;
pub mod loader;

pub use dataset::{DatasetIndex, MelDataset, MelSample, Splits};
pub use loader::{DataLoader, Loaders};
