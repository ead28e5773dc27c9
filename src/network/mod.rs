pub mod metadata;
pub mod network;
pub mod spec;

pub use metadata::ModelMetadata;
pub use network::{ConvBlock, Network};
pub use spec::{BackboneSpec, KNOWN_BACKBONES};
