pub mod plateau;
pub mod sgd;

pub use plateau::{PlateauConfig, ReduceLrOnPlateau};
pub use sgd::Sgd;
