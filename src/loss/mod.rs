pub mod cross_entropy;
pub mod focal;
pub mod loss_type;

pub use cross_entropy::CrossEntropyLoss;
pub use focal::FocalLoss;
pub use loss_type::{Criterion, LossType};
