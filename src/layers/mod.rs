pub mod conv;
pub mod dense;
pub mod pool;

pub use conv::Conv2d;
pub use dense::Dense;
pub use pool::{GlobalAvgPool, MaxPool2d};

use crate::math::matrix::Matrix;

/// A learnable tensor paired with the gradient accumulated for it.
pub struct ParamMut<'a> {
    pub value: &'a mut Matrix,
    pub grad: &'a Matrix,
}
