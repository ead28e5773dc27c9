use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::ParamMut, math::matrix::Matrix};

/// Fully connected layer used by the classifier head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    pub weights: Matrix, // (size, input_size)
    pub biases: Matrix,  // (1, size)
    pub activator: ActivationFunction,
    #[serde(skip)]
    input: Vec<f64>,
    #[serde(skip)]
    pre_neurons: Vec<f64>, // z = Wx + b, needed for σ'(z)
    #[serde(skip)]
    grad_w: Matrix,
    #[serde(skip)]
    grad_b: Matrix,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        let weights = Matrix::he(size, input_size, input_size, rng);
        let biases = Matrix::zeros(1, size);

        Dense {
            size,
            grad_w: Matrix::zeros(weights.rows, weights.cols),
            grad_b: Matrix::zeros(1, size),
            weights,
            biases,
            activator: activation,
            input: Vec::new(),
            pre_neurons: Vec::new(),
        }
    }

    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.mul_vec(input);
        for (zi, b) in z.iter_mut().zip(&self.biases.data) {
            *zi += b;
        }
        let a = z.iter().map(|&x| self.activator.function(x)).collect();
        self.input = input.to_vec();
        self.pre_neurons = z;
        a
    }

    /// Backpropagates `delta` (∂L/∂a for this layer's output).
    ///
    /// Accumulates parameter gradients and returns ∂L/∂input.
    pub fn backward(&mut self, delta: &[f64]) -> Vec<f64> {
        if self.grad_w.shape() != self.weights.shape() {
            self.zero_grad();
        }
        // δ = error ⊙ σ'(z)
        let layer_delta: Vec<f64> = delta.iter().zip(&self.pre_neurons)
            .map(|(d, &z)| d * self.activator.derivative(z))
            .collect();

        self.grad_w.add_outer(&layer_delta, &self.input);
        for (g, d) in self.grad_b.data.iter_mut().zip(&layer_delta) {
            *g += d;
        }

        self.weights.t_mul_vec(&layer_delta)
    }

    pub fn zero_grad(&mut self) {
        self.grad_w.reset_like(&self.weights);
        self.grad_b.reset_like(&self.biases);
    }

    pub fn params_mut(&mut self) -> [ParamMut<'_>; 2] {
        if self.grad_w.shape() != self.weights.shape() {
            self.zero_grad();
        }
        [
            ParamMut { value: &mut self.weights, grad: &self.grad_w },
            ParamMut { value: &mut self.biases, grad: &self.grad_b },
        ]
    }
}
