use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Dense row-major matrix of `f64`.
///
/// Used for every learnable tensor in the crate: dense weights are stored as
/// `(out, in)`, convolution kernels as `(out_channels, in_channels * k * k)`,
/// and biases as `(1, n)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Wraps a flat row-major buffer. Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(
            data.len(),
            rows * cols,
            "Matrix::from_vec: buffer of {} does not fit {}x{}",
            data.len(), rows, cols
        );
        Matrix { rows, cols, data }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // (0, 1] on both draws keeps ln() finite.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / fan_in)).
    ///
    /// `fan_in` is passed explicitly because for convolution kernels it is
    /// `in_channels * k * k`, which equals `cols` only by layout convention.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let cols = self.cols;
        &mut self.data[r * cols..(r + 1) * cols]
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// `self · x` for a column vector `x` of length `cols`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.cols, "mul_vec: expected {} inputs, got {}", self.cols, x.len());
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(x).map(|(w, v)| w * v).sum())
            .collect()
    }

    /// `selfᵀ · d` for a column vector `d` of length `rows`.
    pub fn t_mul_vec(&self, d: &[f64]) -> Vec<f64> {
        assert_eq!(d.len(), self.rows, "t_mul_vec: expected {} inputs, got {}", self.rows, d.len());
        let mut out = vec![0.0; self.cols];
        for (r, &dr) in d.iter().enumerate() {
            if dr == 0.0 {
                continue;
            }
            for (o, &w) in out.iter_mut().zip(self.row(r)) {
                *o += w * dr;
            }
        }
        out
    }

    /// Accumulates the outer product `a · bᵀ` into `self`.
    pub fn add_outer(&mut self, a: &[f64], b: &[f64]) {
        assert_eq!((a.len(), b.len()), (self.rows, self.cols), "add_outer: shape mismatch");
        for (r, &ar) in a.iter().enumerate() {
            if ar == 0.0 {
                continue;
            }
            for (cell, &bc) in self.row_mut(r).iter_mut().zip(b) {
                *cell += ar * bc;
            }
        }
    }

    /// `self += scale * other`, element-wise.
    pub fn add_scaled(&mut self, other: &Matrix, scale: f64) {
        assert_eq!(self.shape(), other.shape(), "add_scaled: shape mismatch");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += scale * b;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for x in &mut self.data {
            *x *= factor;
        }
    }

    pub fn fill(&mut self, v: f64) {
        self.data.iter_mut().for_each(|x| *x = v);
    }

    /// Zeroes `self` and reshapes it to match `other` if needed.
    pub fn reset_like(&mut self, other: &Matrix) {
        if self.shape() == other.shape() {
            self.fill(0.0);
        } else {
            *self = Matrix::zeros(other.rows, other.cols);
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn mul_vec_and_t_mul_vec() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.mul_vec(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
        assert_eq!(m.t_mul_vec(&[1.0, 1.0]), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn add_outer_accumulates() {
        let mut m = Matrix::zeros(2, 2);
        m.add_outer(&[1.0, 2.0], &[3.0, 4.0]);
        m.add_outer(&[1.0, 0.0], &[1.0, 1.0]);
        assert_eq!(m.data, vec![4.0, 5.0, 6.0, 8.0]);
    }

    #[test]
    fn he_is_deterministic_for_a_seed() {
        let a = Matrix::he(4, 4, 4, &mut StdRng::seed_from_u64(7));
        let b = Matrix::he(4, 4, 4, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn reset_like_reshapes() {
        let mut g = Matrix::default();
        g.reset_like(&Matrix::zeros(3, 2));
        assert_eq!(g.shape(), (3, 2));
        assert_eq!(g.sum(), 0.0);
    }
}
