use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::ModelError;

/// Dense row-major tensor of `f64` values.
///
/// Images travel through the network in `[batch, channels, height, width]`
/// (channel-first) layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Wraps `data` with the given shape, failing when the element count
    /// does not match.
    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Tensor, ModelError> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(ModelError::InvalidTensor { shape: shape.to_vec(), len: data.len() });
        }
        Ok(Tensor { shape: shape.to_vec(), data })
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal(rng: &mut ThreadRng) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / fan_in)).
    ///
    /// For a convolution kernel the fan-in is `in_channels * k * k`.
    pub fn he(shape: &[usize], fan_in: usize) -> Tensor {
        let mut rng = rand::thread_rng();
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        let mut res = Tensor::zeros(shape);
        for v in res.data.iter_mut() {
            *v = Tensor::sample_standard_normal(&mut rng) * std_dev;
        }
        res
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `(batch, channels, height, width)` for a rank-4 tensor.
    pub fn dims4(&self) -> Result<(usize, usize, usize, usize), ModelError> {
        match self.shape.as_slice() {
            &[n, c, h, w] => Ok((n, c, h, w)),
            _ => Err(ModelError::InvalidTensor { shape: self.shape.clone(), len: self.data.len() }),
        }
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn clamp(&self, lo: f64, hi: f64) -> Tensor {
        self.map(|x| x.clamp(lo, hi))
    }

    /// Repeats the single channel of a `[n, 1, h, w]` tensor `count` times,
    /// producing `[n, count, h, w]`.
    pub fn replicate_channels(&self, count: usize) -> Result<Tensor, ModelError> {
        let (n, c, h, w) = self.dims4()?;
        if c != 1 {
            return Err(ModelError::ShapeMismatch { expected: 1, found: c });
        }
        let plane = h * w;
        let mut data = Vec::with_capacity(n * count * plane);
        for b in 0..n {
            let src = &self.data[b * plane..(b + 1) * plane];
            for _ in 0..count {
                data.extend_from_slice(src);
            }
        }
        Ok(Tensor { shape: vec![n, count, h, w], data })
    }

    /// Reorders the first batch entry from `[c, h, w]` to `[h, w, c]`.
    pub fn to_channel_last(&self) -> Result<Vec<f64>, ModelError> {
        let (_, c, h, w) = self.dims4()?;
        let plane = h * w;
        let mut out = Vec::with_capacity(c * plane);
        for p in 0..plane {
            for ch in 0..c {
                out.push(self.data[ch * plane + p]);
            }
        }
        Ok(out)
    }
}
