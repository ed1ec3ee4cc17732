use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, error::ModelError, math::tensor::Tensor};

/// 2-D convolution with stride 1 and zero "same" padding, so the spatial
/// size of the output always equals the spatial size of the input.
///
/// `weights` is stored flat in `[out_channels, in_channels, k, k]` order,
/// which is how the weights file lays it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Conv2d {
    /// Creates a layer with He-initialised weights and zero biases.
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: usize, activation: ActivationFunction) -> Conv2d {
        let fan_in = in_channels * kernel_size * kernel_size;
        let weights = Tensor::he(&[out_channels, in_channels, kernel_size, kernel_size], fan_in);
        Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            weights: weights.data,
            biases: vec![0.0; out_channels],
            activator: activation,
        }
    }

    /// Checks that the stored parameters agree with the declared shape.
    pub fn validate(&self, index: usize) -> Result<(), ModelError> {
        let invalid = |reason: String| Err(ModelError::InvalidLayer { index, reason });
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return invalid(format!("kernel size must be odd, got {}", self.kernel_size));
        }
        let expected = self.out_channels * self.in_channels * self.kernel_size * self.kernel_size;
        if self.weights.len() != expected {
            return invalid(format!("expected {} weights, found {}", expected, self.weights.len()));
        }
        if self.biases.len() != self.out_channels {
            return invalid(format!("expected {} biases, found {}", self.out_channels, self.biases.len()));
        }
        Ok(())
    }

    /// Inference-only forward pass over a `[n, in_channels, h, w]` tensor.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor, ModelError> {
        let (n, c, h, w) = input.dims4()?;
        if c != self.in_channels {
            return Err(ModelError::ShapeMismatch { expected: self.in_channels, found: c });
        }

        let k = self.kernel_size;
        let pad = (k / 2) as isize;
        let plane = h * w;
        let mut out = Tensor::zeros(&[n, self.out_channels, h, w]);

        for b in 0..n {
            let src = &input.data[b * c * plane..(b + 1) * c * plane];
            for oc in 0..self.out_channels {
                let dst_off = (b * self.out_channels + oc) * plane;
                let bias = self.biases[oc];
                for y in 0..h {
                    for x in 0..w {
                        let mut sum = bias;
                        for ic in 0..c {
                            let kernel = &self.weights[((oc * c + ic) * k * k)..((oc * c + ic + 1) * k * k)];
                            let channel = &src[ic * plane..(ic + 1) * plane];
                            for ky in 0..k {
                                let sy = y as isize + ky as isize - pad;
                                if sy < 0 || sy >= h as isize {
                                    continue;
                                }
                                for kx in 0..k {
                                    let sx = x as isize + kx as isize - pad;
                                    if sx < 0 || sx >= w as isize {
                                        continue;
                                    }
                                    sum += kernel[ky * k + kx] * channel[sy as usize * w + sx as usize];
                                }
                            }
                        }
                        out.data[dst_off + y * w + x] = sum;
                    }
                }
            }
        }

        self.activator.apply(&mut out);
        Ok(out)
    }
}
