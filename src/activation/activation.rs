use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::math::tensor::Tensor;

/// Element-wise non-linearity applied after each convolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    Tanh,
    LeakyReLU { alpha: f64 },
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Applies the activation to every element of `input` in place.
    pub fn apply(&self, input: &mut Tensor) {
        if *self == ActivationFunction::Identity {
            return;
        }
        for v in input.data.iter_mut() {
            *v = self.function(*v);
        }
    }
}
