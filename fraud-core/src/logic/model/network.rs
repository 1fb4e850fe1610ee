//! Dense feed-forward binary classifier
//!
//! ReLU hidden layers, sigmoid output, optional dropout after the first
//! hidden layer (training only).

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::inference::{FraudClassifier, InferenceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    fn apply(self, z: &mut Array2<f64>) {
        match self {
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv_inplace(sigmoid),
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// One fully connected layer; `weights` is (inputs x outputs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero biases
    fn glorot<R: Rng>(inputs: usize, outputs: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        Self {
            weights: Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit)),
            biases: Array1::zeros(outputs),
            activation,
        }
    }

    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        let mut z = input.dot(&self.weights) + &self.biases;
        self.activation.apply(&mut z);
        z
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
    /// Dropout rate after the first hidden layer
    dropout: f64,
}

/// Intermediate values of one training forward pass
pub(crate) struct ForwardCache {
    /// Input fed to each layer (after dropout of the previous one)
    inputs: Vec<Array2<f64>>,
    /// Activated output of each layer, before dropout
    outputs: Vec<Array2<f64>>,
    /// Scaled keep-mask applied to a layer's output, if any
    masks: Vec<Option<Array2<f64>>>,
}

impl ForwardCache {
    pub(crate) fn probabilities(&self) -> Array1<f64> {
        self.outputs
            .last()
            .map(|o| o.column(0).to_owned())
            .unwrap_or_else(|| Array1::zeros(0))
    }
}

/// Per-layer (weights, biases) gradients
pub(crate) type Gradients = Vec<(Array2<f64>, Array1<f64>)>;

impl DenseNetwork {
    pub fn new<R: Rng>(input_dim: usize, hidden: &[usize], dropout: f64, rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input_dim;

        for &width in hidden {
            layers.push(DenseLayer::glorot(fan_in, width, Activation::Relu, rng));
            fan_in = width;
        }
        layers.push(DenseLayer::glorot(fan_in, 1, Activation::Sigmoid, rng));

        Self { layers, dropout }
    }

    /// Build from explicit layers, checking the shape chain
    pub fn from_layers(layers: Vec<DenseLayer>, dropout: f64) -> Result<Self, InferenceError> {
        let network = Self { layers, dropout };
        network.validate()?;
        Ok(network)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn dropout(&self) -> f64 {
        self.dropout
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let Some(last) = self.layers.last() else {
            return Err(InferenceError::InvalidModel("network has no layers".to_string()));
        };

        if last.weights.ncols() != 1 || last.activation != Activation::Sigmoid {
            return Err(InferenceError::InvalidModel(
                "output layer must be a single sigmoid unit".to_string(),
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.biases.len() != layer.weights.ncols() {
                return Err(InferenceError::InvalidModel(format!(
                    "layer {}: {} biases for {} outputs",
                    i,
                    layer.biases.len(),
                    layer.weights.ncols()
                )));
            }
            if let Some(next) = self.layers.get(i + 1) {
                if next.weights.nrows() != layer.weights.ncols() {
                    return Err(InferenceError::InvalidModel(format!(
                        "layer {} outputs {} values but layer {} expects {}",
                        i,
                        layer.weights.ncols(),
                        i + 1,
                        next.weights.nrows()
                    )));
                }
            }
            if layer.weights.iter().chain(layer.biases.iter()).any(|v| !v.is_finite()) {
                return Err(InferenceError::InvalidModel(format!("layer {} has non-finite parameters", i)));
            }
        }

        Ok(())
    }

    /// Fraud probability for each row of `x`
    pub fn predict_batch(&self, x: &Array2<f64>) -> Array1<f64> {
        let mut a = x.to_owned();
        for layer in &self.layers {
            a = layer.forward(&a);
        }
        a.column(0).to_owned()
    }

    /// Forward pass with dropout, keeping what backprop needs
    pub(crate) fn forward_train<R: Rng>(&self, x: &Array2<f64>, rng: &mut R) -> ForwardCache {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut outputs = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(self.layers.len());

        let mut a = x.to_owned();
        let last = self.layers.len() - 1;

        for (i, layer) in self.layers.iter().enumerate() {
            let out = layer.forward(&a);
            inputs.push(a);

            let mask = if i == 0 && i != last && self.dropout > 0.0 {
                let keep = 1.0 - self.dropout;
                Some(out.mapv(|_| if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 }))
            } else {
                None
            };

            a = match &mask {
                Some(m) => &out * m,
                None => out.clone(),
            };
            outputs.push(out);
            masks.push(mask);
        }

        ForwardCache { inputs, outputs, masks }
    }

    /// Gradients of mean binary cross-entropy w.r.t. every parameter
    pub(crate) fn backward(&self, cache: &ForwardCache, y: &Array1<f64>) -> Gradients {
        let n = y.len().max(1) as f64;
        let last = self.layers.len() - 1;

        let target = y.view().insert_axis(Axis(1));
        // sigmoid + BCE: dL/dz = p - y
        let mut delta = (&cache.outputs[last] - &target) / n;
        let mut grads = vec![(Array2::zeros((0, 0)), Array1::zeros(0)); self.layers.len()];

        for l in (0..=last).rev() {
            let dw = cache.inputs[l].t().dot(&delta);
            let db = delta.sum_axis(Axis(0));
            grads[l] = (dw, db);

            if l > 0 {
                let mut da = delta.dot(&self.layers[l].weights.t());
                if let Some(mask) = &cache.masks[l - 1] {
                    da *= mask;
                }
                da.zip_mut_with(&cache.outputs[l - 1], |d, &a| {
                    if a <= 0.0 {
                        *d = 0.0;
                    }
                });
                delta = da;
            }
        }

        grads
    }
}

impl FraudClassifier for DenseNetwork {
    fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.weights.nrows()).unwrap_or(0)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        let expected = self.input_dim();
        if features.len() != expected {
            return Err(InferenceError::InputDimension {
                expected,
                actual: features.len(),
            });
        }

        let x = Array2::from_shape_vec((1, expected), features.to_vec())
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        Ok(self.predict_batch(&x)[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = DenseNetwork::new(30, &[32, 16], 0.2, &mut rng);

        assert_eq!(net.layers().len(), 3);
        assert_eq!(net.input_dim(), 30);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn test_predict_is_probability() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = DenseNetwork::new(4, &[8], 0.0, &mut rng);

        for x in [[0.0; 4], [100.0, -100.0, 50.0, 3.0], [-1e6; 4]] {
            let p = net.predict_proba(&x).unwrap();
            assert!((0.0..=1.0).contains(&p), "p = {}", p);
        }
    }

    #[test]
    fn test_input_dimension_checked() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = DenseNetwork::new(4, &[8], 0.0, &mut rng);

        assert!(matches!(
            net.predict_proba(&[1.0, 2.0]),
            Err(InferenceError::InputDimension { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_known_weights() {
        // single sigmoid unit: p = sigmoid(2*x0 - x1 + 0.5)
        let layer = DenseLayer {
            weights: array![[2.0], [-1.0]],
            biases: array![0.5],
            activation: Activation::Sigmoid,
        };
        let net = DenseNetwork::from_layers(vec![layer], 0.0).unwrap();

        let p = net.predict_proba(&[1.0, 3.0]).unwrap();
        assert!((p - sigmoid(-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_from_layers_rejects_broken_chain() {
        let hidden = DenseLayer {
            weights: Array2::zeros((3, 4)),
            biases: Array1::zeros(4),
            activation: Activation::Relu,
        };
        let output = DenseLayer {
            weights: Array2::zeros((5, 1)),
            biases: Array1::zeros(1),
            activation: Activation::Sigmoid,
        };

        assert!(matches!(
            DenseNetwork::from_layers(vec![hidden, output], 0.0),
            Err(InferenceError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = DenseNetwork::new(3, &[4], 0.0, &mut rng);
        let x = array![[0.5, -1.0, 2.0], [1.5, 0.3, -0.7]];
        let y = array![1.0, 0.0];

        let cache = net.forward_train(&x, &mut rng);
        let grads = net.backward(&cache, &y);

        let loss = |n: &DenseNetwork| {
            let p = n.predict_batch(&x);
            p.iter()
                .zip(y.iter())
                .map(|(p, y)| -(y * p.ln() + (1.0 - y) * (1.0 - p).ln()))
                .sum::<f64>()
                / 2.0
        };

        let eps = 1e-6;
        let mut plus = net.clone();
        plus.layers_mut()[0].weights[[1, 2]] += eps;
        let mut minus = net.clone();
        minus.layers_mut()[0].weights[[1, 2]] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);

        assert!((grads[0].0[[1, 2]] - numeric).abs() < 1e-6);
    }
}
