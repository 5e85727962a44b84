// ============================================================
// Layer 5 — Shared Dense Stack
// ============================================================
// hidden Linear + ReLU (one per dense_units entry)
//   → output Linear with one unit, no activation
//
// A single DenseStack instance is owned by the model and
// applied three times per step (weighted word embedding,
// class embedding 0, class embedding 1). Every call reads the
// same Param handles, so gradients from all three paths land
// on the same weights.

use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct DenseStackConfig {
    /// Width of the input vectors (the embedding size)
    pub d_input: usize,
    /// Hidden layer widths, applied in order
    pub units: Vec<usize>,
}

impl DenseStackConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DenseStack<B> {
        let mut d_in = self.d_input;
        let mut hidden = Vec::with_capacity(self.units.len());
        for &d_out in &self.units {
            hidden.push(xavier_linear(d_in, d_out, device));
            d_in = d_out;
        }
        let output = xavier_linear(d_in, 1, device);
        DenseStack { hidden, output }
    }
}

fn xavier_linear<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device)
}

#[derive(Module, Debug)]
pub struct DenseStack<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> DenseStack<B> {
    /// x: [n, d_input] → [n, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(x, |x, layer| relu(layer.forward(x)));
        self.output.forward(x)
    }
}
