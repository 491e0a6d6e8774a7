use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, relu, softmax},
};

use crate::domain::features::GridShape;

/// (filters, kernel size) of each conv → pool → dropout block.
pub const CONV_BLOCKS: [(usize, usize); 4] = [(16, 3), (32, 3), (32, 3), (64, 2)];
pub const POOL_SIZE: usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct AudioCnnConfig {
    pub num_classes: usize,
    #[config(default = 40)]
    pub input_rows: usize,
    #[config(default = 108)]
    pub input_cols: usize,
    #[config(default = 1)]
    pub input_channels: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl AudioCnnConfig {
    /// Network sized for `num_classes` over grids of the given shape.
    pub fn for_grid(num_classes: usize, grid: GridShape, dropout: f64) -> Self {
        Self::new(num_classes)
            .with_input_rows(grid.rows)
            .with_input_cols(grid.cols)
            .with_input_channels(grid.channels)
            .with_dropout(dropout)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> AudioCnn<B> {
        let mut in_channels = self.input_channels;
        let blocks = CONV_BLOCKS
            .iter()
            .map(|&(filters, kernel)| {
                let block = ConvBlock {
                    conv:    Conv2dConfig::new([in_channels, filters], [kernel, kernel]).init(device),
                    pool:    MaxPool2dConfig::new([POOL_SIZE, POOL_SIZE])
                        .with_strides([POOL_SIZE, POOL_SIZE])
                        .init(),
                    dropout: DropoutConfig::new(self.dropout).init(),
                };
                in_channels = filters;
                block
            })
            .collect();

        AudioCnn {
            blocks,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head:        LinearConfig::new(in_channels, self.num_classes).init(device),
        }
    }

    /// Output shape and parameter count of every layer, without
    /// building the model.
    pub fn layer_summaries(&self) -> Vec<LayerSummary> {
        let mut layers      = Vec::new();
        let mut channels    = self.input_channels;
        let (mut h, mut w)  = (self.input_rows, self.input_cols);

        for (i, &(filters, kernel)) in CONV_BLOCKS.iter().enumerate() {
            h = (h + 1).saturating_sub(kernel);
            w = (w + 1).saturating_sub(kernel);
            layers.push(LayerSummary {
                name:   format!("conv2d_{}", i + 1),
                output: vec![h, w, filters],
                params: kernel * kernel * channels * filters + filters,
            });
            h /= POOL_SIZE;
            w /= POOL_SIZE;
            layers.push(LayerSummary {
                name:   format!("max_pooling2d_{}", i + 1),
                output: vec![h, w, filters],
                params: 0,
            });
            layers.push(LayerSummary {
                name:   format!("dropout_{}", i + 1),
                output: vec![h, w, filters],
                params: 0,
            });
            channels = filters;
        }

        layers.push(LayerSummary {
            name:   "global_average_pooling2d".to_string(),
            output: vec![channels],
            params: 0,
        });
        layers.push(LayerSummary {
            name:   "dense".to_string(),
            output: vec![self.num_classes],
            params: channels * self.num_classes + self.num_classes,
        });
        layers
    }
}

/// One row of the architecture summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name:   String,
    /// Output shape excluding the batch axis, channels last.
    pub output: Vec<usize>,
    pub params: usize,
}

/// Render the summary table printed before training.
pub fn format_summary(layers: &[LayerSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<28}{:<20}{:>10}\n", "Layer", "Output Shape", "Param #"));
    out.push_str(&format!("{}\n", "=".repeat(58)));
    for layer in layers {
        let dims = layer.output.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ");
        out.push_str(&format!(
            "{:<28}{:<20}{:>10}\n",
            layer.name, format!("(None, {dims})"), layer.params
        ));
    }
    out.push_str(&format!("{}\n", "=".repeat(58)));
    let total: usize = layers.iter().map(|l| l.params).sum();
    out.push_str(&format!("Total params: {total}\n"));
    out
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:    Conv2d<B>,
    pub pool:    MaxPool2d,
    pub dropout: Dropout,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.conv.forward(x));
        self.dropout.forward(self.pool.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct AudioCnn<B: Backend> {
    pub blocks:      Vec<ConvBlock<B>>,
    pub global_pool: AdaptiveAvgPool2d,
    pub head:        Linear<B>,
}

impl<B: Backend> AudioCnn<B> {
    /// inputs: [batch, channels, rows, cols] → logits: [batch, classes]
    pub fn forward(&self, inputs: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = inputs;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let [batch, channels, _, _] = x.dims();
        let pooled = self.global_pool.forward(x).reshape([batch, channels]);
        self.head.forward(pooled)
    }

    /// Class probabilities (softmax over logits).
    pub fn forward_probs(&self, inputs: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(inputs), 1)
    }

    /// Categorical cross-entropy against one-hot targets, averaged
    /// over the batch. Returns the loss and the logits.
    pub fn forward_loss(
        &self,
        inputs:  Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(inputs);
        let loss   = categorical_cross_entropy(logits.clone(), targets);
        (loss, logits)
    }
}

/// −Σ y · log softmax(z), mean over the batch.
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (targets * log_softmax(logits, 1))
        .sum_dim(1)
        .mean()
        .neg()
}

/// Number of rows whose logit argmax equals the target argmax.
pub fn correct_predictions<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let expected  = targets.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(expected)
        .int().sum().into_scalar().elem::<i64>();
    correct as usize
}
