//! Single-layer LSTM regressor for one-step-ahead prediction
//!
//! The network reads a window of scaled values one step at a time, applies
//! dropout to the final hidden state while training, and maps it to the next
//! value with one linear output unit. Gradients come from full
//! backpropagation through time and are applied with Adam.

use super::window::{NextStepPredictor, SupervisedWindows};
use crate::config::SequenceConfig;
use crate::error::{ForecastError, Result};
use ndarray::{s, Array, Array1, Array2, ArrayView1, Axis, Dimension, Zip};
use ndarray_rand::RandomExt;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;

const MODEL_NAME: &str = "LSTM";

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// Network weights. Gate rows are stacked input, forget, candidate, output.
#[derive(Debug, Clone)]
struct LstmParams {
    /// Input to gates [4H]
    w_x: Array1<f64>,
    /// Hidden to gates [4H, H]
    w_h: Array2<f64>,
    /// Gate bias [4H]
    b: Array1<f64>,
    /// Hidden to output [H]
    w_out: Array1<f64>,
    /// Output bias [1]
    b_out: Array1<f64>,
}

impl LstmParams {
    fn init(hidden: usize, rng: &mut ChaCha8Rng) -> Self {
        let limit = (1.0 / hidden as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        let mut b = Array1::<f64>::zeros(4 * hidden);
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        Self {
            w_x: Array1::random_using(4 * hidden, dist, rng),
            w_h: Array2::random_using((4 * hidden, hidden), dist, rng),
            b,
            w_out: Array1::random_using(hidden, dist, rng),
            b_out: Array1::zeros(1),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w_x: Array1::zeros(self.w_x.raw_dim()),
            w_h: Array2::zeros(self.w_h.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
            w_out: Array1::zeros(self.w_out.raw_dim()),
            b_out: Array1::zeros(self.b_out.raw_dim()),
        }
    }

    fn squared_norm(&self) -> f64 {
        let sq = |values: f64, x: &f64| values + x * x;
        self.w_x.iter().fold(0.0, sq)
            + self.w_h.iter().fold(0.0, sq)
            + self.b.iter().fold(0.0, sq)
            + self.w_out.iter().fold(0.0, sq)
            + self.b_out.iter().fold(0.0, sq)
    }

    fn scale(&mut self, factor: f64) {
        self.w_x *= factor;
        self.w_h *= factor;
        self.b *= factor;
        self.w_out *= factor;
        self.b_out *= factor;
    }
}

/// Activations kept from one forward step for the backward pass
struct StepCache {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

/// First and second moment estimates for Adam
#[derive(Debug, Clone)]
struct AdamState {
    m: LstmParams,
    v: LstmParams,
    step: i32,
}

impl AdamState {
    fn new(params: &LstmParams) -> Self {
        Self {
            m: params.zeros_like(),
            v: params.zeros_like(),
            step: 0,
        }
    }

    fn update(&mut self, params: &mut LstmParams, grads: &LstmParams, learning_rate: f64) {
        self.step += 1;
        let bias1 = 1.0 - ADAM_BETA1.powi(self.step);
        let bias2 = 1.0 - ADAM_BETA2.powi(self.step);
        let step_size = learning_rate * bias2.sqrt() / bias1;

        adam_tensor(&mut params.w_x, &grads.w_x, &mut self.m.w_x, &mut self.v.w_x, step_size);
        adam_tensor(&mut params.w_h, &grads.w_h, &mut self.m.w_h, &mut self.v.w_h, step_size);
        adam_tensor(&mut params.b, &grads.b, &mut self.m.b, &mut self.v.b, step_size);
        adam_tensor(
            &mut params.w_out,
            &grads.w_out,
            &mut self.m.w_out,
            &mut self.v.w_out,
            step_size,
        );
        adam_tensor(
            &mut params.b_out,
            &grads.b_out,
            &mut self.m.b_out,
            &mut self.v.b_out,
            step_size,
        );
    }
}

fn adam_tensor<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    step_size: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
            *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
            *p -= step_size * *m / (v.sqrt() + ADAM_EPSILON);
        });
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// LSTM network trained on windows of a scaled series
#[derive(Debug, Clone)]
pub struct LstmRegressor {
    window: usize,
    hidden: usize,
    dropout: f64,
    learning_rate: f64,
    batch_size: usize,
    gradient_clip: Option<f64>,
    params: LstmParams,
    rng: ChaCha8Rng,
    loss_history: Vec<f64>,
}

impl LstmRegressor {
    /// Fresh, randomly initialised network
    pub fn new(config: &SequenceConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let params = LstmParams::init(config.hidden_size, &mut rng);

        Self {
            window: config.window,
            hidden: config.hidden_size,
            dropout: config.dropout,
            learning_rate: config.learning_rate,
            batch_size: config.batch_size,
            gradient_clip: config.gradient_clip,
            params,
            rng,
            loss_history: Vec::new(),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    /// Mean training loss per completed epoch
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Train for `epochs` passes over the windows
    pub fn fit(&mut self, data: &SupervisedWindows, epochs: usize) -> Result<()> {
        if data.is_empty() {
            return Err(ForecastError::training(MODEL_NAME, "no training windows"));
        }
        if data.window() != self.window {
            return Err(ForecastError::training(
                MODEL_NAME,
                format!(
                    "windows have length {}, network expects {}",
                    data.window(),
                    self.window
                ),
            ));
        }

        let mut adam = AdamState::new(&self.params);
        let mut order: Vec<usize> = (0..data.len()).collect();

        for epoch in 0..epochs {
            order.shuffle(&mut self.rng);

            let mut epoch_loss = 0.0;
            for batch in order.chunks(self.batch_size) {
                let (loss, mut grads) = self.batch_gradients(data, batch);
                if !loss.is_finite() {
                    return Err(ForecastError::training(
                        MODEL_NAME,
                        format!("non-finite loss at epoch {}", epoch + 1),
                    ));
                }

                if let Some(clip) = self.gradient_clip {
                    let norm = grads.squared_norm().sqrt();
                    if norm > clip {
                        grads.scale(clip / norm);
                    }
                }

                adam.update(&mut self.params, &grads, self.learning_rate);
                epoch_loss += loss * batch.len() as f64;
            }

            let mean_loss = epoch_loss / data.len() as f64;
            tracing::debug!(epoch = epoch + 1, loss = mean_loss, "lstm epoch finished");
            self.loss_history.push(mean_loss);
        }

        Ok(())
    }

    /// Prediction for one window, without dropout
    pub fn predict(&self, window: ArrayView1<'_, f64>) -> f64 {
        let (h, _) = self.forward(window);
        self.params.w_out.dot(&h) + self.params.b_out[0]
    }

    /// Predictions for every window row
    pub fn predict_windows(&self, data: &SupervisedWindows) -> Vec<f64> {
        data.inputs.rows().into_iter().map(|row| self.predict(row)).collect()
    }

    /// Final hidden state and the per-step caches
    fn forward(&self, window: ArrayView1<'_, f64>) -> (Array1<f64>, Vec<StepCache>) {
        let hd = self.hidden;
        let mut h = Array1::<f64>::zeros(hd);
        let mut c = Array1::<f64>::zeros(hd);
        let mut caches = Vec::with_capacity(window.len());

        for &x in window.iter() {
            let z = &self.params.w_x * x + self.params.w_h.dot(&h) + &self.params.b;

            let i = z.slice(s![0..hd]).mapv(sigmoid);
            let f = z.slice(s![hd..2 * hd]).mapv(sigmoid);
            let g = z.slice(s![2 * hd..3 * hd]).mapv(f64::tanh);
            let o = z.slice(s![3 * hd..4 * hd]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            caches.push(StepCache {
                x,
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            h = h_next;
            c = c_next;
        }

        (h, caches)
    }

    /// Mean squared error over the batch and its gradient
    fn batch_gradients(&mut self, data: &SupervisedWindows, batch: &[usize]) -> (f64, LstmParams) {
        let hd = self.hidden;
        let n = batch.len() as f64;
        let dropout = self.dropout;
        let keep = 1.0 - dropout;
        let mut grads = self.params.zeros_like();
        let mut loss = 0.0;

        for &idx in batch {
            let (h_last, caches) = self.forward(data.inputs.row(idx));

            // Inverted dropout on the last hidden state.
            let mask: Array1<f64> = if dropout > 0.0 {
                let rng = &mut self.rng;
                Array1::from_shape_fn(hd, |_| {
                    if rng.gen::<f64>() < dropout {
                        0.0
                    } else {
                        1.0 / keep
                    }
                })
            } else {
                Array1::ones(hd)
            };
            let h_drop = &h_last * &mask;

            let prediction = self.params.w_out.dot(&h_drop) + self.params.b_out[0];
            let error = prediction - data.targets[idx];
            loss += error * error / n;

            let d_pred = 2.0 * error / n;
            grads.w_out.scaled_add(d_pred, &h_drop);
            grads.b_out[0] += d_pred;

            let mut dh = &self.params.w_out * d_pred * &mask;
            let mut dc_next = Array1::<f64>::zeros(hd);

            for step in caches.iter().rev() {
                let d_o = &dh * &step.tanh_c;
                let dc = &dc_next + &(&dh * &step.o * &step.tanh_c.mapv(|t| 1.0 - t * t));

                let d_i = &dc * &step.g;
                let d_g = &dc * &step.i;
                let d_f = &dc * &step.c_prev;
                dc_next = &dc * &step.f;

                let mut dz = Array1::<f64>::zeros(4 * hd);
                dz.slice_mut(s![0..hd])
                    .assign(&(&d_i * &step.i.mapv(|v| v * (1.0 - v))));
                dz.slice_mut(s![hd..2 * hd])
                    .assign(&(&d_f * &step.f.mapv(|v| v * (1.0 - v))));
                dz.slice_mut(s![2 * hd..3 * hd])
                    .assign(&(&d_g * &step.g.mapv(|v| 1.0 - v * v)));
                dz.slice_mut(s![3 * hd..4 * hd])
                    .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

                grads.w_x.scaled_add(step.x, &dz);
                let dz_col = dz.view().insert_axis(Axis(1));
                let h_row = step.h_prev.view().insert_axis(Axis(0));
                grads.w_h += &dz_col.dot(&h_row);
                grads.b += &dz;

                dh = self.params.w_h.t().dot(&dz);
            }
        }

        (loss, grads)
    }
}

impl NextStepPredictor for LstmRegressor {
    fn window(&self) -> usize {
        self.window
    }

    fn predict_next(&self, window: &[f64]) -> f64 {
        self.predict(ArrayView1::from(window))
    }
}
