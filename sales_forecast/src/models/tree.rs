//! CART regression trees shared by the forest and boosting ensembles

use crate::features::FEATURE_COUNT;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// A fitted regression tree minimising squared error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows selected by `sample_indices`.
    ///
    /// Indices may repeat (bootstrap samples). `rng` is only consulted when
    /// `max_features` restricts the candidate features per split.
    pub fn fit(
        config: &TreeConfig,
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        sample_indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut indices = sample_indices.to_vec();
        let root = grow(config, rows, targets, &mut indices, 0, rng);
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn mean_and_sse(targets: &[f64], indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / n;
    let sse = indices
        .iter()
        .map(|&i| (targets[i] - mean).powi(2))
        .sum::<f64>();
    (mean, sse)
}

fn grow(
    config: &TreeConfig,
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: &mut [usize],
    depth: usize,
    rng: &mut ChaCha8Rng,
) -> TreeNode {
    let (mean, sse) = mean_and_sse(targets, indices);
    let leaf = TreeNode::Leaf {
        value: mean,
        n_samples: indices.len(),
    };

    let depth_reached = config.max_depth.map_or(false, |max| depth >= max);
    if depth_reached
        || indices.len() < config.min_samples_split.max(2)
        || sse <= f64::EPSILON * (1.0 + mean * mean) * indices.len() as f64
    {
        return leaf;
    }

    let Some(best) = best_split(config, rows, targets, indices, rng) else {
        return leaf;
    };
    if best.sse >= sse {
        return leaf;
    }

    // Partition in place: rows going left first
    let mut boundary = 0;
    for i in 0..indices.len() {
        if rows[indices[i]][best.feature] <= best.threshold {
            indices.swap(i, boundary);
            boundary += 1;
        }
    }
    let (left_idx, right_idx) = indices.split_at_mut(boundary);

    let left = grow(config, rows, targets, left_idx, depth + 1, rng);
    let right = grow(config, rows, targets, right_idx, depth + 1, rng);

    TreeNode::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn best_split(
    config: &TreeConfig,
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
    if let Some(max) = config.max_features.filter(|&m| m < FEATURE_COUNT) {
        features.shuffle(rng);
        features.truncate(max.max(1));
        features.sort_unstable();
    }

    let min_leaf = config.min_samples_leaf.max(1);
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i].powi(2)).sum();

    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for &feature in &features {
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 0..n - 1 {
            let y = targets[order[pos]];
            left_sum += y;
            left_sq += y * y;

            let here = rows[order[pos]][feature];
            let next = rows[order[pos + 1]][feature];
            let n_left = pos + 1;
            let n_right = n - n_left;
            if here == next || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (here + next) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}
