//! Bagged CART forest for the top-two finish label.
//!
//! Gini-split trees over bootstrap resamples with sqrt-p feature
//! subsampling; everything is seeded so a fit is reproducible bit for bit.
//! The trained model round-trips through a JSON artifact.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metrics::BinaryMetrics;

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestConfig {
    pub trees: usize,
    pub max_depth: usize,
    pub min_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 16,
            min_split: 2,
            seed: 1234,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        prob: f64,
        samples: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { prob, .. } => return *prob,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    pub trees: Vec<Tree>,
    /// Normalized mean-decrease-in-impurity importances, one per feature.
    pub importances: Vec<f64>,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    max_depth: usize,
    min_split: usize,
    max_features: usize,
    n_features: usize,
    nodes: Vec<Node>,
    importance: Vec<f64>,
    rng: StdRng,
}

fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

impl<'a> TreeBuilder<'a> {
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitChoice> {
        let n = indices.len();
        let pos_total = indices.iter().filter(|&&i| self.y[i]).count();
        let parent = gini(pos_total, n);

        let feats = rand::seq::index::sample(&mut self.rng, self.n_features, self.max_features);
        let mut best: Option<SplitChoice> = None;

        for feature in feats.iter() {
            let mut column: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (self.x[i][feature], self.y[i]))
                .collect();
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut pos_left = 0usize;
            for i in 1..n {
                if column[i - 1].1 {
                    pos_left += 1;
                }
                if column[i].0 <= column[i - 1].0 {
                    continue;
                }
                let n_left = i;
                let n_right = n - i;
                let weighted = (n_left as f64 * gini(pos_left, n_left)
                    + n_right as f64 * gini(pos_total - pos_left, n_right))
                    / n as f64;
                let gain = parent - weighted;
                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitChoice {
                        feature,
                        threshold: (column[i - 1].0 + column[i].0) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let n = indices.len();
        let pos = indices.iter().filter(|&&i| self.y[i]).count();
        let prob = pos as f64 / n as f64;

        let pure = pos == 0 || pos == n;
        if pure || depth >= self.max_depth || n < self.min_split {
            self.nodes.push(Node::Leaf { prob, samples: n });
            return self.nodes.len() - 1;
        }

        let Some(split) = self.best_split(&indices) else {
            self.nodes.push(Node::Leaf { prob, samples: n });
            return self.nodes.len() - 1;
        };

        self.importance[split.feature] += split.gain * n as f64;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { prob, samples: n });
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }
}

fn fit_tree(
    x: &[Vec<f64>],
    y: &[bool],
    config: &ForestConfig,
    tree_seed: u64,
) -> (Tree, Vec<f64>) {
    let n = x.len();
    let n_features = x[0].len();
    let max_features = ((n_features as f64).sqrt().round() as usize).clamp(1, n_features);

    let mut rng = StdRng::seed_from_u64(tree_seed);
    let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

    let mut builder = TreeBuilder {
        x,
        y,
        max_depth: config.max_depth,
        min_split: config.min_split.max(2),
        max_features,
        n_features,
        nodes: Vec::new(),
        importance: vec![0.0; n_features],
        rng,
    };
    builder.grow(bootstrap, 0);
    (
        Tree {
            nodes: builder.nodes,
        },
        builder.importance,
    )
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[bool], config: ForestConfig) -> Result<RandomForest> {
        if x.is_empty() || x.len() != y.len() {
            return Err(anyhow!(
                "forest fit needs matching non-empty samples, got {} features / {} labels",
                x.len(),
                y.len()
            ));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(anyhow!("forest fit needs rectangular feature rows"));
        }

        let grown: Vec<(Tree, Vec<f64>)> = (0..config.trees)
            .into_par_iter()
            .map(|tree_idx| {
                let tree_seed = config
                    .seed
                    .wrapping_add((tree_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                fit_tree(x, y, &config, tree_seed)
            })
            .collect();

        let mut importances = vec![0.0_f64; n_features];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, importance) in grown {
            for (total, part) in importances.iter_mut().zip(&importance) {
                *total += part;
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Ok(RandomForest {
            config,
            trees,
            importances,
        })
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.par_iter().map(|row| self.predict_proba(row)).collect()
    }
}

/// The persisted model: forest, provenance and held-out metrics together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuinellaModelArtifact {
    pub version: u32,
    pub generated_at: String,
    pub feature_names: Vec<String>,
    pub config: ForestConfig,
    pub importances: Vec<f64>,
    pub train_metrics: BinaryMetrics,
    pub test_metrics: BinaryMetrics,
    pub trees: Vec<Tree>,
}

impl QuinellaModelArtifact {
    pub fn forest(&self) -> RandomForest {
        RandomForest {
            config: self.config,
            trees: self.trees.clone(),
            importances: self.importances.clone(),
        }
    }
}

pub fn save_artifact(path: &Path, artifact: &QuinellaModelArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(artifact).context("serialize model artifact")?;
    fs::write(&tmp, json).context("write model artifact")?;
    fs::rename(&tmp, path).context("swap model artifact")?;
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<QuinellaModelArtifact> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read artifact {}", path.display()))?;
    let artifact: QuinellaModelArtifact =
        serde_json::from_str(&raw).context("parse model artifact")?;
    if artifact.version != ARTIFACT_VERSION {
        return Err(anyhow!(
            "artifact version {} unsupported (expected {})",
            artifact.version,
            ARTIFACT_VERSION
        ));
    }
    Ok(artifact)
}
