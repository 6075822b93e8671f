use super::{check_training_data, Regressor};
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fully grown CART tree minimizing squared error.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Grows a tree over the rows named by `sample` (repeats allowed).
    pub fn fit(features: &[Vec<f64>], targets: &[f64], sample: &[usize]) -> Self {
        Self {
            root: grow(features, targets, sample.to_vec()),
        }
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn grow(features: &[Vec<f64>], targets: &[f64], sample: Vec<usize>) -> Node {
    let n = sample.len();
    let mean = sample.iter().map(|&i| targets[i]).sum::<f64>() / n as f64;

    if n < MIN_SAMPLES_SPLIT || sample.iter().all(|&i| targets[i] == targets[sample[0]]) {
        return Node::Leaf(mean);
    }

    match best_split(features, targets, &sample) {
        Some((feature, threshold)) => {
            let (left, right): (Vec<usize>, Vec<usize>) = sample
                .into_iter()
                .partition(|&i| features[i][feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(grow(features, targets, left)),
                right: Box::new(grow(features, targets, right)),
            }
        }
        None => Node::Leaf(mean),
    }
}

/// Feature and midpoint threshold with the lowest summed squared error.
/// Features are scanned in order; the first strictly best candidate wins.
fn best_split(features: &[Vec<f64>], targets: &[f64], sample: &[usize]) -> Option<(usize, f64)> {
    let width = features[sample[0]].len();
    let mut best: Option<(f64, usize, f64)> = None;

    for feature in 0..width {
        let mut pairs: Vec<(f64, f64)> = sample
            .iter()
            .map(|&i| (features[i][feature], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
        let n = pairs.len() as f64;

        let (mut left_sum, mut left_sq) = (0.0, 0.0);
        for k in 0..pairs.len() - 1 {
            left_sum += pairs[k].1;
            left_sq += pairs[k].1 * pairs[k].1;

            let (x_here, x_next) = (pairs[k].0, pairs[k + 1].0);
            if x_here >= x_next {
                continue;
            }

            let n_left = (k + 1) as f64;
            let n_right = n - n_left;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);

            if best.map_or(true, |(best_sse, _, _)| sse < best_sse) {
                let mut threshold = x_here / 2.0 + x_next / 2.0;
                if threshold >= x_next {
                    threshold = x_here;
                }
                best = Some((sse, feature, threshold));
            }
        }
    }

    best.map(|(_, feature, threshold)| (feature, threshold))
}

/// Bagged regression trees. Each tree sees a bootstrap sample drawn from a
/// generator seeded once per fit, so identical inputs give identical forests.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    n_trees: usize,
    seed: u64,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        check_training_data(features, targets)?;
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidConfig(
                "Random forest needs at least one tree".to_string(),
            ));
        }

        let n = features.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.trees = (0..self.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(features, targets, &sample)
            })
            .collect();

        Ok(())
    }

    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::NotFitted("Random Forest".to_string()));
        }

        let sum: f64 = self.trees.iter().map(|t| t.predict_one(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
