// Bagged decision trees. Each tree is fit on a bootstrap sample of the rows and a random
// subset of the feature columns; prediction is a majority vote.
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::{Error, Result};
use crate::model::ClassifierKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct Member {
    /// Feature columns this tree was trained on, ascending.
    pub columns: Vec<usize>,
    pub tree: DecisionTree<f64, usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BaggedTrees {
    members: Vec<Member>,
    n_classes: usize,
}

impl BaggedTrees {
    pub fn fit(params: &ForestParams, seed: u64, x: &Array2<f64>, y: &Array1<usize>) -> Result<Self> {
        let (n_rows, n_cols) = x.dim();
        if n_rows == 0 {
            return Err(Error::EmptyDataset);
        }
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        let n_pick = ((n_cols as f64 * params.max_features_fraction).ceil() as usize).clamp(1, n_cols.max(1));

        let mut rng = StdRng::seed_from_u64(seed);
        let mut members = Vec::with_capacity(params.n_trees);
        for i in 0..params.n_trees {
            let rows: Vec<usize> = (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect();
            let mut columns = rand::seq::index::sample(&mut rng, n_cols, n_pick).into_vec();
            columns.sort_unstable();

            let records = x.select(Axis(0), &rows).select(Axis(1), &columns);
            let targets = y.select(Axis(0), &rows);
            let tree = DecisionTree::params()
                .max_depth(params.max_depth)
                .fit(&Dataset::new(records, targets))
                .map_err(|e| Error::Fit {
                    model: ClassifierKind::BaggedTrees,
                    reason: format!("tree {}: {}", i, e),
                })?;
            members.push(Member { columns, tree });
        }
        log::debug!("fitted {} trees on {} of {} columns", members.len(), n_pick, n_cols);

        Ok(Self { members, n_classes })
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Vote counts, one row per sample and one column per class.
    fn votes(&self, x: &Array2<f64>) -> Array2<usize> {
        let mut votes = Array2::<usize>::zeros((x.nrows(), self.n_classes));
        for member in &self.members {
            let pred: Array1<usize> = member.tree.predict(&x.select(Axis(1), &member.columns));
            for (i, &class) in pred.iter().enumerate() {
                if class < self.n_classes {
                    votes[(i, class)] += 1;
                }
            }
        }
        votes
    }

    /// Majority class; ties go to the lowest class code.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        self.votes(x)
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, 0), |best, (class, &n)| if n > best.1 { (class, n) } else { best })
                    .0
            })
            .collect()
    }

    /// Share of trees that voted for the winning class.
    pub fn predict_confidence(&self, x: &Array2<f64>) -> Array1<f64> {
        let n = self.members.len().max(1) as f64;
        self.votes(x)
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().max().unwrap_or(0) as f64 / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [5.0, 5.1],
            [5.2, 4.9],
            [4.8, 5.0],
            [10.0, 0.0],
            [10.2, 0.1],
            [9.9, 0.2],
        ];
        let y = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        (x, y)
    }

    fn params(n_trees: usize) -> ForestParams {
        ForestParams {
            n_trees,
            max_features_fraction: 1.0,
            max_depth: None,
        }
    }

    #[test]
    fn learns_separable_classes() {
        let (x, y) = separable();
        let forest = BaggedTrees::fit(&params(25), 42, &x, &y).unwrap();
        assert_eq!(forest.n_trees(), 25);
        let pred = forest.predict(&x);
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 8, "only {} of 9 correct", correct);
    }

    #[test]
    fn confidence_is_a_vote_share() {
        let (x, y) = separable();
        let forest = BaggedTrees::fit(&params(10), 1, &x, &y).unwrap();
        for &c in forest.predict_confidence(&x).iter() {
            assert!((0.0..=1.0).contains(&c));
            assert!(c >= 1.0 / 3.0);
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable();
        let probe = array![[2.5, 2.5], [7.5, 2.5]];
        let a = BaggedTrees::fit(&params(15), 9, &x, &y).unwrap();
        let b = BaggedTrees::fit(&params(15), 9, &x, &y).unwrap();
        assert_eq!(a.predict(&probe), b.predict(&probe));
        assert_eq!(a.predict_confidence(&probe), b.predict_confidence(&probe));
    }
}
