//! Single-feature CART classifier over price buckets.

use serde::{Deserialize, Serialize};

use super::PipelineError;
use crate::domain::product::PriceBucket;

const BUCKET_COUNT: usize = PriceBucket::ALL.len();
const IMPURITY_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self { max_depth: None, min_samples_split: 2 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Features `<= threshold` go left.
    Split { threshold: f64, left: usize, right: usize },
    Leaf { bucket: PriceBucket, samples: usize },
}

/// Nodes are stored flat with the root at index 0; children always sit at
/// higher indices than their parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    position: usize,
    threshold: f64,
}

impl DecisionTree {
    /// Fits the tree on `(feature, bucket)` samples. Returns `None` when there
    /// are no samples.
    pub fn fit(samples: &[(f64, PriceBucket)], options: TreeOptions) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        Some(Self { nodes: grow(&sorted, options) })
    }

    pub fn predict(&self, feature: f64) -> Result<PriceBucket, PipelineError> {
        if !feature.is_finite() {
            return Err(PipelineError::InvalidFeature(feature));
        }

        let mut index = 0;
        // Each hop strictly increases the index in a validated tree; the bound
        // also stops a hand-edited cyclic tree.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { bucket, .. }) => return Ok(*bucket),
                Some(TreeNode::Split { threshold, left, right }) => {
                    index = if feature <= *threshold { *left } else { *right };
                }
                None => return Err(PipelineError::MalformedTree { node: index }),
            }
        }
        Err(PipelineError::MalformedTree { node: index })
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| matches!(node, TreeNode::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut deepest = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                let child_depth = depths[index] + 1;
                for child in [*left, *right] {
                    if let Some(slot) = depths.get_mut(child) {
                        *slot = child_depth;
                        deepest = deepest.max(child_depth);
                    }
                }
            }
        }
        deepest
    }

    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("classifier has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { threshold, left, right } = node {
                if !threshold.is_finite() {
                    return Err(format!("node {index} has a non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} points at invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// A pending subtree: `samples[start..end]` hanging off `parent`.
struct GrowTask {
    start: usize,
    end: usize,
    depth: usize,
    parent: Option<(usize, Side)>,
}

/// Builds the tree in pre-order with an explicit work stack, so tree depth
/// never turns into call-stack depth.
fn grow(samples: &[(f64, PriceBucket)], options: TreeOptions) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    let mut pending = vec![GrowTask { start: 0, end: samples.len(), depth: 0, parent: None }];

    while let Some(task) = pending.pop() {
        let index = nodes.len();
        let subset = &samples[task.start..task.end];
        let counts = bucket_counts(subset);
        nodes.push(TreeNode::Leaf { bucket: majority(&counts), samples: subset.len() });
        if let Some((parent, side)) = task.parent {
            attach(&mut nodes, parent, side, index);
        }

        let depth_allowed = options.max_depth.map_or(true, |max_depth| task.depth < max_depth);
        if !depth_allowed || subset.len() < options.min_samples_split {
            continue;
        }
        let Some(split) = best_split(subset, &counts) else {
            continue;
        };

        // Children overwrite both links when they are created.
        nodes[index] = TreeNode::Split { threshold: split.threshold, left: index, right: index };
        let middle = task.start + split.position;
        pending.push(GrowTask {
            start: middle,
            end: task.end,
            depth: task.depth + 1,
            parent: Some((index, Side::Right)),
        });
        pending.push(GrowTask {
            start: task.start,
            end: middle,
            depth: task.depth + 1,
            parent: Some((index, Side::Left)),
        });
    }

    nodes
}

fn attach(nodes: &mut [TreeNode], parent: usize, side: Side, child: usize) {
    if let Some(TreeNode::Split { left, right, .. }) = nodes.get_mut(parent) {
        match side {
            Side::Left => *left = child,
            Side::Right => *right = child,
        }
    }
}

/// Scans thresholds between consecutive distinct feature values in ascending
/// order and keeps the first one with the lowest weighted Gini impurity.
fn best_split(samples: &[(f64, PriceBucket)], counts: &[usize; BUCKET_COUNT]) -> Option<SplitCandidate> {
    let total = samples.len();
    let parent = gini(counts, total);
    if parent <= IMPURITY_EPSILON {
        return None;
    }

    let mut left_counts = [0usize; BUCKET_COUNT];
    let mut best: Option<(f64, SplitCandidate)> = None;

    for position in 1..total {
        let (previous, bucket) = samples[position - 1];
        left_counts[usize::from(bucket.label())] += 1;

        let next = samples[position].0;
        if previous >= next {
            continue;
        }

        let mut right_counts = *counts;
        for (right, left) in right_counts.iter_mut().zip(left_counts.iter()) {
            *right -= left;
        }

        let right_total = total - position;
        let impurity = (position as f64 * gini(&left_counts, position)
            + right_total as f64 * gini(&right_counts, right_total))
            / total as f64;

        let improves = best.as_ref().map_or(true, |(current, _)| impurity < *current);
        if improves {
            let mut threshold = previous + (next - previous) / 2.0;
            if threshold >= next {
                threshold = previous;
            }
            best = Some((impurity, SplitCandidate { position, threshold }));
        }
    }

    best.filter(|(impurity, _)| parent - impurity > IMPURITY_EPSILON).map(|(_, split)| split)
}

fn bucket_counts(samples: &[(f64, PriceBucket)]) -> [usize; BUCKET_COUNT] {
    let mut counts = [0usize; BUCKET_COUNT];
    for (_, bucket) in samples {
        counts[usize::from(bucket.label())] += 1;
    }
    counts
}

fn gini(counts: &[usize; BUCKET_COUNT], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts.iter().map(|&count| (count as f64 / total).powi(2)).sum::<f64>()
}

/// Most frequent bucket; ties go to the lowest label.
fn majority(counts: &[usize; BUCKET_COUNT]) -> PriceBucket {
    let mut winner = PriceBucket::Budget;
    let mut winner_count = 0;
    for bucket in PriceBucket::ALL {
        let count = counts[usize::from(bucket.label())];
        if count > winner_count {
            winner = bucket;
            winner_count = count;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::{DecisionTree, TreeNode, TreeOptions};
    use crate::domain::product::PriceBucket;
    use crate::ml::PipelineError;

    fn samples() -> Vec<(f64, PriceBucket)> {
        vec![
            (-1.5, PriceBucket::Budget),
            (-0.5, PriceBucket::Standard),
            (0.5, PriceBucket::Budget),
            (1.5, PriceBucket::Luxury),
        ]
    }

    #[test]
    fn unlimited_tree_memorizes_training_samples() {
        let tree = DecisionTree::fit(&samples(), TreeOptions::default()).expect("non-empty");

        for (feature, bucket) in samples() {
            assert_eq!(tree.predict(feature), Ok(bucket));
        }
        assert_eq!(tree.leaf_count(), 4);
        assert!(tree.check_shape().is_ok());
    }

    #[test]
    fn pure_samples_produce_single_leaf() {
        let pure = vec![(0.0, PriceBucket::Premium), (1.0, PriceBucket::Premium)];
        let tree = DecisionTree::fit(&pure, TreeOptions::default()).expect("non-empty");

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(42.0), Ok(PriceBucket::Premium));
    }

    #[test]
    fn depth_limit_yields_majority_leaves() {
        let tree = DecisionTree::fit(&samples(), TreeOptions { max_depth: Some(0), min_samples_split: 2 })
            .expect("non-empty");

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(1.5), Ok(PriceBucket::Budget));
    }

    #[test]
    fn threshold_sits_between_neighbouring_values() {
        let two = vec![(0.0, PriceBucket::Budget), (1.0, PriceBucket::Luxury)];
        let tree = DecisionTree::fit(&two, TreeOptions::default()).expect("non-empty");

        match &tree.nodes()[0] {
            TreeNode::Split { threshold, .. } => assert!((threshold - 0.5).abs() < 1e-12),
            other => panic!("expected a split at the root, got {other:?}"),
        }
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn non_finite_feature_is_rejected() {
        let tree = DecisionTree::fit(&samples(), TreeOptions::default()).expect("non-empty");
        assert!(matches!(tree.predict(f64::NAN), Err(PipelineError::InvalidFeature(_))));
    }

    #[test]
    fn backward_child_reference_fails_shape_check() {
        let json = r#"{"nodes":[
            {"type":"split","threshold":0.0,"left":0,"right":1},
            {"type":"leaf","bucket":2,"samples":1}
        ]}"#;
        let tree: DecisionTree = serde_json::from_str(json).expect("json");
        assert!(tree.check_shape().is_err());
        assert!(matches!(tree.predict(-1.0), Err(PipelineError::MalformedTree { .. })));
    }

    #[test]
    fn alternating_labels_grow_a_deep_tree_without_recursion() {
        let alternating: Vec<(f64, PriceBucket)> = (0..5_000)
            .map(|index| {
                let bucket = if index % 2 == 0 { PriceBucket::Budget } else { PriceBucket::Standard };
                (index as f64, bucket)
            })
            .collect();

        let tree = DecisionTree::fit(&alternating, TreeOptions::default()).expect("non-empty");

        assert!(tree.check_shape().is_ok());
        assert_eq!(tree.leaf_count(), alternating.len());
        assert_eq!(tree.nodes().len(), 2 * alternating.len() - 1);
        for (feature, bucket) in &alternating {
            assert_eq!(tree.predict(*feature), Ok(*bucket));
        }
    }

    #[test]
    fn out_of_range_leaf_label_does_not_deserialize() {
        let json = r#"{"nodes":[{"type":"leaf","bucket":9,"samples":1}]}"#;
        assert!(serde_json::from_str::<DecisionTree>(json).is_err());
    }
}
