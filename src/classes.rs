//! Diagnostic class vocabulary and class-probability helpers.

use serde::Serialize;
use std::fmt;

/// Number of diagnostic classes produced by the classification head.
pub const NUM_CLASSES: usize = 3;

/// Diagnostic classes, in the index order of the classification head.
///
/// The ordering is load-bearing: logits, probabilities, and labels all use
/// `{0: Normal, 1: Benign, 2: Malignant}`, and every producer and consumer
/// indexes with it. Reordering these variants is a correctness bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TumorClass {
    Normal,
    Benign,
    Malignant,
}

impl TumorClass {
    /// All classes in index order.
    pub const ALL: [TumorClass; NUM_CLASSES] =
        [TumorClass::Normal, TumorClass::Benign, TumorClass::Malignant];

    /// Index of this class in logits/probability vectors.
    pub fn index(self) -> usize {
        match self {
            TumorClass::Normal => 0,
            TumorClass::Benign => 1,
            TumorClass::Malignant => 2,
        }
    }

    /// Class for a vector index, if in range.
    pub fn from_index(index: usize) -> Option<TumorClass> {
        TumorClass::ALL.get(index).copied()
    }

    /// Human-readable class name.
    pub fn name(self) -> &'static str {
        match self {
            TumorClass::Normal => "Normal",
            TumorClass::Benign => "Benign",
            TumorClass::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for TumorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numerically stable softmax over a class logits vector.
pub fn softmax(logits: &[f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let mut exps = [0.0f32; NUM_CLASSES];
    let mut sum = 0.0f32;
    for (out, &logit) in exps.iter_mut().zip(logits.iter()) {
        *out = (logit - max).exp();
        sum += *out;
    }
    for out in &mut exps {
        *out /= sum;
    }
    exps
}

/// Index of the largest entry. Ties resolve to the earliest index.
pub fn argmax(values: &[f32; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_order_is_frozen() {
        assert_eq!(TumorClass::Normal.index(), 0);
        assert_eq!(TumorClass::Benign.index(), 1);
        assert_eq!(TumorClass::Malignant.index(), 2);

        assert_eq!(TumorClass::from_index(0), Some(TumorClass::Normal));
        assert_eq!(TumorClass::from_index(1), Some(TumorClass::Benign));
        assert_eq!(TumorClass::from_index(2), Some(TumorClass::Malignant));
        assert_eq!(TumorClass::from_index(3), None);
    }

    #[test]
    fn class_names() {
        assert_eq!(TumorClass::Normal.to_string(), "Normal");
        assert_eq!(TumorClass::Benign.to_string(), "Benign");
        assert_eq!(TumorClass::Malignant.to_string(), "Malignant");
    }

    #[test]
    fn softmax_sums_to_one() {
        for logits in [[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [-3.0, 7.5, 1.2], [100.0, 99.0, 98.0]] {
            let probs = softmax(&logits);
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sum was {sum} for {logits:?}");
            assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 0.0, 0.0]);
        assert!(probs[0] > 0.999);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn argmax_picks_largest_and_breaks_ties_low() {
        assert_eq!(argmax(&[5.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[0.0, 5.0, 0.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0, 5.0]), 2);
        assert_eq!(argmax(&[1.0, 1.0, 1.0]), 0);
        assert_eq!(argmax(&[0.0, 2.0, 2.0]), 1);
    }
}
