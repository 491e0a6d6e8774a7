// ============================================================
// Layer 4 — Label Encoder
// ============================================================
// Maps class names to integer indices and on to one-hot rows.
//
//   fit        → sorted list of distinct labels (the vocabulary)
//   transform  → index of each label in the vocabulary
//   to_categorical → (N, C) one-hot matrix
//
// The vocabulary is sorted, not first-seen, so two runs over
// the same labels always agree on which class is index 0
// regardless of the order the clips were saved in. Labels
// that were integers on disk sort by value (2 before 10),
// everything else sorts as text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DataError,
    labels::{hot_index, LabelSet, OneHotLabels},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit the vocabulary over every label in the set.
    pub fn fit(labels: &LabelSet) -> Self {
        let distinct: BTreeSet<&str> = labels.iter().collect();
        let mut classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();

        let numeric: Option<Vec<i64>> = classes.iter().map(|c| c.parse().ok()).collect();
        if let Some(values) = numeric {
            let mut paired: Vec<(i64, String)> = values.into_iter().zip(classes).collect();
            paired.sort();
            classes = paired.into_iter().map(|(_, c)| c).collect();
        }
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn index_of(&self, label: &str) -> Result<usize, DataError> {
        self.classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| DataError::UnknownLabel(label.to_string()))
    }

    pub fn transform(&self, labels: &LabelSet) -> Result<Vec<usize>, DataError> {
        labels.iter().map(|l| self.index_of(l)).collect()
    }

    /// One-hot rows for the labels, C = vocabulary size.
    pub fn to_categorical(&self, labels: &LabelSet) -> Result<OneHotLabels, DataError> {
        let indices = self.transform(labels)?;
        Ok(OneHotLabels::from_indices(&indices, self.num_classes()))
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Label of a one-hot (or probability) row.
    pub fn decode(&self, row: &[f32]) -> Option<&str> {
        self.inverse_transform(hot_index(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> LabelSet {
        LabelSet::new(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_vocabulary_is_sorted_and_distinct() {
        let enc = LabelEncoder::fit(&labels(&["siren", "dog_bark", "siren", "air_conditioner"]));
        assert_eq!(enc.classes(), &["air_conditioner", "dog_bark", "siren"]);
    }

    #[test]
    fn test_vocabulary_ignores_input_order() {
        let a = LabelEncoder::fit(&labels(&["b", "a", "c"]));
        let b = LabelEncoder::fit(&labels(&["c", "b", "a", "a"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_one_hot_decodes_back_to_label() {
        let set     = labels(&["kick", "snare", "hat", "kick", "snare"]);
        let enc     = LabelEncoder::fit(&set);
        let one_hot = enc.to_categorical(&set).unwrap();
        assert_eq!(one_hot.num_classes(), 3);
        for (i, original) in set.iter().enumerate() {
            let row = one_hot.row(i);
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(row.iter().sum::<f32>(), 1.0);
            assert_eq!(enc.decode(row), Some(original));
        }
    }

    #[test]
    fn test_integer_labels_sort_by_value() {
        let set = labels(&["10", "2", "0", "1", "10", "-3"]);
        let enc = LabelEncoder::fit(&set);
        assert_eq!(enc.classes(), &["-3", "0", "1", "2", "10"]);
        assert_eq!(enc.index_of("10").unwrap(), 4);
        assert_eq!(enc.transform(&set).unwrap(), vec![4, 3, 1, 2, 4, 0]);
    }

    #[test]
    fn test_mixed_labels_sort_as_text() {
        let enc = LabelEncoder::fit(&labels(&["10", "2", "siren"]));
        assert_eq!(enc.classes(), &["10", "2", "siren"]);
    }

    #[test]
    fn test_unknown_label_fails() {
        let enc = LabelEncoder::fit(&labels(&["a", "b"]));
        let err = enc.transform(&labels(&["a", "z"])).unwrap_err();
        assert!(matches!(err, DataError::UnknownLabel(l) if l == "z"));
    }

    #[test]
    fn test_transform_indices() {
        let set = labels(&["b", "a", "b"]);
        let enc = LabelEncoder::fit(&set);
        let idx = enc.transform(&set).unwrap();
        assert_eq!(idx, vec![1, 0, 1]);
        assert_eq!(enc.inverse_transform(1), Some("b"));
        assert_eq!(enc.inverse_transform(2), None);
    }
}
