// ============================================================
// Layer 3 — Label Domain Types
// ============================================================
// LabelSet holds one class name per example, in file order.
// OneHotLabels is the (N, C) matrix the model is trained
// against: every row has a single 1.0 at the class index.

/// One label string per example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Row-major (N, C) one-hot matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotLabels {
    num_classes: usize,
    values:      Vec<f32>,
}

impl OneHotLabels {
    /// Build from class indices. Callers guarantee `index < num_classes`.
    pub fn from_indices(indices: &[usize], num_classes: usize) -> Self {
        let mut values = vec![0.0f32; indices.len() * num_classes];
        for (row, &class) in indices.iter().enumerate() {
            values[row * num_classes + class] = 1.0;
        }
        Self { num_classes, values }
    }

    pub fn len(&self) -> usize {
        if self.num_classes == 0 { 0 } else { self.values.len() / self.num_classes }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.num_classes..(index + 1) * self.num_classes]
    }
}

/// Index of the largest entry in a one-hot (or probability) row.
pub fn hot_index(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
