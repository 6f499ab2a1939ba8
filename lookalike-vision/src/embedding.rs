use ndarray::{Array1, ArrayView1};

/// Fixed-length face descriptor produced by the recognizer for one face.
///
/// Embeddings are immutable once built. Two embeddings are only comparable
/// when they come from the same recognizer, which also means they share a
/// dimension; callers are expected to check [`Embedding::dim`] before
/// comparing.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    vector: Array1<f32>,
}

impl Embedding {
    pub fn new(vector: Array1<f32>) -> Self {
        Self { vector }
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.vector.view()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.vector.to_vec()
    }

    /// Scale to unit length. A zero vector is returned unchanged.
    pub fn normalized(self) -> Self {
        let norm = self.vector.dot(&self.vector).sqrt();
        if norm > 0.0 {
            Self::new(self.vector / norm)
        } else {
            self
        }
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(Array1::from(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_unit_length() {
        let e = Embedding::from(vec![3.0, 4.0]).normalized();
        assert_eq!(e.dim(), 2);
        assert!((e.view()[0] - 0.6).abs() < 1e-6);
        assert!((e.view()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_zero_vector() {
        let e = Embedding::from(vec![0.0; 4]).normalized();
        assert_eq!(e.to_vec(), vec![0.0; 4]);
    }
}
