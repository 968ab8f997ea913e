// Vector helpers shared by the embedder, the groupers and SemAxis.

/// Scale `v` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in [-1, 1]. Mismatched or zero vectors give 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mag_a = dot(a, a).sqrt();
    let mag_b = dot(b, b).sqrt();
    let denom = mag_a * mag_b;
    if denom < f32::EPSILON {
        0.0
    } else {
        (dot(a, b) / denom).clamp(-1.0, 1.0)
    }
}

/// Element-wise mean of a set of vectors of width `dim`.
///
/// Used for group centroids and for the SemAxis pole vectors. An empty set
/// yields the zero vector.
pub fn mean_embedding<V: AsRef<[f32]>>(vectors: &[V], dim: usize) -> Vec<f32> {
    let mut mean = vec![0.0_f32; dim];
    if vectors.is_empty() {
        return mean;
    }

    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v.as_ref()) {
            *m += x;
        }
    }

    let n = vectors.len() as f32;
    for m in &mut mean {
        *m /= n;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_mean_embedding() {
        let mean = mean_embedding(&[vec![1.0, 0.0], vec![0.0, 1.0]], 2);
        assert_eq!(mean, vec![0.5, 0.5]);
        assert_eq!(mean_embedding::<Vec<f32>>(&[], 3), vec![0.0; 3]);
    }
}
