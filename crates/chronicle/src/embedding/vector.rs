//! Dense vector helpers shared by clustering and deduplication

/// Cosine similarity of two vectors.
///
/// Returns 0.0 when either vector has zero norm, so zero vectors are treated
/// as dissimilar to everything. Empty or mismatched-length inputs also yield
/// 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Component-wise mean of the given vectors, L2-normalized.
///
/// Returns an empty vector when `vectors` yields nothing.
pub fn normalized_mean<'a, I>(vectors: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum: Vec<f32> = Vec::new();
    let mut count = 0usize;

    for v in vectors {
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        }
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
        count += 1;
    }

    if count == 0 {
        return sum;
    }

    let n = count as f32;
    for x in sum.iter_mut() {
        *x /= n;
    }
    l2_normalize(&mut sum);
    sum
}
