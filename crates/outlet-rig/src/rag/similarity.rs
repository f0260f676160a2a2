//! Vector similarity.

/// Cosine similarity between two vectors.
///
/// Returns `None` if the dimensions differ. A zero-magnitude vector has no
/// direction and scores `0.0` against everything. The result is clamped to
/// `[-1.0, 1.0]` to absorb floating point drift.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return Some(0.0);
    }

    Some((dot / magnitude).clamp(-1.0, 1.0))
}
