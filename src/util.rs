use std::collections::HashMap;
use std::hash::Hash;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Trailing-window mean; the first `window - 1` positions are `None`.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                mean(&data[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Running mean over every value seen so far.
pub fn cumulative_mean(data: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    data.iter()
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            sum / (i + 1) as f64
        })
        .collect()
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Row indices per group key, each list in original row order.
/// Keys come back in order of first appearance.
pub fn group_indices<K, T, F>(rows: &[T], key: F) -> Vec<(K, Vec<usize>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<usize>)> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let k = key(row);
        match slots.get(&k) {
            Some(&slot) => groups[slot].1.push(idx),
            None => {
                slots.insert(k.clone(), groups.len());
                groups.push((k, vec![idx]));
            }
        }
    }
    groups
}

/// Apply a sequence transform inside each group and write the results
/// back to the rows' original positions.
pub fn transform_by_group<K, T, V, F, G>(rows: &[T], key: F, transform: G) -> Vec<V>
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
    F: Fn(&T) -> K,
    G: Fn(&[usize]) -> Vec<V>,
{
    let mut out = vec![V::default(); rows.len()];
    for (_, indices) in group_indices(rows, key) {
        let values = transform(&indices);
        for (idx, value) in indices.into_iter().zip(values) {
            out[idx] = value;
        }
    }
    out
}
