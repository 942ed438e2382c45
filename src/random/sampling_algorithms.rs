//! Algorithms for uniform random sampling from collections of known length. They draw from a
//! [`Sampler`] rather than a raw generator so that seeding and simulation share one batched
//! stream discipline.
//!
//! We do not assume the containers are randomly indexable, only that they can be iterated over
//! and report their length.

use rand::Rng;

use crate::error::ContagionError;
use crate::random::Sampler;

/// Sample a random element uniformly from a container of known length.
///
/// # Errors
///
/// Returns `ContagionError::EmptyCandidateSet` if the iterator is empty.
pub fn sample_single_from_known_length<R, I, T>(
    sampler: &mut Sampler<R>,
    mut iter: I,
) -> Result<T, ContagionError>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    let index = sampler.choose_index(iter.len())?;
    // The set need not be randomly indexable, so we have to use the `nth` method.
    iter.nth(index).ok_or_else(|| {
        ContagionError::EmptyCandidateSet("iterator ended before its reported length".to_string())
    })
}

/// Draws `requested` distinct indices from `0..len` with a partial Fisher-Yates shuffle. The
/// indices are returned in the order they were drawn.
///
/// # Errors
///
/// Returns `ContagionError::EmptyCandidateSet` if `requested > len`.
pub fn sample_distinct_indices<R: Rng>(
    sampler: &mut Sampler<R>,
    len: usize,
    requested: usize,
) -> Result<Vec<usize>, ContagionError> {
    if requested > len {
        return Err(ContagionError::EmptyCandidateSet(format!(
            "requested {requested} distinct samples from {len} candidates"
        )));
    }
    let mut pool: Vec<usize> = (0..len).collect();
    for i in 0..requested {
        let j = i + sampler.choose_index(len - i)?;
        pool.swap(i, j);
    }
    pool.truncate(requested);
    Ok(pool)
}

/// Sample multiple random elements uniformly without replacement from a container of known
/// length. The selected items are returned in iteration order.
///
/// # Errors
///
/// Returns `ContagionError::EmptyCandidateSet` if the container has fewer than `requested`
/// items.
pub fn sample_multiple_from_known_length<R, I, T>(
    sampler: &mut Sampler<R>,
    iter: I,
    requested: usize,
) -> Result<Vec<T>, ContagionError>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    let mut indexes = sample_distinct_indices(sampler, iter.len(), requested)?;
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter();
    let Some(mut next_idx) = index_iterator.next() else {
        return Ok(Vec::new());
    };
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        if idx == next_idx {
            selected.push(item);
            if let Some(i) = index_iterator.next() {
                next_idx = i;
            } else {
                break;
            }
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashSet;

    #[test]
    fn single_from_empty_fails() {
        let mut sampler = Sampler::new(42, 16).unwrap();
        let empty: Vec<u32> = Vec::new();
        let result = sample_single_from_known_length(&mut sampler, empty.into_iter());
        assert!(matches!(result, Err(ContagionError::EmptyCandidateSet(_))));
    }

    #[test]
    fn single_is_roughly_uniform() {
        let mut sampler = Sampler::new(42, 256).unwrap();
        let items = [10, 20, 30];
        let mut counts = [0usize; 3];
        for _ in 0..3_000 {
            let value = sample_single_from_known_length(&mut sampler, items.iter()).unwrap();
            counts[(*value / 10 - 1) as usize] += 1;
        }
        for count in counts {
            assert!((count as i64 - 1_000).abs() < 100);
        }
    }

    #[test]
    fn distinct_indices_are_distinct() {
        let mut sampler = Sampler::new(11, 64).unwrap();
        for _ in 0..100 {
            let indices = sample_distinct_indices(&mut sampler, 20, 12).unwrap();
            assert_eq!(indices.len(), 12);
            let unique: HashSet<usize> = indices.iter().copied().collect();
            assert_eq!(unique.len(), 12);
            assert!(indices.iter().all(|&i| i < 20));
        }
    }

    #[test]
    fn distinct_indices_can_take_everything() {
        let mut sampler = Sampler::new(11, 64).unwrap();
        let mut indices = sample_distinct_indices(&mut sampler, 7, 7).unwrap();
        indices.sort_unstable();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn too_many_requested_fails() {
        let mut sampler = Sampler::new(11, 64).unwrap();
        let result = sample_distinct_indices(&mut sampler, 3, 4);
        assert!(matches!(result, Err(ContagionError::EmptyCandidateSet(_))));
    }

    #[test]
    fn zero_requested_from_empty_is_fine() {
        let mut sampler = Sampler::new(11, 64).unwrap();
        let empty: Vec<u32> = Vec::new();
        let selected = sample_multiple_from_known_length(&mut sampler, empty.into_iter(), 0);
        assert!(selected.unwrap().is_empty());
    }

    #[test]
    fn multiple_preserves_iteration_order() {
        let mut sampler = Sampler::new(5, 64).unwrap();
        let items: Vec<u32> = (0..50).collect();
        let selected = sample_multiple_from_known_length(&mut sampler, items.into_iter(), 10).unwrap();
        assert_eq!(selected.len(), 10);
        assert!(selected.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
