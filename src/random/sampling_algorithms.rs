//! Algorithms for uniform random sampling from iterators of known length. These are written to
//! be generic over the container type so they work directly on grid cells and agent lists
//! without collecting them first.

use rand::seq::index::sample as choose_range;
use rand::Rng;

/// Sample a random element uniformly from a container of known length.
///
/// We do not assume the container is randomly indexable, only that it can be iterated over.
/// Returns `None` for an empty container.
pub fn sample_single_from_known_length<I, R, T>(rng: &mut R, mut iter: I) -> Option<T>
where
    R: Rng,
    I: Iterator<Item = T> + ExactSizeIterator<Item = T>,
{
    let len = iter.len();
    if len == 0 {
        return None;
    }
    // Sampling a `u32` is measurably faster than sampling a `usize`.
    let index = rng.random_range(0..len as u32) as usize;
    iter.nth(index)
}

/// Sample `requested` distinct elements uniformly without replacement from a container of known
/// length. The selected elements are returned in iteration order.
///
/// # Panics
///
/// Panics if `requested` exceeds the length of the container.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator<Item = T>,
{
    let iter = iter.into_iter();
    let len = iter.len();
    assert!(
        requested <= len,
        "cannot sample {requested} distinct items from a population of {len}"
    );
    if requested == 0 {
        return Vec::new();
    }

    let mut indexes = choose_range(rng, len, requested).into_vec();
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter().peekable();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        match index_iterator.peek() {
            Some(&next_idx) if next_idx == idx => {
                selected.push(item);
                index_iterator.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::HashSet;

    #[test]
    fn single_from_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<u32> = vec![];
        assert_eq!(sample_single_from_known_length(&mut rng, data.iter()), None);
    }

    #[test]
    fn single_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<usize> = (0..4).collect();
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            let value = sample_single_from_known_length(&mut rng, data.iter()).unwrap();
            counts[*value] += 1;
        }
        // The expected count of each bucket is 1000.
        for count in counts {
            assert!((count as i64 - 1000).abs() < 150, "counts = {counts:?}");
        }
    }

    #[test]
    fn multiple_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<u32> = (0..1000).collect();
        let sample = sample_multiple_from_known_length(&mut rng, data.iter(), 100);

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|v| **v < 1000));
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), sample.len());
    }

    #[test]
    fn multiple_of_everything_returns_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<u32> = (0..10).collect();
        let sample = sample_multiple_from_known_length(&mut rng, data.iter().copied(), 10);
        assert_eq!(sample, data);
    }

    #[test]
    #[should_panic(expected = "cannot sample 11 distinct items from a population of 10")]
    fn multiple_more_than_available_panics() {
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<u32> = (0..10).collect();
        sample_multiple_from_known_length(&mut rng, data.iter(), 11);
    }
}
