//! Accumulators and first-appearance-ordered grouping.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use common_error::{TallyError, TallyResult};

/// Trait for aggregate accumulators.
pub trait Accumulator<T>: Default {
    /// The finalized result type.
    type Output;

    /// Update the accumulator with one value; `None` is a null and is skipped.
    fn update(&mut self, value: Option<T>);

    /// Get the final result.
    fn finalize(&self) -> Self::Output;
}

/// Sum accumulator for Float64 values.
#[derive(Debug, Clone, Default)]
pub struct SumFloat64 {
    sum: f64,
}

impl Accumulator<f64> for SumFloat64 {
    type Output = f64;

    fn update(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
        }
    }

    fn finalize(&self) -> f64 {
        self.sum
    }
}

/// Checked sum accumulator for Int64 values.
///
/// Once the sum leaves the `i64` range it stays failed and `finalize` errors.
#[derive(Debug, Clone, Default)]
pub struct SumInt64 {
    sum: i64,
    overflowed: bool,
}

impl Accumulator<i64> for SumInt64 {
    type Output = TallyResult<i64>;

    fn update(&mut self, value: Option<i64>) {
        if let Some(v) = value {
            match self.sum.checked_add(v) {
                Some(sum) => self.sum = sum,
                None => self.overflowed = true,
            }
        }
    }

    fn finalize(&self) -> TallyResult<i64> {
        if self.overflowed {
            return Err(TallyError::execution("integer sum overflowed i64"));
        }
        Ok(self.sum)
    }
}

/// Max accumulator for Int64 values (timestamps in milliseconds).
#[derive(Debug, Clone, Default)]
pub struct MaxInt64 {
    max: Option<i64>,
}

impl Accumulator<i64> for MaxInt64 {
    type Output = Option<i64>;

    fn update(&mut self, value: Option<i64>) {
        if let Some(v) = value {
            self.max = Some(self.max.map_or(v, |current| current.max(v)));
        }
    }

    fn finalize(&self) -> Option<i64> {
        self.max
    }
}

/// Distinct-count accumulator over borrowed string values.
#[derive(Debug, Clone, Default)]
pub struct CountDistinct<'a> {
    seen: HashSet<&'a str>,
}

impl<'a> Accumulator<&'a str> for CountDistinct<'a> {
    type Output = u64;

    fn update(&mut self, value: Option<&'a str>) {
        if let Some(v) = value {
            self.seen.insert(v);
        }
    }

    fn finalize(&self) -> u64 {
        self.seen.len() as u64
    }
}

/// Group states keyed by `K`, iterated in order of first appearance.
#[derive(Debug, Clone)]
pub struct Groups<K, S> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    states: Vec<S>,
}

impl<K, S> Default for Groups<K, S> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
            states: Vec::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, S: Default> Groups<K, S> {
    /// Create an empty grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `key`, created on first sight.
    pub fn entry(&mut self, key: K) -> &mut S {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.keys.len();
                self.index.insert(key.clone(), slot);
                self.keys.push(key);
                self.states.push(S::default());
                slot
            }
        };
        &mut self.states[slot]
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no group has been created.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Consume into `(key, state)` pairs in first-appearance order.
    pub fn into_ordered(self) -> impl Iterator<Item = (K, S)> {
        self.keys.into_iter().zip(self.states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_skips_nulls() {
        let mut acc = SumFloat64::default();
        acc.update(Some(10.5));
        acc.update(None);
        acc.update(Some(4.5));
        assert_eq!(acc.finalize(), 15.0);

        let mut ints = SumInt64::default();
        ints.update(Some(2));
        ints.update(Some(3));
        assert_eq!(ints.finalize().unwrap(), 5);
    }

    #[test]
    fn test_int_sum_overflow_is_an_error() {
        let mut acc = SumInt64::default();
        acc.update(Some(5_000_000_000_000_000_000));
        acc.update(Some(5_000_000_000_000_000_000));
        // A later negative value must not bring the sum back into range.
        acc.update(Some(-5_000_000_000_000_000_000));
        assert!(matches!(
            acc.finalize(),
            Err(TallyError::ExecutionError(_))
        ));
    }

    #[test]
    fn test_max() {
        let mut m = MaxInt64::default();
        for v in [5, 9, 2] {
            m.update(Some(v));
        }
        m.update(None);
        assert_eq!(m.finalize(), Some(9));
    }

    #[test]
    fn test_max_empty_is_none() {
        assert_eq!(MaxInt64::default().finalize(), None);
    }

    #[test]
    fn test_count_distinct() {
        let mut acc = CountDistinct::default();
        for id in ["o1", "o1", "o2", "o3", "o2"] {
            acc.update(Some(id));
        }
        acc.update(None);
        assert_eq!(acc.finalize(), 3);
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let mut groups: Groups<&str, SumInt64> = Groups::new();
        for (key, value) in [("b", 1), ("a", 2), ("b", 3), ("c", 4)] {
            groups.entry(key).update(Some(value));
        }
        assert_eq!(groups.len(), 3);
        let collected: Vec<_> = groups
            .into_ordered()
            .map(|(k, s)| (k, s.finalize().unwrap()))
            .collect();
        assert_eq!(collected, vec![("b", 4), ("a", 2), ("c", 4)]);
    }
}
