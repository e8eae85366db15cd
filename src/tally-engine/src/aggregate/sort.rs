//! Deterministic ordering of summary rows.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array};
use arrow::compute::{SortColumn, SortOptions, lexsort_to_indices};

use common_error::TallyResult;

/// Sort direction for [`stable_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Row positions ordering `values` in `direction`, ties kept in input order.
///
/// `values` must not contain nulls; they would sort last.
pub fn stable_order(values: ArrayRef, direction: Direction) -> TallyResult<Vec<usize>> {
    let len = values.len();
    if len < 2 {
        return Ok((0..len).collect());
    }

    let position: ArrayRef = Arc::new(Int64Array::from_iter_values(0..len as i64));
    let sort_columns = [
        SortColumn {
            values,
            options: Some(SortOptions {
                descending: direction == Direction::Descending,
                nulls_first: false,
            }),
        },
        SortColumn {
            values: position,
            options: None,
        },
    ];

    let indices = lexsort_to_indices(&sort_columns, None)?;
    Ok(indices.values().iter().map(|&i| i as usize).collect())
}

/// Reorder `rows` by `order`, as produced by [`stable_order`].
pub fn reorder<T: Clone>(rows: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| rows[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Float64Array;

    #[test]
    fn test_descending_keeps_ties_in_input_order() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![3, 7, 3, 9, 7]));
        let order = stable_order(values, Direction::Descending).unwrap();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn test_ascending_keeps_ties_in_input_order() {
        let values: ArrayRef = Arc::new(Float64Array::from(vec![2.0, 1.0, 2.0, 0.5]));
        let order = stable_order(values, Direction::Ascending).unwrap();
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_trivial_inputs() {
        let empty: ArrayRef = Arc::new(Int64Array::from(Vec::<i64>::new()));
        assert!(stable_order(empty, Direction::Descending).unwrap().is_empty());

        let single: ArrayRef = Arc::new(Int64Array::from(vec![42]));
        assert_eq!(stable_order(single, Direction::Ascending).unwrap(), vec![0]);
    }

    #[test]
    fn test_reorder() {
        let rows = vec!["a", "b", "c"];
        assert_eq!(reorder(&rows, &[2, 0, 1]), vec!["c", "a", "b"]);
    }
}
