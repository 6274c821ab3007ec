use num_traits::{Float, ToPrimitive};

/// Build an evenly spaced grid from `start` up to (but excluding) `end`.
///
/// A step count within a small relative tolerance of a whole number is rounded up to it, so
/// rounding error in `(end - start) / step` does not drop the last interior point.
pub fn gridspace<T: Float + ToPrimitive>(start: T, end: T, step: T) -> Vec<T> {
    let ratio = (end - start) / step;
    let rel_tol = T::from(1e-9)
        .unwrap_or_else(T::epsilon)
        .max(T::epsilon() * T::from(4.0).unwrap_or_else(T::one));
    let tolerance = rel_tol * ratio.abs().max(T::one());
    let steps = (ratio + tolerance).floor().to_usize().unwrap_or(0);
    let mut result = Vec::with_capacity(steps);
    for i in 0..steps {
        result.push(start + T::from(i).unwrap_or_else(T::nan) * step);
    }
    result
}

/// The smallest and largest finite values in `values`.
///
/// Returns `(0, 0)` when there are no finite values.
pub fn minmax<T: Float>(values: &[T]) -> (T, T) {
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((T::infinity(), T::neg_infinity()), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (T::zero(), T::zero())
    } else {
        (lo, hi)
    }
}

/// The index of the largest value in `values`, ignoring NaN.
pub fn argmax<T: Float>(values: &[T]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, T)>, (i, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}

/// The median of `values`, ignoring NaN.
pub fn median<T: Float>(values: &[T]) -> Option<T> {
    let mut sorted: Vec<T> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / (T::one() + T::one()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gridspace() {
        let grid = gridspace(0.0, 1.0, 0.25);
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75]);
        assert!(gridspace(1.0, 0.0, 0.25).is_empty());

        // 0.3 / 0.1 is slightly below 3 in floating point
        let grid = gridspace(0.0, 0.3, 0.1);
        assert_eq!(grid.len(), 3);
        assert!((grid[2] - 0.2).abs() < 1e-15);
        assert_eq!(gridspace(0.0f32, 0.3, 0.1).len(), 3);
    }

    #[test]
    fn test_minmax_argmax() {
        let values = [3.0, f64::NAN, -1.0, 7.5, 2.0];
        assert_eq!(minmax(&values), (-1.0, 7.5));
        assert_eq!(argmax(&values), Some(3));
        assert_eq!(argmax::<f64>(&[]), None);
        assert_eq!(minmax::<f64>(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median::<f64>(&[]), None);
    }
}
