//! Turning a normalized series into supervised (window, next value) pairs.

/// Windows and their labels, index-aligned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisedSet {
    pub windows: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl SupervisedSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Slides a window of `time_step` values over `series`.
///
/// Produces `len - time_step - 1` pairs, so the last available
/// (window, label) pair is never emitted. Series shorter than
/// `time_step + 2` produce an empty set.
pub fn create_dataset(series: &[f64], time_step: usize) -> SupervisedSet {
    let count = series.len().saturating_sub(time_step + 1);
    let mut set = SupervisedSet {
        windows: Vec::with_capacity(count),
        labels: Vec::with_capacity(count),
    };
    for i in 0..count {
        set.windows.push(series[i..i + time_step].to_vec());
        set.labels.push(series[i + time_step]);
    }
    set
}

/// Prefix split preserving temporal order: the first `floor(len * ratio)`
/// values train, the rest evaluate.
pub fn split_train_test(series: &[f64], ratio: f64) -> (&[f64], &[f64]) {
    let ratio = ratio.clamp(0.0, 1.0);
    let split = ((series.len() as f64) * ratio).floor() as usize;
    series.split_at(split.min(series.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_count_is_len_minus_step_minus_one() {
        let series: Vec<f64> = (0..250).map(|i| i as f64).collect();
        for step in [1, 5, 100] {
            let set = create_dataset(&series, step);
            assert_eq!(set.len(), series.len() - step - 1);
            assert_eq!(set.windows.len(), set.labels.len());
        }
    }

    #[test]
    fn test_label_follows_its_window() {
        let series: Vec<f64> = (0..20).map(|i| (i * i) as f64).collect();
        let set = create_dataset(&series, 4);
        for (i, (window, label)) in set.windows.iter().zip(&set.labels).enumerate() {
            assert_eq!(window.len(), 4);
            assert_eq!(window.as_slice(), &series[i..i + 4]);
            assert_eq!(*label, series[i + 4]);
        }
    }

    #[test]
    fn test_short_segments_yield_nothing() {
        let series = vec![0.0; 101];
        assert!(create_dataset(&series, 100).is_empty());
        assert!(create_dataset(&[], 100).is_empty());
        assert_eq!(create_dataset(&vec![0.0; 102], 100).len(), 1);
    }

    #[test]
    fn test_split_is_prefix_ordered() {
        let series: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let (train, test) = split_train_test(&series, 0.8);
        assert_eq!(train, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(test, &[8.0, 9.0]);

        let (train, test) = split_train_test(&series[..7], 0.8);
        assert_eq!(train.len(), 5);
        assert_eq!(test.len(), 2);
    }
}
