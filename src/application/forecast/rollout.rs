use crate::application::ml::SequenceModel;
use crate::domain::errors::ModelError;
use std::collections::VecDeque;

/// Feeds each prediction back as the newest input, `horizon` times.
///
/// `seed` must hold exactly `model.window_len()` normalized values. Outputs
/// stay in normalized units.
pub fn autoregressive_rollout(
    model: &dyn SequenceModel,
    seed: &[f64],
    horizon: usize,
) -> Result<Vec<f64>, ModelError> {
    let expected = model.window_len();
    if seed.len() != expected {
        return Err(ModelError::WindowLength {
            expected,
            actual: seed.len(),
        });
    }

    let mut window: VecDeque<f64> = seed.iter().copied().collect();
    let mut outputs = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let next = model.predict_next(window.make_contiguous())?;
        outputs.push(next);
        window.pop_front();
        window.push_back(next);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns last + 1 and remembers every window it saw
    struct StepModel {
        window: usize,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl SequenceModel for StepModel {
        fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(window.to_vec());
            }
            Ok(window[window.len() - 1] + 1.0)
        }

        fn window_len(&self) -> usize {
            self.window
        }

        fn name(&self) -> &str {
            "step"
        }

        fn version(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_rollout_slides_window_over_predictions() {
        let model = StepModel {
            window: 3,
            seen: Mutex::new(Vec::new()),
        };
        let out = autoregressive_rollout(&model, &[0.0, 1.0, 2.0], 4).unwrap();
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], vec![0.0, 1.0, 2.0]);
        assert_eq!(seen[1], vec![1.0, 2.0, 3.0]);
        assert_eq!(seen[3], vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_rollout_rejects_wrong_seed_length() {
        let model = StepModel {
            window: 3,
            seen: Mutex::new(Vec::new()),
        };
        let err = autoregressive_rollout(&model, &[1.0], 2).unwrap_err();
        assert!(matches!(
            err,
            ModelError::WindowLength {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let model = StepModel {
            window: 2,
            seen: Mutex::new(Vec::new()),
        };
        assert!(autoregressive_rollout(&model, &[1.0, 2.0], 0).unwrap().is_empty());
    }
}
