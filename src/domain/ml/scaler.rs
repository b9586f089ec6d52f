//! Min-max normalization of a single price column.

use crate::domain::errors::ScalerError;
use serde::{Deserialize, Serialize};

/// Min-max transform fitted on one series, mapping `[min, max]` onto `[0, 1]`.
///
/// A zero-width range keeps a unit scale so a constant series maps to zeros
/// instead of dividing by zero. Values outside the fitted range extrapolate
/// linearly in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
    range: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self, ScalerError> {
        if values.is_empty() {
            return Err(ScalerError::EmptySeries);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScalerError::NonFinite { index });
        }

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = data_max - data_min;
        let range = if width == 0.0 { 1.0 } else { width };

        Ok(Self {
            data_min,
            data_max,
            range,
        })
    }

    /// Fits on `values` and returns the scaler with the transformed series.
    pub fn fit_transform(values: &[f64]) -> Result<(Self, Vec<f64>), ScalerError> {
        let scaler = Self::fit(values)?;
        let scaled = scaler.transform(values);
        Ok((scaler, scaled))
    }

    pub fn transform_one(&self, value: f64) -> f64 {
        (value - self.data_min) / self.range
    }

    pub fn inverse_one(&self, value: f64) -> f64 {
        value * self.range + self.data_min
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform_one(*v)).collect()
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.inverse_one(*v)).collect()
    }

    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    pub fn data_max(&self) -> f64 {
        self.data_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_maps_range_onto_unit_interval() {
        let (scaler, scaled) = MinMaxScaler::fit_transform(&[10.0, 15.0, 20.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
        assert_eq!(scaler.data_min(), 10.0);
        assert_eq!(scaler.data_max(), 20.0);
    }

    #[test]
    fn test_round_trip_inside_fitted_range() {
        let prices = [101.3, 99.7, 104.2, 110.9, 95.05, 100.0];
        let scaler = MinMaxScaler::fit(&prices).unwrap();
        for x in [95.05, 97.0, 100.123, 108.4, 110.9] {
            let back = scaler.inverse_one(scaler.transform_one(x));
            assert!((back - x).abs() < 1e-9, "{} -> {}", x, back);
        }
    }

    #[test]
    fn test_extrapolates_outside_fitted_range() {
        let scaler = MinMaxScaler::fit(&[0.0, 10.0]).unwrap();
        assert!((scaler.transform_one(15.0) - 1.5).abs() < 1e-12);
        assert!((scaler.inverse_one(-0.5) + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_does_not_divide_by_zero() {
        let (scaler, scaled) = MinMaxScaler::fit_transform(&[42.0, 42.0, 42.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 0.0, 0.0]);
        assert_eq!(scaler.inverse_one(0.0), 42.0);
        assert_eq!(scaler.inverse_one(1.0), 43.0);
    }

    #[test]
    fn test_rejects_empty_and_non_finite_input() {
        assert_eq!(MinMaxScaler::fit(&[]), Err(ScalerError::EmptySeries));
        assert_eq!(
            MinMaxScaler::fit(&[1.0, f64::NAN]),
            Err(ScalerError::NonFinite { index: 1 })
        );
    }
}
