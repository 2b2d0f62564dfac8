//! Масштабирование признаков в [0, 1]

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};

use crate::error::FeatureError;

#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Option<Array1<f64>>,
    max: Option<Array1<f64>>,
    range: Option<Array1<f64>>,
    is_fitted: bool,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
            range: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<(), FeatureError> {
        if X.nrows() == 0 {
            return Err(FeatureError::EmptyDataset);
        }

        let min = X.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = X.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));

        // Постоянная колонка: диапазон 1, чтобы не делить на ноль
        let range = (&max - &min).mapv(|r| if r < 1e-12 { 1.0 } else { r });

        self.min = Some(min);
        self.max = Some(max);
        self.range = Some(range);
        self.is_fitted = true;
        Ok(())
    }

    fn params(&self, width: usize) -> Result<(&Array1<f64>, &Array1<f64>), FeatureError> {
        let (Some(min), Some(range)) = (self.min.as_ref(), self.range.as_ref()) else {
            return Err(FeatureError::ScalerNotFitted);
        };
        if !self.is_fitted {
            return Err(FeatureError::ScalerNotFitted);
        }
        if min.len() != width {
            return Err(FeatureError::ScalerWidthMismatch {
                fitted: min.len(),
                got: width,
            });
        }
        Ok((min, range))
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        let (min, range) = self.params(X.ncols())?;

        // (X - min) / (max - min)
        let mut scaled = X.clone();
        for mut row in scaled.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - min[i]) / range[i];
            }
        }

        Ok(scaled)
    }

    pub fn inverse_transform(&self, X: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        let (min, range) = self.params(X.ncols())?;

        let mut restored = X.clone();
        for mut row in restored.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = *val * range[i] + min[i];
            }
        }

        Ok(restored)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        self.fit(X)?;
        self.transform(X)
    }

    pub fn data_min(&self) -> Option<&Array1<f64>> {
        self.min.as_ref()
    }

    pub fn data_max(&self) -> Option<&Array1<f64>> {
        self.max.as_ref()
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}
