use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Affine standardization `(x - mean) / scale` learned from the encoded
/// training codes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
    n_samples: usize,
}

impl StandardScaler {
    /// Population mean and standard deviation. A zero deviation becomes 1 so
    /// a single-sample fit stays invertible.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
        let deviation = variance.sqrt();
        let scale = if deviation > 0.0 { deviation } else { 1.0 };

        Some(Self { mean, scale, n_samples: values.len() })
    }

    pub fn transform(&self, code: usize) -> Result<f64, PipelineError> {
        let feature = (code as f64 - self.mean) / self.scale;
        if feature.is_finite() {
            Ok(feature)
        } else {
            Err(PipelineError::NonFiniteFeature { code })
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if !self.mean.is_finite() {
            return Err("scaler mean must be finite".to_string());
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err("scaler scale must be finite and positive".to_string());
        }
        if self.n_samples == 0 {
            return Err("scaler was fitted on zero samples".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StandardScaler;
    use crate::ml::PipelineError;

    #[test]
    fn fit_uses_population_statistics() {
        let scaler = StandardScaler::fit(&[0.0, 1.0, 2.0, 3.0]).expect("non-empty");

        assert!((scaler.mean() - 1.5).abs() < 1e-12);
        assert!((scaler.scale() - 1.25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(scaler.n_samples(), 4);
    }

    #[test]
    fn transform_is_affine_and_centered() {
        let scaler = StandardScaler::fit(&[0.0, 1.0, 2.0]).expect("non-empty");
        let low = scaler.transform(0).expect("finite");
        let mid = scaler.transform(1).expect("finite");
        let high = scaler.transform(2).expect("finite");

        assert!(mid.abs() < 1e-12);
        assert!((low + high).abs() < 1e-12);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn constant_input_keeps_unit_scale() {
        let scaler = StandardScaler::fit(&[4.0]).expect("non-empty");
        assert_eq!(scaler.scale(), 1.0);
        assert_eq!(scaler.transform(4), Ok(0.0));
        assert!(StandardScaler::fit(&[]).is_none());
    }

    #[test]
    fn degenerate_parameters_fail_shape_or_transform() {
        let broken: StandardScaler =
            serde_json::from_str(r#"{"mean":0.0,"scale":0.0,"n_samples":3}"#).expect("json");
        assert!(broken.check_shape().is_err());
        assert_eq!(broken.transform(0), Err(PipelineError::NonFiniteFeature { code: 0 }));
    }
}
