use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{ArtifactError, ModelError};

/// A trained regressor taking one schema-aligned row.
pub trait Regressor: Send + Sync {
    fn predict(&self, x: &[f32]) -> Result<f64, ModelError>;
}

// ---------- JSON model artifacts ----------

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelJson {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

/// Loads the model at `path` for a schema of `in_dim` columns.
///
/// `.pt`/`.pth` files are TorchScript modules; anything else is a JSON
/// document tagged by `kind`.
pub fn load(path: &Path, in_dim: usize) -> Result<Box<dyn Regressor>, ArtifactError> {
    let is_torchscript = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pt") | Some("pth")
    );
    if is_torchscript {
        return load_torchscript(path, in_dim);
    }

    let txt = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ModelJson = serde_json::from_str(&txt).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match parsed {
        ModelJson::Linear(m) => {
            m.check(in_dim)?;
            Box::new(m)
        }
        ModelJson::TreeEnsemble(m) => {
            m.check(in_dim)?;
            Box::new(m)
        }
    })
}

#[cfg(feature = "torch")]
fn load_torchscript(path: &Path, in_dim: usize) -> Result<Box<dyn Regressor>, ArtifactError> {
    Ok(Box::new(torch::TorchModel::load(path, in_dim)?))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(path: &Path, _in_dim: usize) -> Result<Box<dyn Regressor>, ArtifactError> {
    Err(ArtifactError::TorchUnavailable(path.to_path_buf()))
}

fn check_len(x: &[f32], expected: usize) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::LengthMismatch {
            got: x.len(),
            expected,
        });
    }
    Ok(())
}

fn finite(v: f64) -> Result<f64, ModelError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ModelError::NonFinite(v))
    }
}

// ---------- Linear ----------

/// Ordinary linear regression; coefficients are positional against the schema.
#[derive(Deserialize, Debug, Clone)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn check(&self, in_dim: usize) -> Result<(), ArtifactError> {
        if self.coefficients.len() != in_dim {
            return Err(ArtifactError::InvalidModel(format!(
                "linear model has {} coefficients, feature schema has {} columns",
                self.coefficients.len(),
                in_dim
            )));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, x: &[f32]) -> Result<f64, ModelError> {
        check_len(x, self.coefficients.len())?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * f64::from(*v))
            .sum();
        finite(self.intercept + dot)
    }
}

// ---------- Tree ensemble ----------

const LEAF: i64 = -1;

/// One regression tree in the array layout of a fitted decision tree.
#[derive(Deserialize, Debug, Clone)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    fn check(&self, idx: usize, in_dim: usize) -> Result<(), ArtifactError> {
        let n = self.children_left.len();
        let invalid = |msg: String| ArtifactError::InvalidModel(format!("tree {idx}: {msg}"));

        if n == 0 {
            return Err(invalid("no nodes".into()));
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(invalid("node arrays differ in length".into()));
        }

        for node in 0..n {
            let (l, r) = (self.children_left[node], self.children_right[node]);
            if l == LEAF {
                if r != LEAF {
                    return Err(invalid(format!("node {node} has only a right child")));
                }
                continue;
            }
            // Children must point forward so traversal always terminates.
            for child in [l, r] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!("node {node} has out-of-order child {child}")));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= in_dim {
                return Err(invalid(format!("node {node} splits on feature {f} of {in_dim}")));
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: &[f32]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if f64::from(x[f]) <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of the trees.
    #[default]
    Mean,
    /// Boosting: base score plus the sum of the trees.
    Sum,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    fn check(&self, in_dim: usize) -> Result<(), ArtifactError> {
        if self.n_features != in_dim {
            return Err(ArtifactError::InvalidModel(format!(
                "tree ensemble expects {} features, feature schema has {} columns",
                self.n_features, in_dim
            )));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("tree ensemble has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(i, in_dim)?;
        }
        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, x: &[f32]) -> Result<f64, ModelError> {
        check_len(x, self.n_features)?;
        let total: f64 = self.trees.iter().map(|t| t.leaf_value(x)).sum();
        let out = match self.aggregation {
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
            Aggregation::Sum => self.base_score + total,
        };
        finite(out)
    }
}

// ---------- TorchScript ----------

#[cfg(feature = "torch")]
mod torch {
    use std::path::Path;
    use tch::{kind::Kind, CModule, Device, Tensor};

    use super::{check_len, finite, Regressor};
    use crate::error::{ArtifactError, ModelError};

    pub struct TorchModel {
        model: CModule,
        device: Device,
        in_dim: usize,
    }

    impl TorchModel {
        pub fn load(path: &Path, in_dim: usize) -> Result<Self, ArtifactError> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device).map_err(|e| {
                ArtifactError::InvalidModel(format!(
                    "failed to load TorchScript {}: {e}",
                    path.display()
                ))
            })?;

            // Probe output shape with a dummy forward; expect a single value.
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let out = model
                .forward_ts(&[dummy])
                .map_err(|e| ArtifactError::InvalidModel(e.to_string()))?;
            if out.numel() != 1 {
                return Err(ArtifactError::InvalidModel(format!(
                    "unexpected model output size: {:?}",
                    out.size()
                )));
            }

            Ok(Self {
                model,
                device,
                in_dim,
            })
        }
    }

    impl Regressor for TorchModel {
        fn predict(&self, x: &[f32]) -> Result<f64, ModelError> {
            check_len(x, self.in_dim)?;
            let input = Tensor::from_slice(x)
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let out = self
                .model
                .forward_ts(&[input])
                .map_err(|e| ModelError::Backend(e.to_string()))?;
            let v = out
                .reshape([-1])
                .to_kind(Kind::Double)
                .double_value(&[0]);
            finite(v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: i64, threshold: f64, left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    #[test]
    fn test_linear_predict() {
        let m = LinearModel {
            intercept: 1.0,
            coefficients: vec![0.5, 2.0],
        };
        assert_eq!(m.predict(&[2.0, 1.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_linear_length_mismatch() {
        let m = LinearModel {
            intercept: 0.0,
            coefficients: vec![1.0, 1.0],
        };
        assert!(matches!(
            m.predict(&[1.0]),
            Err(ModelError::LengthMismatch { got: 1, expected: 2 })
        ));
        assert!(m.check(3).is_err());
    }

    #[test]
    fn test_forest_mean() {
        let m = TreeEnsemble {
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            n_features: 2,
            trees: vec![stump(0, 10.0, 1.0, 3.0), stump(1, 0.5, 2.0, 6.0)],
        };
        m.check(2).unwrap();
        // x0 <= 10 -> 1.0, x1 > 0.5 -> 6.0
        assert_eq!(m.predict(&[10.0, 1.0]).unwrap(), 3.5);
        assert_eq!(m.predict(&[11.0, 0.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_boosted_sum() {
        let m = TreeEnsemble {
            aggregation: Aggregation::Sum,
            base_score: 4.0,
            n_features: 1,
            trees: vec![stump(0, 0.0, -0.5, 0.5), stump(0, 1.0, -0.25, 0.25)],
        };
        assert_eq!(m.predict(&[0.5]).unwrap(), 4.25);
    }

    #[test]
    fn test_tree_rejects_backward_child() {
        let mut t = stump(0, 1.0, 0.0, 1.0);
        t.children_right[0] = 0;
        assert!(t.check(0, 1).is_err());
    }

    #[test]
    fn test_tree_rejects_feature_out_of_range() {
        let t = stump(3, 1.0, 0.0, 1.0);
        assert!(t.check(0, 2).is_err());
    }

    #[test]
    fn test_model_json_kind_tag() {
        let m: ModelJson = serde_json::from_str(
            r#"{"kind":"linear","intercept":0.5,"coefficients":[1.0]}"#,
        )
        .unwrap();
        assert!(matches!(m, ModelJson::Linear(_)));

        let m: ModelJson = serde_json::from_str(
            r#"{"kind":"tree_ensemble","aggregation":"sum","n_features":1,"trees":[]}"#,
        )
        .unwrap();
        match m {
            ModelJson::TreeEnsemble(e) => assert_eq!(e.aggregation, Aggregation::Sum),
            _ => panic!("expected tree ensemble"),
        }
    }

    #[cfg(not(feature = "torch"))]
    #[test]
    fn test_torchscript_needs_feature() {
        let err = load(Path::new("crop_yield_model.pt"), 3).err().unwrap();
        assert!(matches!(err, ArtifactError::TorchUnavailable(_)));
    }
}
