//! Versioned value-function snapshots.
//!
//! A snapshot is an opaque JSON serialization of the per-action vector
//! sets, stamped with the schema version and the model dimensions it was
//! computed against. Loading against a different model is rejected rather
//! than silently producing garbage policies.

use crate::model::Pomdp;
use crate::policy::ValueFunction;
use crate::solver::vector_set::{ValueVector, VectorSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Schema version for snapshot files.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1";

/// Errors from snapshot capture and restore.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot schema version {0}")]
    SchemaVersion(String),

    #[error("snapshot {field} is {found}, model has {expected}")]
    ModelMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("snapshot vector {index} has {found} values, expected {expected}")]
    VectorShape {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One serialized alpha-vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotVector {
    pub action: usize,
    pub values: Vec<f64>,
}

/// A value function frozen to disk, versioned by the model it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueFunctionSnapshot {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub states: usize,
    pub actions: usize,
    pub observations: usize,
    pub discount: f64,
    pub stage: usize,
    pub vectors: Vec<SnapshotVector>,
}

impl ValueFunctionSnapshot {
    /// Freeze a value function together with its model's dimensions.
    pub fn capture(model: &Pomdp, value_function: &ValueFunction) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            states: model.states,
            actions: model.actions,
            observations: model.observations,
            discount: model.discount,
            stage: value_function.stage(),
            vectors: value_function
                .vectors()
                .iter()
                .map(|v| SnapshotVector {
                    action: v.action(),
                    values: v.values().to_vec(),
                })
                .collect(),
        }
    }

    /// Rebuild the value function, checking internal consistency only.
    pub fn value_function(&self) -> Result<ValueFunction, SnapshotError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::SchemaVersion(self.schema_version.clone()));
        }
        let mut set = VectorSet::with_capacity(self.vectors.len());
        for (index, v) in self.vectors.iter().enumerate() {
            if v.values.len() != self.states {
                return Err(SnapshotError::VectorShape {
                    index,
                    expected: self.states,
                    found: v.values.len(),
                });
            }
            set.push(ValueVector::new(v.values.clone(), v.action));
        }
        Ok(ValueFunction::new(self.stage, set))
    }

    /// Rebuild the value function against a model, rejecting any mismatch in
    /// dimensions or discount.
    pub fn restore(&self, model: &Pomdp) -> Result<ValueFunction, SnapshotError> {
        let checks: [(&'static str, usize, usize); 3] = [
            ("state count", model.states, self.states),
            ("action count", model.actions, self.actions),
            ("observation count", model.observations, self.observations),
        ];
        for (field, expected, found) in checks {
            if expected != found {
                return Err(SnapshotError::ModelMismatch {
                    field,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        if (model.discount - self.discount).abs() > 1e-9 {
            return Err(SnapshotError::ModelMismatch {
                field: "discount",
                expected: model.discount.to_string(),
                found: self.discount.to_string(),
            });
        }
        self.value_function()
    }

    /// Write as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read back from a JSON file.
    pub fn read_from(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{initial_value_function, IncrementalPruning, SolverConfig};

    fn solved_tiger() -> (Pomdp, ValueFunction) {
        let model = Pomdp::tiger(0.95).unwrap();
        let report = IncrementalPruning::new(SolverConfig {
            horizon: Some(2),
            ..Default::default()
        })
        .unwrap()
        .solve(&model)
        .unwrap();
        (model, report.value_function)
    }

    #[test]
    fn capture_restore_roundtrip() {
        let (model, vf) = solved_tiger();
        let snapshot = ValueFunctionSnapshot::capture(&model, &vf);
        let restored = snapshot.restore(&model).unwrap();
        assert_eq!(restored.stage(), vf.stage());
        assert!(restored.vectors().same_vectors(vf.vectors()));
    }

    #[test]
    fn file_roundtrip() {
        let (model, vf) = solved_tiger();
        let snapshot = ValueFunctionSnapshot::capture(&model, &vf);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vf.json");
        snapshot.write_to(&path).unwrap();
        let back = ValueFunctionSnapshot::read_from(&path).unwrap();
        let restored = back.restore(&model).unwrap();
        assert!(restored.vectors().same_vectors(vf.vectors()));
    }

    #[test]
    fn mismatched_model_rejected() {
        let (model, vf) = solved_tiger();
        let snapshot = ValueFunctionSnapshot::capture(&model, &vf);

        let other = Pomdp::single_state(1.0, 0.95).unwrap();
        assert!(matches!(
            snapshot.restore(&other),
            Err(SnapshotError::ModelMismatch {
                field: "state count",
                ..
            })
        ));

        let mut rediscounted = model.clone();
        rediscounted.discount = 0.9;
        assert!(matches!(
            snapshot.restore(&rediscounted),
            Err(SnapshotError::ModelMismatch {
                field: "discount",
                ..
            })
        ));
    }

    #[test]
    fn wrong_schema_version_rejected() {
        let model = Pomdp::single_state(1.0, 0.9).unwrap();
        let vf = initial_value_function(&model);
        let mut snapshot = ValueFunctionSnapshot::capture(&model, &vf);
        snapshot.schema_version = "0".to_string();
        assert!(matches!(
            snapshot.value_function(),
            Err(SnapshotError::SchemaVersion(_))
        ));
    }

    #[test]
    fn malformed_vector_rejected() {
        let model = Pomdp::tiger(0.95).unwrap();
        let vf = initial_value_function(&model);
        let mut snapshot = ValueFunctionSnapshot::capture(&model, &vf);
        snapshot.vectors[0].values.pop();
        assert!(matches!(
            snapshot.value_function(),
            Err(SnapshotError::VectorShape { index: 0, .. })
        ));
    }
}
