use crate::{error::Error, schema_inference, util};
use serde::Serialize;
use serde_json::Value;
use std::{io, path::PathBuf};

pub const DEFAULT_SCHEMA_ROOT: &str = "response-schemas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaMode {
    /// Validate against the stored schema.
    #[default]
    Verify,
    /// Derive a schema from the payload, overwrite the stored one, then
    /// validate. Developer tooling for authoring schemas: the written file
    /// reflects whatever payload triggered it and must be reviewed.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub instance_path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

/// JSON Schemas addressed by `(group, name)`, stored at
/// `<root>/<group>/<name>_schema.json`.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    root: PathBuf,
}

impl SchemaStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, group: &str, name: &str) -> PathBuf {
        self.root
            .join(group)
            .join(format!("{}_schema.json", name))
    }

    pub async fn capture(
        &self,
        group: &str,
        name: &str,
        payload: &Value,
    ) -> Result<PathBuf, Error> {
        let path = self.resolve(group, name);
        tracing::warn!(
            path = %path.display(),
            "capturing schema from payload, review it before committing"
        );

        let schema = util::pretty_json(&schema_inference::infer_schema(payload));
        let written: io::Result<()> = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, schema).await
        }
        .await;

        match written {
            Ok(()) => Ok(path),
            Err(source) => Err(Error::SchemaCapture { path, source }),
        }
    }

    pub async fn load(&self, group: &str, name: &str) -> Result<Value, Error> {
        let path = self.resolve(group, name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SchemaNotFound(path));
            }
            Err(e) => return Err(Error::IoError(e)),
        };

        serde_json::from_str(&content).map_err(|e| Error::InvalidSchema {
            path,
            reason: e.to_string(),
        })
    }

    /// Evaluates `payload` and returns every violation instead of failing.
    pub async fn check(
        &self,
        group: &str,
        name: &str,
        payload: &Value,
        mode: SchemaMode,
    ) -> Result<ValidationResult, Error> {
        if mode == SchemaMode::Capture {
            self.capture(group, name, payload).await?;
        }

        let schema = self.load(group, name).await?;
        evaluate(&schema, payload).map_err(|reason| Error::InvalidSchema {
            path: self.resolve(group, name),
            reason,
        })
    }

    pub async fn validate(
        &self,
        group: &str,
        name: &str,
        payload: &Value,
        mode: SchemaMode,
    ) -> Result<(), Error> {
        let result = self.check(group, name, payload, mode).await?;
        if result.valid {
            return Ok(());
        }

        Err(Error::SchemaValidation {
            file_name: name.into(),
            violations: result.violations,
            payload: util::pretty_json(payload),
        })
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_ROOT)
    }
}

/// Compiles `schema` with format validation enabled and collects all
/// violations of `payload`, in evaluation order.
pub fn evaluate(schema: &Value, payload: &Value) -> Result<ValidationResult, String> {
    let validator = jsonschema::options()
        .should_validate_formats(true)
        .build(schema)
        .map_err(|e| e.to_string())?;

    let violations: Vec<Violation> = validator
        .iter_errors(payload)
        .map(|error| Violation {
            instance_path: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect();

    Ok(ValidationResult {
        valid: violations.is_empty(),
        violations,
    })
}
