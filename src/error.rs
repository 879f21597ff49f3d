use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by parser functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("expected a struct target, got {type_name}")]
    NotAStructPointer { type_name: &'static str },

    #[error("tag option {option:?} not supported on field {field}")]
    UnsupportedTagOption { field: &'static str, option: String },

    #[error("required environment variable {key:?} is not set")]
    RequiredVariableMissing { key: String },

    #[error("environment variable {key:?} should not be empty")]
    EmptyVariable { key: String },

    #[error("could not load {path} from variable {key}: {source}")]
    FileLoadError {
        key: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error on field {field:?} of type {type_name}: {source}")]
    ParseError {
        field: &'static str,
        type_name: &'static str,
        source: BoxError,
    },

    #[error("no parser found for field {field:?} of type {type_name}")]
    NoParserFound {
        field: &'static str,
        type_name: &'static str,
    },

    #[error("{}", display_joined(.0))]
    Multiple(Vec<EnvError>),
}

impl EnvError {
    /// Structural errors abort the walk instead of being collected.
    pub fn is_structural(&self) -> bool {
        match self {
            EnvError::NotAStructPointer { .. } | EnvError::UnsupportedTagOption { .. } => true,
            EnvError::Multiple(errors) => errors.iter().any(EnvError::is_structural),
            _ => false,
        }
    }

    /// Join collected errors into one. A single error is returned bare and
    /// nested `Multiple` values are flattened.
    pub fn join(errors: Vec<EnvError>) -> Option<EnvError> {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            err.flatten_into(&mut flat);
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(EnvError::Multiple(flat)),
        }
    }

    /// Iterate over every individual error, flattening `Multiple`.
    pub fn errors(&self) -> Box<dyn Iterator<Item = &EnvError> + '_> {
        match self {
            EnvError::Multiple(errors) => Box::new(errors.iter().flat_map(EnvError::errors)),
            other => Box::new(std::iter::once(other)),
        }
    }

    fn flatten_into(self, out: &mut Vec<EnvError>) {
        match self {
            EnvError::Multiple(errors) => {
                for err in errors {
                    err.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }
}

fn display_joined(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
