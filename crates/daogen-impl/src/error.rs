// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation errors.
//!
//! Every method is checked before anything is emitted. A pass that finds
//! several problems reports them together as [`GenerateError::Multiple`].

use thiserror::Error;

/// Error raised while lowering an interface model.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The method payload does not fit any category.
    #[error("method `{method}` cannot be classified: {reason}")]
    Unclassifiable {
        /// Method name.
        method: String,
        /// What is wrong with the payload.
        reason: String
    },

    /// A placeholder has no matching parameter.
    #[error("method `{method}`: placeholder `{placeholder}` has no matching parameter")]
    PlaceholderWithoutParameter {
        /// Method name.
        method:      String,
        /// Placeholder text as written in the SQL.
        placeholder: String
    },

    /// A shortcut or read refers to an entity missing from the model.
    #[error("method `{method}` references unknown entity `{entity}`")]
    UnknownEntity {
        /// Method name.
        method: String,
        /// Entity type name.
        entity: String
    },

    /// Two structurally different entities want the same helper.
    #[error("helper `{key}` requested for `{first}` and `{second}`")]
    HelperCollision {
        /// Helper signature.
        key:    String,
        /// Fingerprint of the first request.
        first:  String,
        /// Fingerprint of the conflicting request.
        second: String
    },

    /// The category cannot be delivered with this concurrency kind.
    #[error("method `{method}`: {category} methods cannot use {concurrency} delivery")]
    UnsupportedConcurrency {
        /// Method name.
        method:      String,
        /// Method category.
        category:    &'static str,
        /// Requested concurrency kind.
        concurrency: &'static str
    },

    /// An asynchronous method takes a borrowed parameter it must move.
    #[error("method `{method}`: parameter `{param}` must be owned to run asynchronously")]
    BorrowedAsyncParameter {
        /// Method name.
        method: String,
        /// Parameter name.
        param:  String
    },

    /// A delegate points to a missing or unsuitable method.
    #[error("method `{method}` delegates to `{target}`: {reason}")]
    UnknownDelegate {
        /// Method name.
        method: String,
        /// Target method name.
        target: String,
        /// Why the target is rejected.
        reason: &'static str
    },

    /// A converter is used but not declared on the interface.
    #[error("converter `{converter}` used by `{owner}` is not declared")]
    UnknownConverter {
        /// Method or entity using the converter.
        owner:     String,
        /// Converter path.
        converter: String
    },

    /// A key-based shortcut targets an entity without a primary key.
    #[error("method `{method}`: entity `{entity}` has no primary key")]
    MissingPrimaryKey {
        /// Method name.
        method: String,
        /// Entity type name.
        entity: String
    },

    /// The declared return type does not fit the category.
    #[error("method `{method}`: cannot return `{returns}`: {reason}")]
    UnsupportedReturn {
        /// Method name.
        method:  String,
        /// Declared return type.
        returns: String,
        /// Accepted return types.
        reason:  &'static str
    },

    /// Several errors found in one pass.
    #[error("{} errors:\n{}", .0.len(), render(.0))]
    Multiple(Vec<GenerateError>)
}

impl GenerateError {
    /// Fold a list of errors into one.
    ///
    /// Returns `None` for an empty list and the error itself for a single
    /// one.
    pub fn combine(mut errors: Vec<GenerateError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors))
        }
    }

    /// Errors contained in this one, flattened.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &GenerateError> + '_> {
        match self {
            Self::Multiple(errors) => Box::new(errors.iter().flat_map(GenerateError::iter)),
            other => Box::new(std::iter::once(other))
        }
    }
}

fn render(errors: &[GenerateError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unclassifiable(method: &str) -> GenerateError {
        GenerateError::Unclassifiable {
            method: method.into(),
            reason: "no targets".into()
        }
    }

    #[test]
    fn combine_empty_is_none() {
        assert!(GenerateError::combine(Vec::new()).is_none());
    }

    #[test]
    fn combine_single_unwraps() {
        let err = GenerateError::combine(vec![unclassifiable("a")]).unwrap();
        assert!(matches!(err, GenerateError::Unclassifiable { .. }));
    }

    #[test]
    fn multiple_lists_every_error() {
        let err = GenerateError::combine(vec![unclassifiable("a"), unclassifiable("b")]).unwrap();
        let message = err.to_string();
        assert!(message.starts_with("2 errors:"));
        assert!(message.contains("`a`"));
        assert!(message.contains("`b`"));
        assert_eq!(err.iter().count(), 2);
    }
}
