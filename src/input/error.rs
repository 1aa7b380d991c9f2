//! Error type shared by the bind and control layers.

use super::bind::MAX_COMBO_LEN;

/// Error type for bind and control operations
///
/// Every variant is local and recoverable. Operations that return an error
/// leave the group or registry they were called on unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// Control name (or index) not present in the control registry
    #[error("Unknown control '{0}'")]
    UnknownControl(String),

    /// Bind name not present in the group
    #[error("Unknown bind '{0}'")]
    UnknownBind(String),

    /// Group name not present in the bind registry
    #[error("Unknown bind group '{0}'")]
    UnknownGroup(String),

    /// Bind, group, or control name already taken (case-insensitive)
    #[error("Name '{0}' is already in use")]
    DuplicateName(String),

    /// Combo has no controls or more than the supported maximum
    #[error("Combo must have between 1 and {max} controls, got {0}", max = MAX_COMBO_LEN)]
    InvalidComboLength(usize),

    /// Another bind in the group already owns exactly this set of controls
    #[error("Combo for '{bind}' is already used by '{existing}'")]
    ComboConflict { bind: String, existing: String },

    /// A batch reconfiguration entry failed; the whole batch was rolled back
    #[error("Bind definition '{entry}' rejected: {source}")]
    BatchValidationFailed {
        entry: String,
        #[source]
        source: Box<BindError>,
    },
}

/// Result type for bind and control operations
pub type BindResult<T> = Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            BindError::UnknownControl("Foo".into()).to_string(),
            "Unknown control 'Foo'"
        );
        assert_eq!(
            BindError::InvalidComboLength(4).to_string(),
            "Combo must have between 1 and 3 controls, got 4"
        );
        assert_eq!(
            BindError::ComboConflict {
                bind: "z".into(),
                existing: "y".into()
            }
            .to_string(),
            "Combo for 'z' is already used by 'y'"
        );
    }

    #[test]
    fn test_batch_error_exposes_source() {
        use std::error::Error;

        let err = BindError::BatchValidationFailed {
            entry: "b".into(),
            source: Box::new(BindError::InvalidComboLength(0)),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Combo must have between 1 and 3 controls, got 0")
        );
        assert!(err.to_string().starts_with("Bind definition 'b' rejected"));
    }
}
