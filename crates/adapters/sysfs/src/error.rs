//! Sysfs adapter error types.

use std::path::PathBuf;

use dhtnode_domain::error::NodeError;

/// Errors specific to the sysfs adapter.
#[derive(Debug, thiserror::Error)]
pub enum SysfsError {
    /// An attribute file could not be read or written.
    #[error("sysfs attribute {path} unavailable")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An attribute held something other than the expected integer.
    #[error("sysfs attribute {path} holds unexpected value {value:?}")]
    Parse { path: PathBuf, value: String },
}

impl SysfsError {
    /// Convert into a [`NodeError::Hardware`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> NodeError {
        NodeError::Hardware(Box::new(self))
    }
}

impl From<SysfsError> for NodeError {
    fn from(err: SysfsError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_parse_error() {
        let err = SysfsError::Parse {
            path: PathBuf::from("/sys/class/gpio/gpio17/value"),
            value: "x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "sysfs attribute /sys/class/gpio/gpio17/value holds unexpected value \"x\""
        );
    }

    #[test]
    fn should_convert_to_hardware_error() {
        let err: NodeError = SysfsError::Parse {
            path: PathBuf::new(),
            value: String::new(),
        }
        .into();
        assert!(matches!(err, NodeError::Hardware(_)));
    }
}
