//! Virtual plug errors.

use daylight_domain::error::DaylightError;
use daylight_domain::id::DeviceId;

#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The plug is configured to behave as offline.
    #[error("virtual plug {0} is unreachable")]
    Unreachable(DeviceId),

    /// A device `config` entry could not be interpreted.
    #[error("invalid virtual plug config key {0:?}")]
    InvalidConfig(&'static str),
}

impl VirtualError {
    /// Convert into the domain error.
    pub fn into_domain(self) -> DaylightError {
        DaylightError::Transport(Box::new(self))
    }
}

impl From<VirtualError> for DaylightError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}
