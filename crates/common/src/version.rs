use serde::{Deserialize, Serialize};

/// Version counter for an aggregate, used for optimistic concurrency control.
///
/// Versions start at 1 on creation and increment by exactly 1 on every
/// accepted mutation. A mutation whose caller-supplied expected version does
/// not match the stored version is rejected without side effects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version assigned to a freshly created aggregate (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_is_one() {
        assert_eq!(Version::first().as_i64(), 1);
    }

    #[test]
    fn next_increments_by_one() {
        assert_eq!(Version::first().next(), Version::new(2));
        assert_eq!(Version::new(41).next().as_i64(), 42);
    }

    #[test]
    fn ordering() {
        assert!(Version::first() < Version::new(2));
    }
}
