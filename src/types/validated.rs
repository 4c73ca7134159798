//! Validated identifier types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for identifier types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("channel id cannot be empty or whitespace")]
    EmptyChannelId,

    #[error("entity id cannot be empty or whitespace")]
    EmptyEntityId,

    #[error("tab id cannot be empty or whitespace")]
    EmptyTabId,

    #[error("step cannot be 0 seconds")]
    InvalidStep,
}

/// Macro to generate validated string newtypes.
///
/// Each type gets:
/// - A `new()` constructor that validates
/// - `as_str()` getter
/// - `AsRef<str>`, `Deref`, `Display`, `TryFrom<String>` impls
/// - Serde `Serialize` and `Deserialize` with validation
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            error_variant: $error_variant:ident,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
                let s = s.into();
                if s.trim().is_empty() {
                    return Err(ValidationError::$error_variant);
                }
                Ok(Self(s))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// Identifier of a single metric channel (e.g. `"cpu_load"`)
    pub struct ChannelId(String) {
        error_variant: EmptyChannelId,
    }
}

validated_string! {
    /// Identifier of a monitored network entity (access point, gateway, site)
    pub struct EntityId(String) {
        error_variant: EmptyEntityId,
    }
}

validated_string! {
    /// Identifier of a dashboard tab (e.g. `"overview"`, `"radio"`)
    pub struct TabId(String) {
        error_variant: EmptyTabId,
    }
}

/// Query resolution step in seconds; always non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StepSeconds(u64);

impl StepSeconds {
    /// Create a new step, rejecting 0
    #[must_use]
    pub fn new(seconds: u64) -> Option<Self> {
        if seconds == 0 { None } else { Some(Self(seconds)) }
    }

    /// Create a new step, with a descriptive error for config loading
    pub fn try_new(seconds: u64) -> Result<Self, ValidationError> {
        Self::new(seconds).ok_or(ValidationError::InvalidStep)
    }

    /// Get the step in seconds
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for StepSeconds {
    fn default() -> Self {
        Self(60)
    }
}

impl fmt::Display for StepSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl<'de> Deserialize<'de> for StepSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::try_new(seconds).map_err(serde::de::Error::custom)
    }
}
