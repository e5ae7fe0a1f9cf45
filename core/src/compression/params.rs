//! compression/params.rs
//! Declarative parameter binding.
//!
//! Design notes:
//! - A `ParamTable` lists only the fields the caller set; absent fields never reach a setter.
//! - `apply` walks the table through a per-backend setter closure and stops at the first refusal.
//! - Flags follow the backend's `FlagPolicy`; integers are always checked.
//! - Tables are applied to a freshly created native context owned by the caller of
//!   `apply`, so a refusal drops that context and nothing half-configured escapes.

use std::fmt;
use std::ops::RangeInclusive;

use crate::compression::types::{CompressionError, Result};
use crate::utils::in_range;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Int(i32),
    Flag(bool),
}

impl ParamValue {
    /// Native integer form; flags map to 0/1.
    pub fn as_native(self) -> i32 {
        match self {
            ParamValue::Int(v) => v,
            ParamValue::Flag(b) => b as i32,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// How a backend treats a refused flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagPolicy {
    /// A refused flag fails construction like any other parameter.
    Checked,
    /// A refused flag is logged and ignored.
    BestEffort,
}

/// Sparse list of (symbolic parameter, value) pairs for one backend.
#[derive(Clone, Debug)]
pub struct ParamTable<K> {
    backend: &'static str,
    entries: Vec<(K, ParamValue)>,
}

impl<K: Copy + fmt::Debug> ParamTable<K> {
    pub fn new(backend: &'static str) -> Self {
        Self { backend, entries: Vec::new() }
    }

    pub fn int(mut self, key: K, value: Option<i32>) -> Self {
        if let Some(v) = value {
            self.entries.push((key, ParamValue::Int(v)));
        }
        self
    }

    pub fn flag(mut self, key: K, value: Option<bool>) -> Self {
        if let Some(b) = value {
            self.entries.push((key, ParamValue::Flag(b)));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, ParamValue)> {
        self.entries.iter()
    }

    /// Run every present entry through `set`.
    ///
    /// # Errors
    /// - `InvalidConfiguration` for the first refused integer, or refused flag under
    ///   `FlagPolicy::Checked`.
    pub fn apply<F>(&self, policy: FlagPolicy, mut set: F) -> Result<()>
    where
        F: FnMut(K, ParamValue) -> std::result::Result<(), String>,
    {
        for &(key, value) in &self.entries {
            match set(key, value) {
                Ok(()) => {
                    tracing::trace!(backend = self.backend, param = ?key, %value, "parameter set");
                }
                Err(msg) if policy == FlagPolicy::BestEffort && matches!(value, ParamValue::Flag(_)) => {
                    tracing::warn!(backend = self.backend, param = ?key, %value, %msg, "flag ignored");
                }
                Err(msg) => {
                    return Err(CompressionError::invalid_config(
                        self.backend,
                        format!("failed to set {key:?} to {value}: {msg}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Reject a present value outside `range` before any native call.
pub fn check_range(
    backend: &'static str,
    name: &str,
    value: Option<i32>,
    range: RangeInclusive<i32>,
) -> Result<()> {
    match value {
        Some(v) if !in_range(v, &range) => Err(CompressionError::invalid_config(
            backend,
            format!("{name} must be between {} and {}, got {v}", range.start(), range.end()),
        )),
        _ => Ok(()),
    }
}

/// Native setters taking unsigned values; negative input is refused.
pub fn to_u32(value: i32) -> std::result::Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{value} is negative"))
}
