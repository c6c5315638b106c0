//! Per-byte transform applied by the child

use serde::Serialize;

/// Shift applied when none is configured
pub const DEFAULT_SHIFT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Relay bytes unchanged
    Identity,
    /// Add a constant to every byte, wrapping at 256
    Shift(u8),
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Shift(DEFAULT_SHIFT)
    }
}

impl Transform {
    pub fn apply(&self, byte: u8) -> u8 {
        match self {
            Transform::Identity => byte,
            Transform::Shift(n) => byte.wrapping_add(*n),
        }
    }

    pub fn apply_all(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|&b| self.apply(b)).collect()
    }
}
