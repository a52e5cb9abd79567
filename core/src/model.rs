//! Static/dynamic combo model.
//!
//! A shader entry declares a list of static and a list of dynamic parameters,
//! each taking every integer value in `min..=max`. The combo space of an entry
//! is the Cartesian product of both lists. Indices decompose mixed-radix with
//! the first declared parameter as the least significant digit.

use serde::Deserialize;

/// One `#define` that varies across combos.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComboParam {
    pub name: String,
    pub min: i32,
    pub max: i32,
    /// Dynamic parameters only: the parameter needs centroid sampling.
    #[serde(default)]
    pub centroid: bool,
}

impl ComboParam {
    pub fn new(name: impl Into<String>, min: i32, max: i32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            centroid: false,
        }
    }

    pub fn with_centroid(mut self) -> Self {
        self.centroid = true;
        self
    }

    /// Number of values the parameter takes. Zero when `max < min`.
    pub fn value_count(&self) -> u64 {
        if self.max < self.min {
            0
        } else {
            (i64::from(self.max) - i64::from(self.min) + 1) as u64
        }
    }
}

/// Read-only description of one shader entry and its command range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgEntryInfo {
    /// Name of the shader, e.g. "shader_ps20b"
    pub name: String,
    /// Name of the source file, e.g. "shader_psxx.fxc"
    pub shader_file_name: String,
    /// Target profile, e.g. "ps_2_0b"
    pub shader_version: String,
    /// Total combos including skipped ones: static * dynamic
    pub num_combos: u64,
    pub num_dynamic_combos: u64,
    pub num_static_combos: u64,
    /// First command number owned by this entry
    pub command_start: u64,
    /// One past the last command number owned by this entry
    pub command_end: u64,
    /// Bit `i` set when dynamic parameter `i` needs centroid sampling
    pub centroid_mask: u32,
}

impl CfgEntryInfo {
    /// Whether `command` lies in `[command_start, command_end)`.
    pub fn contains(&self, command: u64) -> bool {
        command >= self.command_start && command < self.command_end
    }
}

/// Product of the value counts of `params`, or `None` on overflow.
///
/// An empty list has exactly one combo.
pub(crate) fn combo_count(params: &[ComboParam]) -> Option<u64> {
    params
        .iter()
        .try_fold(1u64, |acc, param| acc.checked_mul(param.value_count()))
}

/// Centroid mask for a list of dynamic parameters.
pub(crate) fn centroid_mask(dynamics: &[ComboParam]) -> u32 {
    dynamics
        .iter()
        .enumerate()
        .filter(|(_, param)| param.centroid)
        .fold(0, |mask, (bit, _)| mask | 1u32.checked_shl(bit as u32).unwrap_or(0))
}

/// Decompose a combo index into one value per parameter.
pub(crate) fn decompose(params: &[ComboParam], index: u64) -> impl Iterator<Item = i32> + '_ {
    let mut rest = index;
    params.iter().map(move |param| {
        let count = param.value_count().max(1);
        let digit = rest % count;
        rest /= count;
        (i64::from(param.min) + digit as i64) as i32
    })
}
