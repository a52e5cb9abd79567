//! Entry table: shader entries laid out in one global command-number space.

use std::fmt;

use hashbrown::HashSet;

use crate::error::ConfigError;
use crate::model::{CfgEntryInfo, ComboParam, centroid_mask, combo_count};
use crate::section::SectionIndex;
use crate::validity::{AllValid, ComboValidity};

/// Parsed description of one shader entry, before command numbers are assigned.
pub struct EntryDef {
    pub name: String,
    pub shader_file_name: String,
    pub shader_version: String,
    pub static_params: Vec<ComboParam>,
    pub dynamic_params: Vec<ComboParam>,
    pub validity: Box<dyn ComboValidity>,
}

impl EntryDef {
    pub fn new(
        name: impl Into<String>,
        shader_file_name: impl Into<String>,
        shader_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shader_file_name: shader_file_name.into(),
            shader_version: shader_version.into(),
            static_params: Vec::new(),
            dynamic_params: Vec::new(),
            validity: Box::new(AllValid),
        }
    }

    pub fn with_static(mut self, param: ComboParam) -> Self {
        self.static_params.push(param);
        self
    }

    pub fn with_dynamic(mut self, param: ComboParam) -> Self {
        self.dynamic_params.push(param);
        self
    }

    pub fn with_validity(mut self, validity: impl ComboValidity + 'static) -> Self {
        self.validity = Box::new(validity);
        self
    }
}

impl fmt::Debug for EntryDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryDef")
            .field("name", &self.name)
            .field("shader_file_name", &self.shader_file_name)
            .field("shader_version", &self.shader_version)
            .field("static_params", &self.static_params)
            .field("dynamic_params", &self.dynamic_params)
            .finish_non_exhaustive()
    }
}

/// Check the parameter lists of an entry.
///
/// Returns the problem as a message; callers attach location context.
pub(crate) fn check_params(
    statics: &[ComboParam],
    dynamics: &[ComboParam],
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for param in statics.iter().chain(dynamics) {
        if param.name.is_empty() {
            return Err("parameter name must not be empty".to_string());
        }
        if !seen.insert(param.name.as_str()) {
            return Err(format!("parameter '{}' is declared twice", param.name));
        }
    }
    if let Some(param) = statics.iter().find(|p| p.value_count() == 0) {
        return Err(format!(
            "static parameter '{}' has an empty range {}..{}",
            param.name, param.min, param.max
        ));
    }
    if let Some(param) = dynamics
        .iter()
        .skip(u32::BITS as usize)
        .find(|param| param.centroid)
    {
        return Err(format!(
            "centroid parameter '{}' index exceeds mask width of {} bits",
            param.name,
            u32::BITS
        ));
    }
    Ok(())
}

/// An entry with its assigned range. Owned by the [`Configuration`].
pub(crate) struct CfgEntry {
    pub(crate) info: CfgEntryInfo,
    pub(crate) statics: Vec<ComboParam>,
    pub(crate) dynamics: Vec<ComboParam>,
    validity: Box<dyn ComboValidity>,
}

impl CfgEntry {
    pub(crate) fn is_static_valid(&self, static_index: u64) -> bool {
        self.validity.is_valid(static_index)
    }
}

impl fmt::Debug for CfgEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CfgEntry")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Immutable, loaded configuration: the entry table plus its section index.
///
/// Safe to share between threads; every lookup and iteration method takes
/// `&self`. Mutable iteration state lives in caller-owned [`ComboHandle`]s.
///
/// [`ComboHandle`]: crate::ComboHandle
#[derive(Debug)]
pub struct Configuration {
    entries: Vec<CfgEntry>,
    pub(crate) sections: SectionIndex,
    total: u64,
}

impl Configuration {
    /// Build the entry table, assigning command ranges by prefix sum in
    /// declaration order.
    pub fn from_entries(defs: impl IntoIterator<Item = EntryDef>) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        let mut next_start = 0u64;

        for def in defs {
            let entry_error = |message: String| ConfigError::Entry {
                entry: def.name.clone(),
                message,
            };
            if def.name.is_empty() {
                return Err(entry_error("entry name must not be empty".to_string()));
            }
            check_params(&def.static_params, &def.dynamic_params).map_err(entry_error)?;

            let overflow = || entry_error("combo count overflows 64 bits".to_string());
            let num_static_combos = combo_count(&def.static_params).ok_or_else(overflow)?;
            let num_dynamic_combos = combo_count(&def.dynamic_params).ok_or_else(overflow)?;
            let num_combos = num_static_combos
                .checked_mul(num_dynamic_combos)
                .ok_or_else(overflow)?;
            let command_end = next_start.checked_add(num_combos).ok_or_else(|| {
                entry_error("total command count overflows 64 bits".to_string())
            })?;

            if num_dynamic_combos == 0 {
                tracing::warn!(
                    entry = %def.name,
                    "Entry has no dynamic combos; it occupies no command numbers"
                );
            }

            let info = CfgEntryInfo {
                name: def.name,
                shader_file_name: def.shader_file_name,
                shader_version: def.shader_version,
                num_combos,
                num_dynamic_combos,
                num_static_combos: if num_dynamic_combos == 0 {
                    0
                } else {
                    num_static_combos
                },
                command_start: next_start,
                command_end,
                centroid_mask: centroid_mask(&def.dynamic_params),
            };
            next_start = command_end;

            entries.push(CfgEntry {
                info,
                statics: def.static_params,
                dynamics: def.dynamic_params,
                validity: def.validity,
            });
        }

        let sections = SectionIndex::build(entries.iter().map(|entry| &entry.info));

        tracing::debug!(
            entries = entries.len(),
            total_commands = next_start,
            "Built shader combo table"
        );

        Ok(Self {
            entries,
            sections,
            total: next_start,
        })
    }

    /// All entries in table order.
    pub fn describe(&self) -> impl ExactSizeIterator<Item = &CfgEntryInfo> + '_ {
        self.entries.iter().map(|entry| &entry.info)
    }

    /// Number of command numbers across all entries, skipped combos included.
    pub fn total_command_count(&self) -> u64 {
        self.total
    }

    /// Entry owning `command`, or `None` when out of range.
    pub fn get_section(&self, command: u64) -> Option<&CfgEntryInfo> {
        self.sections
            .find(command)
            .map(|index| &self.entries[index].info)
    }

    pub(crate) fn entry(&self, index: usize) -> Option<&CfgEntry> {
        self.entries.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, statics: i32, dynamics: i32) -> EntryDef {
        let mut def = EntryDef::new(name, format!("{name}.fxc"), "ps_3_0");
        if statics > 0 {
            def = def.with_static(ComboParam::new("S", 0, statics - 1));
        }
        def.with_dynamic(ComboParam::new("D", 0, dynamics - 1))
    }

    #[test]
    fn test_prefix_sum_ranges() {
        let config = Configuration::from_entries([
            entry("a", 7, 2),
            entry("b", 3, 3),
            entry("c", 13, 1),
        ])
        .unwrap();

        let infos: Vec<_> = config.describe().collect();
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].command_start, 0);
        for pair in infos.windows(2) {
            assert_eq!(pair[0].command_end, pair[1].command_start);
        }
        assert_eq!(infos[2].command_end, config.total_command_count());
        assert_eq!(config.total_command_count(), 14 + 9 + 13);

        assert_eq!(infos[0].num_static_combos, 7);
        assert_eq!(infos[0].num_dynamic_combos, 2);
        assert_eq!(infos[0].num_combos, 14);
    }

    #[test]
    fn test_zero_dynamic_combos_is_an_empty_range() {
        let config = Configuration::from_entries([
            entry("a", 2, 2),
            entry("empty", 4, 0),
            entry("b", 2, 1),
        ])
        .unwrap();

        let empty = config.describe().nth(1).unwrap();
        assert_eq!(empty.num_combos, 0);
        assert_eq!(empty.num_dynamic_combos, 0);
        assert_eq!(empty.command_start, 4);
        assert_eq!(empty.command_end, 4);

        assert_eq!(config.get_section(4).unwrap().name, "b");
        assert_eq!(config.get_section(3).unwrap().name, "a");
        assert!(config.get_section(6).is_none());
    }

    #[test]
    fn test_entry_without_static_params() {
        let config = Configuration::from_entries([entry("a", 0, 4)]).unwrap();
        let info = config.describe().next().unwrap();
        assert_eq!(info.num_static_combos, 1);
        assert_eq!(info.num_combos, 4);
    }

    #[test]
    fn test_rejects_duplicate_params() {
        let def = EntryDef::new("dup", "dup.fxc", "vs_3_0")
            .with_static(ComboParam::new("X", 0, 1))
            .with_dynamic(ComboParam::new("X", 0, 1));
        let err = Configuration::from_entries([def]).unwrap_err();
        assert!(err.to_string().contains("declared twice"), "{err}");
    }

    #[test]
    fn test_rejects_empty_static_range() {
        let def = EntryDef::new("bad", "bad.fxc", "vs_3_0").with_static(ComboParam::new("X", 2, 1));
        let err = Configuration::from_entries([def]).unwrap_err();
        assert!(matches!(err, ConfigError::Entry { ref entry, .. } if entry == "bad"));
    }

    #[test]
    fn test_rejects_overflow() {
        let wide = || ComboParam::new("W", i32::MIN, i32::MAX);
        let def = EntryDef::new("huge", "huge.fxc", "ps_3_0")
            .with_static(wide())
            .with_dynamic(ComboParam { name: "V".into(), ..wide() })
            .with_dynamic(ComboParam { name: "U".into(), ..wide() });
        let err = Configuration::from_entries([def]).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
    }

    #[test]
    fn test_rejects_centroid_past_mask_width() {
        let dynamics = |centroid_at: usize| {
            (0..33).fold(EntryDef::new("wide", "wide.fxc", "vs_3_0"), |def, index| {
                let param = ComboParam::new(format!("D{index}"), 0, 0);
                let param = if index == centroid_at {
                    param.with_centroid()
                } else {
                    param
                };
                def.with_dynamic(param)
            })
        };

        let config = Configuration::from_entries([dynamics(31)]).unwrap();
        assert_eq!(config.describe().next().unwrap().centroid_mask, 1 << 31);

        let err = Configuration::from_entries([dynamics(32)]).unwrap_err();
        assert!(err.to_string().contains("exceeds mask width"), "{err}");
    }

    #[test]
    fn test_empty_configuration() {
        let config = Configuration::from_entries(Vec::new()).unwrap();
        assert_eq!(config.total_command_count(), 0);
        assert_eq!(config.describe().len(), 0);
        assert!(config.get_section(0).is_none());
    }
}
