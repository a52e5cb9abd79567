//! Forward iteration over valid combos.
//!
//! Scanning is a small state machine. From a candidate command number it
//! either stays within the current entry, crosses into the next non-empty
//! entry (restarting at local offset 0), or runs out of range. Skipped static
//! combos are stepped over a whole static combo at a time.

use std::ops::Range;

use crate::combo::{Binding, ComboHandle};
use crate::error::ComboError;
use crate::table::{CfgEntry, Configuration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Candidate at local offset `combo` of the section at `section`.
    Within { section: usize, combo: u64 },
    /// Local range of `section - 1` exhausted; continue at the start of `section`.
    Crossed { section: usize },
    Exhausted,
}

impl Configuration {
    /// First valid combo at or after `start` and before `end`.
    fn scan(&self, start: u64, end: u64) -> Option<Binding<'_>> {
        let mut state = match self.sections.locate(start) {
            Some(section) if start < end => {
                let entry = self.section_entry(section)?;
                ScanState::Within {
                    section,
                    combo: start - entry.info.command_start,
                }
            }
            _ => ScanState::Exhausted,
        };

        loop {
            state = match state {
                ScanState::Within { section, combo } => {
                    let entry = self.section_entry(section)?;
                    let info = &entry.info;
                    if info.command_start + combo >= end {
                        ScanState::Exhausted
                    } else if combo >= info.num_combos {
                        ScanState::Crossed {
                            section: section + 1,
                        }
                    } else {
                        let binding = Binding::at_offset(entry, combo);
                        if entry.is_static_valid(binding.static_index) {
                            return Some(binding);
                        }
                        ScanState::Within {
                            section,
                            combo: (binding.static_index + 1) * info.num_dynamic_combos,
                        }
                    }
                }
                ScanState::Crossed { section } => match self.section_entry(section) {
                    Some(entry) => {
                        tracing::trace!(entry = %entry.info.name, "Combo scan crossed into entry");
                        ScanState::Within { section, combo: 0 }
                    }
                    None => ScanState::Exhausted,
                },
                ScanState::Exhausted => return None,
            };
        }
    }

    fn section_entry(&self, section: usize) -> Option<&CfgEntry> {
        self.sections
            .entry_at(section)
            .and_then(|index| self.entry(index))
    }

    /// Advance `command` and `combo` to the next valid combo before `end`.
    ///
    /// An unbound `combo` starts fresh: `command` itself is a candidate. A
    /// bound `combo` must sit at `command`, and the search starts one past it.
    /// Returns `Ok(true)` with both rebound to the combo found, or `Ok(false)`
    /// with `command == end` and `combo` unbound when none remains.
    pub fn next_combo<'a>(
        &'a self,
        command: &mut u64,
        combo: &mut ComboHandle<'a>,
        end: u64,
    ) -> Result<bool, ComboError> {
        let start = match combo.binding_opt()? {
            None => *command,
            Some(binding) => {
                let bound = binding.command_num();
                if bound != *command {
                    return Err(ComboError::CursorMismatch {
                        cursor: *command,
                        bound,
                    });
                }
                bound.saturating_add(1)
            }
        };

        let found = self.scan(start, end);
        *command = found.map_or(end, |binding| binding.command_num());
        combo.rebind(found);
        Ok(found.is_some())
    }

    /// Every valid combo with a command number in `range`, in order.
    pub fn combos(&self, range: Range<u64>) -> Combos<'_> {
        Combos {
            config: self,
            command: range.start,
            combo: ComboHandle::unbound(),
            end: range.end,
            done: false,
        }
    }

    /// Number of valid combos with a command number in `range`.
    pub fn count_valid(&self, range: Range<u64>) -> u64 {
        self.combos(range).count() as u64
    }
}

/// Iterator returned by [`Configuration::combos`].
#[derive(Debug)]
pub struct Combos<'a> {
    config: &'a Configuration,
    command: u64,
    combo: ComboHandle<'a>,
    end: u64,
    done: bool,
}

impl<'a> Iterator for Combos<'a> {
    type Item = ComboHandle<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self
            .config
            .next_combo(&mut self.command, &mut self.combo, self.end)
        {
            Ok(true) => Some(self.combo.clone()),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Combos<'_> {}
