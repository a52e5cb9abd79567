//! Binary-searchable index over entry command ranges.

use crate::model::CfgEntryInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Section {
    start: u64,
    end: u64,
    entry: usize,
}

/// Maps a command number to the index of the entry owning it.
///
/// Entries with an empty range are left out, so every section is non-empty
/// and sections are sorted and contiguous.
#[derive(Debug, Clone, Default)]
pub(crate) struct SectionIndex {
    sections: Vec<Section>,
}

impl SectionIndex {
    pub(crate) fn build<'a>(entries: impl IntoIterator<Item = &'a CfgEntryInfo>) -> Self {
        let sections = entries
            .into_iter()
            .enumerate()
            .filter(|(_, info)| info.command_end > info.command_start)
            .map(|(entry, info)| Section {
                start: info.command_start,
                end: info.command_end,
                entry,
            })
            .collect();
        Self { sections }
    }

    /// Position in the section list of the section containing `command`.
    pub(crate) fn locate(&self, command: u64) -> Option<usize> {
        let pos = self.sections.partition_point(|section| section.end <= command);
        self.sections
            .get(pos)
            .filter(|section| section.start <= command)
            .map(|_| pos)
    }

    /// Entry index for the section at `pos`.
    pub(crate) fn entry_at(&self, pos: usize) -> Option<usize> {
        self.sections.get(pos).map(|section| section.entry)
    }

    /// Entry index owning `command`.
    pub(crate) fn find(&self, command: u64) -> Option<usize> {
        self.locate(command).and_then(|pos| self.entry_at(pos))
    }
}
