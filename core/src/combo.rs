//! Combo handles: owned cursors into one entry's combo space.
//!
//! A handle is either unbound, bound to `(entry, static index, dynamic index)`,
//! or freed. Freeing is explicit and leaves a sentinel behind, so any later
//! use reports [`ComboError::Freed`] instead of reading stale state. Cloning
//! a handle copies its binding; entries are borrowed from the
//! [`Configuration`], never owned.

use std::fmt;

use crate::error::ComboError;
use crate::model::{CfgEntryInfo, ComboParam, decompose};
use crate::table::{CfgEntry, Configuration};

#[derive(Clone, Copy)]
pub(crate) struct Binding<'a> {
    pub(crate) entry: &'a CfgEntry,
    pub(crate) static_index: u64,
    pub(crate) dynamic_index: u64,
}

impl<'a> Binding<'a> {
    /// Bind to the local offset `combo` of `entry`.
    pub(crate) fn at_offset(entry: &'a CfgEntry, combo: u64) -> Self {
        let dynamic_combos = entry.info.num_dynamic_combos;
        Self {
            entry,
            static_index: combo / dynamic_combos,
            dynamic_index: combo % dynamic_combos,
        }
    }

    pub(crate) fn combo_num(&self) -> u64 {
        self.static_index * self.entry.info.num_dynamic_combos + self.dynamic_index
    }

    pub(crate) fn command_num(&self) -> u64 {
        self.entry.info.command_start + self.combo_num()
    }
}

#[derive(Clone, Copy, Default)]
enum HandleState<'a> {
    #[default]
    Unbound,
    Bound(Binding<'a>),
    Freed,
}

/// An owned handle to one combo of one shader entry.
#[derive(Clone, Default)]
pub struct ComboHandle<'a> {
    state: HandleState<'a>,
}

impl<'a> ComboHandle<'a> {
    /// A handle not bound to any combo.
    pub fn unbound() -> Self {
        Self::default()
    }

    pub(crate) fn bound(binding: Binding<'a>) -> Self {
        Self {
            state: HandleState::Bound(binding),
        }
    }

    /// Allocate a handle, copying the binding of `source` if given.
    pub fn alloc(source: Option<&ComboHandle<'a>>) -> Result<Self, ComboError> {
        match source {
            None => Ok(Self::unbound()),
            Some(source) if source.is_freed() => Err(ComboError::Freed),
            Some(source) => Ok(source.clone()),
        }
    }

    /// Overwrite this handle's binding with a copy of `source`'s.
    pub fn assign(&mut self, source: &ComboHandle<'a>) -> Result<(), ComboError> {
        if self.is_freed() || source.is_freed() {
            return Err(ComboError::Freed);
        }
        self.state = source.state;
        Ok(())
    }

    /// Release the handle. Every later operation on it fails with
    /// [`ComboError::Freed`], including a second `free`.
    pub fn free(&mut self) -> Result<(), ComboError> {
        if self.is_freed() {
            return Err(ComboError::Freed);
        }
        self.state = HandleState::Freed;
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, HandleState::Bound(_))
    }

    pub fn is_freed(&self) -> bool {
        matches!(self.state, HandleState::Freed)
    }

    pub(crate) fn binding(&self) -> Result<Binding<'a>, ComboError> {
        match self.state {
            HandleState::Bound(binding) => Ok(binding),
            HandleState::Unbound => Err(ComboError::Unbound),
            HandleState::Freed => Err(ComboError::Freed),
        }
    }

    /// `None` for an unbound handle.
    pub(crate) fn binding_opt(&self) -> Result<Option<Binding<'a>>, ComboError> {
        match self.state {
            HandleState::Bound(binding) => Ok(Some(binding)),
            HandleState::Unbound => Ok(None),
            HandleState::Freed => Err(ComboError::Freed),
        }
    }

    pub(crate) fn rebind(&mut self, binding: Option<Binding<'a>>) {
        self.state = binding.map_or(HandleState::Unbound, HandleState::Bound);
    }

    /// The entry this handle is bound to.
    pub fn entry_info(&self) -> Result<&'a CfgEntryInfo, ComboError> {
        self.binding().map(|binding| &binding.entry.info)
    }

    /// Global command number.
    pub fn command_num(&self) -> Result<u64, ComboError> {
        self.binding().map(|binding| binding.command_num())
    }

    /// Offset within the entry's combo space.
    pub fn combo_num(&self) -> Result<u64, ComboError> {
        self.binding().map(|binding| binding.combo_num())
    }

    pub fn static_index(&self) -> Result<u64, ComboError> {
        self.binding().map(|binding| binding.static_index)
    }

    pub fn dynamic_index(&self) -> Result<u64, ComboError> {
        self.binding().map(|binding| binding.dynamic_index)
    }

    /// `(name, value)` of every static parameter, in declaration order.
    pub fn static_values(
        &self,
    ) -> Result<impl Iterator<Item = (&'a str, i32)> + use<'a>, ComboError> {
        let binding = self.binding()?;
        Ok(named_values(&binding.entry.statics, binding.static_index))
    }

    /// `(name, value)` of every dynamic parameter, in declaration order.
    pub fn dynamic_values(
        &self,
    ) -> Result<impl Iterator<Item = (&'a str, i32)> + use<'a>, ComboError> {
        let binding = self.binding()?;
        Ok(named_values(&binding.entry.dynamics, binding.dynamic_index))
    }
}

fn named_values(params: &[ComboParam], index: u64) -> impl Iterator<Item = (&str, i32)> {
    params
        .iter()
        .map(|param| param.name.as_str())
        .zip(decompose(params, index))
}

impl fmt::Debug for ComboHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            HandleState::Unbound => f.write_str("ComboHandle(unbound)"),
            HandleState::Freed => f.write_str("ComboHandle(freed)"),
            HandleState::Bound(binding) => f
                .debug_struct("ComboHandle")
                .field("entry", &binding.entry.info.name)
                .field("static_index", &binding.static_index)
                .field("dynamic_index", &binding.dynamic_index)
                .field("command", &binding.command_num())
                .finish(),
        }
    }
}

impl Configuration {
    /// Handle bound to `command`.
    ///
    /// `None` when `command` is out of range or its static combo is skipped.
    pub fn combo(&self, command: u64) -> Option<ComboHandle<'_>> {
        let entry = self.sections.find(command).and_then(|index| self.entry(index))?;
        let binding = Binding::at_offset(entry, command - entry.info.command_start);
        entry
            .is_static_valid(binding.static_index)
            .then(|| ComboHandle::bound(binding))
    }
}
