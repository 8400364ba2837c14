//! Ordered collection of open document tabs.
//!
//! Insertion order is visual order. The "add tab" affordance is not an
//! entry: it is always the last slot of `visual_order()`, so the tab strip
//! is never empty even when no document is open. Only the controller
//! mutates the registry.

use std::path::Path;

use crate::model::{DocumentSession, TabId};
use crate::services::surface::SurfaceId;

/// One visual slot of the tab strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabSlot {
    Document(TabId),
    /// The trailing "+" affordance
    AddTab,
}

#[derive(Debug)]
pub struct TabEntry {
    pub id: TabId,
    pub title: String,
    pub session: DocumentSession,
}

#[derive(Debug)]
pub struct TabRegistry {
    entries: Vec<TabEntry>,
    selected: TabSlot,
    next_id: u64,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            selected: TabSlot::AddTab,
            next_id: 1,
        }
    }

    /// Insert before the "add tab" marker and select the new tab
    pub fn create_tab(&mut self, title: impl Into<String>, session: DocumentSession) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        self.entries.push(TabEntry {
            id,
            title: title.into(),
            session,
        });
        self.selected = TabSlot::Document(id);
        id
    }

    /// Tab bound to `path`, if any (paths are compared as resolved by the caller)
    pub fn find_by_file_path(&self, path: &Path) -> Option<TabId> {
        self.entries
            .iter()
            .find(|entry| entry.session.file_path() == Some(path))
            .map(|entry| entry.id)
    }

    pub fn find_by_surface(&self, surface: SurfaceId) -> Option<TabId> {
        self.entries
            .iter()
            .find(|entry| entry.session.bridge().id() == surface)
            .map(|entry| entry.id)
    }

    /// Remove a tab. When it was selected, its left neighbour is selected
    /// (or the right one, or the marker once nothing is left).
    pub fn remove(&mut self, id: TabId) -> Option<TabEntry> {
        let index = self.position(id)?;
        let entry = self.entries.remove(index);

        if self.selected == TabSlot::Document(id) {
            let neighbour = if index > 0 {
                self.entries.get(index - 1)
            } else {
                self.entries.first()
            };
            self.selected = neighbour
                .map(|e| TabSlot::Document(e.id))
                .unwrap_or(TabSlot::AddTab);
        }
        Some(entry)
    }

    /// Session of a slot; `None` for the marker or unknown handles
    pub fn session_for(&self, slot: TabSlot) -> Option<&DocumentSession> {
        match slot {
            TabSlot::Document(id) => self.entry(id).map(|e| &e.session),
            TabSlot::AddTab => None,
        }
    }

    pub fn session_for_mut(&mut self, slot: TabSlot) -> Option<&mut DocumentSession> {
        match slot {
            TabSlot::Document(id) => self.entry_mut(id).map(|e| &mut e.session),
            TabSlot::AddTab => None,
        }
    }

    pub fn entry(&self, id: TabId) -> Option<&TabEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_mut(&mut self, id: TabId) -> Option<&mut TabEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: TabId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Select a slot; unknown tabs are rejected
    pub fn select(&mut self, slot: TabSlot) -> bool {
        match slot {
            TabSlot::Document(id) if !self.contains(id) => false,
            _ => {
                self.selected = slot;
                true
            }
        }
    }

    pub fn selected(&self) -> TabSlot {
        self.selected
    }

    /// Selected document tab; `None` when the marker is selected
    pub fn selected_tab(&self) -> Option<TabId> {
        match self.selected {
            TabSlot::Document(id) => Some(id),
            TabSlot::AddTab => None,
        }
    }

    /// Document tab `offset` steps away from the selection, wrapping and
    /// skipping the marker
    pub fn cycle(&self, offset: isize) -> Option<TabId> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as isize;
        let current = self.selected_tab().and_then(|id| self.position(id));
        let index = match current {
            Some(pos) => (pos as isize + offset).rem_euclid(len),
            // The marker sits after the last tab
            None if offset > 0 => (offset - 1).rem_euclid(len),
            None => (len + offset).rem_euclid(len),
        } as usize;
        Some(self.entries[index].id)
    }

    /// Slots in visual order; the marker is always present and last
    pub fn visual_order(&self) -> Vec<TabSlot> {
        self.entries
            .iter()
            .map(|e| TabSlot::Document(e.id))
            .chain(std::iter::once(TabSlot::AddTab))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabEntry> {
        self.entries.iter()
    }
}
