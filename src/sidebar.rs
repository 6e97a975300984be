//! Sidebar state controller.
//!
//! Owns the ingested [`SourceRecord`] collection and the selected-index set,
//! bridging ingestion output and registry calls into one piece of view
//! state. Selection changes are reported back to the caller as returned
//! [`SelectionChange`] values carrying the resolved descriptors — there is
//! no callback into a parent component.
//!
//! State is mutated only by the single task driving the controller; all
//! backend persistence failures leave local state in place and surface as
//! warnings (the backend may therefore briefly disagree with the client
//! about the active selection).

use anyhow::Result;

use crate::models::{IndexDescriptor, SourceRecord};
use crate::registry::Registry;

/// The resolved descriptor set after a selection change.
#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub selected: Vec<IndexDescriptor>,
}

#[derive(Default)]
pub struct Sidebar {
    records: Vec<SourceRecord>,
    indexes: Vec<IndexDescriptor>,
    selection: Vec<String>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload index metadata from the registry.
    ///
    /// On success the descriptor list is replaced wholesale. If nothing is
    /// selected yet and the backend lists at least one index, a default is
    /// chosen — the backend-reported current index when it names a listed
    /// descriptor, the first listed index otherwise — and persisted.
    ///
    /// On fetch failure the previous index list and selection are left
    /// untouched; the error is logged and returned.
    pub async fn reload_indexes(&mut self, registry: &Registry) -> Result<Option<SelectionChange>> {
        let list = match registry.list_indexes().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "index reload failed, keeping previous state");
                return Err(e);
            }
        };

        self.indexes = list.indexes;
        tracing::debug!(count = self.indexes.len(), "index list loaded");

        if !self.selection.is_empty() || self.indexes.is_empty() {
            return Ok(None);
        }

        let default = if self.indexes.iter().any(|i| i.name == list.current_index) {
            list.current_index
        } else {
            self.indexes[0].name.clone()
        };
        self.selection = vec![default];

        if let Err(e) = registry.select_multiple(&self.selection).await {
            tracing::warn!(error = %e, "default selection not persisted");
        }

        Ok(Some(SelectionChange {
            selected: self.selected_descriptors(),
        }))
    }

    /// Toggle one index in or out of the selection.
    ///
    /// Removing the last remaining selection is a no-op (`None`). Every
    /// effective toggle is pushed to the backend via `select-multiple`; a
    /// persist failure keeps the local change and is only logged.
    pub async fn toggle_index(
        &mut self,
        name: &str,
        registry: &Registry,
    ) -> Option<SelectionChange> {
        if let Some(pos) = self.selection.iter().position(|n| n == name) {
            if self.selection.len() == 1 {
                return None;
            }
            self.selection.remove(pos);
        } else {
            self.selection.push(name.to_string());
        }

        if let Err(e) = registry.select_multiple(&self.selection).await {
            tracing::warn!(error = %e, "selection not persisted");
        }

        Some(SelectionChange {
            selected: self.selected_descriptors(),
        })
    }

    /// Append a finished ingestion batch, preserving its order.
    pub fn attach(&mut self, batch: Vec<SourceRecord>) {
        self.records.extend(batch);
    }

    /// Remove one record by id. Local-only; the backend is not notified.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Descriptors from the last reload matching the current selection.
    pub fn selected_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .filter(|i| self.selection.iter().any(|n| n == &i.name))
            .cloned()
            .collect()
    }
}
