//! Budget category entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, EntryType, OwnerId, SyncEntity};

/// Named bucket transactions refer to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: EntityId,
    owner_id: OwnerId,
    name: String,
    color: String,
    icon: String,
    #[serde(rename = "type")]
    entry_type: EntryType,
}

impl Category {
    /// Display name, also the soft reference used by transactions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display colour, e.g. `#ff8800`.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Icon identifier.
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Income or expense.
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// The caller-editable fields of this category.
    pub fn to_draft(&self) -> NewCategory {
        NewCategory {
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            entry_type: self.entry_type,
        }
    }
}

/// Fields supplied by the caller when adding a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// Display name.
    pub name: String,
    /// Display colour.
    pub color: String,
    /// Icon identifier.
    pub icon: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// Partial update of a category; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    /// Replacement name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Replacement icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Replacement type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
}

impl SyncEntity for Category {
    type Draft = NewCategory;
    type Patch = CategoryPatch;

    const COLLECTION: &'static str = "categories";
    const NOUN: &'static str = "category";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn from_draft(
        id: EntityId,
        owner_id: OwnerId,
        draft: &NewCategory,
        _created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name: draft.name.clone(),
            color: draft.color.clone(),
            icon: draft.icon.clone(),
            entry_type: draft.entry_type,
        }
    }

    fn apply_patch(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(icon) = &patch.icon {
            self.icon.clone_from(icon);
        }
        if let Some(entry_type) = patch.entry_type {
            self.entry_type = entry_type;
        }
    }
}
