//! Budget transaction entity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, EntityId, EntryType, OwnerId, SyncEntity};

/// One income or expense entry.
///
/// `category` is a soft reference to a category by name; nothing enforces
/// that a category with that name exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: EntityId,
    owner_id: OwnerId,
    amount: Amount,
    category: String,
    #[serde(rename = "type")]
    entry_type: EntryType,
    description: String,
    occurred_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Assemble a transaction from already validated parts.
    pub fn from_parts(parts: TransactionParts) -> Self {
        let TransactionParts {
            id,
            owner_id,
            draft,
            created_at,
        } = parts;
        Self {
            id,
            owner_id,
            amount: draft.amount,
            category: draft.category,
            entry_type: draft.entry_type,
            description: draft.description,
            occurred_on: draft.occurred_on,
            created_at,
        }
    }

    /// Major-unit amount.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Category name.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Income or expense.
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Date the transaction happened.
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_on
    }

    /// Instant the entity was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The caller-editable fields of this transaction.
    pub fn to_draft(&self) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            category: self.category.clone(),
            entry_type: self.entry_type,
            description: self.description.clone(),
            occurred_on: self.occurred_on,
        }
    }
}

/// Identity and metadata wrapped around a [`NewTransaction`].
#[derive(Debug, Clone)]
pub struct TransactionParts {
    /// Entity identity.
    pub id: EntityId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Editable fields.
    pub draft: NewTransaction,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when adding a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Major-unit amount.
    pub amount: Amount,
    /// Category name.
    pub category: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Free-text description.
    pub description: String,
    /// Date the transaction happened.
    pub occurred_on: NaiveDate,
}

/// Partial update of a transaction; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    /// Replacement amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Replacement category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Replacement type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
    /// Replacement description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_on: Option<NaiveDate>,
}

impl SyncEntity for Transaction {
    type Draft = NewTransaction;
    type Patch = TransactionPatch;

    const COLLECTION: &'static str = "transactions";
    const NOUN: &'static str = "transaction";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn from_draft(
        id: EntityId,
        owner_id: OwnerId,
        draft: &NewTransaction,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::from_parts(TransactionParts {
            id,
            owner_id,
            draft: draft.clone(),
            created_at,
        })
    }

    fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(entry_type) = patch.entry_type {
            self.entry_type = entry_type;
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(occurred_on) = patch.occurred_on {
            self.occurred_on = occurred_on;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> NewTransaction {
        NewTransaction {
            amount: Amount::from_f64(75.5).expect("amount"),
            category: "Food".to_owned(),
            entry_type: EntryType::Expense,
            description: "Lunch".to_owned(),
            occurred_on: NaiveDate::from_ymd_opt(2025, 11, 16).expect("date"),
        }
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let owner = OwnerId::new("owner-1").expect("owner");
        let created_at = Utc.with_ymd_and_hms(2025, 11, 16, 12, 0, 0).single().expect("time");
        let mut tx = Transaction::from_draft(EntityId::canonical("tx-1"), owner, &draft(), created_at);

        tx.apply_patch(&TransactionPatch {
            description: Some("Dinner".to_owned()),
            ..TransactionPatch::default()
        });

        assert_eq!(tx.description(), "Dinner");
        assert_eq!(tx.category(), "Food");
        assert_eq!(tx.amount().to_minor_units(), Ok(7550));
        assert_eq!(tx.to_draft().description, "Dinner");
    }

    #[test]
    fn empty_patch_serialises_to_empty_object() {
        let json = serde_json::to_value(TransactionPatch::default()).expect("serialise");
        assert_eq!(json, serde_json::json!({}));
    }
}
