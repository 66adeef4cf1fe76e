//! Wire representations of transactions and categories.
//!
//! Amounts travel as integer minor units (`amountMinor`), dates as
//! `YYYY-MM-DD` strings, and creation instants as RFC 3339 strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, Category, CategoryPatch, EntityId, EntryType, Error, NewCategory, NewTransaction,
    OwnerId, SyncEntity, Transaction, TransactionParts, TransactionPatch,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Translation between an entity and its JSON wire form.
pub trait WireEntity: SyncEntity {
    /// Entity as returned by the API.
    type Dto: DeserializeOwned + Send + 'static;
    /// Body of a create request.
    type DraftDto: Serialize;
    /// Body of an update request.
    type PatchDto: Serialize;

    /// Decode a response entity.
    ///
    /// # Errors
    ///
    /// Malformed fields are [`crate::domain::FailureKind::Unknown`] errors.
    fn from_dto(dto: Self::Dto) -> Result<Self, Error>;

    /// Encode a create request.
    ///
    /// # Errors
    ///
    /// Values the wire cannot carry are client errors.
    fn draft_to_dto(owner: &OwnerId, draft: &Self::Draft) -> Result<Self::DraftDto, Error>;

    /// Encode an update request carrying only the changed fields.
    ///
    /// # Errors
    ///
    /// Values the wire cannot carry are client errors.
    fn patch_to_dto(patch: &Self::Patch) -> Result<Self::PatchDto, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub user_id: String,
    pub posted_at: String,
    pub amount_minor: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionDto {
    pub user_id: String,
    pub posted_at: String,
    pub amount_minor: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_minor: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategoryDto {
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
}

impl WireEntity for Transaction {
    type Dto = TransactionDto;
    type DraftDto = NewTransactionDto;
    type PatchDto = TransactionPatchDto;

    fn from_dto(dto: TransactionDto) -> Result<Self, Error> {
        let amount = Amount::from_minor_units(dto.amount_minor).map_err(|err| {
            malformed("amountMinor", &dto.amount_minor.to_string(), &err.to_string())
        })?;
        Ok(Self::from_parts(TransactionParts {
            id: entity_id(&dto.id)?,
            owner_id: owner_id(&dto.user_id)?,
            draft: NewTransaction {
                amount,
                category: dto.category,
                entry_type: dto.entry_type,
                description: dto.description,
                occurred_on: parse_date(&dto.posted_at)?,
            },
            created_at: parse_instant(&dto.created_at)?,
        }))
    }

    fn draft_to_dto(owner: &OwnerId, draft: &NewTransaction) -> Result<NewTransactionDto, Error> {
        Ok(NewTransactionDto {
            user_id: owner.to_string(),
            posted_at: format_date(draft.occurred_on),
            amount_minor: minor_units(draft.amount)?,
            entry_type: draft.entry_type,
            category: draft.category.clone(),
            description: draft.description.clone(),
        })
    }

    fn patch_to_dto(patch: &TransactionPatch) -> Result<TransactionPatchDto, Error> {
        Ok(TransactionPatchDto {
            posted_at: patch.occurred_on.map(format_date),
            amount_minor: patch.amount.map(minor_units).transpose()?,
            entry_type: patch.entry_type,
            category: patch.category.clone(),
            description: patch.description.clone(),
        })
    }
}

impl WireEntity for Category {
    type Dto = CategoryDto;
    type DraftDto = NewCategoryDto;
    type PatchDto = CategoryPatchDto;

    fn from_dto(dto: CategoryDto) -> Result<Self, Error> {
        let draft = NewCategory {
            name: dto.name,
            color: dto.color,
            icon: dto.icon,
            entry_type: dto.entry_type,
        };
        Ok(Self::from_draft(
            entity_id(&dto.id)?,
            owner_id(&dto.user_id)?,
            &draft,
            DateTime::<Utc>::default(),
        ))
    }

    fn draft_to_dto(owner: &OwnerId, draft: &NewCategory) -> Result<NewCategoryDto, Error> {
        Ok(NewCategoryDto {
            user_id: owner.to_string(),
            name: draft.name.clone(),
            color: draft.color.clone(),
            icon: draft.icon.clone(),
            entry_type: draft.entry_type,
        })
    }

    fn patch_to_dto(patch: &CategoryPatch) -> Result<CategoryPatchDto, Error> {
        Ok(CategoryPatchDto {
            name: patch.name.clone(),
            color: patch.color.clone(),
            icon: patch.icon.clone(),
            entry_type: patch.entry_type,
        })
    }
}

fn minor_units(amount: Amount) -> Result<i64, Error> {
    amount
        .to_minor_units()
        .map_err(|err| Error::client_request(422, format!("amount {amount}: {err}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| malformed("postedAt", raw, &err.to_string()))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| malformed("createdAt", raw, &err.to_string()))
}

fn entity_id(raw: &str) -> Result<EntityId, Error> {
    let id: EntityId = raw
        .parse()
        .map_err(|err: crate::domain::EmptyEntityId| malformed("id", raw, &err.to_string()))?;
    if id.is_temporary() {
        return Err(malformed("id", raw, "server returned a temporary id"));
    }
    Ok(id)
}

fn owner_id(raw: &str) -> Result<OwnerId, Error> {
    OwnerId::new(raw).map_err(|err| malformed("userId", raw, &err.to_string()))
}

fn malformed(field: &str, raw: &str, reason: &str) -> Error {
    Error::unknown(format!("response field {field} is malformed ({raw:?}): {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use serde_json::json;

    fn wire_transaction() -> serde_json::Value {
        json!({
            "id": "tx-1",
            "userId": "u1",
            "postedAt": "2025-11-16",
            "amountMinor": 5025,
            "type": "expense",
            "category": "Food",
            "description": "Lunch",
            "createdAt": "2025-11-16T09:00:00Z"
        })
    }

    #[test]
    fn decodes_minor_units_and_iso_dates() {
        let dto: TransactionDto = serde_json::from_value(wire_transaction()).expect("dto");
        let tx = Transaction::from_dto(dto).expect("valid transaction");

        assert_eq!(tx.amount().to_string(), "50.25");
        assert_eq!(
            tx.occurred_on(),
            NaiveDate::from_ymd_opt(2025, 11, 16).expect("date")
        );
        assert_eq!(tx.id(), &EntityId::canonical("tx-1"));
        assert_eq!(tx.owner_id().as_ref(), "u1");
    }

    #[test]
    fn encodes_drafts_with_minor_units() {
        let draft = NewTransaction {
            amount: Amount::from_f64(50.25).expect("amount"),
            category: "Food".to_owned(),
            entry_type: EntryType::Expense,
            description: "Lunch".to_owned(),
            occurred_on: NaiveDate::from_ymd_opt(2025, 11, 16).expect("date"),
        };
        let owner = OwnerId::new("u1").expect("owner");

        let dto = Transaction::draft_to_dto(&owner, &draft).expect("encodable");

        assert_eq!(
            serde_json::to_value(dto).expect("serialise"),
            json!({
                "userId": "u1",
                "postedAt": "2025-11-16",
                "amountMinor": 5025,
                "type": "expense",
                "category": "Food",
                "description": "Lunch"
            })
        );
    }

    #[test]
    fn patches_only_carry_changed_fields() {
        let patch = TransactionPatch {
            amount: Some(Amount::from_f64(12.3).expect("amount")),
            ..TransactionPatch::default()
        };
        let dto = Transaction::patch_to_dto(&patch).expect("encodable");
        assert_eq!(
            serde_json::to_value(dto).expect("serialise"),
            json!({"amountMinor": 1230})
        );
    }

    #[test]
    fn malformed_dates_are_unknown_failures() {
        let mut wire = wire_transaction();
        wire["postedAt"] = json!("16/11/2025");
        let dto: TransactionDto = serde_json::from_value(wire).expect("dto");

        let err = Transaction::from_dto(dto).expect_err("bad date");
        assert_eq!(err.kind(), FailureKind::Unknown);
    }

    #[test]
    fn non_positive_amounts_are_unknown_failures() {
        let mut wire = wire_transaction();
        wire["amountMinor"] = json!(0);
        let dto: TransactionDto = serde_json::from_value(wire).expect("dto");

        let err = Transaction::from_dto(dto).expect_err("zero amount");
        assert_eq!(err.kind(), FailureKind::Unknown);
    }

    #[test]
    fn sub_cent_amounts_cannot_be_sent() {
        let draft = NewTransaction {
            amount: Amount::from_f64(0.001).expect("amount"),
            category: "Food".to_owned(),
            entry_type: EntryType::Expense,
            description: String::new(),
            occurred_on: NaiveDate::from_ymd_opt(2025, 11, 16).expect("date"),
        };
        let owner = OwnerId::new("u1").expect("owner");

        let err = Transaction::draft_to_dto(&owner, &draft).expect_err("below one cent");
        assert_eq!(err.kind(), FailureKind::ClientRequest { status: 422 });
    }
}
