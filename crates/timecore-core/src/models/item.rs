//! Line item model
//!
//! Items are the article/description/amount rows attached to a time report.
//! The server-confirmed list is the baseline; the list being edited is made of
//! [`WorkingItem`]s, which remember the baseline id they originated from.

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned line item identifier
pub type ItemId = i64;

/// Article (catalog entry) identifier
pub type ArticleId = i64;

/// Smallest amount an item may carry after normalization
pub const MIN_AMOUNT: f64 = 1.0;

/// A line item as last confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable id; `None` only for items the server has not seen yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    /// Optional article reference
    #[serde(default)]
    pub article_id: Option<ArticleId>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Quantity
    #[serde(default = "default_amount", deserialize_with = "deserialize_amount")]
    pub amount: f64,
    /// Unit price, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

impl Item {
    /// Comparable fields of this item, normalized.
    #[must_use]
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            article_id: self.article_id,
            amount: self.amount,
            description: self.description.clone(),
        }
        .normalized()
    }
}

/// An item in the user's in-progress edit of a report's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingItem {
    /// Baseline id this row was created from, if any
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_id: Option<ItemId>,
    #[serde(default)]
    pub article_id: Option<ArticleId>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_amount", deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

impl WorkingItem {
    /// Start editing an existing baseline item.
    #[must_use]
    pub fn from_baseline(item: &Item) -> Self {
        Self {
            origin_id: item.id,
            article_id: item.article_id,
            description: item.description.clone(),
            amount: item.amount,
        }
    }

    /// A brand new row without baseline identity.
    #[must_use]
    pub fn new(article_id: Option<ArticleId>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            origin_id: None,
            article_id,
            description: description.into(),
            amount,
        }
    }

    #[must_use]
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            article_id: self.article_id,
            amount: self.amount,
            description: self.description.clone(),
        }
        .normalized()
    }

    /// Returns this item with its fields normalized in place.
    #[must_use]
    pub fn normalized(self) -> Self {
        let fields = self.fields();
        Self {
            origin_id: self.origin_id,
            article_id: fields.article_id,
            description: fields.description,
            amount: fields.amount,
        }
    }
}

/// The mutable field set compared by the delta engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub article_id: Option<ArticleId>,
    pub amount: f64,
    pub description: String,
}

impl ItemFields {
    /// Apply the normalization rules so representational differences never
    /// count as edits: amount clamped to at least 1, description trimmed,
    /// non-positive article ids treated as absent.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            article_id: normalize_article_id(self.article_id),
            amount: normalize_amount(self.amount),
            description: self.description.trim().to_string(),
        }
    }

    /// Whether a row carries enough content to be persisted.
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.article_id.is_some() || !self.description.is_empty()
    }
}

/// Clamp an amount to [`MIN_AMOUNT`]; non-finite values collapse to it.
#[must_use]
pub fn normalize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount >= MIN_AMOUNT {
        amount
    } else {
        MIN_AMOUNT
    }
}

#[must_use]
pub const fn normalize_article_id(article_id: Option<ArticleId>) -> Option<ArticleId> {
    match article_id {
        Some(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// Wire shape of a new-or-changed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub article_id: Option<ArticleId>,
    pub amount: f64,
    pub description: String,
}

impl UpsertItem {
    #[must_use]
    pub fn from_fields(id: Option<ItemId>, fields: ItemFields) -> Self {
        Self {
            id,
            article_id: fields.article_id,
            amount: fields.amount,
            description: fields.description,
        }
    }
}

/// Upsert/delete instruction set turning a baseline into a working set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsDelta {
    #[serde(default)]
    pub upsert: Vec<UpsertItem>,
    #[serde(default)]
    pub delete: Vec<ItemId>,
}

impl ItemsDelta {
    /// An empty delta needs no network call.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.upsert.is_empty() && self.delete.is_empty()
    }
}

const fn default_amount() -> f64 {
    MIN_AMOUNT
}

/// UI layers hand amounts over as numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountInput {
    Number(f64),
    Text(String),
    Missing(()),
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match AmountInput::deserialize(deserializer)? {
        AmountInput::Number(value) => value,
        AmountInput::Text(text) => text.trim().parse::<f64>().unwrap_or(MIN_AMOUNT),
        AmountInput::Missing(()) => MIN_AMOUNT,
    };
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn amount_is_clamped_to_minimum() {
        assert_eq!(normalize_amount(0.0), 1.0);
        assert_eq!(normalize_amount(-4.0), 1.0);
        assert_eq!(normalize_amount(f64::NAN), 1.0);
        assert_eq!(normalize_amount(2.5), 2.5);
    }

    #[test]
    fn non_positive_article_ids_are_absent() {
        assert_eq!(normalize_article_id(Some(0)), None);
        assert_eq!(normalize_article_id(Some(-3)), None);
        assert_eq!(normalize_article_id(Some(12)), Some(12));
    }

    #[test]
    fn fields_trim_description() {
        let item = WorkingItem::new(None, "  Cable  ", 0.0);
        assert_eq!(
            item.fields(),
            ItemFields {
                article_id: None,
                amount: 1.0,
                description: "Cable".to_string(),
            }
        );
    }

    #[test]
    fn incomplete_rows_are_not_persistable() {
        assert!(!WorkingItem::new(None, "   ", 3.0).fields().is_persistable());
        assert!(WorkingItem::new(Some(4), "", 3.0).fields().is_persistable());
        assert!(WorkingItem::new(None, "Fee", 3.0).fields().is_persistable());
    }

    #[test]
    fn working_item_accepts_string_amounts_and_origin_tag() {
        let item: WorkingItem =
            serde_json::from_str(r#"{"_id": 3, "articleId": null, "amount": "4", "description": "Cable"}"#)
                .unwrap();
        assert_eq!(item.origin_id, Some(3));
        assert_eq!(item.amount, 4.0);
        assert_eq!(item.article_id, None);

        let garbage: WorkingItem =
            serde_json::from_str(r#"{"amount": "lots", "description": "Fee"}"#).unwrap();
        assert_eq!(garbage.amount, 1.0);
    }

    #[test]
    fn upsert_item_serializes_null_article_and_omits_missing_id() {
        let upsert = UpsertItem {
            id: None,
            article_id: None,
            amount: 1.0,
            description: "Custom fee".to_string(),
        };
        let value = serde_json::to_value(&upsert).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("articleId").unwrap().is_null());
        assert_eq!(value["description"], "Custom fee");
    }
}
