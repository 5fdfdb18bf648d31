//! Project model

use serde::{Deserialize, Serialize};

/// A customer project that time can be reported against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}
