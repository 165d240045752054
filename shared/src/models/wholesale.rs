//! Wholesale Model

use serde::{Deserialize, Serialize};

/// Wholesaler entity. Wholesalers form a tree through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Wholesale {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub pic: Option<String>,
    pub city: Option<String>,
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create wholesale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholesaleCreate {
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub pic: Option<String>,
    pub city: Option<String>,
    pub parent_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// Update wholesale payload
///
/// `parent_id` uses a double option: absent keeps the parent, `null` detaches
/// the node to a root, a value re-parents it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WholesaleUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub pic: Option<String>,
    pub city: Option<String>,
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

/// Wholesaler row annotated with its depth from the root (root = 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WholesaleWithLevel {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub pic: Option<String>,
    pub city: Option<String>,
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub level: i32,
}

/// Nested tree node used by the `tree` view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholesaleNode {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub is_active: bool,
    pub level: i32,
    pub children: Vec<WholesaleNode>,
}

/// Full hierarchy information for one wholesaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholesaleHierarchy {
    pub wholesale: Wholesale,
    pub level: i32,
    pub is_root: bool,
    pub is_leaf: bool,
    pub children: Vec<Wholesale>,
    pub descendants: Vec<WholesaleWithLevel>,
    pub ancestors: Vec<Wholesale>,
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_parent_absent_vs_null() {
        let absent: WholesaleUpdate = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let null: WholesaleUpdate = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: WholesaleUpdate = serde_json::from_str(r#"{"parent_id":4}"#).unwrap();
        assert_eq!(set.parent_id, Some(Some(4)));
    }
}
