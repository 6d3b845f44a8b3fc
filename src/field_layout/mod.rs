use std::fmt::{self, Display};

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

pub mod db;

pub const CAMPAIGN_ENTITY_KIND: &str = "campaign";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FieldLayoutId(pub i64);

impl Display for FieldLayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<FieldLayoutId> for Bson {
    fn from(id: FieldLayoutId) -> Bson {
        Bson::Int64(id.0)
    }
}

/// The custom-field structure attached to every campaign of a type.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldLayout {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldLayoutId>,
    pub entity_kind: String,
    pub tabs: Vec<FieldLayoutTab>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldLayoutTab {
    pub name: String,
    pub fields: Vec<FieldLayoutField>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldLayoutField {
    pub handle: String,
    pub required: bool,
}

impl FieldLayout {
    pub fn new() -> FieldLayout {
        FieldLayout {
            id: None,
            entity_kind: CAMPAIGN_ENTITY_KIND.to_string(),
            tabs: vec![],
        }
    }

    pub fn with_tab(mut self, name: impl Into<String>, fields: Vec<FieldLayoutField>) -> FieldLayout {
        self.tabs.push(FieldLayoutTab {
            name: name.into(),
            fields,
        });
        self
    }

    pub fn field_handles(&self) -> impl Iterator<Item = &str> {
        self.tabs
            .iter()
            .flat_map(|tab| tab.fields.iter())
            .map(|field| field.handle.as_str())
    }
}

impl Default for FieldLayout {
    fn default() -> FieldLayout {
        FieldLayout::new()
    }
}
