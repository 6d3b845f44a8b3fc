use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Violation {
    FieldRequired {
        field: String,
    },
    FieldTooLong {
        field: String,
        maximum_length: usize,
        current_length: usize,
    },
    HandleMalformed {
        handle: String,
    },
    HandleReserved {
        handle: String,
    },
    HandleTaken {
        handle: String,
    },
    SiteInvalid {
        site_id: i64,
    },
}
