use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

use crate::field_layout::{FieldLayout, FieldLayoutId};
use crate::violations::Violation;

pub mod db;
pub mod manager;

pub use manager::CampaignTypeManager;

const MAX_STRING_LENGTH: usize = 255;
const RESERVED_HANDLES: &[&str] = &[
    "attributes",
    "dateCreated",
    "dateUpdated",
    "handle",
    "id",
    "name",
    "title",
    "uid",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CampaignTypeId(pub i64);

impl Display for CampaignTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<CampaignTypeId> for Bson {
    fn from(id: CampaignTypeId) -> Bson {
        Bson::Int64(id.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<SiteId> for Bson {
    fn from(id: SiteId) -> Bson {
        Bson::Int64(id.0)
    }
}

/// A campaign type as callers see it. Persisted through
/// [`CampaignTypeManager::save_campaign_type`], stored as a
/// [`CampaignTypeRecord`].
#[derive(Clone, Debug, PartialEq)]
pub struct CampaignType {
    pub id: Option<CampaignTypeId>,
    pub name: String,
    pub handle: String,
    pub site_id: SiteId,
    pub field_layout_id: Option<FieldLayoutId>,
    /// Layout to write on the next save. `None` keeps whatever layout is
    /// currently stored under `field_layout_id`.
    pub field_layout: Option<FieldLayout>,
    pub mailer: String,
    pub email_template_id: Option<String>,
    pub title_format: Option<String>,
    pub url_format: Option<String>,
    pub has_urls: bool,
    pub has_advanced_titles: bool,
    pub template: Option<String>,
    pub template_copy_paste: Option<String>,
    pub errors: Vec<Violation>,
}

impl CampaignType {
    pub fn new(name: impl Into<String>, handle: impl Into<String>, site_id: SiteId) -> CampaignType {
        CampaignType {
            id: None,
            name: name.into(),
            handle: handle.into(),
            site_id,
            field_layout_id: None,
            field_layout: None,
            mailer: "default".to_string(),
            email_template_id: None,
            title_format: None,
            url_format: None,
            has_urls: false,
            has_advanced_titles: false,
            template: None,
            template_copy_paste: None,
            errors: vec![],
        }
    }

    pub fn from_record(record: CampaignTypeRecord) -> CampaignType {
        CampaignType {
            id: record.id,
            name: record.name,
            handle: record.handle,
            site_id: record.site_id,
            field_layout_id: record.field_layout_id,
            field_layout: None,
            mailer: record.mailer,
            email_template_id: record.email_template_id,
            title_format: record.title_format,
            url_format: record.url_format,
            has_urls: record.has_urls,
            has_advanced_titles: record.has_advanced_titles,
            template: record.template,
            template_copy_paste: record.template_copy_paste,
            errors: vec![],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, violation: Violation) {
        self.errors.push(violation);
    }

    /// Runs the rules that need nothing but the model itself. Previous
    /// errors are cleared first.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();

        check_string(&mut self.errors, "name", &self.name);
        check_string(&mut self.errors, "handle", &self.handle);
        check_string(&mut self.errors, "mailer", &self.mailer);

        if !self.handle.is_empty() {
            if !is_well_formed_handle(&self.handle) {
                self.errors.push(Violation::HandleMalformed {
                    handle: self.handle.clone(),
                });
            } else if RESERVED_HANDLES
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(&self.handle))
            {
                self.errors.push(Violation::HandleReserved {
                    handle: self.handle.clone(),
                });
            }
        }

        if self.site_id.0 <= 0 {
            self.errors.push(Violation::SiteInvalid {
                site_id: self.site_id.0,
            });
        }

        if self.has_urls && is_blank(&self.url_format) {
            self.errors.push(Violation::FieldRequired {
                field: "url_format".to_string(),
            });
        }

        if self.has_advanced_titles && is_blank(&self.title_format) {
            self.errors.push(Violation::FieldRequired {
                field: "title_format".to_string(),
            });
        }

        !self.has_errors()
    }
}

fn check_string(errors: &mut Vec<Violation>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(Violation::FieldRequired {
            field: field.to_string(),
        });
    } else if value.chars().count() > MAX_STRING_LENGTH {
        errors.push(Violation::FieldTooLong {
            field: field.to_string(),
            maximum_length: MAX_STRING_LENGTH,
            current_length: value.chars().count(),
        });
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn is_well_formed_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The stored shape of a campaign type. Every field that crosses from
/// [`CampaignType`] is assigned by name in [`CampaignTypeRecord::assign`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CampaignTypeRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CampaignTypeId>,
    pub name: String,
    pub handle: String,
    pub site_id: SiteId,
    pub field_layout_id: Option<FieldLayoutId>,
    pub mailer: String,
    pub email_template_id: Option<String>,
    pub title_format: Option<String>,
    pub url_format: Option<String>,
    pub has_urls: bool,
    pub has_advanced_titles: bool,
    pub template: Option<String>,
    pub template_copy_paste: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl CampaignTypeRecord {
    /// A record for a campaign type that has never been stored. The id is
    /// left for the store to generate.
    pub fn new(campaign_type: &CampaignType, now: DateTime<Utc>) -> CampaignTypeRecord {
        let mut record = CampaignTypeRecord {
            id: None,
            name: String::new(),
            handle: String::new(),
            site_id: campaign_type.site_id,
            field_layout_id: None,
            mailer: String::new(),
            email_template_id: None,
            title_format: None,
            url_format: None,
            has_urls: false,
            has_advanced_titles: false,
            template: None,
            template_copy_paste: None,
            created_at: now,
            modified_at: now,
        };
        record.assign(campaign_type, now);
        record
    }

    /// Copies the model's attributes onto the record. The record's own id
    /// and creation time are never touched.
    pub fn assign(&mut self, campaign_type: &CampaignType, now: DateTime<Utc>) {
        self.name = campaign_type.name.clone();
        self.handle = campaign_type.handle.clone();
        self.site_id = campaign_type.site_id;
        self.field_layout_id = campaign_type.field_layout_id;
        self.mailer = campaign_type.mailer.clone();
        self.email_template_id = campaign_type.email_template_id.clone();
        self.title_format = campaign_type.title_format.clone();
        self.url_format = campaign_type.url_format.clone();
        self.has_urls = campaign_type.has_urls;
        self.has_advanced_titles = campaign_type.has_advanced_titles;
        self.template = campaign_type.template.clone();
        self.template_copy_paste = campaign_type.template_copy_paste.clone();
        self.modified_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn newsletter() -> CampaignType {
        CampaignType::new("Newsletter", "newsletter", SiteId(1))
    }

    #[test]
    fn valid_campaign_type_passes() {
        let mut campaign_type = newsletter();

        assert!(campaign_type.validate());
        assert!(campaign_type.errors.is_empty());
    }

    #[test]
    fn blank_name_and_handle_are_required() {
        let mut campaign_type = CampaignType::new("  ", "", SiteId(1));

        assert!(!campaign_type.validate());
        assert_eq!(
            campaign_type.errors,
            vec![
                Violation::FieldRequired {
                    field: "name".to_string()
                },
                Violation::FieldRequired {
                    field: "handle".to_string()
                },
            ]
        );
    }

    #[test]
    fn handle_must_be_well_formed_and_unreserved() {
        let mut campaign_type = newsletter();
        campaign_type.handle = "1st-newsletter".to_string();
        assert!(!campaign_type.validate());
        assert_eq!(
            campaign_type.errors,
            vec![Violation::HandleMalformed {
                handle: "1st-newsletter".to_string()
            }]
        );

        campaign_type.handle = "DateCreated".to_string();
        assert!(!campaign_type.validate());
        assert_eq!(
            campaign_type.errors,
            vec![Violation::HandleReserved {
                handle: "DateCreated".to_string()
            }]
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut campaign_type = newsletter();
        campaign_type.name = "x".repeat(256);

        assert!(!campaign_type.validate());
        assert_eq!(
            campaign_type.errors,
            vec![Violation::FieldTooLong {
                field: "name".to_string(),
                maximum_length: 255,
                current_length: 256,
            }]
        );
    }

    #[test]
    fn urls_require_a_url_format() {
        let mut campaign_type = newsletter();
        campaign_type.has_urls = true;
        assert!(!campaign_type.validate());

        campaign_type.url_format = Some("newsletters/{slug}".to_string());
        assert!(campaign_type.validate());
    }

    #[test]
    fn site_must_be_positive() {
        let mut campaign_type = CampaignType::new("Newsletter", "newsletter", SiteId(0));

        assert!(!campaign_type.validate());
        assert_eq!(campaign_type.errors, vec![Violation::SiteInvalid { site_id: 0 }]);
    }

    #[test]
    fn record_assignment_keeps_identity() {
        let created = Utc::now();
        let mut record = CampaignTypeRecord::new(&newsletter(), created);
        record.id = Some(CampaignTypeId(7));

        let mut campaign_type = newsletter();
        campaign_type.site_id = SiteId(2);
        campaign_type.field_layout_id = Some(FieldLayoutId(3));
        campaign_type.template = Some("_emails/newsletter".to_string());
        let modified = Utc::now();
        record.assign(&campaign_type, modified);

        assert_eq!(record.id, Some(CampaignTypeId(7)));
        assert_eq!(record.created_at, created);
        assert_eq!(record.modified_at, modified);
        assert_eq!(record.site_id, SiteId(2));
        assert_eq!(record.field_layout_id, Some(FieldLayoutId(3)));
        assert_eq!(record.template.as_deref(), Some("_emails/newsletter"));

        let round_tripped = CampaignType::from_record(record);
        assert_eq!(round_tripped.id, Some(CampaignTypeId(7)));
        assert_eq!(round_tripped.field_layout, None);
    }
}
