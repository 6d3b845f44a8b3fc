use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign_type::{CampaignTypeId, SiteId};
use crate::typedid::{IdTag, TypedId};

pub mod db;

pub type CampaignId = TypedId<Campaign>;

/// A content entity owned by exactly one campaign type.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub campaign_type_id: CampaignTypeId,
    pub site_id: SiteId,
    pub title: String,
    pub status: CampaignStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl IdTag for Campaign {
    const TAG: &'static str = "CPN";
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum CampaignStatus {
    Pending,
    Enabled,
    Disabled,
    Sent,
}

impl Campaign {
    pub fn new(
        campaign_type_id: CampaignTypeId,
        site_id: SiteId,
        title: impl Into<String>,
        status: CampaignStatus,
    ) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId::new(),
            campaign_type_id,
            site_id,
            title: title.into(),
            status,
            created_at: now,
            modified_at: now,
        }
    }
}
