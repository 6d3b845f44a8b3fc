use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignStatus;
use crate::campaign_type::{CampaignTypeId, SiteId};
use crate::typedid::{IdTag, TypedId};

pub mod queue;

pub use queue::ReprocessQueue;

pub type JobId = TypedId<ReprocessJob>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum EntityKind {
    Campaign,
}

/// Selects the entities a job works through. A `status` of `None` matches
/// every status.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct JobCriteria {
    pub site_id: SiteId,
    pub campaign_type_id: CampaignTypeId,
    pub status: Option<CampaignStatus>,
}

/// Re-saves every entity matching `criteria` under `target_site_id`. Run
/// later by a worker, never inside the transaction that queued it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ReprocessJob {
    #[serde(rename = "_id")]
    pub id: JobId,
    pub description: String,
    pub entity_kind: EntityKind,
    pub criteria: JobCriteria,
    pub target_site_id: SiteId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl IdTag for ReprocessJob {
    const TAG: &'static str = "JOB";
}

impl ReprocessJob {
    pub fn new(
        description: impl Into<String>,
        entity_kind: EntityKind,
        criteria: JobCriteria,
        target_site_id: SiteId,
    ) -> ReprocessJob {
        ReprocessJob {
            id: JobId::new(),
            description: description.into(),
            entity_kind,
            criteria,
            target_site_id,
            created_at: Utc::now(),
        }
    }
}
