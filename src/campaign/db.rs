use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson, Collection, Database};

use crate::campaign_type::CampaignTypeId;
use crate::database::Session;
use crate::error::Error;

use super::Campaign;

const CAMPAIGNS: &str = "campaigns";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGNS,
            "indexes": [
                { "key": { "campaign_type_id": 1, "created_at": 1 }, "name": "by_campaign_type_id" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn fetch_campaigns_by_campaign_type(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaigns_by_campaign_type_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Vec<Campaign>, Error>;

    async fn delete_campaign_with_session(
        &self,
        session: &mut Session,
        campaign: &Campaign,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct MongoCampaignStore {
    collection: Collection<Campaign>,
}

impl MongoCampaignStore {
    pub fn new(db: &Database) -> MongoCampaignStore {
        MongoCampaignStore {
            collection: db.collection(CAMPAIGNS),
        }
    }
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.collection.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns_by_campaign_type(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = self
            .collection
            .find(bson::doc! { "campaign_type_id": campaign_type_id }, None)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self, session))]
    async fn fetch_campaigns_by_campaign_type_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Vec<Campaign>, Error> {
        let session = session.as_mongo()?;
        let mut cursor = self
            .collection
            .find_with_session(
                bson::doc! { "campaign_type_id": campaign_type_id },
                None,
                session,
            )
            .await?;

        let campaigns: Vec<Campaign> = cursor.stream(session).try_collect().await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self, session))]
    async fn delete_campaign_with_session(
        &self,
        session: &mut Session,
        campaign: &Campaign,
    ) -> Result<(), Error> {
        self.collection
            .delete_one_with_session(bson::doc! { "_id": campaign.id }, None, session.as_mongo()?)
            .await?;

        Ok(())
    }
}
