use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::error::{Error as DatabaseError, ErrorKind, WriteFailure};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::database::{Sequences, Session};
use crate::error::Error;

use super::{CampaignTypeId, CampaignTypeRecord};

const CAMPAIGN_TYPES: &str = "campaign_types";
const DUPLICATE_KEY: i32 = 11000;

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGN_TYPES,
            "indexes": [
                { "key": { "handle": 1 }, "name": "by_handle", "unique": true },
                { "key": { "name": 1 }, "name": "by_name" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait CampaignTypeStore: Send + Sync {
    /// Ordered by name.
    async fn fetch_campaign_types(&self) -> Result<Vec<CampaignTypeRecord>, Error>;

    async fn fetch_campaign_type_by_id(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Option<CampaignTypeRecord>, Error>;

    async fn fetch_campaign_type_by_id_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Option<CampaignTypeRecord>, Error>;

    async fn fetch_campaign_type_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CampaignTypeRecord>, Error>;

    async fn save_campaign_type_with_session(
        &self,
        session: &mut Session,
        record: &CampaignTypeRecord,
    ) -> Result<CampaignTypeId, Error>;

    async fn delete_campaign_type_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<bool, Error>;
}

#[derive(Debug, Clone)]
pub struct MongoCampaignTypeStore {
    collection: Collection<CampaignTypeRecord>,
    sequences: Sequences,
}

impl MongoCampaignTypeStore {
    pub fn new(db: &Database, sequences: Sequences) -> MongoCampaignTypeStore {
        MongoCampaignTypeStore {
            collection: db.collection(CAMPAIGN_TYPES),
            sequences,
        }
    }
}

fn map_write_error(err: DatabaseError, record: &CampaignTypeRecord) -> Error {
    let duplicate = matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    );

    if duplicate {
        Error::HandleAlreadyExists {
            handle: record.handle.clone(),
        }
    } else {
        Error::FailedDatabaseCall(err)
    }
}

#[async_trait]
impl CampaignTypeStore for MongoCampaignTypeStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_types(&self) -> Result<Vec<CampaignTypeRecord>, Error> {
        let options = FindOptions::builder().sort(bson::doc! { "name": 1 }).build();

        let campaign_types: Vec<CampaignTypeRecord> = self
            .collection
            .find(bson::doc! {}, options)
            .await?
            .try_collect()
            .await?;

        Ok(campaign_types)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_type_by_id(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Option<CampaignTypeRecord>, Error> {
        let campaign_type = self
            .collection
            .find_one(bson::doc! { "_id": campaign_type_id }, None)
            .await?;

        Ok(campaign_type)
    }

    #[tracing::instrument(skip(self, session))]
    async fn fetch_campaign_type_by_id_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Option<CampaignTypeRecord>, Error> {
        let campaign_type = self
            .collection
            .find_one_with_session(
                bson::doc! { "_id": campaign_type_id },
                None,
                session.as_mongo()?,
            )
            .await?;

        Ok(campaign_type)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_type_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CampaignTypeRecord>, Error> {
        let campaign_type = self
            .collection
            .find_one(bson::doc! { "handle": handle }, None)
            .await?;

        Ok(campaign_type)
    }

    #[tracing::instrument(skip(self, session))]
    async fn save_campaign_type_with_session(
        &self,
        session: &mut Session,
        record: &CampaignTypeRecord,
    ) -> Result<CampaignTypeId, Error> {
        let session = session.as_mongo()?;

        match record.id {
            Some(campaign_type_id) => {
                let result = self
                    .collection
                    .replace_one_with_session(
                        bson::doc! { "_id": campaign_type_id },
                        record,
                        None,
                        session,
                    )
                    .await
                    .map_err(|err| map_write_error(err, record))?;

                if result.matched_count == 0 {
                    return Err(Error::CampaignTypeNotFound { campaign_type_id });
                }

                Ok(campaign_type_id)
            }
            None => {
                let campaign_type_id = CampaignTypeId(
                    self.sequences
                        .next_value_with_session(session, CAMPAIGN_TYPES)
                        .await?,
                );
                let mut record = record.clone();
                record.id = Some(campaign_type_id);

                self.collection
                    .insert_one_with_session(&record, None, session)
                    .await
                    .map_err(|err| map_write_error(err, &record))?;

                Ok(campaign_type_id)
            }
        }
    }

    #[tracing::instrument(skip(self, session))]
    async fn delete_campaign_type_with_session(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
    ) -> Result<bool, Error> {
        let result = self
            .collection
            .delete_one_with_session(
                bson::doc! { "_id": campaign_type_id },
                None,
                session.as_mongo()?,
            )
            .await?;

        Ok(result.deleted_count > 0)
    }
}
