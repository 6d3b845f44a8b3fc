use async_trait::async_trait;
use mongodb::bson::{self, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Client, ClientSession, Collection};
use tracing::warn;

use crate::campaign::db::{CampaignStore, MongoCampaignStore};
use crate::campaign_type::db::{CampaignTypeStore, MongoCampaignTypeStore};
use crate::error::Error;
use crate::field_layout::db::{FieldLayoutStore, MongoFieldLayoutStore};
use crate::job::queue::MongoJobQueue;


const SEQUENCES: &str = "sequences";

// transactions cannot create collections before mongodb 4.4
async fn initialize_sequences(db: &mongodb::Database) -> Result<(), Error> {
    let existing = db
        .list_collection_names(bson::doc! { "name": SEQUENCES })
        .await?;
    if existing.is_empty() {
        db.create_collection(SEQUENCES, None).await?;
    }

    Ok(())
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Opens a session with a transaction already started on it.
    async fn start_transaction(&self) -> Result<Session, Error>;

    fn campaign_types(&self) -> &dyn CampaignTypeStore;

    fn field_layouts(&self) -> &dyn FieldLayoutStore;

    fn campaigns(&self) -> &dyn CampaignStore;

    async fn drop(&self) -> Result<(), Error>;
}

/// An open transaction.
pub struct Session(SessionKind);

enum SessionKind {
    Mongo(ClientSession),
    #[cfg(test)]
    Mock(test::MockSession),
}

impl Session {
    pub fn mongo(session: ClientSession) -> Session {
        Session(SessionKind::Mongo(session))
    }

    #[cfg(test)]
    pub fn mock(session: test::MockSession) -> Session {
        Session(SessionKind::Mock(session))
    }

    pub fn as_mongo(&mut self) -> Result<&mut ClientSession, Error> {
        match &mut self.0 {
            SessionKind::Mongo(session) => Ok(session),
            #[cfg(test)]
            _ => Err(Error::ExistentialState(
                "session was not opened by mongodb".to_string(),
            )),
        }
    }

    #[cfg(test)]
    pub fn as_mock(&mut self) -> Result<&mut test::MockSession, Error> {
        match &mut self.0 {
            SessionKind::Mock(session) => Ok(session),
            _ => Err(Error::ExistentialState(
                "session was not opened by the mock database".to_string(),
            )),
        }
    }

    pub async fn commit(self) -> Result<(), Error> {
        match self.0 {
            SessionKind::Mongo(mut session) => session.commit_transaction().await?,
            #[cfg(test)]
            SessionKind::Mock(session) => session.commit(),
        }

        Ok(())
    }

    pub async fn abort(self) -> Result<(), Error> {
        match self.0 {
            SessionKind::Mongo(mut session) => session.abort_transaction().await?,
            #[cfg(test)]
            SessionKind::Mock(session) => session.abort(),
        }

        Ok(())
    }

    /// Commits when `result` is `Ok`, aborts otherwise. An abort failure is
    /// logged and the original error is returned unchanged.
    pub async fn finish<T>(self, result: Result<T, Error>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = self.abort().await {
                    warn!("failed to abort transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }
}

/// Hands out monotonically increasing integer ids per collection.
#[derive(Debug, Clone)]
pub struct Sequences(Collection<Document>);

impl Sequences {
    #[tracing::instrument(skip(self, session))]
    pub async fn next_value_with_session(
        &self,
        session: &mut ClientSession,
        name: &str,
    ) -> Result<i64, Error> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let sequence = self
            .0
            .find_one_and_update_with_session(
                bson::doc! { "_id": name },
                bson::doc! { "$inc": { "value": 1i64 } },
                options,
                session,
            )
            .await?
            .ok_or_else(|| Error::ExistentialState(format!("sequence {} was not upserted", name)))?;

        Ok(sequence.get_i64("value")?)
    }
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaign_types: MongoCampaignTypeStore,
    field_layouts: MongoFieldLayoutStore,
    campaigns: MongoCampaignStore,
    client: Client,
    db: mongodb::Database,
}

impl MongoDatabase {
    pub fn new(client: Client, name: &str) -> MongoDatabase {
        let db = client.database(name);
        let sequences = Sequences(db.collection(SEQUENCES));
        MongoDatabase {
            campaign_types: MongoCampaignTypeStore::new(&db, sequences.clone()),
            field_layouts: MongoFieldLayoutStore::new(&db, sequences),
            campaigns: MongoCampaignStore::new(&db),
            client,
            db,
        }
    }

    /// Creates every collection up front along with its indexes.
    pub async fn initialize(&self) -> Result<(), Error> {
        initialize_sequences(&self.db).await?;
        crate::campaign_type::db::initialize(&self.db).await?;
        crate::field_layout::db::initialize(&self.db).await?;
        crate::campaign::db::initialize(&self.db).await?;
        crate::job::queue::initialize(&self.db).await?;

        Ok(())
    }

    pub fn job_queue(&self) -> MongoJobQueue {
        MongoJobQueue::new(&self.db)
    }
}

#[async_trait]
impl Database for MongoDatabase {
    async fn start_transaction(&self) -> Result<Session, Error> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        Ok(Session::mongo(session))
    }

    fn campaign_types(&self) -> &dyn CampaignTypeStore {
        &self.campaign_types
    }

    fn field_layouts(&self) -> &dyn FieldLayoutStore {
        &self.field_layouts
    }

    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    async fn drop(&self) -> Result<(), Error> {
        self.db.drop(None).await?;
        Ok(())
    }
}
