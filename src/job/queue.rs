use async_trait::async_trait;
use mongodb::{bson, Collection, Database};
use tracing::{debug, warn};

use crate::error::Error;

use super::ReprocessJob;

const JOBS: &str = "jobs";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": JOBS,
            "indexes": [
                { "key": { "created_at": 1 }, "name": "by_created_at" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

/// Enqueueing never fails from the caller's point of view.
#[async_trait]
pub trait ReprocessQueue: Send + Sync {
    async fn enqueue(&self, job: ReprocessJob);
}

#[derive(Debug, Clone)]
pub struct MongoJobQueue {
    collection: Collection<ReprocessJob>,
}

impl MongoJobQueue {
    pub fn new(db: &Database) -> MongoJobQueue {
        MongoJobQueue {
            collection: db.collection(JOBS),
        }
    }
}

#[async_trait]
impl ReprocessQueue for MongoJobQueue {
    #[tracing::instrument(skip(self))]
    async fn enqueue(&self, job: ReprocessJob) {
        match self.collection.insert_one(&job, None).await {
            Ok(_) => debug!(job_id = %job.id, "queued job: {}", job.description),
            Err(err) => warn!(job_id = %job.id, "failed to queue job: {}", err),
        }
    }
}
