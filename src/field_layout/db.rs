use async_trait::async_trait;
use mongodb::bson;
use mongodb::{Collection, Database};

use crate::database::{Sequences, Session};
use crate::error::Error;

use super::{FieldLayout, FieldLayoutId};

const FIELD_LAYOUTS: &str = "field_layouts";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": FIELD_LAYOUTS,
            "indexes": [
                { "key": { "entity_kind": 1 }, "name": "by_entity_kind" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait FieldLayoutStore: Send + Sync {
    async fn fetch_field_layout_by_id(
        &self,
        field_layout_id: FieldLayoutId,
    ) -> Result<Option<FieldLayout>, Error>;

    async fn fetch_field_layout_by_id_with_session(
        &self,
        session: &mut Session,
        field_layout_id: FieldLayoutId,
    ) -> Result<Option<FieldLayout>, Error>;

    /// The returned layout always carries its id.
    async fn save_field_layout_with_session(
        &self,
        session: &mut Session,
        layout: FieldLayout,
    ) -> Result<FieldLayout, Error>;

    async fn delete_field_layout_by_id_with_session(
        &self,
        session: &mut Session,
        field_layout_id: FieldLayoutId,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct MongoFieldLayoutStore {
    collection: Collection<FieldLayout>,
    sequences: Sequences,
}

impl MongoFieldLayoutStore {
    pub fn new(db: &Database, sequences: Sequences) -> MongoFieldLayoutStore {
        MongoFieldLayoutStore {
            collection: db.collection(FIELD_LAYOUTS),
            sequences,
        }
    }
}

#[async_trait]
impl FieldLayoutStore for MongoFieldLayoutStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_field_layout_by_id(
        &self,
        field_layout_id: FieldLayoutId,
    ) -> Result<Option<FieldLayout>, Error> {
        let layout = self
            .collection
            .find_one(bson::doc! { "_id": field_layout_id }, None)
            .await?;

        Ok(layout)
    }

    #[tracing::instrument(skip(self, session))]
    async fn fetch_field_layout_by_id_with_session(
        &self,
        session: &mut Session,
        field_layout_id: FieldLayoutId,
    ) -> Result<Option<FieldLayout>, Error> {
        let layout = self
            .collection
            .find_one_with_session(
                bson::doc! { "_id": field_layout_id },
                None,
                session.as_mongo()?,
            )
            .await?;

        Ok(layout)
    }

    #[tracing::instrument(skip(self, session))]
    async fn save_field_layout_with_session(
        &self,
        session: &mut Session,
        mut layout: FieldLayout,
    ) -> Result<FieldLayout, Error> {
        let session = session.as_mongo()?;

        match layout.id {
            Some(field_layout_id) => {
                let result = self
                    .collection
                    .replace_one_with_session(
                        bson::doc! { "_id": field_layout_id },
                        &layout,
                        None,
                        session,
                    )
                    .await?;

                if result.matched_count == 0 {
                    return Err(Error::FieldLayoutNotFound { field_layout_id });
                }
            }
            None => {
                let field_layout_id = FieldLayoutId(
                    self.sequences
                        .next_value_with_session(session, FIELD_LAYOUTS)
                        .await?,
                );
                layout.id = Some(field_layout_id);

                self.collection
                    .insert_one_with_session(&layout, None, session)
                    .await?;
            }
        }

        Ok(layout)
    }

    #[tracing::instrument(skip(self, session))]
    async fn delete_field_layout_by_id_with_session(
        &self,
        session: &mut Session,
        field_layout_id: FieldLayoutId,
    ) -> Result<(), Error> {
        self.collection
            .delete_one_with_session(
                bson::doc! { "_id": field_layout_id },
                None,
                session.as_mongo()?,
            )
            .await?;

        Ok(())
    }
}
