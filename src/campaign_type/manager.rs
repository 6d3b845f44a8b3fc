use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::database::{Database, Session};
use crate::error::Error;
use crate::field_layout::{FieldLayout, FieldLayoutId};
use crate::hooks::{CampaignTypeEvent, HookBus};
use crate::job::{EntityKind, JobCriteria, ReprocessJob, ReprocessQueue};
use crate::violations::Violation;

use super::{CampaignType, CampaignTypeId, CampaignTypeRecord};

pub struct CampaignTypeManager {
    db: Arc<dyn Database>,
    hooks: HookBus,
    queue: Arc<dyn ReprocessQueue>,
}

impl CampaignTypeManager {
    pub fn new(
        db: Arc<dyn Database>,
        hooks: HookBus,
        queue: Arc<dyn ReprocessQueue>,
    ) -> CampaignTypeManager {
        CampaignTypeManager { db, hooks, queue }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all_campaign_types(&self) -> Result<Vec<CampaignType>, Error> {
        let records = self.db.campaign_types().fetch_campaign_types().await?;

        Ok(records.into_iter().map(CampaignType::from_record).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_type_by_id(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<Option<CampaignType>, Error> {
        let record = self
            .db
            .campaign_types()
            .fetch_campaign_type_by_id(campaign_type_id)
            .await?;

        Ok(record.map(CampaignType::from_record))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_type_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CampaignType>, Error> {
        let record = self
            .db
            .campaign_types()
            .fetch_campaign_type_by_handle(handle)
            .await?;

        Ok(record.map(CampaignType::from_record))
    }

    #[tracing::instrument(skip(self, campaign_type), fields(handle = %campaign_type.handle))]
    pub async fn get_field_layout(
        &self,
        campaign_type: &CampaignType,
    ) -> Result<Option<FieldLayout>, Error> {
        match campaign_type.field_layout_id {
            Some(field_layout_id) => {
                self.db
                    .field_layouts()
                    .fetch_field_layout_by_id(field_layout_id)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Returns `Ok(false)` when validation fails, leaving the violations on
    /// `campaign_type.errors`.
    #[tracing::instrument(skip(self, campaign_type), fields(handle = %campaign_type.handle))]
    pub async fn save_campaign_type(
        &self,
        campaign_type: &mut CampaignType,
        run_validation: bool,
    ) -> Result<bool, Error> {
        let is_new = campaign_type.id.is_none();

        self.hooks
            .notify(&CampaignTypeEvent::before_save(campaign_type, is_new))
            .await;

        if run_validation && !self.validate(campaign_type).await? {
            info!(
                errors = ?campaign_type.errors,
                "campaign type not saved due to validation errors"
            );
            return Ok(false);
        }

        let now = Utc::now();
        let (mut record, previous_site_id, stored_field_layout_id) = match campaign_type.id {
            Some(campaign_type_id) => {
                let mut record = self
                    .db
                    .campaign_types()
                    .fetch_campaign_type_by_id(campaign_type_id)
                    .await?
                    .ok_or(Error::CampaignTypeNotFound { campaign_type_id })?;
                let previous_site_id = record.site_id;
                let stored_field_layout_id = record.field_layout_id;
                record.assign(campaign_type, now);
                (record, Some(previous_site_id), stored_field_layout_id)
            }
            None => (CampaignTypeRecord::new(campaign_type, now), None, None),
        };

        let mut session = self.db.start_transaction().await?;
        let result = self
            .persist(
                &mut session,
                campaign_type,
                stored_field_layout_id,
                &mut record,
            )
            .await;
        let (layout, campaign_type_id) = session.finish(result).await?;

        campaign_type.id = Some(campaign_type_id);
        campaign_type.field_layout_id = layout.id;
        campaign_type.field_layout = Some(layout);

        self.hooks
            .notify(&CampaignTypeEvent::after_save(campaign_type, is_new))
            .await;

        if let Some(previous_site_id) = previous_site_id {
            let job = ReprocessJob::new(
                format!("Resaving {} campaigns", campaign_type.name),
                EntityKind::Campaign,
                JobCriteria {
                    site_id: previous_site_id,
                    campaign_type_id,
                    status: None,
                },
                campaign_type.site_id,
            );
            self.queue.enqueue(job).await;
        }

        info!(campaign_type_id = %campaign_type_id, is_new, "saved campaign type");

        Ok(true)
    }

    async fn validate(&self, campaign_type: &mut CampaignType) -> Result<bool, Error> {
        campaign_type.validate();

        if !campaign_type.handle.is_empty() {
            let existing = self
                .db
                .campaign_types()
                .fetch_campaign_type_by_handle(&campaign_type.handle)
                .await?;
            if let Some(existing) = existing {
                if existing.id != campaign_type.id {
                    campaign_type.add_error(Violation::HandleTaken {
                        handle: campaign_type.handle.clone(),
                    });
                }
            }
        }

        Ok(!campaign_type.has_errors())
    }

    // must not touch the model, it is only updated after commit
    async fn persist(
        &self,
        session: &mut Session,
        campaign_type: &CampaignType,
        stored_field_layout_id: Option<FieldLayoutId>,
        record: &mut CampaignTypeRecord,
    ) -> Result<(FieldLayout, CampaignTypeId), Error> {
        let layout = self
            .resolve_field_layout(session, campaign_type, stored_field_layout_id)
            .await?;
        let layout = self
            .db
            .field_layouts()
            .save_field_layout_with_session(session, layout)
            .await?;
        record.field_layout_id = layout.id;

        let campaign_type_id = self
            .db
            .campaign_types()
            .save_campaign_type_with_session(session, record)
            .await?;

        Ok((layout, campaign_type_id))
    }

    /// A type owns exactly one layout. Whatever layout the model carries is
    /// written over the one the stored record points at.
    async fn resolve_field_layout(
        &self,
        session: &mut Session,
        campaign_type: &CampaignType,
        stored_field_layout_id: Option<FieldLayoutId>,
    ) -> Result<FieldLayout, Error> {
        let stored = match stored_field_layout_id.or(campaign_type.field_layout_id) {
            Some(field_layout_id) => {
                self.db
                    .field_layouts()
                    .fetch_field_layout_by_id_with_session(session, field_layout_id)
                    .await?
            }
            None => None,
        };

        let mut layout = match (&campaign_type.field_layout, &stored) {
            (Some(layout), _) => layout.clone(),
            (None, Some(stored)) => stored.clone(),
            (None, None) => FieldLayout::new(),
        };

        if let Some(stored) = stored {
            layout.id = stored.id;
        }

        Ok(layout)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_campaign_type_by_id(
        &self,
        campaign_type_id: CampaignTypeId,
    ) -> Result<bool, Error> {
        match self.get_campaign_type_by_id(campaign_type_id).await? {
            Some(campaign_type) => self.delete_campaign_type(&campaign_type).await,
            None => {
                debug!(campaign_type_id = %campaign_type_id, "nothing to delete");
                Ok(false)
            }
        }
    }

    /// A record that is already gone still counts as deleted.
    #[tracing::instrument(skip(self, campaign_type), fields(handle = %campaign_type.handle))]
    pub async fn delete_campaign_type(&self, campaign_type: &CampaignType) -> Result<bool, Error> {
        let campaign_type_id = match campaign_type.id {
            Some(campaign_type_id) => campaign_type_id,
            None => return Ok(false),
        };

        self.hooks
            .notify(&CampaignTypeEvent::before_delete(campaign_type))
            .await;

        let mut session = self.db.start_transaction().await?;
        let result = self
            .remove(&mut session, campaign_type_id, campaign_type.field_layout_id)
            .await;
        let deleted_campaigns = session.finish(result).await?;

        self.hooks
            .notify(&CampaignTypeEvent::after_delete(campaign_type))
            .await;

        info!(
            campaign_type_id = %campaign_type_id,
            deleted_campaigns = deleted_campaigns as u64,
            "deleted campaign type"
        );

        Ok(true)
    }

    async fn remove(
        &self,
        session: &mut Session,
        campaign_type_id: CampaignTypeId,
        field_layout_id: Option<FieldLayoutId>,
    ) -> Result<usize, Error> {
        let record = self
            .db
            .campaign_types()
            .fetch_campaign_type_by_id_with_session(session, campaign_type_id)
            .await?;

        // the model may be stale, the stored record names the current layout
        let mut field_layout_ids: Vec<FieldLayoutId> = record
            .and_then(|record| record.field_layout_id)
            .into_iter()
            .chain(field_layout_id)
            .collect();
        field_layout_ids.dedup();
        for field_layout_id in field_layout_ids {
            self.db
                .field_layouts()
                .delete_field_layout_by_id_with_session(session, field_layout_id)
                .await?;
        }

        let campaigns = self
            .db
            .campaigns()
            .fetch_campaigns_by_campaign_type_with_session(session, campaign_type_id)
            .await?;
        for campaign in &campaigns {
            self.db
                .campaigns()
                .delete_campaign_with_session(session, campaign)
                .await?;
        }

        let deleted = self
            .db
            .campaign_types()
            .delete_campaign_type_with_session(session, campaign_type_id)
            .await?;
        if !deleted {
            debug!(campaign_type_id = %campaign_type_id, "campaign type record was already gone");
        }

        Ok(campaigns.len())
    }
}
