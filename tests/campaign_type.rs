use std::sync::Arc;

use campaign_types::campaign::{Campaign, CampaignStatus};
use campaign_types::database::{Database, MongoDatabase};
use campaign_types::hooks::HookBus;
use campaign_types::job::{ReprocessJob, ReprocessQueue};
use campaign_types::{CampaignType, CampaignTypeManager, Config, SiteId};
use mongodb::Client;
use tokio::sync::Mutex;

#[derive(Default)]
struct CollectingQueue(Mutex<Vec<ReprocessJob>>);

#[async_trait::async_trait]
impl ReprocessQueue for CollectingQueue {
    async fn enqueue(&self, job: ReprocessJob) {
        self.0.lock().await.push(job);
    }
}

// needs a MongoDB replica set, see CAMPAIGN_TYPES_MONGODB_URI
#[tokio::test]
#[ignore]
async fn newsletter_lifecycle_against_mongodb() {
    let config = Config::from_env().unwrap();
    let client = Client::with_uri_str(&config.mongodb_uri).await.unwrap();
    let db = MongoDatabase::new(client.clone(), "campaign_types_integration");
    db.drop().await.unwrap();
    db.initialize().await.unwrap();

    let collections = client
        .database("campaign_types_integration")
        .list_collection_names(None)
        .await
        .unwrap();
    for name in &["campaign_types", "field_layouts", "campaigns", "jobs", "sequences"] {
        assert!(collections.iter().any(|c| c == name), "missing {}", name);
    }

    let db: Arc<dyn Database> = Arc::new(db);
    let queue = Arc::new(CollectingQueue::default());
    let manager = CampaignTypeManager::new(Arc::clone(&db), HookBus::new(), queue.clone());

    let mut newsletter = CampaignType::new("Newsletter", "newsletter", SiteId(1));
    assert!(manager.save_campaign_type(&mut newsletter, true).await.unwrap());
    let campaign_type_id = newsletter.id.unwrap();
    assert!(newsletter.field_layout_id.is_some());

    db.campaigns()
        .insert_campaign(&Campaign::new(
            campaign_type_id,
            SiteId(1),
            "Issue #1",
            CampaignStatus::Sent,
        ))
        .await
        .unwrap();

    newsletter.site_id = SiteId(2);
    assert!(manager.save_campaign_type(&mut newsletter, true).await.unwrap());
    {
        let jobs = queue.0.lock().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].criteria.site_id, SiteId(1));
        assert_eq!(jobs[0].criteria.campaign_type_id, campaign_type_id);
        assert_eq!(jobs[0].target_site_id, SiteId(2));
    }

    assert!(manager
        .delete_campaign_type_by_id(campaign_type_id)
        .await
        .unwrap());
    assert!(manager.get_all_campaign_types().await.unwrap().is_empty());
    assert!(db
        .campaigns()
        .fetch_campaigns_by_campaign_type(campaign_type_id)
        .await
        .unwrap()
        .is_empty());
}
