use std::sync::Arc;

use mongodb::Client;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use campaign_types::database::{Database, MongoDatabase};
use campaign_types::hooks::{HookBus, TracingObserver};
use campaign_types::{seed, CampaignTypeManager, Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("connecting to db: {}", config.mongodb_uri);
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let db = MongoDatabase::new(client, &config.database);

    if config.seed {
        db.drop().await?;
    }
    db.initialize().await?;

    let queue = Arc::new(db.job_queue());
    let db: Arc<dyn Database> = Arc::new(db);
    let hooks = HookBus::new().with_observer(Arc::new(TracingObserver));
    let manager = CampaignTypeManager::new(Arc::clone(&db), hooks, queue);

    if config.seed {
        seed::seed(db.as_ref(), &manager).await?;
    }

    for campaign_type in manager.get_all_campaign_types().await? {
        let campaign_type_id = campaign_type
            .id
            .ok_or_else(|| Error::ExistentialState("stored campaign type has no id".into()))?;
        let campaigns = db
            .campaigns()
            .fetch_campaigns_by_campaign_type(campaign_type_id)
            .await?;
        info!(
            "{} ({}): site {}, {} campaigns",
            campaign_type.name,
            campaign_type.handle,
            campaign_type.site_id,
            campaigns.len()
        );
    }

    Ok(())
}
