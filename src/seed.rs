use tracing::info;

use crate::campaign::{Campaign, CampaignStatus};
use crate::campaign_type::{CampaignType, CampaignTypeManager, SiteId};
use crate::database::Database;
use crate::error::Error;
use crate::field_layout::{FieldLayout, FieldLayoutField};

/// Fills an empty database with a couple of campaign types and campaigns.
/// Returns early if the stored types already look seeded.
pub async fn seed(db: &dyn Database, manager: &CampaignTypeManager) -> Result<(), Error> {
    if manager
        .get_campaign_type_by_handle("newsletter")
        .await?
        .is_some()
    {
        info!("database already seeded");
        return Ok(());
    }

    let mut newsletter = CampaignType::new("Newsletter", "newsletter", SiteId(1));
    newsletter.has_urls = true;
    newsletter.url_format = Some("newsletters/{slug}".to_string());
    newsletter.template = Some("_emails/newsletter".to_string());
    newsletter.field_layout = Some(
        FieldLayout::new()
            .with_tab(
                "Content",
                vec![
                    field("headline", true),
                    field("body", true),
                    field("heroImage", false),
                ],
            )
            .with_tab("Footer", vec![field("unsubscribeNote", false)]),
    );

    let mut promotions = CampaignType::new("Promotions", "promotions", SiteId(1));
    promotions.has_advanced_titles = true;
    promotions.title_format = Some("{offer} ends {endDate}".to_string());
    promotions.field_layout = Some(FieldLayout::new().with_tab(
        "Offer",
        vec![field("offer", true), field("endDate", true)],
    ));

    for campaign_type in vec![&mut newsletter, &mut promotions] {
        if !manager.save_campaign_type(campaign_type, true).await? {
            return Err(Error::ExistentialState(format!(
                "seed campaign type {} is invalid: {:?}",
                campaign_type.handle, campaign_type.errors
            )));
        }
    }

    let campaigns = [
        (&newsletter, "March Issue", CampaignStatus::Sent),
        (&newsletter, "April Issue", CampaignStatus::Pending),
        (&promotions, "Spring Sale", CampaignStatus::Enabled),
        (&promotions, "Winter Clearance", CampaignStatus::Disabled),
    ];
    for (campaign_type, title, status) in campaigns.iter() {
        let campaign_type_id = campaign_type.id.ok_or_else(|| {
            Error::ExistentialState(format!("{} was saved without an id", campaign_type.handle))
        })?;
        let campaign = Campaign::new(campaign_type_id, campaign_type.site_id, *title, *status);
        db.campaigns().insert_campaign(&campaign).await?;
    }

    info!("seeded 2 campaign types and {} campaigns", campaigns.len());

    Ok(())
}

fn field(handle: &str, required: bool) -> FieldLayoutField {
    FieldLayoutField {
        handle: handle.to_string(),
        required,
    }
}
