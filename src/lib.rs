#[macro_use]
extern crate derivative;

pub mod campaign;
pub mod campaign_type;
pub mod config;
pub mod database;
pub mod error;
pub mod field_layout;
pub mod hooks;
pub mod job;
pub mod seed;
pub mod typedid;
pub mod violations;

pub use campaign_type::{CampaignType, CampaignTypeId, CampaignTypeManager, SiteId};
pub use config::Config;
pub use error::Error;
