//! Before/after notifications around campaign type saves and deletes.
//!
//! Observers see every event but cannot stop the operation; the bus ignores
//! whatever they do.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::campaign_type::CampaignType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::BeforeSave => "beforeSaveCampaignType",
            EventKind::AfterSave => "afterSaveCampaignType",
            EventKind::BeforeDelete => "beforeDeleteCampaignType",
            EventKind::AfterDelete => "afterDeleteCampaignType",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CampaignTypeEvent<'a> {
    pub kind: EventKind,
    pub campaign_type: &'a CampaignType,
    /// Only meaningful for save events.
    pub is_new: bool,
}

impl<'a> CampaignTypeEvent<'a> {
    pub fn before_save(campaign_type: &'a CampaignType, is_new: bool) -> CampaignTypeEvent<'a> {
        CampaignTypeEvent {
            kind: EventKind::BeforeSave,
            campaign_type,
            is_new,
        }
    }

    pub fn after_save(campaign_type: &'a CampaignType, is_new: bool) -> CampaignTypeEvent<'a> {
        CampaignTypeEvent {
            kind: EventKind::AfterSave,
            campaign_type,
            is_new,
        }
    }

    pub fn before_delete(campaign_type: &'a CampaignType) -> CampaignTypeEvent<'a> {
        CampaignTypeEvent {
            kind: EventKind::BeforeDelete,
            campaign_type,
            is_new: false,
        }
    }

    pub fn after_delete(campaign_type: &'a CampaignType) -> CampaignTypeEvent<'a> {
        CampaignTypeEvent {
            kind: EventKind::AfterDelete,
            campaign_type,
            is_new: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[async_trait]
pub trait CampaignTypeObserver: Send + Sync {
    async fn notify(&self, event: &CampaignTypeEvent<'_>);
}

/// Calls observers in registration order.
#[derive(Clone, Default)]
pub struct HookBus {
    observers: Vec<Arc<dyn CampaignTypeObserver>>,
}

impl HookBus {
    pub fn new() -> HookBus {
        HookBus::default()
    }

    pub fn register(&mut self, observer: Arc<dyn CampaignTypeObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Arc<dyn CampaignTypeObserver>) -> HookBus {
        self.register(observer);
        self
    }

    pub async fn notify(&self, event: &CampaignTypeEvent<'_>) {
        debug!(
            event = event.name(),
            observers = self.observers.len(),
            "notifying observers"
        );
        for observer in &self.observers {
            observer.notify(event).await;
        }
    }
}

/// Logs every lifecycle event.
pub struct TracingObserver;

#[async_trait]
impl CampaignTypeObserver for TracingObserver {
    async fn notify(&self, event: &CampaignTypeEvent<'_>) {
        info!(
            event = event.name(),
            handle = %event.campaign_type.handle,
            is_new = event.is_new,
            "campaign type event"
        );
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::Mutex;

    use super::*;
    use crate::campaign_type::CampaignTypeId;

    #[derive(Clone, Debug, PartialEq)]
    pub struct RecordedEvent {
        pub name: &'static str,
        pub campaign_type_id: Option<CampaignTypeId>,
        pub handle: String,
        pub is_new: bool,
    }

    /// Captures events for assertions.
    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<RecordedEvent>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<RecordedEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn names(&self) -> Vec<&'static str> {
            self.events().iter().map(|event| event.name).collect()
        }
    }

    #[async_trait]
    impl CampaignTypeObserver for RecordingObserver {
        async fn notify(&self, event: &CampaignTypeEvent<'_>) {
            self.events.lock().unwrap().push(RecordedEvent {
                name: event.name(),
                campaign_type_id: event.campaign_type.id,
                handle: event.campaign_type.handle.clone(),
                is_new: event.is_new,
            });
        }
    }

    #[tokio::test]
    async fn notifies_observers_in_registration_order() {
        struct Tagging(&'static str, Arc<Mutex<Vec<&'static str>>>);

        #[async_trait]
        impl CampaignTypeObserver for Tagging {
            async fn notify(&self, _event: &CampaignTypeEvent<'_>) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        let calls = Arc::new(Mutex::new(vec![]));
        let hooks = HookBus::new()
            .with_observer(Arc::new(Tagging("first", Arc::clone(&calls))))
            .with_observer(Arc::new(Tagging("second", Arc::clone(&calls))));
        let campaign_type = CampaignType::new(
            "Newsletter",
            "newsletter",
            crate::campaign_type::SiteId(1),
        );

        hooks
            .notify(&CampaignTypeEvent::before_save(&campaign_type, true))
            .await;

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn events_carry_their_names() {
        let observer = Arc::new(RecordingObserver::default());
        let hooks = HookBus::new().with_observer(observer.clone());
        let campaign_type = CampaignType::new(
            "Newsletter",
            "newsletter",
            crate::campaign_type::SiteId(1),
        );

        hooks
            .notify(&CampaignTypeEvent::after_save(&campaign_type, false))
            .await;
        hooks
            .notify(&CampaignTypeEvent::before_delete(&campaign_type))
            .await;

        assert_eq!(
            observer.names(),
            vec!["afterSaveCampaignType", "beforeDeleteCampaignType"]
        );
        assert!(!observer.events()[0].is_new);
    }
}
