use std::sync::Arc;
use crate::core::clock::ManualClock;
use crate::core::domain::Configuration;
use crate::core::library::{ItemKind, ItemStatus, MemberStanding};
use crate::gateway::memory::RecordingGateway;
use crate::items::domain::model::ItemEntity;
use crate::loans::domain::LoanService;
use crate::loans::domain::service::LoanServiceImpl;
use crate::members::directory::memory_member_directory::MemoryMemberDirectory;
use crate::reservations::domain::ReservationService;
use crate::reservations::domain::service::ReservationServiceImpl;
use crate::store::CirculationStore;
use crate::store::locker::ItemLocker;
use crate::store::memory::MemoryCirculationStore;
use crate::sweep::domain::service::ExpirationSweep;

// Circulation wires the services over in-memory collaborators that tests can inspect.
pub(crate) struct Circulation {
    pub config: Configuration,
    pub store: Arc<MemoryCirculationStore>,
    pub members: Arc<MemoryMemberDirectory>,
    pub gateway: Arc<RecordingGateway>,
    pub clock: ManualClock,
    pub locker: Arc<ItemLocker>,
}

impl Circulation {
    pub async fn new() -> Self {
        Circulation::with_config(Configuration::new("test")).await
    }

    pub async fn with_config(config: Configuration) -> Self {
        let store = Arc::new(MemoryCirculationStore::new());
        let clock = ManualClock::default();
        let locker = Arc::new(ItemLocker::new(store.clone(), Arc::new(clock.clone()), config.lock_timeout()));
        Circulation {
            config,
            store,
            members: Arc::new(MemoryMemberDirectory::new()),
            gateway: Arc::new(RecordingGateway::new()),
            clock,
            locker,
        }
    }

    pub async fn item(&self) -> String {
        let item = ItemEntity::new(self.config.branch_id.as_str(), ItemKind::Game, "Agricola");
        let _ = self.store.add_item(&item).await;
        item.item_id
    }

    pub async fn member(&self, borrower_id: &str) -> String {
        self.members.enroll(borrower_id, MemberStanding::Active).await;
        borrower_id.to_string()
    }

    pub async fn status(&self, item_id: &str) -> ItemStatus {
        self.store.get_item(item_id).await.map(|item| item.item_status).unwrap_or(ItemStatus::Available)
    }

    pub fn loans(&self) -> Arc<dyn LoanService> {
        Arc::new(LoanServiceImpl::new(&self.config, self.locker.clone(), self.members.clone(),
                                      self.gateway.clone(), Arc::new(self.clock.clone())))
    }

    pub fn reservations(&self) -> Arc<dyn ReservationService> {
        Arc::new(ReservationServiceImpl::new(&self.config, self.locker.clone(), self.members.clone(),
                                             self.gateway.clone(), Arc::new(self.clock.clone())))
    }

    pub fn sweep(&self) -> ExpirationSweep {
        ExpirationSweep::new(&self.config, self.locker.clone(), self.gateway.clone(), Arc::new(self.clock.clone()))
    }
}
