use std::sync::Arc;
use crate::core::clock::{Clock, SystemClock};
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_gateway;
use crate::store::factory::create_circulation_store;
use crate::store::locker::ItemLocker;
use crate::sweep::domain::SweepService;
use crate::sweep::domain::service::ExpirationSweep;

pub async fn create_sweep_service(config: &Configuration, store: RepositoryStore) -> LibraryResult<Arc<dyn SweepService>> {
    let circulation = create_circulation_store(config, store).await;
    let gateway = create_gateway(store.gateway_publisher()).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let locker = Arc::new(ItemLocker::new(circulation, clock.clone(), config.lock_timeout()));
    Ok(Arc::new(ExpirationSweep::new(config, locker, gateway, clock)))
}
