use std::sync::Arc;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::gateway::events::NotificationGateway;
use crate::members::domain::MemberDirectory;
use crate::reservations::domain::ReservationService;
use crate::reservations::domain::service::ReservationServiceImpl;
use crate::store::locker::ItemLocker;

pub fn create_reservation_service(config: &Configuration, locker: Arc<ItemLocker>, members: Arc<dyn MemberDirectory>,
                                  gateway: Arc<dyn NotificationGateway>, clock: Arc<dyn Clock>) -> Arc<dyn ReservationService> {
    Arc::new(ReservationServiceImpl::new(config, locker, members, gateway, clock))
}
