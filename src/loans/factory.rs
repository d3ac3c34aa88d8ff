use std::sync::Arc;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::gateway::events::NotificationGateway;
use crate::loans::domain::LoanService;
use crate::loans::domain::service::LoanServiceImpl;
use crate::members::domain::MemberDirectory;
use crate::store::locker::ItemLocker;

pub fn create_loan_service(config: &Configuration, locker: Arc<ItemLocker>, members: Arc<dyn MemberDirectory>,
                           gateway: Arc<dyn NotificationGateway>, clock: Arc<dyn Clock>) -> Arc<dyn LoanService> {
    Arc::new(LoanServiceImpl::new(config, locker, members, gateway, clock))
}
