use std::sync::Arc;
use axum::http::StatusCode;
use crate::core::clock::{Clock, SystemClock};
use crate::core::command::CommandError;
use crate::core::domain::Configuration;
use crate::core::library::{CirculationRule, LibraryResult};
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_gateway;
use crate::loans::domain::LoanService;
use crate::loans::factory::create_loan_service;
use crate::members::factory::create_member_directory;
use crate::reservations::domain::ReservationService;
use crate::reservations::factory::create_reservation_service;
use crate::store::factory::create_circulation_store;
use crate::store::locker::ItemLocker;

// AppState is shared by every request of a binary, so all handlers see the same item locks.
#[derive(Clone)]
pub struct AppState {
    pub config: Configuration,
    pub store: RepositoryStore,
    pub loans: Arc<dyn LoanService>,
    pub reservations: Arc<dyn ReservationService>,
}

impl AppState {
    pub async fn build(config: Configuration, store: RepositoryStore) -> LibraryResult<AppState> {
        let circulation = create_circulation_store(&config, store).await;
        let members = create_member_directory(store).await;
        let gateway = create_gateway(store.gateway_publisher()).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let locker = Arc::new(ItemLocker::new(circulation, clock.clone(), config.lock_timeout()));
        Ok(AppState {
            loans: create_loan_service(&config, locker.clone(), members.clone(), gateway.clone(), clock.clone()),
            reservations: create_reservation_service(&config, locker, members, gateway, clock),
            config,
            store,
        })
    }
}

pub type ServerError = (StatusCode, String);

pub fn json_to_server_error(err: serde_json::Error) -> ServerError {
    (StatusCode::BAD_REQUEST, format!("{}", err))
}

impl From<CommandError> for ServerError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Busy { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("{:?}", err))
            }
            CommandError::Conflict { rule: CirculationRule::BorrowerNotEligible, .. } => {
                (StatusCode::FORBIDDEN, format!("{:?}", err))
            }
            CommandError::Conflict { .. } => {
                (StatusCode::CONFLICT, format!("{:?}", err))
            }
            CommandError::Database { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:?}", err))
            }
            CommandError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, format!("{:?}", err))
            }
            CommandError::Runtime { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:?}", err))
            }
            CommandError::Serialization { .. } => {
                (StatusCode::BAD_REQUEST, format!("{:?}", err))
            }
            CommandError::Validation { .. } => {
                (StatusCode::BAD_REQUEST, format!("{:?}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use crate::core::command::CommandError;
    use crate::core::controller::ServerError;
    use crate::core::library::CirculationRule;

    #[tokio::test]
    async fn test_should_map_status_codes() {
        let (status, _) = ServerError::from(CommandError::Conflict {
            rule: CirculationRule::BorrowerNotEligible, message: "suspended".to_string() });
        assert_eq!(StatusCode::FORBIDDEN, status);
        let (status, _) = ServerError::from(CommandError::Conflict {
            rule: CirculationRule::ItemNotAvailable, message: "on loan".to_string() });
        assert_eq!(StatusCode::CONFLICT, status);
        let (status, _) = ServerError::from(CommandError::Busy { message: "locked".to_string(), reason_code: None });
        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, status);
    }
}
