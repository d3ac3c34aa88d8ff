use axum::{
    routing::{get, post},
    Router,
};
use lambda_http::{run, Error};
use circulation::core::controller::AppState;
use circulation::core::domain::Configuration;
use circulation::core::repository::RepositoryStore;
use circulation::reservations::controller::{cancel_hold, enqueue_hold, find_reservation_by_id, list_queue};
use circulation::utils::logs::setup_tracing;

const DEV_MODE: bool = true;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let (config, store) = if DEV_MODE {
        std::env::set_var("AWS_LAMBDA_FUNCTION_NAME", "_");
        std::env::set_var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE", "4096");
        std::env::set_var("AWS_LAMBDA_FUNCTION_VERSION", "1");
        std::env::set_var("AWS_LAMBDA_RUNTIME_API", "http://[::]:9000/.rt");
        (Configuration::from_env("dev")?, RepositoryStore::LocalDynamoDB)
    } else {
        (Configuration::from_env("prod")?, RepositoryStore::DynamoDB)
    };
    let state = AppState::build(config, store).await?;

    let app = Router::new()
        .route("/reservations", post(enqueue_hold))
        .route("/reservations/cancel", post(cancel_hold))
        .route("/reservations/:reservation_id", get(find_reservation_by_id))
        .route("/items/:item_id/queue", get(list_queue))
        .with_state(state);

    run(app).await
}
