use axum::{
    routing::{get, post},
    Router,
};
use lambda_http::{run, Error};
use circulation::core::controller::AppState;
use circulation::core::domain::Configuration;
use circulation::core::repository::RepositoryStore;
use circulation::loans::controller::{create_loan, find_loan_by_id, return_loan};
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
        .route("/loans", post(create_loan))
        .route("/loans/return", post(return_loan))
        .route("/loans/:loan_id", get(find_loan_by_id))
        .with_state(state);

    run(app).await
}
