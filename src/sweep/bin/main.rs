use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::error;
use circulation::core::command::Command;
use circulation::core::domain::Configuration;
use circulation::core::repository::RepositoryStore;
use circulation::sweep::command::run_sweep_cmd::{RunSweepCommand, RunSweepCommandRequest};
use circulation::sweep::factory::create_sweep_service;
use circulation::utils::logs::setup_tracing;

const DEV_MODE: bool = true;

// invoked by a schedule; the event payload may switch off the overdue pass
async fn handle(cmd: &RunSweepCommand, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let req: RunSweepCommandRequest = if event.payload.is_object() {
        serde_json::from_value(event.payload)?
    } else {
        RunSweepCommandRequest::default()
    };
    match cmd.execute(req).await {
        Ok(res) => Ok(serde_json::to_value(res)?),
        Err(err) => {
            error!(error = ?err, "sweep failed");
            Err(Error::from(format!("{:?}", err)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let (config, store) = if DEV_MODE {
        (Configuration::from_env("dev")?, RepositoryStore::LocalDynamoDB)
    } else {
        (Configuration::from_env("prod")?, RepositoryStore::DynamoDB)
    };
    let cmd = RunSweepCommand::new(create_sweep_service(&config, store).await?);
    let cmd = &cmd;

    run(service_fn(move |event: LambdaEvent<Value>| handle(cmd, event))).await
}
