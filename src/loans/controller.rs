use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use crate::core::command::{Command, CommandError};
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::loans::command::create_loan_cmd::{CreateLoanCommand, CreateLoanCommandRequest, CreateLoanCommandResponse};
use crate::loans::command::return_loan_cmd::{ReturnLoanCommand, ReturnLoanCommandRequest, ReturnLoanCommandResponse};
use crate::loans::dto::LoanDto;

pub async fn create_loan(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<CreateLoanCommandResponse>, ServerError> {
    let req: CreateLoanCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = CreateLoanCommand::new(state.loans.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn return_loan(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<ReturnLoanCommandResponse>, ServerError> {
    let req: ReturnLoanCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = ReturnLoanCommand::new(state.loans.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn find_loan_by_id(
    State(state): State<AppState>,
    Path(loan_id): Path<String>) -> Result<Json<LoanDto>, ServerError> {
    let loan = state.loans.find_loan(loan_id.as_str()).await.map_err(CommandError::from)?;
    Ok(Json(loan))
}
