use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use crate::core::command::{Command, CommandError};
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::reservations::command::cancel_hold_cmd::{CancelHoldCommand, CancelHoldCommandRequest, CancelHoldCommandResponse};
use crate::reservations::command::enqueue_hold_cmd::{EnqueueHoldCommand, EnqueueHoldCommandRequest, EnqueueHoldCommandResponse};
use crate::reservations::command::list_queue_cmd::{ListQueueCommand, ListQueueCommandRequest, ListQueueCommandResponse};
use crate::reservations::dto::ReservationDto;

pub async fn enqueue_hold(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<EnqueueHoldCommandResponse>, ServerError> {
    let req: EnqueueHoldCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = EnqueueHoldCommand::new(state.reservations.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn cancel_hold(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<CancelHoldCommandResponse>, ServerError> {
    let req: CancelHoldCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = CancelHoldCommand::new(state.reservations.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn list_queue(
    State(state): State<AppState>,
    Path(item_id): Path<String>) -> Result<Json<ListQueueCommandResponse>, ServerError> {
    let res = ListQueueCommand::new(state.reservations.clone()).execute(ListQueueCommandRequest::new(item_id.as_str())).await?;
    Ok(Json(res))
}

pub async fn find_reservation_by_id(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>) -> Result<Json<ReservationDto>, ServerError> {
    let hold = state.reservations.find_reservation(reservation_id.as_str()).await.map_err(CommandError::from)?;
    Ok(Json(hold))
}
