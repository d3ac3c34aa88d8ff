use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::sweep::domain::{OverdueReport, SweepReport, SweepService};

pub struct RunSweepCommand {
    sweep_service: Arc<dyn SweepService>,
}

impl RunSweepCommand {
    pub fn new(sweep_service: Arc<dyn SweepService>) -> Self {
        Self {
            sweep_service,
        }
    }
}

// the scheduled event payload; overdue flagging runs unless switched off
#[derive(Debug, Default, Deserialize)]
pub struct RunSweepCommandRequest {
    #[serde(default)]
    skip_overdue: bool,
}

impl RunSweepCommandRequest {
    pub fn new(skip_overdue: bool) -> Self {
        Self {
            skip_overdue,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSweepCommandResponse {
    pub holds: SweepReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loans: Option<OverdueReport>,
}

#[async_trait]
impl Command<RunSweepCommandRequest, RunSweepCommandResponse> for RunSweepCommand {
    async fn execute(&self, req: RunSweepCommandRequest) -> Result<RunSweepCommandResponse, CommandError> {
        let holds = self.sweep_service.run().await.map_err(CommandError::from)?;
        let loans = if req.skip_overdue {
            None
        } else {
            Some(self.sweep_service.flag_overdue_loans().await.map_err(CommandError::from)?)
        };
        Ok(RunSweepCommandResponse { holds, loans })
    }
}
