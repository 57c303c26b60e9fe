//! Error taxonomy for simulation state operations.
//!
//! Two outcomes are deliberately *not* errors: an exhausted charger/stall pool is reported as
//! `None` by the checkout operations, and a transition whose target vanished (a request picked
//! up by another vehicle or cancelled) is reported as `Ok(None)` by `enter`.

use crate::ids::{BaseId, ChargerId, MechatronicsId, RequestId, StationId, VehicleId};
use crate::model::ResourcePoolError;
use crate::vehicle_state::VehicleStateType;

pub type StateResult<T> = Result<T, SimulationStateError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationStateError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),
    #[error("request {0} not found")]
    RequestNotFound(RequestId),
    #[error("station {0} not found")]
    StationNotFound(StationId),
    #[error("base {0} not found")]
    BaseNotFound(BaseId),
    #[error("mechatronics {0} not registered in the environment")]
    MechatronicsNotFound(MechatronicsId),
    #[error("charger {0} not registered in the environment")]
    ChargerNotFound(ChargerId),
    #[error("{entity} does not grant access to vehicle {vehicle_id}")]
    AccessDenied { vehicle_id: VehicleId, entity: String },
    #[error("vehicle {vehicle_id} cannot transition from {from} to {to}")]
    InvalidTransition {
        vehicle_id: VehicleId,
        from: VehicleStateType,
        to: VehicleStateType,
    },
    #[error("geometric mismatch: {0}")]
    GeometricMismatch(String),
    #[error("invalid trip plan for vehicle {vehicle_id}: {reason}")]
    InvalidTripPlan { vehicle_id: VehicleId, reason: String },
    #[error("charger {charger_id} cannot be used by vehicle {vehicle_id}")]
    InvalidCharger {
        vehicle_id: VehicleId,
        charger_id: ChargerId,
    },
    #[error(
        "vehicle {vehicle_id} could not enter {state}: resource unavailable or target vanished"
    )]
    TerminalStateNotEntered {
        vehicle_id: VehicleId,
        state: VehicleStateType,
    },
    #[error(transparent)]
    ResourcePool(#[from] ResourcePoolError),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<SimulationStateError>,
    },
}

impl SimulationStateError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SimulationStateError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &SimulationStateError {
        match self {
            SimulationStateError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attach context to a failed state operation.
pub trait ResultExt<T> {
    fn context<F, S>(self, f: F) -> StateResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for StateResult<T> {
    fn context<F, S>(self, f: F) -> StateResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|err| err.with_context(f()))
    }
}
