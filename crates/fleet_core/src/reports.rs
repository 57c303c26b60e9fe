//! Report records: the side channel through which the simulation tells the outside world what
//! happened. Records are collected per tick in a [`ReportLog`] and drained into a
//! [`ReportSink`](crate::report_export::ReportSink).

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ids::{RequestId, SimTime, VehicleId};
use crate::mechatronics::Mechatronics;
use crate::model::{Request, Vehicle};
use crate::vehicle_state::VehicleStateType;

/// One vehicle as seen at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleId,
    pub state: VehicleStateType,
    /// H3 cell as its raw `u64`.
    pub cell: u64,
    pub energy: f64,
    pub soc: f64,
    pub distance_traveled_km: f64,
    pub idle_time_secs: u64,
    pub passengers: usize,
}

impl VehicleSnapshot {
    pub fn new(vehicle: &Vehicle, mechatronics: &dyn Mechatronics) -> Self {
        Self {
            vehicle_id: vehicle.id.clone(),
            state: vehicle.vehicle_state.state_type(),
            cell: vehicle.cell.into(),
            energy: vehicle.energy,
            soc: mechatronics.fuel_source_soc(vehicle),
            distance_traveled_km: vehicle.distance_traveled_km,
            idle_time_secs: vehicle.idle_time_secs,
            passengers: vehicle.passengers().len(),
        }
    }
}

/// One waiting request as seen at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub request_id: RequestId,
    pub origin: u64,
    pub destination: u64,
    pub departure_time: SimTime,
    pub cancel_time: SimTime,
    pub passengers: usize,
    pub dispatched_vehicle: Option<VehicleId>,
}

impl From<&Request> for RequestSnapshot {
    fn from(request: &Request) -> Self {
        Self {
            request_id: request.id.clone(),
            origin: request.origin.into(),
            destination: request.destination.into(),
            departure_time: request.departure_time,
            cancel_time: request.cancel_time,
            passengers: request.passenger_count(),
            dispatched_vehicle: request.dispatched_vehicle.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report_type", rename_all = "snake_case")]
pub enum Report {
    CancelRequest {
        sim_time: SimTime,
        request_id: RequestId,
        departure_time: SimTime,
        cancel_time: SimTime,
    },
    VehicleTransition {
        sim_time: SimTime,
        vehicle_id: VehicleId,
        from: VehicleStateType,
        to: VehicleStateType,
    },
    /// A vehicle's update failed; its pre-update snapshot was kept.
    VehicleError {
        sim_time: SimTime,
        vehicle_id: VehicleId,
        state: VehicleStateType,
        message: String,
    },
    InstructionApplied {
        sim_time: SimTime,
        vehicle_id: VehicleId,
        instruction: String,
    },
    /// An instruction errored or was skipped (target vanished, resource busy, duplicate).
    InstructionFailed {
        sim_time: SimTime,
        vehicle_id: VehicleId,
        instruction: String,
        message: String,
    },
    VehicleSnapshot {
        sim_time: SimTime,
        #[serde(flatten)]
        snapshot: VehicleSnapshot,
    },
    RequestSnapshot {
        sim_time: SimTime,
        #[serde(flatten)]
        snapshot: RequestSnapshot,
    },
}

impl Report {
    pub fn sim_time(&self) -> SimTime {
        match self {
            Report::CancelRequest { sim_time, .. }
            | Report::VehicleTransition { sim_time, .. }
            | Report::VehicleError { sim_time, .. }
            | Report::InstructionApplied { sim_time, .. }
            | Report::InstructionFailed { sim_time, .. }
            | Report::VehicleSnapshot { sim_time, .. }
            | Report::RequestSnapshot { sim_time, .. } => *sim_time,
        }
    }

    pub fn report_type(&self) -> &'static str {
        match self {
            Report::CancelRequest { .. } => "cancel_request",
            Report::VehicleTransition { .. } => "vehicle_transition",
            Report::VehicleError { .. } => "vehicle_error",
            Report::InstructionApplied { .. } => "instruction_applied",
            Report::InstructionFailed { .. } => "instruction_failed",
            Report::VehicleSnapshot { .. } => "vehicle_snapshot",
            Report::RequestSnapshot { .. } => "request_snapshot",
        }
    }
}

/// Append-only report channel, drained by the caller between or after ticks.
#[derive(Debug, Default, Resource)]
pub struct ReportLog {
    records: Vec<Report>,
}

impl ReportLog {
    pub fn push(&mut self, report: Report) {
        self.records.push(report);
    }

    pub fn extend(&mut self, reports: impl IntoIterator<Item = Report>) {
        self.records.extend(reports);
    }

    pub fn records(&self) -> &[Report] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand every record collected so far to the caller, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.records)
    }

    pub fn count_of(&self, report_type: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.report_type() == report_type)
            .count()
    }
}
