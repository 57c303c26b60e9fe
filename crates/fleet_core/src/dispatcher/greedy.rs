use std::collections::{BTreeMap, BTreeSet};

use h3o::CellIndex;

use super::Dispatcher;
use crate::config::Environment;
use crate::ids::{BaseId, ChargerId, StationId, VehicleId};
use crate::instruction::Instruction;
use crate::mechatronics::Mechatronics;
use crate::model::{Request, Station, Vehicle};
use crate::simulation_state::SimulationState;
use crate::spatial::distance_km_between_cells;
use crate::vehicle_state::{VehicleState, VehicleStateType};

/// Greedy reference dispatcher: nearest-vehicle matching plus simple energy and parking rules.
///
/// Each tick, in this order:
///
/// 1. Idle or repositioning vehicles below the lower SOC limit go to the nearest station with a
///    free compatible charger; out-of-service vehicles standing at such a station plug in.
/// 2. Requests whose departure time has come, oldest first, get the nearest free vehicle within
///    `max_pickup_radius` grid steps that shares membership and has the range for the trip.
/// 3. Vehicles idle for at least `idle_to_base_secs` go to the nearest base with a free stall.
/// 4. Vehicles reserved at a base with a station top up when below the upper SOC limit.
///
/// A vehicle receives at most one instruction per tick. Charger and stall counts are tracked
/// locally so one tick never oversubscribes a station or base.
#[derive(Debug, Clone)]
pub struct GreedyDispatcher {
    pub max_pickup_radius: u32,
    pub idle_to_base_secs: u64,
}

impl Default for GreedyDispatcher {
    fn default() -> Self {
        Self {
            max_pickup_radius: 20,
            idle_to_base_secs: 30 * 60,
        }
    }
}

/// Per-tick bookkeeping of what has already been promised.
#[derive(Default)]
struct Claims {
    vehicles: BTreeSet<VehicleId>,
    chargers: BTreeMap<(StationId, ChargerId), u32>,
    stalls: BTreeMap<BaseId, u32>,
}

impl Claims {
    /// Count vehicles already heading to a charger or stall, so they keep their spot.
    fn from_in_flight(sim: &SimulationState) -> Self {
        let mut claims = Self::default();
        for vehicle in sim.vehicles() {
            match &vehicle.vehicle_state {
                VehicleState::DispatchStation(state) => {
                    *claims
                        .chargers
                        .entry((state.station_id.clone(), state.charger_id.clone()))
                        .or_default() += 1;
                }
                VehicleState::DispatchBase(state) => {
                    *claims.stalls.entry(state.base_id.clone()).or_default() += 1;
                }
                _ => {}
            }
        }
        claims
    }

    fn is_free(&self, vehicle_id: &VehicleId) -> bool {
        !self.vehicles.contains(vehicle_id)
    }

    fn free_chargers(&self, station: &Station, charger_id: &ChargerId) -> u32 {
        let claimed = self
            .chargers
            .get(&(station.id.clone(), charger_id.clone()))
            .copied()
            .unwrap_or(0);
        station.available_chargers(charger_id).saturating_sub(claimed)
    }
}

fn grid_distance(a: CellIndex, b: CellIndex) -> Option<u32> {
    a.grid_distance(b).ok().and_then(|d| u32::try_from(d).ok())
}

impl GreedyDispatcher {
    pub fn with_max_pickup_radius(mut self, radius: u32) -> Self {
        self.max_pickup_radius = radius;
        self
    }

    pub fn with_idle_to_base_secs(mut self, secs: u64) -> Self {
        self.idle_to_base_secs = secs;
        self
    }

    /// The fastest compatible charger with a free slot at `station`.
    fn best_charger(
        station: &Station,
        mechatronics: &dyn Mechatronics,
        env: &Environment,
        claims: &Claims,
    ) -> Option<ChargerId> {
        station
            .chargers
            .keys()
            .filter(|charger_id| claims.free_chargers(station, charger_id) > 0)
            .filter_map(|charger_id| env.charger(charger_id).ok())
            .filter(|charger| mechatronics.valid_charger(charger))
            .max_by(|a, b| a.rate.total_cmp(&b.rate))
            .map(|charger| charger.id.clone())
    }

    fn charge_low_vehicles(
        &self,
        sim: &SimulationState,
        env: &Environment,
        claims: &mut Claims,
        out: &mut Vec<Instruction>,
    ) {
        for vehicle in sim.vehicles() {
            let Ok(mechatronics) = env.mechatronics_for(vehicle) else {
                continue;
            };
            let state_type = vehicle.vehicle_state.state_type();

            if state_type == VehicleStateType::OutOfService {
                let here = sim.at_cell(vehicle.cell);
                let target = here
                    .stations
                    .iter()
                    .filter_map(|id| sim.station(id))
                    .filter(|station| station.is_member(&vehicle.membership))
                    .find_map(|station| {
                        Self::best_charger(station, mechatronics.as_ref(), env, claims)
                            .map(|charger_id| (station.id.clone(), charger_id))
                    });
                if let Some((station_id, charger_id)) = target {
                    self.claim_charger(claims, vehicle, &station_id, &charger_id);
                    out.push(Instruction::ChargeStation {
                        vehicle_id: vehicle.id.clone(),
                        station_id,
                        charger_id,
                    });
                }
                continue;
            }

            let needs_charge = matches!(
                state_type,
                VehicleStateType::Idle | VehicleStateType::Repositioning
            ) && mechatronics.fuel_source_soc(vehicle) < env.config.soc_lower_limit;
            if !needs_charge || !claims.is_free(&vehicle.id) {
                continue;
            }

            let nearest = sim
                .stations()
                .filter(|station| station.is_member(&vehicle.membership))
                .filter_map(|station| {
                    let charger_id =
                        Self::best_charger(station, mechatronics.as_ref(), env, claims)?;
                    let distance = distance_km_between_cells(vehicle.cell, station.cell);
                    Some((distance, station.id.clone(), charger_id))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            if let Some((_, station_id, charger_id)) = nearest {
                self.claim_charger(claims, vehicle, &station_id, &charger_id);
                out.push(Instruction::DispatchStation {
                    vehicle_id: vehicle.id.clone(),
                    station_id,
                    charger_id,
                });
            }
        }
    }

    fn claim_charger(
        &self,
        claims: &mut Claims,
        vehicle: &Vehicle,
        station_id: &StationId,
        charger_id: &ChargerId,
    ) {
        claims.vehicles.insert(vehicle.id.clone());
        *claims
            .chargers
            .entry((station_id.clone(), charger_id.clone()))
            .or_default() += 1;
    }

    fn available_for_trip(
        vehicle: &Vehicle,
        mechatronics: &dyn Mechatronics,
        env: &Environment,
    ) -> bool {
        matches!(
            vehicle.vehicle_state.state_type(),
            VehicleStateType::Idle
                | VehicleStateType::Repositioning
                | VehicleStateType::ReserveBase
        ) && mechatronics.fuel_source_soc(vehicle) >= env.config.soc_lower_limit
    }

    fn match_requests(
        &self,
        sim: &SimulationState,
        env: &Environment,
        claims: &mut Claims,
        out: &mut Vec<Instruction>,
    ) {
        let now = sim.sim_time();
        let mut waiting: Vec<&Request> = sim
            .requests()
            .filter(|r| !r.is_dispatched() && r.departure_time <= now)
            .collect();
        waiting.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        for request in waiting {
            let trip_km = distance_km_between_cells(request.origin, request.destination);
            let best = sim
                .vehicles()
                .filter(|vehicle| claims.is_free(&vehicle.id))
                .filter(|vehicle| {
                    request
                        .membership
                        .grant_access_to_membership(&vehicle.membership)
                })
                .filter_map(|vehicle| {
                    let mechatronics = env.mechatronics_for(vehicle).ok()?;
                    if !Self::available_for_trip(vehicle, mechatronics.as_ref(), env) {
                        return None;
                    }
                    let steps = grid_distance(vehicle.cell, request.origin)?;
                    if steps > self.max_pickup_radius {
                        return None;
                    }
                    let pickup_km = distance_km_between_cells(vehicle.cell, request.origin);
                    if mechatronics.range_remaining_km(vehicle) < pickup_km + trip_km {
                        return None;
                    }
                    Some((pickup_km, vehicle.id.clone()))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

            if let Some((_, vehicle_id)) = best {
                claims.vehicles.insert(vehicle_id.clone());
                out.push(Instruction::DispatchTrip {
                    vehicle_id,
                    request_id: request.id.clone(),
                });
            }
        }
    }

    fn send_idle_to_base(
        &self,
        sim: &SimulationState,
        claims: &mut Claims,
        out: &mut Vec<Instruction>,
    ) {
        for vehicle in sim.vehicles() {
            let VehicleState::Idle(idle) = &vehicle.vehicle_state else {
                continue;
            };
            if idle.idle_duration_secs < self.idle_to_base_secs || !claims.is_free(&vehicle.id) {
                continue;
            }
            let nearest = sim
                .bases()
                .filter(|base| base.is_member(&vehicle.membership))
                .filter(|base| {
                    let claimed = claims.stalls.get(&base.id).copied().unwrap_or(0);
                    base.available_stalls() > claimed
                })
                .min_by(|a, b| {
                    distance_km_between_cells(vehicle.cell, a.cell)
                        .total_cmp(&distance_km_between_cells(vehicle.cell, b.cell))
                        .then_with(|| a.id.cmp(&b.id))
                });
            if let Some(base) = nearest {
                claims.vehicles.insert(vehicle.id.clone());
                *claims.stalls.entry(base.id.clone()).or_default() += 1;
                out.push(Instruction::DispatchBase {
                    vehicle_id: vehicle.id.clone(),
                    base_id: base.id.clone(),
                });
            }
        }
    }

    fn charge_at_base(
        &self,
        sim: &SimulationState,
        env: &Environment,
        claims: &mut Claims,
        out: &mut Vec<Instruction>,
    ) {
        for vehicle in sim.vehicles() {
            let VehicleState::ReserveBase(reserve) = &vehicle.vehicle_state else {
                continue;
            };
            if !claims.is_free(&vehicle.id) {
                continue;
            }
            let Ok(mechatronics) = env.mechatronics_for(vehicle) else {
                continue;
            };
            if mechatronics.fuel_source_soc(vehicle) >= env.config.soc_upper_limit {
                continue;
            }
            let Some(station) = sim
                .base(&reserve.base_id)
                .and_then(|base| base.station_id.as_ref())
                .and_then(|station_id| sim.station(station_id))
            else {
                continue;
            };
            let charger = Self::best_charger(station, mechatronics.as_ref(), env, claims);
            if let Some(charger_id) = charger {
                self.claim_charger(claims, vehicle, &station.id, &charger_id);
                out.push(Instruction::ChargeBase {
                    vehicle_id: vehicle.id.clone(),
                    base_id: reserve.base_id.clone(),
                    charger_id,
                });
            }
        }
    }
}

impl Dispatcher for GreedyDispatcher {
    fn generate_instructions(
        &mut self,
        sim: &SimulationState,
        env: &Environment,
    ) -> Vec<Instruction> {
        let mut claims = Claims::from_in_flight(sim);
        let mut instructions = Vec::new();
        self.charge_low_vehicles(sim, env, &mut claims, &mut instructions);
        self.match_requests(sim, env, &mut claims, &mut instructions);
        self.send_idle_to_base(sim, &mut claims, &mut instructions);
        self.charge_at_base(sim, env, &mut claims, &mut instructions);
        instructions
    }
}
