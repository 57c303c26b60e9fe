use std::sync::Arc;

use h3o::{CellIndex, LatLng};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Environment;
use crate::ids::ChargerId;
use crate::mechatronics::{Bev, Ice, Mechatronics};
use crate::model::{Base, Charger, Request, Station, Vehicle};
use crate::roadnetwork::H3GridRoadNetwork;
use crate::scenario::params::{PowertrainMix, ScenarioParams, BEV_MECHATRONICS, ICE_MECHATRONICS};
use crate::simulation_state::SimulationState;
use crate::spatial::{cell_from_lat_lng, distance_km_between_cells};

/// Base fare plus a per-km rate, used to value generated requests.
const BASE_FARE: f64 = 2.5;
const FARE_PER_KM: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid latitude bounds [{min}, {max}]")]
    InvalidLatitude { min: f64, max: f64 },
    #[error("invalid longitude bounds [{min}, {max}]")]
    InvalidLongitude { min: f64, max: f64 },
    #[error("invalid trip length {min}..={max} cells")]
    InvalidTripLength { min: u32, max: u32 },
}

/// Sample a uniformly random point in the box and return its resolution 9 cell.
pub fn random_cell_in_bounds<R: Rng>(
    rng: &mut R,
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
) -> Result<CellIndex, ScenarioError> {
    if lat_min < -90.0 || lat_max > 90.0 || lat_min > lat_max {
        return Err(ScenarioError::InvalidLatitude {
            min: lat_min,
            max: lat_max,
        });
    }
    if lng_min < -180.0 || lng_max > 180.0 || lng_min > lng_max {
        return Err(ScenarioError::InvalidLongitude {
            min: lng_min,
            max: lng_max,
        });
    }
    let lat = rng.gen_range(lat_min..=lat_max);
    let lng = rng.gen_range(lng_min..=lng_max);
    cell_from_lat_lng(lat, lng).ok_or(ScenarioError::InvalidLatitude {
        min: lat_min,
        max: lat_max,
    })
}

fn cell_in_bounds(cell: CellIndex, params: &ScenarioParams) -> bool {
    let coord = LatLng::from(cell);
    (params.lat_min..=params.lat_max).contains(&coord.lat())
        && (params.lng_min..=params.lng_max).contains(&coord.lng())
}

/// A destination between `min_trip_cells` and `max_trip_cells` grid steps from `origin`,
/// preferring cells inside the box. Falls back to any cell in range when the box excludes them
/// all, and to the origin itself when the grid disk cannot be built.
fn random_destination<R: Rng>(
    rng: &mut R,
    origin: CellIndex,
    params: &ScenarioParams,
) -> CellIndex {
    let in_range = |cell: &CellIndex| {
        origin
            .grid_distance(*cell)
            .map(|d| d >= params.min_trip_cells as i32 && d <= params.max_trip_cells as i32)
            .unwrap_or(false)
    };
    let disk: Vec<CellIndex> = origin.grid_disk(params.max_trip_cells);
    let mut candidates: Vec<CellIndex> = disk
        .iter()
        .copied()
        .filter(|c| in_range(c) && cell_in_bounds(*c, params))
        .collect();
    if candidates.is_empty() {
        candidates = disk.into_iter().filter(in_range).collect();
    }
    if candidates.is_empty() {
        return origin;
    }
    candidates[rng.gen_range(0..candidates.len())]
}

fn bev_chargers(count: u32) -> Vec<(ChargerId, u32)> {
    vec![
        (Charger::dcfc().id, count),
        (Charger::level_2().id, count),
    ]
}

fn station_chargers(mix: PowertrainMix, count: u32) -> Vec<(ChargerId, u32)> {
    match mix {
        PowertrainMix::AllBev => bev_chargers(count),
        PowertrainMix::AllIce => vec![(Charger::gas_pump().id, count)],
        PowertrainMix::Mixed { .. } => {
            let mut chargers = bev_chargers(count);
            chargers.push((Charger::gas_pump().id, count));
            chargers
        }
    }
}

/// Build the initial simulation state and its environment from `params`.
///
/// Deterministic for a given seed. Every base gets a co-located station with slow chargers
/// so vehicles parked there can top up.
pub fn build_scenario(
    params: &ScenarioParams,
) -> Result<(SimulationState, Environment), ScenarioError> {
    if params.min_trip_cells > params.max_trip_cells {
        return Err(ScenarioError::InvalidTripLength {
            min: params.min_trip_cells,
            max: params.max_trip_cells,
        });
    }
    let mut rng = StdRng::seed_from_u64(params.seed.unwrap_or(0));
    let start_time = params.sim_config.start_time;
    let bev = Bev::default();
    let ice = Ice::default();
    let env = Environment::new(params.sim_config.clone())
        .with_mechatronics(BEV_MECHATRONICS, bev.clone())
        .with_mechatronics(ICE_MECHATRONICS, ice.clone());

    let mut sim = SimulationState::new(Arc::new(H3GridRoadNetwork::default()), start_time);
    let random_cell = |rng: &mut StdRng| {
        random_cell_in_bounds(
            rng,
            params.lat_min,
            params.lat_max,
            params.lng_min,
            params.lng_max,
        )
    };

    for n in 0..params.num_stations {
        let cell = random_cell(&mut rng)?;
        let chargers = station_chargers(params.powertrain_mix, params.chargers_per_station);
        sim = sim.add_station(Station::build(format!("s{n}"), cell, chargers));
    }

    for n in 0..params.num_bases {
        let cell = random_cell(&mut rng)?;
        let station_id = format!("bs{n}");
        let slow_chargers = [(Charger::level_2().id, params.chargers_per_station)];
        let base = Base::build(format!("b{n}"), cell, params.stalls_per_base)
            .with_station(station_id.as_str());
        sim = sim
            .add_station(Station::build(station_id, cell, slow_chargers))
            .add_base(base);
    }

    for n in 0..params.num_vehicles {
        let cell = random_cell(&mut rng)?;
        let electric = match params.powertrain_mix {
            PowertrainMix::AllBev => true,
            PowertrainMix::AllIce => false,
            PowertrainMix::Mixed { bev_share } => rng.gen_bool(bev_share.clamp(0.0, 1.0)),
        };
        let (mechatronics_id, energy) = if electric {
            (BEV_MECHATRONICS, bev.initial_energy(params.initial_soc))
        } else {
            (ICE_MECHATRONICS, ice.initial_energy(params.initial_soc))
        };
        let pooling = rng.gen_bool(params.pooling_share.clamp(0.0, 1.0));
        let vehicle =
            Vehicle::new(format!("v{n}"), mechatronics_id, cell, energy).with_pooling(pooling);
        sim = sim.add_vehicle(vehicle);
    }

    for n in 0..params.num_requests {
        let origin = random_cell(&mut rng)?;
        let destination = random_destination(&mut rng, origin, params);
        let departure = start_time + rng.gen_range(0..=params.request_window_secs);
        let passengers = rng.gen_range(1..=2);
        let fare = BASE_FARE + FARE_PER_KM * distance_km_between_cells(origin, destination);
        let pooling = rng.gen_bool(params.pooling_share.clamp(0.0, 1.0));
        let request = Request::build(
            format!("r{n}"),
            origin,
            destination,
            departure,
            departure + params.cancel_delay_secs,
            passengers,
        )
        .with_pooling(pooling)
        .with_value(fare);
        sim = sim.add_request(request);
    }

    info!(
        "scenario built: {} vehicles, {} requests, {} stations, {} bases",
        sim.vehicle_count(),
        sim.request_count(),
        sim.stations().count(),
        sim.bases().count()
    );
    Ok((sim, env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ScenarioParams {
        ScenarioParams::default()
            .with_seed(7)
            .with_fleet(8, PowertrainMix::Mixed { bev_share: 0.5 })
            .with_requests(12, 600)
            .with_infrastructure(2, 1)
            .with_trip_cells(2, 6)
    }

    #[test]
    fn builds_requested_counts() {
        let (sim, env) = build_scenario(&small()).expect("scenario");
        assert_eq!(sim.vehicle_count(), 8);
        assert_eq!(sim.request_count(), 12);
        assert_eq!(sim.stations().count(), 3);
        assert_eq!(sim.bases().count(), 1);
        for vehicle in sim.vehicles() {
            assert!(env.mechatronics_for(vehicle).is_ok());
        }
    }

    #[test]
    fn same_seed_same_scenario() {
        let (a, _) = build_scenario(&small()).expect("scenario");
        let (b, _) = build_scenario(&small()).expect("scenario");
        let cells = |sim: &SimulationState| sim.vehicles().map(|v| v.cell).collect::<Vec<_>>();
        assert_eq!(cells(&a), cells(&b));
        let departures =
            |sim: &SimulationState| sim.requests().map(|r| r.departure_time).collect::<Vec<_>>();
        assert_eq!(departures(&a), departures(&b));
    }

    #[test]
    fn requests_cancel_after_delay() {
        let params = small().with_cancel_delay_secs(120);
        let (sim, _) = build_scenario(&params).expect("scenario");
        for request in sim.requests() {
            assert_eq!(request.cancel_time, request.departure_time + 120);
            assert!(request.departure_time <= 600);
            let steps = request.origin.grid_distance(request.destination).ok();
            assert!(steps.is_some_and(|d| (2..=6).contains(&d)));
        }
    }

    #[test]
    fn rejects_inverted_bounds() {
        let params = small().with_bounds(40.0, 39.0, -105.0, -104.9);
        assert_eq!(
            build_scenario(&params).err(),
            Some(ScenarioError::InvalidLatitude {
                min: 40.0,
                max: 39.0
            })
        );
    }
}
