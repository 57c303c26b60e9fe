//! Property tests: random instruction streams never leak chargers or stalls, and never
//! double-book requests.

mod support;

use fleet_core::config::Environment;
use fleet_core::ids::{RequestId, VehicleId};
use fleet_core::instruction::Instruction;
use fleet_core::simulation_state::SimulationState;
use fleet_core::test_helpers::{mock_env, mock_sim};
use fleet_core::update::{apply_instructions, step_vehicles};
use fleet_core::vehicle_state::VehicleState;
use proptest::prelude::*;
use support::entities::{
    base_with_station, bev_at, request, seeded_cell, seeded_cell_at, station_with,
};

const FLEET: usize = 5;

#[derive(Debug, Clone)]
enum ChargeOp {
    Charge(usize),
    Release(usize),
    Step,
}

fn arb_charge_ops() -> impl Strategy<Value = Vec<ChargeOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..FLEET).prop_map(ChargeOp::Charge),
            (0..FLEET).prop_map(ChargeOp::Release),
            Just(ChargeOp::Step),
        ],
        1..40,
    )
}

#[derive(Debug, Clone)]
enum TripOp {
    Dispatch(usize, usize),
    Release(usize),
    Step,
}

fn arb_trip_ops() -> impl Strategy<Value = Vec<TripOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..FLEET, 0..3usize).prop_map(|(v, r)| TripOp::Dispatch(v, r)),
            (0..FLEET).prop_map(TripOp::Release),
            Just(TripOp::Step),
        ],
        1..40,
    )
}

#[derive(Debug, Clone)]
enum BaseOp {
    Dispatch(usize),
    Reserve(usize),
    Charge(usize),
    Release(usize),
    Step,
}

fn arb_base_ops() -> impl Strategy<Value = Vec<BaseOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..FLEET).prop_map(BaseOp::Dispatch),
            (0..FLEET).prop_map(BaseOp::Reserve),
            (0..FLEET).prop_map(BaseOp::Charge),
            (0..FLEET).prop_map(BaseOp::Release),
            Just(BaseOp::Step),
        ],
        1..60,
    )
}

fn vehicle_id(n: usize) -> VehicleId {
    format!("v{n}").into()
}

fn release(n: usize) -> Instruction {
    Instruction::Idle {
        vehicle_id: vehicle_id(n),
    }
}

fn apply(sim: SimulationState, env: &Environment, instruction: Instruction) -> SimulationState {
    apply_instructions(&sim, env, &[instruction]).sim
}

fn charging_fleet() -> SimulationState {
    (0..FLEET).fold(
        mock_sim().add_station(station_with("s1", seeded_cell(), &[("DCFC", 2)])),
        |sim, n| sim.add_vehicle(bev_at(&format!("v{n}"), seeded_cell(), 0.3)),
    )
}

fn trip_fleet() -> SimulationState {
    let sim = (0..FLEET).fold(mock_sim(), |sim, n| {
        sim.add_vehicle(bev_at(&format!("v{n}"), seeded_cell_at(n as u32 % 2), 0.9))
    });
    (0..3).fold(sim, |sim, n| {
        sim.add_request(request(
            &format!("r{n}"),
            seeded_cell_at(3),
            seeded_cell_at(6),
            100_000,
        ))
    })
}

fn base_fleet() -> SimulationState {
    let (base, station) = base_with_station("b1", "bs1", seeded_cell(), 2);
    (0..FLEET).fold(mock_sim().add_base(base).add_station(station), |sim, n| {
        let cell = if n % 2 == 0 { seeded_cell() } else { seeded_cell_at(2) };
        sim.add_vehicle(bev_at(&format!("v{n}"), cell, 0.4))
    })
}

fn assert_base_accounting(sim: &SimulationState) {
    let base = sim.base(&"b1".into()).expect("base");
    let (mut parked, mut plugged) = (0, 0);
    for vehicle in sim.vehicles() {
        match &vehicle.vehicle_state {
            VehicleState::ReserveBase(reserve) if reserve.base_id == base.id => parked += 1,
            VehicleState::ChargingBase(charging) if charging.base_id == base.id => {
                parked += 1;
                plugged += 1;
            }
            _ => {}
        }
    }
    assert_eq!(base.available_stalls() + parked, base.total_stalls());

    let station = sim.station(&"bs1".into()).expect("station");
    let level_2 = "LEVEL_2".into();
    assert_eq!(
        station.available_chargers(&level_2) + plugged,
        station.total_chargers(&level_2)
    );
}

fn assert_charger_accounting(sim: &SimulationState) {
    let station = sim.station(&"s1".into()).expect("station");
    let plugged = sim
        .vehicles()
        .filter(|v| {
            matches!(
                &v.vehicle_state,
                VehicleState::ChargingStation(charging) if charging.station_id.as_str() == "s1"
            )
        })
        .count() as u32;
    let dcfc = "DCFC".into();
    assert_eq!(station.available_chargers(&dcfc) + plugged, station.total_chargers(&dcfc));
}

fn assert_request_exclusivity(sim: &SimulationState) {
    let mut claimed: Vec<&RequestId> = sim
        .vehicles()
        .filter_map(|v| match &v.vehicle_state {
            VehicleState::DispatchTrip(dispatch) => Some(&dispatch.request_id),
            _ => None,
        })
        .collect();
    let total = claimed.len();
    claimed.sort();
    claimed.dedup();
    assert_eq!(claimed.len(), total, "a request is claimed by two vehicles");

    for request in sim.requests() {
        if let Some(assigned) = &request.dispatched_vehicle {
            let vehicle = sim.vehicle(assigned).expect("assigned vehicle exists");
            assert!(matches!(
                &vehicle.vehicle_state,
                VehicleState::DispatchTrip(dispatch) if dispatch.request_id == request.id
            ));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn chargers_are_never_leaked_or_oversold(ops in arb_charge_ops()) {
        let env = mock_env();
        let mut sim = charging_fleet();
        for op in ops {
            sim = match op {
                ChargeOp::Charge(n) => apply(sim, &env, Instruction::ChargeStation {
                    vehicle_id: vehicle_id(n),
                    station_id: "s1".into(),
                    charger_id: "DCFC".into(),
                }),
                ChargeOp::Release(n) => apply(sim, &env, release(n)),
                ChargeOp::Step => step_vehicles(&sim, &env).sim,
            };
            assert_charger_accounting(&sim);
        }
    }

    #[test]
    fn requests_have_at_most_one_dispatched_vehicle(ops in arb_trip_ops()) {
        let env = mock_env();
        let mut sim = trip_fleet();
        for op in ops {
            sim = match op {
                TripOp::Dispatch(v, r) => apply(sim, &env, Instruction::DispatchTrip {
                    vehicle_id: vehicle_id(v),
                    request_id: format!("r{r}").into(),
                }),
                TripOp::Release(n) => apply(sim, &env, release(n)),
                TripOp::Step => step_vehicles(&sim, &env).sim,
            };
            assert_request_exclusivity(&sim);
        }
    }

    #[test]
    fn stalls_follow_vehicles_through_the_base(ops in arb_base_ops()) {
        let env = mock_env();
        let mut sim = base_fleet();
        for op in ops {
            sim = match op {
                BaseOp::Dispatch(n) => apply(sim, &env, Instruction::DispatchBase {
                    vehicle_id: vehicle_id(n),
                    base_id: "b1".into(),
                }),
                BaseOp::Reserve(n) => apply(sim, &env, Instruction::ReserveBase {
                    vehicle_id: vehicle_id(n),
                    base_id: "b1".into(),
                }),
                BaseOp::Charge(n) => apply(sim, &env, Instruction::ChargeBase {
                    vehicle_id: vehicle_id(n),
                    base_id: "b1".into(),
                    charger_id: "LEVEL_2".into(),
                }),
                BaseOp::Release(n) => apply(sim, &env, release(n)),
                BaseOp::Step => step_vehicles(&sim, &env).sim,
            };
            assert_base_accounting(&sim);
        }
    }
}
