//! Run a one-hour mixed-fleet scenario with the greedy dispatcher and print a summary.
//!
//! Run with: cargo run -p fleet_core --example scenario_run [reports.jsonl]

use std::collections::BTreeMap;

use fleet_core::config::SimConfig;
use fleet_core::dispatcher::GreedyDispatcher;
use fleet_core::report_export::{JsonLinesSink, ReportSink};
use fleet_core::reports::{Report, ReportLog};
use fleet_core::runner::{build_world, run_until_end, simulation_schedule};
use fleet_core::scenario::{build_scenario, PowertrainMix, ScenarioParams};
use fleet_core::simulation_state::SimulationState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const NUM_VEHICLES: usize = 100;
    const NUM_REQUESTS: usize = 500;

    let params = ScenarioParams::default()
        .with_seed(123)
        .with_fleet(NUM_VEHICLES, PowertrainMix::Mixed { bev_share: 0.6 })
        .with_requests(NUM_REQUESTS, 3600)
        .with_pooling_share(0.3)
        .with_sim_config(SimConfig::default().with_time_range(0, 2 * 3600));

    let (sim, env) = build_scenario(&params)?;
    let mut world = build_world(sim, env, GreedyDispatcher::default());
    let mut schedule = simulation_schedule();
    let ticks = run_until_end(&mut world, &mut schedule, 10_000);

    let reports = world.resource_mut::<ReportLog>().drain();
    let sim = world.resource::<SimulationState>();

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for report in &reports {
        *by_type.entry(report.report_type()).or_default() += 1;
    }
    let mut by_state: BTreeMap<String, usize> = BTreeMap::new();
    for vehicle in sim.vehicles() {
        *by_state
            .entry(vehicle.vehicle_state.state_type().to_string())
            .or_default() += 1;
    }
    let distance: f64 = sim.vehicles().map(|v| v.distance_traveled_km).sum();
    let cancelled = reports
        .iter()
        .filter(|r| matches!(r, Report::CancelRequest { .. }))
        .count();

    println!(
        "--- Scenario run ({NUM_VEHICLES} vehicles, {NUM_REQUESTS} requests, seed 123) ---"
    );
    println!("Ticks executed: {ticks}");
    println!("Simulation time: {} s", sim.sim_time());
    println!("Requests still waiting: {}", sim.request_count());
    println!("Requests cancelled: {cancelled}");
    println!("Fleet distance: {distance:.1} km");
    println!("\nVehicles by state:");
    for (state, count) in &by_state {
        println!("  {state:<22} {count}");
    }
    println!("\nReports by type:");
    for (report_type, count) in &by_type {
        println!("  {report_type:<22} {count}");
    }

    if let Some(path) = std::env::args().nth(1) {
        let mut sink = JsonLinesSink::create(&path)?;
        sink.write_reports(&reports)?;
        sink.flush()?;
        println!("\nWrote {} reports to {path}", reports.len());
    }
    Ok(())
}
