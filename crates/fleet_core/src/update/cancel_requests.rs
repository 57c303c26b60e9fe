use log::debug;

use super::UpdateOutcome;
use crate::error::StateResult;
use crate::ids::RequestId;
use crate::reports::Report;
use crate::simulation_state::SimulationState;

/// Remove every unassigned request whose cancel time has come.
///
/// Requests with a dispatched vehicle are left alone; that vehicle's state owns them.
pub fn cancel_requests(sim: &SimulationState) -> StateResult<UpdateOutcome> {
    let now = sim.sim_time();
    let expired: Vec<(RequestId, u64, u64)> = sim
        .requests()
        .filter(|request| !request.is_dispatched() && request.cancel_time <= now)
        .map(|request| {
            (
                request.id.clone(),
                request.departure_time,
                request.cancel_time,
            )
        })
        .collect();

    let mut updated = sim.clone();
    let mut reports = Vec::with_capacity(expired.len());
    for (request_id, departure_time, cancel_time) in expired {
        updated = updated.remove_request(&request_id)?;
        debug!("request {request_id} cancelled at {now}");
        reports.push(Report::CancelRequest {
            sim_time: now,
            request_id,
            departure_time,
            cancel_time,
        });
    }

    Ok(UpdateOutcome {
        sim: updated,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Request;
    use crate::test_helpers::{mock_request, mock_sim, test_cell, test_cell_at_distance};

    #[test]
    fn cancels_only_expired_unassigned_requests() {
        let destination = test_cell_at_distance(3);
        let expired = mock_request("expired", test_cell(), destination);
        let claimed = mock_request("claimed", test_cell(), destination)
            .assign_dispatched_vehicle(&"v1".into(), 0);
        let waiting = Request::build("waiting", test_cell(), destination, 0, 1200, 1);
        let sim = mock_sim()
            .add_request(expired)
            .add_request(claimed)
            .add_request(waiting)
            .advance_time(600);

        let outcome = cancel_requests(&sim).expect("cancel");

        assert!(outcome.sim.request(&"expired".into()).is_none());
        assert!(outcome.sim.request(&"claimed".into()).is_some());
        assert!(outcome.sim.request(&"waiting".into()).is_some());
        assert_eq!(
            outcome.reports,
            vec![Report::CancelRequest {
                sim_time: 600,
                request_id: "expired".into(),
                departure_time: 0,
                cancel_time: 600,
            }]
        );
    }
}
