use super::{LinkTraversal, RoadNetwork, Route};

/// Result of moving along a route for a bounded amount of time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTraversal {
    /// The links (or link prefixes) actually travelled this step.
    pub experienced_route: Route,
    /// What is left to travel; a partially travelled link is split and its tail kept here.
    pub remaining_route: Route,
    pub remaining_time_secs: f64,
    pub distance_km: f64,
}

impl RouteTraversal {
    pub fn no_movement(route: &Route, duration_secs: f64) -> Self {
        Self {
            experienced_route: Route::empty(),
            remaining_route: route.clone(),
            remaining_time_secs: duration_secs,
            distance_km: 0.0,
        }
    }
}

/// Travel along `route` for at most `duration_secs`.
pub fn traverse(
    route: &Route,
    road_network: &dyn RoadNetwork,
    duration_secs: f64,
) -> RouteTraversal {
    if route.is_empty() || duration_secs <= 0.0 {
        return RouteTraversal::no_movement(route, duration_secs.max(0.0));
    }

    let mut experienced = Vec::new();
    let mut remaining = Vec::new();
    let mut time_left = duration_secs;
    let mut distance_km = 0.0;
    let mut exhausted = false;

    for link in route.links() {
        if exhausted {
            remaining.push(link.clone());
            continue;
        }
        let link_time = link.travel_time_secs();
        if link_time <= time_left {
            time_left -= link_time;
            distance_km += link.distance_km;
            experienced.push(link.clone());
            if time_left <= 0.0 {
                exhausted = true;
            }
        } else {
            let offset_km = link.distance_km * (time_left / link_time);
            let split_at = road_network.position_at(link, offset_km);
            experienced.push(LinkTraversal {
                end: split_at,
                distance_km: offset_km,
                ..link.clone()
            });
            remaining.push(LinkTraversal {
                start: split_at,
                distance_km: link.distance_km - offset_km,
                ..link.clone()
            });
            distance_km += offset_km;
            time_left = 0.0;
            exhausted = true;
        }
    }

    RouteTraversal {
        experienced_route: Route::new(experienced),
        remaining_route: Route::new(remaining),
        remaining_time_secs: time_left,
        distance_km,
    }
}
