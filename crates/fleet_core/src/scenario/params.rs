use crate::config::SimConfig;

/// Default bounding box: Denver, Colorado (approx).
const DEFAULT_LAT_MIN: f64 = 39.61;
const DEFAULT_LAT_MAX: f64 = 39.80;
const DEFAULT_LNG_MIN: f64 = -105.07;
const DEFAULT_LNG_MAX: f64 = -104.87;

/// Default window over which requests depart: 1 hour.
const DEFAULT_REQUEST_WINDOW_SECS: u64 = 60 * 60;

/// Mechatronics id under which scenarios register the battery electric powertrain.
pub const BEV_MECHATRONICS: &str = "bev";
/// Mechatronics id under which scenarios register the combustion powertrain.
pub const ICE_MECHATRONICS: &str = "ice";

/// Which powertrains the generated fleet uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowertrainMix {
    AllBev,
    AllIce,
    /// Each vehicle is electric with this probability.
    Mixed { bev_share: f64 },
}

/// Parameters for building a simulation scenario.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub num_vehicles: usize,
    pub num_requests: usize,
    pub num_stations: usize,
    pub num_bases: usize,
    /// Plugs of each compatible charger type per station.
    pub chargers_per_station: u32,
    pub stalls_per_base: u32,
    pub seed: Option<u64>,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    /// Requests depart uniformly in `[start_time, start_time + window]`.
    pub request_window_secs: u64,
    /// Seconds after departure at which an unserved request gives up.
    pub cancel_delay_secs: u64,
    pub min_trip_cells: u32,
    pub max_trip_cells: u32,
    /// Fraction of requests (and vehicles) that accept pooled service.
    pub pooling_share: f64,
    pub initial_soc: f64,
    pub powertrain_mix: PowertrainMix,
    pub sim_config: SimConfig,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            num_vehicles: 50,
            num_requests: 300,
            num_stations: 5,
            num_bases: 3,
            chargers_per_station: 4,
            stalls_per_base: 10,
            seed: None,
            lat_min: DEFAULT_LAT_MIN,
            lat_max: DEFAULT_LAT_MAX,
            lng_min: DEFAULT_LNG_MIN,
            lng_max: DEFAULT_LNG_MAX,
            request_window_secs: DEFAULT_REQUEST_WINDOW_SECS,
            cancel_delay_secs: 10 * 60,
            min_trip_cells: 5,
            max_trip_cells: 30,
            pooling_share: 0.0,
            initial_soc: 0.8,
            powertrain_mix: PowertrainMix::AllBev,
            sim_config: SimConfig::default(),
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fleet(mut self, num_vehicles: usize, powertrain_mix: PowertrainMix) -> Self {
        self.num_vehicles = num_vehicles;
        self.powertrain_mix = powertrain_mix;
        self
    }

    pub fn with_requests(mut self, num_requests: usize, window_secs: u64) -> Self {
        self.num_requests = num_requests;
        self.request_window_secs = window_secs;
        self
    }

    pub fn with_infrastructure(mut self, num_stations: usize, num_bases: usize) -> Self {
        self.num_stations = num_stations;
        self.num_bases = num_bases;
        self
    }

    pub fn with_bounds(mut self, lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        self.lat_min = lat_min;
        self.lat_max = lat_max;
        self.lng_min = lng_min;
        self.lng_max = lng_max;
        self
    }

    pub fn with_cancel_delay_secs(mut self, secs: u64) -> Self {
        self.cancel_delay_secs = secs;
        self
    }

    /// Trip length in H3 cells: min..=max.
    pub fn with_trip_cells(mut self, min_cells: u32, max_cells: u32) -> Self {
        self.min_trip_cells = min_cells;
        self.max_trip_cells = max_cells;
        self
    }

    pub fn with_pooling_share(mut self, share: f64) -> Self {
        self.pooling_share = share;
        self
    }

    pub fn with_sim_config(mut self, sim_config: SimConfig) -> Self {
        self.sim_config = sim_config;
        self
    }
}
