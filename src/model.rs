//! Request/response models for the solver surface.
//!
//! The wire formats are deliberately tolerant: coordinates arrive as objects
//! (`lat`/`lon`, `lng`, `latitude`/`longitude`) or two-element arrays, demands
//! as a scalar or a vector, pickup/delivery pairs as `[p, d]`, `{pickup,
//! delivery}` or `{from, to}`. Everything canonicalizes at the edge; shapes
//! that cannot be read unambiguously are an input error, not a guess.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::matrix::MatrixResult;

// ============ Coordinates ============

/// A WGS84 point. Canonical JSON form is `{"lat": .., "lon": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateWire {
    LatLon { lat: f64, lon: f64 },
    LatLng { lat: f64, lng: f64 },
    Long { latitude: f64, longitude: f64 },
    Pair(Vec<f64>),
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = CoordinateWire::deserialize(deserializer)
            .map_err(|_| D::Error::custom("coordinate must be {lat, lon} or a [lon, lat] pair"))?;
        let (lat, lon) = match wire {
            CoordinateWire::LatLon { lat, lon } => (lat, lon),
            CoordinateWire::LatLng { lat, lng } => (lat, lng),
            CoordinateWire::Long { latitude, longitude } => (latitude, longitude),
            CoordinateWire::Pair(pair) => {
                if pair.len() != 2 {
                    return Err(D::Error::custom(format!(
                        "coordinate array must have exactly 2 elements, got {}",
                        pair.len()
                    )));
                }
                // Arrays read as [lon, lat]. When the second element cannot be
                // a latitude the pair was [lat, lon]; when neither ordering is
                // valid the input is rejected rather than guessed at.
                let (a, b) = (pair[0], pair[1]);
                if a.abs() > 180.0 || b.abs() > 180.0 {
                    return Err(D::Error::custom(format!(
                        "coordinate ({a}, {b}) is outside any valid range"
                    )));
                }
                if b.abs() <= 90.0 {
                    (b, a)
                } else if a.abs() <= 90.0 {
                    (a, b)
                } else {
                    return Err(D::Error::custom(format!(
                        "ambiguous coordinate pair ({a}, {b}): no element can be a latitude"
                    )));
                }
            }
        };
        Ok(Coordinate { lat, lon })
    }
}

// ============ Time windows ============

/// `[earliest_start, latest_end]` in seconds during which service may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeWindowWire {
    Pair(Vec<i64>),
    Fields { start: i64, end: i64 },
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TimeWindowWire::deserialize(deserializer)
            .map_err(|_| D::Error::custom("time window must be [start, end] or {start, end}"))?
        {
            TimeWindowWire::Pair(pair) => {
                if pair.len() != 2 {
                    return Err(D::Error::custom("time window array must have 2 elements"));
                }
                Ok(TimeWindow { start: pair[0], end: pair[1] })
            }
            TimeWindowWire::Fields { start, end } => Ok(TimeWindow { start, end }),
        }
    }
}

impl TimeWindow {
    /// Window with start/end swapped into order.
    pub fn ordered(self) -> TimeWindow {
        if self.start <= self.end {
            self
        } else {
            TimeWindow { start: self.end, end: self.start }
        }
    }
}

// ============ Waypoints ============

fn de_demand<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DemandWire {
        One(f64),
        Many(Vec<f64>),
    }
    match Option::<DemandWire>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(DemandWire::One(v)) => Ok(vec![v.round() as i64]),
        Some(DemandWire::Many(vs)) => Ok(vs.into_iter().map(|v| v.round() as i64).collect()),
    }
}

/// A stop. Carries the solver space (planar `x`/`y`) and/or the display space
/// (`lat`/`lon`); at least one must be usable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Waypoint {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Possibly vector-valued for multi-dimensional capacity.
    #[serde(default, deserialize_with = "de_demand")]
    pub demand: Vec<i64>,
    /// Seconds spent at the node on arrival.
    #[serde(default, alias = "service_duration")]
    pub service_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default)]
    pub depot: bool,
}

impl Waypoint {
    /// Display-space coordinate, preferring the nested `location` form.
    pub fn coordinate(&self) -> Option<Coordinate> {
        if let Some(loc) = self.location {
            return Some(loc);
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => None,
        }
    }

    /// Solver-space planar pair. Historical loaders aliased x→lat and y→lon,
    /// so the display fields are the fallback.
    pub fn solver_xy(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => self.coordinate().map(|c| (c.lat, c.lon)),
        }
    }

    pub fn scalar_demand(&self) -> i64 {
        self.demand.first().copied().unwrap_or(0)
    }
}

// ============ Fleet ============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Vec<i64>>,
    /// Start/end node indices; default to the depot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
}

impl Vehicle {
    pub fn named(id: &str) -> Self {
        Vehicle {
            id: id.to_string(),
            capacity: None,
            start: None,
            end: None,
            time_window: None,
            emissions_per_km: None,
            fuel_type: None,
        }
    }

    pub fn scalar_capacity(&self) -> i64 {
        match &self.capacity {
            Some(caps) if !caps.is_empty() => caps[0],
            _ => i64::MAX / 4,
        }
    }
}

/// The wire accepts a bare vehicle array or `{"vehicles": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct Fleet {
    pub vehicles: Vec<Vehicle>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FleetWire {
    Wrapped { vehicles: Vec<Vehicle> },
    Bare(Vec<Vehicle>),
}

impl<'de> Deserialize<'de> for Fleet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let vehicles = match FleetWire::deserialize(deserializer)
            .map_err(|_| D::Error::custom("fleet must be a vehicle array or {vehicles: [...]}"))?
        {
            FleetWire::Wrapped { vehicles } => vehicles,
            FleetWire::Bare(vehicles) => vehicles,
        };
        Ok(Fleet { vehicles })
    }
}

// ============ Pickup & delivery ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PickupDeliveryPair {
    pub pickup: usize,
    pub delivery: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PairWire {
    Named {
        pickup: usize,
        delivery: usize,
        #[serde(default)]
        quantity: Option<i64>,
    },
    FromTo { from: usize, to: usize },
    Pair(Vec<usize>),
}

impl<'de> Deserialize<'de> for PickupDeliveryPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (pickup, delivery, quantity) = match PairWire::deserialize(deserializer).map_err(
            |_| {
                D::Error::custom(
                    "pickup/delivery pair must be [pickup, delivery], {pickup, delivery} or {from, to}",
                )
            },
        )? {
            PairWire::Named { pickup, delivery, quantity } => (pickup, delivery, quantity),
            PairWire::FromTo { from, to } => (from, to, None),
            PairWire::Pair(pair) => {
                if pair.len() != 2 {
                    return Err(D::Error::custom("pair array must have 2 elements"));
                }
                (pair[0], pair[1], None)
            }
        };
        Ok(PickupDeliveryPair { pickup, delivery, quantity })
    }
}

// ============ Solve request ============

/// Weighted objective for multi-objective engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub distance: f64,
    pub time: f64,
    pub emissions: f64,
    /// Fixed per-vehicle cost, in distance units; discourages spinning up a
    /// vehicle unless it pays for itself.
    pub vehicle_fixed_cost: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            distance: 1.0,
            time: 0.0,
            emissions: 0.0,
            vehicle_fixed_cost: 100.0,
        }
    }
}

/// Engine tuning knobs that are not part of the problem statement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SolveOptions {
    /// Wall-clock budget in seconds (engines return their incumbent when it
    /// elapses).
    pub time_limit: u64,
    /// Permit dropping customers at a penalty instead of failing.
    pub allow_drop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_penalty: Option<i64>,
    /// Named first-solution strategy (`path_cheapest_arc`, `savings`).
    pub first_solution: String,
    /// Named improvement strategy (`guided_local_search`, `none`).
    pub metaheuristic: String,
    /// Explicit duration scale for auto-built Euclidean matrices; supersedes
    /// the time-window heuristic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_scale: Option<f64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            time_limit: 60,
            allow_drop: false,
            drop_penalty: None,
            first_solution: "path_cheapest_arc".to_string(),
            metaheuristic: "guided_local_search".to_string(),
            duration_scale: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    /// Engine name, resolved through the solver registry.
    pub solver: String,
    pub fleet: Fleet,
    #[serde(default)]
    pub depot_index: usize,
    #[serde(default)]
    pub matrix: Option<MatrixResult>,
    #[serde(default)]
    pub demands: Option<Vec<i64>>,
    #[serde(default)]
    pub node_time_windows: Option<Vec<Option<TimeWindow>>>,
    #[serde(default, alias = "service_times")]
    pub node_service_times: Option<Vec<i64>>,
    #[serde(default)]
    pub pickup_delivery_pairs: Option<Vec<PickupDeliveryPair>>,
    #[serde(default)]
    pub weights: Option<ObjectiveWeights>,
    /// Coordinate-mode payload; also the source for EUC_2D auto-matrices.
    #[serde(default)]
    pub waypoints: Option<Vec<Waypoint>>,
    #[serde(flatten)]
    pub options: SolveOptions,
}

// ============ Routes ============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Route {
    pub vehicle_id: String,
    /// Node indices as strings, starting and ending at the vehicle's
    /// start/end nodes.
    pub waypoint_ids: Vec<String>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<i64>,
    /// kg CO2e.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Route {
    pub fn node_indices(&self) -> Vec<usize> {
        self.waypoint_ids
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Routes {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Non-depot nodes left unvisited (only when dropping is enabled).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<usize>,
}

impl Routes {
    pub fn success(message: String, routes: Vec<Route>, dropped: Vec<usize>) -> Self {
        Routes {
            status: "success".to_string(),
            message: Some(message),
            routes,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_all_documented_shapes() {
        let obj: Coordinate = serde_json::from_str(r#"{"lat": 50.8, "lon": 4.35}"#).unwrap();
        assert_eq!(obj, Coordinate { lat: 50.8, lon: 4.35 });

        let lng: Coordinate = serde_json::from_str(r#"{"lat": 50.8, "lng": 4.35}"#).unwrap();
        assert_eq!(lng.lon, 4.35);

        let long: Coordinate =
            serde_json::from_str(r#"{"latitude": 50.8, "longitude": 4.35}"#).unwrap();
        assert_eq!(long.lat, 50.8);

        // Arrays default to [lon, lat].
        let pair: Coordinate = serde_json::from_str("[4.35, 50.8]").unwrap();
        assert_eq!(pair, Coordinate { lat: 50.8, lon: 4.35 });

        // [lat, lon] with an unambiguous longitude is swapped.
        let swapped: Coordinate = serde_json::from_str("[37.77, -122.42]").unwrap();
        assert_eq!(swapped, Coordinate { lat: 37.77, lon: -122.42 });
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(serde_json::from_str::<Coordinate>("[200.0, 200.0]").is_err());
        assert!(serde_json::from_str::<Coordinate>("[1.0]").is_err());
        assert!(serde_json::from_str::<Coordinate>(r#"{"lat": 1.0}"#).is_err());
    }

    #[test]
    fn demand_accepts_scalar_and_vector() {
        let scalar: Waypoint =
            serde_json::from_str(r#"{"id": "1", "lat": 0.0, "lon": 0.0, "demand": 3}"#).unwrap();
        assert_eq!(scalar.demand, vec![3]);

        let vector: Waypoint =
            serde_json::from_str(r#"{"id": "1", "lat": 0.0, "lon": 0.0, "demand": [3, 7]}"#)
                .unwrap();
        assert_eq!(vector.demand, vec![3, 7]);
    }

    #[test]
    fn pair_accepts_all_documented_shapes() {
        let arr: PickupDeliveryPair = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!((arr.pickup, arr.delivery), (1, 2));

        let named: PickupDeliveryPair =
            serde_json::from_str(r#"{"pickup": 1, "delivery": 2, "quantity": 4}"#).unwrap();
        assert_eq!(named.quantity, Some(4));

        let from_to: PickupDeliveryPair = serde_json::from_str(r#"{"from": 1, "to": 2}"#).unwrap();
        assert_eq!((from_to.pickup, from_to.delivery), (1, 2));
    }

    #[test]
    fn fleet_accepts_bare_array_and_wrapped_form() {
        let bare: Fleet = serde_json::from_str(r#"[{"id": "veh-1"}]"#).unwrap();
        assert_eq!(bare.vehicles.len(), 1);

        let wrapped: Fleet =
            serde_json::from_str(r#"{"vehicles": [{"id": "veh-1"}, {"id": "veh-2"}]}"#).unwrap();
        assert_eq!(wrapped.vehicles.len(), 2);
    }

    #[test]
    fn waypoint_prefers_explicit_solver_space() {
        let wp: Waypoint = serde_json::from_str(
            r#"{"id": "1", "x": 10.0, "y": 20.0, "lat": 50.0, "lon": 4.0}"#,
        )
        .unwrap();
        assert_eq!(wp.solver_xy(), Some((10.0, 20.0)));
        assert_eq!(wp.coordinate().unwrap().lat, 50.0);

        // Legacy instances aliased x→lat, y→lon.
        let legacy: Waypoint =
            serde_json::from_str(r#"{"id": "1", "lat": 35.0, "lon": 45.0}"#).unwrap();
        assert_eq!(legacy.solver_xy(), Some((35.0, 45.0)));
    }

    #[test]
    fn solve_request_flattens_engine_options() {
        let req: SolveRequest = serde_json::from_str(
            r#"{
                "solver": "localsearch",
                "fleet": [{"id": "veh-1", "capacity": [10]}],
                "depot_index": 0,
                "time_limit": 5,
                "allow_drop": true
            }"#,
        )
        .unwrap();
        assert_eq!(req.options.time_limit, 5);
        assert!(req.options.allow_drop);
        assert_eq!(req.options.first_solution, "path_cheapest_arc");
    }
}
