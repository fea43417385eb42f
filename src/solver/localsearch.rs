//! Metaheuristic engine: cheapest-arc / savings construction followed by a
//! relocate + swap + 2-opt improvement loop under a wall-clock budget.
//!
//! Arc cost is `w_dist · d + w_time · (duration / 3600)`, scaled to integers.
//! Capacity is enforced as a running load (pickups positive, deliveries
//! negative), time as a simulated time dimension with per-node and
//! per-vehicle windows, pickup/delivery as same-vehicle plus precedence.
//! `allow_drop` leaves customers unserved at a large penalty instead of
//! failing. The incumbent at the deadline is returned, never discarded.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::model::Routes;
use crate::solver::{
    is_depot_only, route_from_path, summarize, EngineRequirements, SolveInput, SolverEngine,
};

const COST_SCALE: f64 = 1000.0;

pub struct LocalSearchEngine;

impl LocalSearchEngine {
    pub fn new() -> Self {
        LocalSearchEngine
    }
}

impl Default for LocalSearchEngine {
    fn default() -> Self {
        LocalSearchEngine::new()
    }
}

// ============ Problem view ============

struct Problem<'a> {
    input: &'a SolveInput<'a>,
    matrix: &'a Matrix,
    n: usize,
    depot: usize,
    arc_cost: Vec<Vec<i64>>,
    fixed_cost: i64,
    drop_penalty: i64,
    /// node → (partner node, node is the pickup side)
    partner: Vec<Option<(usize, bool)>>,
}

#[derive(Clone, PartialEq, Eq)]
struct Candidate {
    routes: Vec<Vec<usize>>,
    dropped: Vec<usize>,
}

impl<'a> Problem<'a> {
    fn new(input: &'a SolveInput<'a>, matrix: &'a Matrix) -> Problem<'a> {
        let n = matrix.len();
        let w_dist = input.weights.distance;
        let w_time = input.weights.time;

        let arc_cost: Vec<Vec<i64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let d = matrix.distance(i, j) as f64;
                        let t_hr = matrix.duration(i, j).unwrap_or(0) as f64 / 3600.0;
                        ((w_dist * d + w_time * t_hr) * COST_SCALE).round() as i64
                    })
                    .collect()
            })
            .collect();

        let max_arc = arc_cost
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(0)
            .max(1);
        let drop_penalty = input
            .options
            .drop_penalty
            .map(|p| p.saturating_mul(COST_SCALE as i64))
            .unwrap_or_else(|| max_arc.saturating_mul(n as i64).max(1_000_000_000));

        let mut partner = vec![None; n];
        for pair in input.pairs {
            partner[pair.pickup] = Some((pair.delivery, true));
            partner[pair.delivery] = Some((pair.pickup, false));
        }

        Problem {
            input,
            matrix,
            n,
            depot: input.depot_index,
            arc_cost,
            fixed_cost: (input.weights.vehicle_fixed_cost * COST_SCALE).round() as i64,
            drop_penalty,
            partner,
        }
    }

    fn customers(&self) -> Vec<usize> {
        (0..self.n).filter(|&i| i != self.depot).collect()
    }

    fn route_path(&self, vehicle: usize, seq: &[usize]) -> Vec<usize> {
        let v = &self.input.fleet[vehicle];
        let mut path = Vec::with_capacity(seq.len() + 2);
        path.push(self.input.vehicle_start(v));
        path.extend_from_slice(seq);
        path.push(self.input.vehicle_end(v));
        path
    }

    // ---- feasibility ----

    fn route_feasible(&self, vehicle: usize, seq: &[usize]) -> bool {
        let v = &self.input.fleet[vehicle];
        let capacity = v.scalar_capacity();

        // Running load: pickups positive, deliveries negative.
        let mut load = 0i64;
        for &c in seq {
            load += self.input.demands[c];
            if load > capacity || load < 0 {
                return false;
            }
        }

        // Pickup/delivery: same route, pickup strictly before delivery.
        for (pos, &c) in seq.iter().enumerate() {
            if let Some((partner, is_pickup)) = self.partner[c] {
                match seq.iter().position(|&x| x == partner) {
                    Some(partner_pos) => {
                        if is_pickup && partner_pos < pos {
                            return false;
                        }
                        if !is_pickup && partner_pos > pos {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }

        // Time dimension: transit = service(from) + travel(from, to); service
        // must begin within each node window and the vehicle window.
        let (vehicle_start_t, vehicle_end_t) = self.input.vehicle_time_windows[vehicle];
        let start_node = self.input.vehicle_start(v);
        let end_node = self.input.vehicle_end(v);

        let mut t = vehicle_start_t.max(self.input.node_time_windows[start_node].0);
        if t > self.input.node_time_windows[start_node].1 {
            return false;
        }
        let mut prev = start_node;
        for &c in seq.iter().chain(std::iter::once(&end_node)) {
            let arrival = t + self.input.service_times[prev] + self.matrix.travel_time(prev, c);
            let (open, close) = self.input.node_time_windows[c];
            t = arrival.max(open);
            if t > close {
                return false;
            }
            prev = c;
        }
        t <= vehicle_end_t
    }

    // ---- cost ----

    fn route_cost(&self, vehicle: usize, seq: &[usize]) -> i64 {
        if seq.is_empty() {
            return 0;
        }
        let path = self.route_path(vehicle, seq);
        let arcs: i64 = path
            .windows(2)
            .map(|leg| self.arc_cost[leg[0]][leg[1]])
            .sum();
        arcs.saturating_add(self.fixed_cost)
    }

    fn cost(&self, candidate: &Candidate) -> i64 {
        let routed: i64 = candidate
            .routes
            .iter()
            .enumerate()
            .map(|(k, seq)| self.route_cost(k, seq))
            .sum();
        routed.saturating_add(
            self.drop_penalty
                .saturating_mul(candidate.dropped.len() as i64),
        )
    }

    // ---- construction ----

    /// Units of insertion: a plain customer is `[c]`, a pickup drags its
    /// delivery along as `[p, d]`.
    fn insertion_units(&self) -> Vec<Vec<usize>> {
        let mut units = Vec::new();
        for c in self.customers() {
            match self.partner[c] {
                Some((delivery, true)) => units.push(vec![c, delivery]),
                Some((_, false)) => {} // deliveries ride with their pickup
                None => units.push(vec![c]),
            }
        }
        units
    }

    fn try_append(&self, vehicle: usize, seq: &mut Vec<usize>, unit: &[usize]) -> bool {
        let len_before = seq.len();
        seq.extend_from_slice(unit);
        if self.route_feasible(vehicle, seq) {
            true
        } else {
            seq.truncate(len_before);
            false
        }
    }

    fn construct_cheapest_arc(&self) -> Candidate {
        let mut remaining = self.insertion_units();
        let mut routes: Vec<Vec<usize>> = vec![Vec::new(); self.input.fleet.len()];

        for k in 0..routes.len() {
            loop {
                let last = routes[k]
                    .last()
                    .copied()
                    .unwrap_or(self.input.vehicle_start(&self.input.fleet[k]));
                // Nearest unit whose appended route stays feasible.
                let mut order: Vec<usize> = (0..remaining.len()).collect();
                order.sort_by_key(|&u| self.arc_cost[last][remaining[u][0]]);

                let mut appended = None;
                for u in order {
                    if self.try_append(k, &mut routes[k], &remaining[u]) {
                        appended = Some(u);
                        break;
                    }
                }
                match appended {
                    Some(u) => {
                        remaining.swap_remove(u);
                    }
                    None => break,
                }
            }
        }

        self.repair(routes, remaining)
    }

    fn construct_savings(&self) -> Candidate {
        // One route per insertion unit, then Clarke-Wright merges in
        // descending savings until the fleet size fits.
        let units = self.insertion_units();
        let mut routes: Vec<Vec<usize>> = units;

        loop {
            let mut best: Option<(i64, usize, usize)> = None;
            for a in 0..routes.len() {
                for b in 0..routes.len() {
                    if a == b || routes[a].is_empty() || routes[b].is_empty() {
                        continue;
                    }
                    let tail = *routes[a].last().unwrap();
                    let head = routes[b][0];
                    let saving = self.arc_cost[tail][self.depot]
                        + self.arc_cost[self.depot][head]
                        - self.arc_cost[tail][head];
                    let must_merge = routes.iter().filter(|r| !r.is_empty()).count()
                        > self.input.fleet.len();
                    if saving <= 0 && !must_merge {
                        continue;
                    }
                    if best.map(|(s, _, _)| saving > s).unwrap_or(true) {
                        // Check feasibility on the first vehicle shape; the
                        // fleet is near-uniform in benchmark instances.
                        let merged: Vec<usize> =
                            routes[a].iter().chain(routes[b].iter()).copied().collect();
                        if self.route_feasible(0, &merged) {
                            best = Some((saving, a, b));
                        }
                    }
                }
            }
            match best {
                Some((_, a, b)) => {
                    let tail = std::mem::take(&mut routes[b]);
                    routes[a].extend(tail);
                    routes.retain(|r| !r.is_empty());
                }
                None => break,
            }
        }

        // Map merged routes onto actual vehicles, feasibility-checked.
        let mut assigned: Vec<Vec<usize>> = vec![Vec::new(); self.input.fleet.len()];
        let mut leftover: Vec<Vec<usize>> = Vec::new();
        let mut used = vec![false; self.input.fleet.len()];
        for route in routes {
            let slot = (0..self.input.fleet.len())
                .find(|&k| !used[k] && self.route_feasible(k, &route));
            match slot {
                Some(k) => {
                    assigned[k] = route;
                    used[k] = true;
                }
                None => leftover.push(route),
            }
        }
        let leftover_units: Vec<Vec<usize>> = leftover
            .into_iter()
            .flat_map(|route| {
                // Break unplaceable routes back into units for repair.
                let mut sub = Vec::new();
                let mut skip: HashSet<usize> = HashSet::new();
                for &c in &route {
                    if skip.contains(&c) {
                        continue;
                    }
                    match self.partner[c] {
                        Some((delivery, true)) => {
                            skip.insert(delivery);
                            sub.push(vec![c, delivery]);
                        }
                        _ => sub.push(vec![c]),
                    }
                }
                sub
            })
            .collect();

        self.repair(assigned, leftover_units)
    }

    /// Cheapest feasible insertion for every unit that construction left
    /// over; what still cannot be placed is dropped.
    fn repair(&self, mut routes: Vec<Vec<usize>>, remaining: Vec<Vec<usize>>) -> Candidate {
        let mut dropped = Vec::new();
        for unit in remaining {
            match self.cheapest_insertion(&routes, &unit) {
                Some((k, seq)) => routes[k] = seq,
                None => dropped.extend(unit),
            }
        }
        Candidate { routes, dropped }
    }

    /// Best (vehicle, new sequence) inserting `unit` anywhere, or None.
    fn cheapest_insertion(
        &self,
        routes: &[Vec<usize>],
        unit: &[usize],
    ) -> Option<(usize, Vec<usize>)> {
        let mut best: Option<(i64, usize, Vec<usize>)> = None;
        for (k, seq) in routes.iter().enumerate() {
            let base = self.route_cost(k, seq);
            for pos in 0..=seq.len() {
                // For a pair, the delivery may sit anywhere at or after the
                // pickup slot.
                let delivery_positions: Vec<usize> = if unit.len() == 2 {
                    (pos..=seq.len()).collect()
                } else {
                    vec![pos]
                };
                for dpos in delivery_positions {
                    let mut trial = seq.clone();
                    trial.insert(pos, unit[0]);
                    if unit.len() == 2 {
                        trial.insert(dpos + 1, unit[1]);
                    }
                    if !self.route_feasible(k, &trial) {
                        continue;
                    }
                    let delta = self.route_cost(k, &trial) - base;
                    if best.as_ref().map(|(d, _, _)| delta < *d).unwrap_or(true) {
                        best = Some((delta, k, trial));
                    }
                }
            }
        }
        best.map(|(_, k, seq)| (k, seq))
    }

    // ---- improvement ----

    fn improve(&self, candidate: &mut Candidate, deadline: Instant) -> bool {
        let mut stopped_early = false;
        let mut improved = true;
        while improved {
            if Instant::now() >= deadline {
                stopped_early = true;
                break;
            }
            improved = self.relocate_pass(candidate)
                || self.two_opt_pass(candidate)
                || self.reinsert_dropped(candidate);
        }
        stopped_early
    }

    fn relocate_pass(&self, candidate: &mut Candidate) -> bool {
        let current = self.cost(candidate);
        for from in 0..candidate.routes.len() {
            let mut skip: HashSet<usize> = HashSet::new();
            for pos in 0..candidate.routes[from].len() {
                let c = candidate.routes[from][pos];
                if skip.contains(&c) {
                    continue;
                }
                let unit: Vec<usize> = match self.partner[c] {
                    Some((delivery, true)) => {
                        skip.insert(delivery);
                        vec![c, delivery]
                    }
                    Some((_, false)) => continue,
                    None => vec![c],
                };

                let mut trial_routes = candidate.routes.clone();
                trial_routes[from].retain(|x| !unit.contains(x));
                if !self.route_feasible(from, &trial_routes[from]) {
                    continue;
                }
                if let Some((k, seq)) = self.cheapest_insertion(&trial_routes, &unit) {
                    trial_routes[k] = seq;
                    let trial = Candidate {
                        routes: trial_routes,
                        dropped: candidate.dropped.clone(),
                    };
                    if self.cost(&trial) < current {
                        *candidate = trial;
                        return true;
                    }
                }
            }
        }
        false
    }

    fn two_opt_pass(&self, candidate: &mut Candidate) -> bool {
        for k in 0..candidate.routes.len() {
            let len = candidate.routes[k].len();
            if len < 3 {
                continue;
            }
            let base = self.route_cost(k, &candidate.routes[k]);
            for i in 0..len - 1 {
                for j in i + 1..len {
                    let mut trial = candidate.routes[k].clone();
                    trial[i..=j].reverse();
                    if self.route_cost(k, &trial) < base && self.route_feasible(k, &trial) {
                        candidate.routes[k] = trial;
                        return true;
                    }
                }
            }
        }
        false
    }

    fn reinsert_dropped(&self, candidate: &mut Candidate) -> bool {
        if candidate.dropped.is_empty() {
            return false;
        }
        let current = self.cost(candidate);
        let dropped = candidate.dropped.clone();
        let mut skip: HashSet<usize> = HashSet::new();
        for &c in &dropped {
            if skip.contains(&c) {
                continue;
            }
            let unit: Vec<usize> = match self.partner[c] {
                Some((delivery, true)) => {
                    skip.insert(delivery);
                    vec![c, delivery]
                }
                Some((_, false)) => continue,
                None => vec![c],
            };
            if let Some((k, seq)) = self.cheapest_insertion(&candidate.routes, &unit) {
                let mut trial = candidate.clone();
                trial.routes[k] = seq;
                trial.dropped.retain(|x| !unit.contains(x));
                if self.cost(&trial) < current {
                    *candidate = trial;
                    return true;
                }
            }
        }
        false
    }
}

// ============ Engine ============

impl SolverEngine for LocalSearchEngine {
    fn name(&self) -> &'static str {
        "localsearch"
    }

    fn requirements(&self) -> EngineRequirements {
        EngineRequirements::Matrix
    }

    fn solve(&self, input: &SolveInput) -> Result<Routes> {
        let matrix = input.matrix.ok_or_else(|| Error::EngineInternal {
            engine: "localsearch".to_string(),
            detail: "canonical matrix is required".to_string(),
        })?;
        if input.fleet.is_empty() {
            return Err(Error::InvalidInput(
                "localsearch: at least one vehicle is required".to_string(),
            ));
        }

        let problem = Problem::new(input, matrix);
        let deadline =
            Instant::now() + Duration::from_secs(input.options.time_limit.clamp(1, 900));

        let mut candidates = match input.options.first_solution.to_lowercase().as_str() {
            "savings" => vec![problem.construct_savings()],
            "path_cheapest_arc" => vec![problem.construct_cheapest_arc()],
            _ => vec![
                problem.construct_cheapest_arc(),
                problem.construct_savings(),
            ],
        };
        if candidates.len() > 1 {
            // Randomized tie-break keeps multi-start restarts from always
            // walking the same basin.
            candidates.shuffle(&mut rand::thread_rng());
        }

        let improve = input.options.metaheuristic.to_lowercase() != "none";
        let mut stopped_early = false;
        let mut best: Option<(i64, Candidate)> = None;
        for mut candidate in candidates {
            if improve {
                stopped_early |= problem.improve(&mut candidate, deadline);
            }
            let cost = problem.cost(&candidate);
            if best.as_ref().map(|(b, _)| cost < *b).unwrap_or(true) {
                best = Some((cost, candidate));
            }
            if Instant::now() >= deadline {
                stopped_early = true;
                break;
            }
        }
        let (_, solution) = best.expect("at least one construction ran");

        if !solution.dropped.is_empty() && !input.options.allow_drop {
            return Err(Error::EngineInternal {
                engine: "localsearch".to_string(),
                detail: format!(
                    "no feasible assignment for {} customer(s): {:?}; enable allow_drop or \
                     relax constraints",
                    solution.dropped.len(),
                    solution.dropped
                ),
            });
        }

        let status = if stopped_early { "stopped_at_time_limit" } else { "success" };
        let mut routes = Vec::new();
        for (k, seq) in solution.routes.iter().enumerate() {
            let vehicle = &input.fleet[k];
            let path = problem.route_path(k, seq);
            if is_depot_only(&path, input.vehicle_start(vehicle), input.vehicle_end(vehicle)) {
                continue;
            }
            routes.push(route_from_path(vehicle, matrix, &path, status));
        }

        let dropped = if input.options.allow_drop {
            let mut d = solution.dropped.clone();
            d.sort_unstable();
            d
        } else {
            Vec::new()
        };

        let message = summarize(
            status,
            &routes,
            input.fleet.len(),
            problem.n,
            problem.depot,
            &dropped,
        );
        Ok(Routes::success(message, routes, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SolveOptions, Vehicle};

    fn matrix_tsp3() -> Matrix {
        Matrix {
            distances: vec![
                vec![0, 5, 7],
                vec![5, 0, 3],
                vec![7, 3, 0],
            ],
            durations: Some(vec![
                vec![0, 300, 420],
                vec![300, 0, 180],
                vec![420, 180, 0],
            ]),
        }
    }

    fn vehicle(id: &str, cap: i64) -> Vehicle {
        Vehicle {
            capacity: Some(vec![cap]),
            ..Vehicle::named(id)
        }
    }

    fn input_for<'a>(
        fleet: &'a [Vehicle],
        matrix: &'a Matrix,
        demands: &'a [i64],
        windows: &'a [(i64, i64)],
        services: &'a [i64],
        vehicle_windows: &'a [(i64, i64)],
        pairs: &'a [crate::model::PickupDeliveryPair],
        options: &'a SolveOptions,
    ) -> SolveInput<'a> {
        SolveInput {
            fleet,
            matrix: Some(matrix),
            depot_index: 0,
            demands,
            node_time_windows: windows,
            service_times: services,
            vehicle_time_windows: vehicle_windows,
            pairs,
            weights: Default::default(),
            waypoints: None,
            options,
        }
    }

    #[test]
    fn tsp3_total_distance_is_fifteen() {
        let matrix = matrix_tsp3();
        let fleet = vec![vehicle("veh-1", 999)];
        let options = SolveOptions { time_limit: 5, ..Default::default() };
        let windows = vec![(0, 1_000_000_000); 3];
        let input = input_for(
            &fleet, &matrix, &[0, 0, 0], &windows, &[0, 0, 0], &[(0, 1_000_000_000)], &[],
            &options,
        );

        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].total_distance, Some(15.0));
        let nodes = routes.routes[0].node_indices();
        assert_eq!(nodes.first(), Some(&0));
        assert_eq!(nodes.last(), Some(&0));
        assert_eq!(nodes.len(), 4);
    }

    #[test]
    fn cvrp3_needs_two_vehicles() {
        let matrix = matrix_tsp3();
        let fleet = vec![vehicle("veh-1", 5), vehicle("veh-2", 5)];
        let options = SolveOptions { time_limit: 5, ..Default::default() };
        let windows = vec![(0, 1_000_000_000); 3];
        let input = input_for(
            &fleet, &matrix, &[0, 4, 4], &windows, &[0, 0, 0],
            &[(0, 1_000_000_000); 2], &[], &options,
        );

        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        assert_eq!(routes.routes.len(), 2);
        // Each vehicle serves exactly one customer.
        let mut served: Vec<usize> = routes
            .routes
            .iter()
            .flat_map(|r| r.node_indices())
            .filter(|&n| n != 0)
            .collect();
        served.sort_unstable();
        assert_eq!(served, vec![1, 2]);
    }

    #[test]
    fn vrptw3_waits_for_the_late_window() {
        let matrix = matrix_tsp3();
        let fleet = vec![vehicle("veh-1", 999)];
        let options = SolveOptions { time_limit: 5, ..Default::default() };
        let windows = vec![(0, 3600), (0, 3600), (600, 3600)];
        let input = input_for(
            &fleet, &matrix, &[0, 0, 0], &windows, &[120, 120, 120],
            &[(0, 1_000_000_000)], &[], &options,
        );

        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        assert_eq!(routes.routes.len(), 1);
        let served: HashSet<usize> = routes.routes[0]
            .node_indices()
            .into_iter()
            .filter(|&n| n != 0)
            .collect();
        assert_eq!(served.len(), 2);
    }

    #[test]
    fn pdptw3_keeps_pickup_before_delivery_in_one_tour() {
        let matrix = matrix_tsp3();
        let fleet = vec![vehicle("veh-1", 5), vehicle("veh-2", 5)];
        let options = SolveOptions { time_limit: 5, ..Default::default() };
        let windows = vec![(0, 1_000_000_000); 3];
        let pairs = vec![crate::model::PickupDeliveryPair {
            pickup: 1,
            delivery: 2,
            quantity: None,
        }];
        let input = input_for(
            &fleet, &matrix, &[0, 4, -4], &windows, &[0, 0, 0],
            &[(0, 1_000_000_000); 2], &pairs, &options,
        );

        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        let tour: Vec<&crate::model::Route> = routes
            .routes
            .iter()
            .filter(|r| r.node_indices().iter().any(|&n| n != 0))
            .collect();
        assert_eq!(tour.len(), 1, "pair must ride the same vehicle");
        let nodes = tour[0].node_indices();
        let pickup_pos = nodes.iter().position(|&n| n == 1).unwrap();
        let delivery_pos = nodes.iter().position(|&n| n == 2).unwrap();
        assert!(pickup_pos < delivery_pos);
    }

    #[test]
    fn infeasible_without_drop_is_an_engine_error_and_drop_recovers() {
        let matrix = matrix_tsp3();
        let fleet = vec![vehicle("veh-1", 3)];
        let windows = vec![(0, 1_000_000_000); 3];
        // Customer demands exceed the single vehicle on one tour but their
        // sum fits no better; node 2 can never be served.
        let demands = [0, 3, 4];

        let strict = SolveOptions { time_limit: 5, ..Default::default() };
        let input = input_for(
            &fleet, &matrix, &demands, &windows, &[0, 0, 0], &[(0, 1_000_000_000)], &[],
            &strict,
        );
        assert!(LocalSearchEngine::new().solve(&input).is_err());

        let lenient = SolveOptions { time_limit: 5, allow_drop: true, ..Default::default() };
        let input = input_for(
            &fleet, &matrix, &demands, &windows, &[0, 0, 0], &[(0, 1_000_000_000)], &[],
            &lenient,
        );
        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        assert_eq!(routes.dropped, vec![2]);
        let served: Vec<usize> = routes
            .routes
            .iter()
            .flat_map(|r| r.node_indices())
            .filter(|&n| n != 0)
            .collect();
        assert_eq!(served, vec![1]);
    }

    #[test]
    fn single_node_instance_yields_no_routes() {
        let matrix = Matrix { distances: vec![vec![0]], durations: None };
        let fleet = vec![vehicle("veh-1", 10)];
        let options = SolveOptions { time_limit: 5, ..Default::default() };
        let input = input_for(
            &fleet, &matrix, &[0], &[(0, 1_000_000_000)], &[0], &[(0, 1_000_000_000)], &[],
            &options,
        );
        let routes = LocalSearchEngine::new().solve(&input).unwrap();
        assert!(routes.routes.is_empty());
    }
}
