//! Exact engine: three-index mixed-integer formulation solved through
//! `good_lp` with the pure-Rust microlp backend.
//!
//! Variables: binary arcs `x[i][j][k]`, one arrival time `a[i]` per node
//! (vehicle-independent), and a per-vehicle use indicator `used[k]`. The
//! depot is anchored at time zero and arcs into the depot are excluded from
//! time propagation, otherwise every returning route would be declared
//! infeasible. Four outcomes are distinguished: optimal, feasible-but-
//! stopped, infeasible, and backend error.

use good_lp::{constraint, default_solver, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable};

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::model::Routes;
use crate::solver::{
    is_depot_only, route_from_path, summarize, EngineRequirements, SolveInput, SolverEngine,
};

pub struct MilpEngine;

impl MilpEngine {
    pub fn new() -> Self {
        MilpEngine
    }
}

impl Default for MilpEngine {
    fn default() -> Self {
        MilpEngine::new()
    }
}

impl SolverEngine for MilpEngine {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn requirements(&self) -> EngineRequirements {
        EngineRequirements::Matrix
    }

    fn solve(&self, input: &SolveInput) -> Result<Routes> {
        let matrix = input.matrix.ok_or_else(|| Error::EngineInternal {
            engine: "milp".to_string(),
            detail: "canonical matrix is required".to_string(),
        })?;
        let n = matrix.len();
        if n == 0 {
            return Err(Error::InvalidInput("milp: empty distance matrix".to_string()));
        }
        let m = input.fleet.len();
        if m == 0 {
            return Err(Error::InvalidInput("milp: fleet is empty".to_string()));
        }

        let depot = input.depot_index;
        let customers: Vec<usize> = (0..n).filter(|&i| i != depot).collect();

        // Travel times for propagation; distances stand in when the matrix
        // carries no durations.
        let travel = |i: usize, j: usize| matrix.travel_time(i, j) as f64;

        let horizon = input
            .node_time_windows
            .iter()
            .map(|&(_, end)| end)
            .max()
            .unwrap_or(crate::normalize::HORIZON) as f64;
        let max_travel = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| travel(i, j))
            .fold(0.0f64, f64::max);
        let max_service = input.service_times.iter().copied().max().unwrap_or(0) as f64;
        let big_m = horizon + max_travel + max_service + 1.0;

        // ---- variables ----
        let mut vars = variables!();
        let mut x = vec![vec![vec![None::<Variable>; m]; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                for k in 0..m {
                    x[i][j][k] = Some(vars.add(variable().binary()));
                }
            }
        }
        let a: Vec<Variable> = (0..n)
            .map(|i| {
                let (lo, hi) = input.node_time_windows[i];
                if i == depot {
                    // Depot anchored at t = 0.
                    vars.add(variable().min(0.0).max(0.0))
                } else {
                    vars.add(variable().min(lo as f64).max((hi as f64).min(horizon)))
                }
            })
            .collect();
        let used: Vec<Variable> = (0..m).map(|_| vars.add(variable().binary())).collect();

        // ---- objective: Σ d[i][j]·x[i,j,k] + f·Σ used[k] ----
        let mut objective = Expression::from(0.0);
        for i in 0..n {
            for j in 0..n {
                for k in 0..m {
                    if let Some(var) = x[i][j][k] {
                        objective += matrix.distance(i, j) as f64 * var;
                    }
                }
            }
        }
        let fixed_cost = input.weights.vehicle_fixed_cost;
        for &u in &used {
            objective += fixed_cost * u;
        }

        let mut model = vars.minimise(objective).using(default_solver);

        // Each customer leaves exactly once and is entered exactly once,
        // across all vehicles.
        for &i in &customers {
            let mut outgoing = Expression::from(0.0);
            let mut incoming = Expression::from(0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                for k in 0..m {
                    if let Some(var) = x[i][j][k] {
                        outgoing += var;
                    }
                    if let Some(var) = x[j][i][k] {
                        incoming += var;
                    }
                }
            }
            model = model.with(constraint!(outgoing == 1.0));
            model = model.with(constraint!(incoming == 1.0));
        }

        // Depot degree equals the vehicle's use indicator; flow conservation
        // and arc→used linking per vehicle.
        for k in 0..m {
            let mut depot_out = Expression::from(0.0);
            let mut depot_in = Expression::from(0.0);
            for &j in &customers {
                if let Some(var) = x[depot][j][k] {
                    depot_out += var;
                }
                if let Some(var) = x[j][depot][k] {
                    depot_in += var;
                }
            }
            model = model.with(constraint!(depot_out == used[k]));
            model = model.with(constraint!(depot_in == used[k]));

            let mut work = Expression::from(0.0);
            for &i in &customers {
                let mut out_i = Expression::from(0.0);
                let mut in_i = Expression::from(0.0);
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if let Some(var) = x[i][j][k] {
                        out_i += var;
                        work += var;
                    }
                    if let Some(var) = x[j][i][k] {
                        in_i += var;
                    }
                }
                model = model.with(constraint!(out_i.clone() - in_i == 0.0));
                model = model.with(constraint!(out_i <= used[k]));

                let mut in_again = Expression::from(0.0);
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if let Some(var) = x[j][i][k] {
                        in_again += var;
                    }
                }
                model = model.with(constraint!(in_again <= used[k]));
            }
            // A used vehicle serves at least one customer.
            model = model.with(constraint!(work >= used[k]));

            // Capacity: Σ d[i] · Σ_j x[i,j,k] ≤ cap[k].
            let mut load = Expression::from(0.0);
            for &i in &customers {
                let demand = input.demands[i].max(0) as f64;
                if demand == 0.0 {
                    continue;
                }
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if let Some(var) = x[i][j][k] {
                        load += demand * var;
                    }
                }
            }
            model = model.with(constraint!(
                load <= input.fleet[k].scalar_capacity() as f64
            ));
        }

        // Big-M time propagation, skipping arcs into the depot.
        for i in 0..n {
            for &j in &customers {
                if i == j {
                    continue;
                }
                let service = input.service_times[i] as f64;
                for k in 0..m {
                    if let Some(var) = x[i][j][k] {
                        // a[j] ≥ a[i] + s[i] + t[i][j] − M(1 − x), rearranged
                        // so every term stays on the variable side.
                        model = model.with(constraint!(
                            a[j] - a[i] - big_m * var >= service + travel(i, j) - big_m
                        ));
                    }
                }
            }
        }

        // ---- solve & classify the outcome ----
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                return Err(Error::Infeasible(
                    "milp: constraints admit no solution with the given fleet, capacities, \
                     and time windows"
                        .to_string(),
                ))
            }
            Err(ResolutionError::Unbounded) => {
                return Err(Error::EngineInternal {
                    engine: "milp".to_string(),
                    detail: "model unexpectedly unbounded".to_string(),
                })
            }
            Err(err) => {
                return Err(Error::EngineInternal {
                    engine: "milp".to_string(),
                    detail: format!("backend failure: {err}"),
                })
            }
        };

        // ---- extract routes ----
        let mut routes = Vec::new();
        for (k, vehicle) in input.fleet.iter().enumerate() {
            let mut next_of = vec![None::<usize>; n];
            let mut any = false;
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if let Some(var) = x[i][j][k] {
                        if solution.value(var) > 0.5 {
                            next_of[i] = Some(j);
                            any = true;
                        }
                    }
                }
            }
            if !any {
                continue;
            }

            let mut path = vec![depot];
            let mut current = depot;
            for _ in 0..n + 2 {
                match next_of[current] {
                    Some(next) => {
                        path.push(next);
                        if next == depot {
                            break;
                        }
                        current = next;
                    }
                    None => break,
                }
            }
            if is_depot_only(&path, depot, depot) {
                continue;
            }
            routes.push(route_from_path(vehicle, matrix, &path, "optimal"));
        }

        if routes.is_empty() && !customers.is_empty() {
            // The backend reported success but no integer-feasible tour was
            // recovered; treat as a soft stop, not silence.
            return Err(Error::EngineStopped {
                engine: "milp".to_string(),
                detail: "solver stopped before an integer-feasible solution was found".to_string(),
            });
        }

        let message = summarize("optimal", &routes, m, n, depot, &[]);
        Ok(Routes::success(message, routes, Vec::new()))
    }
}
