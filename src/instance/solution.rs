//! Benchmark solution (`.sol`) parser: `Route #k: i j …` lines plus a
//! `Cost <number>` / `Objective <number>` trailer.
//!
//! Solution files number customers 1..n with the depot left implicit, while
//! parsed instances are 0-based with the depot at index 0, so every node is
//! bumped by one and each route is closed through the depot.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionRoute {
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solution {
    pub routes: Vec<SolutionRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<f64>,
}

pub fn parse(text: &str) -> Result<Solution> {
    let mut solution = Solution::default();

    for line in text.lines() {
        let lower = line.trim().to_lowercase();
        if lower.starts_with("route") {
            if let Some((_, nodes_part)) = line.split_once(':') {
                let customers: Vec<usize> = nodes_part
                    .split_whitespace()
                    .filter_map(|tok| tok.parse::<usize>().ok())
                    .map(|customer| customer + 1)
                    .collect();
                if !customers.is_empty() {
                    let mut nodes = Vec::with_capacity(customers.len() + 2);
                    nodes.push(0);
                    nodes.extend(customers);
                    nodes.push(0);
                    solution.routes.push(SolutionRoute { nodes });
                }
            }
        } else if lower.starts_with("cost") || lower.starts_with("objective") {
            solution.objective = line
                .split_whitespace()
                .last()
                .and_then(|tok| tok.parse().ok());
        }
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_are_bumped_and_closed_through_the_depot() {
        let text = "Route #1: 1 3 5\nRoute #2: 2 4\nCost 827.3\n";
        let solution = parse(text).unwrap();

        assert_eq!(solution.routes.len(), 2);
        assert_eq!(solution.routes[0].nodes, vec![0, 2, 4, 6, 0]);
        assert_eq!(solution.routes[1].nodes, vec![0, 3, 5, 0]);
        assert_eq!(solution.objective, Some(827.3));
    }

    #[test]
    fn objective_trailer_accepts_both_spellings() {
        let cost = parse("Route #1: 1\nCost 10\n").unwrap();
        assert_eq!(cost.objective, Some(10.0));

        let objective = parse("Route #1: 1\nObjective 42.5\n").unwrap();
        assert_eq!(objective.objective, Some(42.5));
    }

    #[test]
    fn empty_file_yields_empty_solution() {
        let solution = parse("").unwrap();
        assert!(solution.routes.is_empty());
        assert!(solution.objective.is_none());
    }
}
