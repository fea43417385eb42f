//! Solomon-style `.txt` parser: a VEHICLE header (count, capacity) followed
//! by a 7-column CUSTOMER table. All time fields in the file are minutes and
//! are converted to seconds (×60) on the way in; the depot is the row with
//! id 0 (or the smallest id) and its window is widened to cover the whole
//! horizon.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::instance::{
    infer_vehicle_count, uniform_fleet, CoordinateSpaces, Instance, InstanceMeta,
};
use crate::matrix::euclidean::euclidean_matrix;
use crate::matrix::MatrixResult;
use crate::model::{TimeWindow, Waypoint};

pub const SECONDS_PER_MIN: i64 = 60;

struct CustomerRow {
    id: usize,
    x: f64,
    y: f64,
    demand: i64,
    ready: i64,
    due: i64,
    service: i64,
}

fn numeric_tokens(line: &str) -> Vec<f64> {
    line.split_whitespace()
        .filter_map(|tok| tok.parse().ok())
        .collect()
}

fn find_vehicle_block(lines: &[&str]) -> (Option<usize>, Option<i64>) {
    for (i, line) in lines.iter().take(60).enumerate() {
        if !line.to_uppercase().contains("VEHICLE") {
            continue;
        }
        for candidate in lines.iter().skip(i).take(12) {
            let nums = numeric_tokens(candidate);
            if nums.len() >= 2 {
                return (Some(nums[0] as usize), Some(nums[1] as i64));
            }
        }
        break;
    }
    (None, None)
}

fn find_data_start(lines: &[&str]) -> Option<usize> {
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if upper.contains("CUST") && upper.contains("XCOORD") {
            return Some(i + 1);
        }
    }
    None
}

pub fn parse(text: &str, compute_matrix: bool) -> Result<Instance> {
    let lines: Vec<&str> = text.lines().collect();

    let (vehicle_header, capacity_header) = find_vehicle_block(&lines);
    let capacity = capacity_header.filter(|&c| c > 0).unwrap_or(200);

    let start = find_data_start(&lines)
        .ok_or_else(|| Error::InvalidInput("solomon: customer header line not found".to_string()))?;

    let mut rows: Vec<CustomerRow> = Vec::new();
    for line in &lines[start..] {
        let nums = numeric_tokens(line);
        if nums.len() < 7 {
            continue;
        }
        rows.push(CustomerRow {
            id: nums[0] as usize,
            x: nums[1],
            y: nums[2],
            demand: nums[3].round() as i64,
            ready: nums[4].round() as i64,
            due: nums[5].round() as i64,
            service: nums[6].round() as i64,
        });
    }

    if rows.is_empty() {
        return Err(Error::InvalidInput(format!(
            "solomon: no customer rows parsed; header was {:?}",
            lines.iter().take(4).collect::<Vec<_>>()
        )));
    }

    // Rows are keyed by id; sparse ids leave default gaps so the matrix index
    // always equals the file id.
    let n = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
    let mut coords = vec![(0.0, 0.0); n];
    let mut demands = vec![0i64; n];
    let mut ready = vec![0i64; n];
    let mut due = vec![1_000_000_000i64; n];
    let mut service = vec![0i64; n];

    for row in &rows {
        coords[row.id] = (row.x, row.y);
        demands[row.id] = row.demand;
        // An inverted window is swapped, not clamped.
        let (lo, hi) = if row.due < row.ready {
            (row.due, row.ready)
        } else {
            (row.ready, row.due)
        };
        ready[row.id] = lo;
        due[row.id] = hi;
        service[row.id] = row.service;
    }

    let depot_index = if rows.iter().any(|r| r.id == 0) {
        0
    } else {
        rows.iter().map(|r| r.id).min().unwrap_or(0)
    };

    // Depot window covers the widest extent of the instance.
    let max_due = due.iter().copied().max().unwrap_or(1_000_000_000);
    ready[depot_index] = ready[depot_index].min(0);
    due[depot_index] = due[depot_index].max(max_due);

    let waypoints: Vec<Waypoint> = (0..n)
        .map(|i| Waypoint {
            id: i.to_string(),
            x: Some(coords[i].0),
            y: Some(coords[i].1),
            lat: Some(coords[i].0),
            lon: Some(coords[i].1),
            location: None,
            demand: vec![demands[i]],
            service_time: service[i] * SECONDS_PER_MIN,
            time_window: Some(TimeWindow {
                start: ready[i] * SECONDS_PER_MIN,
                end: due[i] * SECONDS_PER_MIN,
            }),
            depot: i == depot_index,
        })
        .collect();

    let total_demand: i64 = demands.iter().sum();
    let vehicle_count = vehicle_header
        .filter(|&v| v > 0)
        .unwrap_or_else(|| infer_vehicle_count(total_demand, capacity, n));

    let matrix = if compute_matrix {
        let points: Vec<(f64, f64)> = coords.to_vec();
        let distances = euclidean_matrix(&points);
        // Solomon speed is one distance unit per minute; durations land in
        // seconds like every other time field.
        let durations = distances
            .iter()
            .map(|row| row.iter().map(|d| (d * 60.0).round()).collect())
            .collect();
        Some(MatrixResult {
            distances,
            durations: Some(durations),
        })
    } else {
        None
    };

    Ok(Instance {
        edge_weight_type: "EUC_2D".to_string(),
        coordinate_spaces: CoordinateSpaces::euclidean(),
        waypoints,
        fleet: uniform_fleet(vehicle_count, capacity, depot_index),
        depot_index,
        matrix,
        meta: InstanceMeta {
            format: "solomon".to_string(),
            source: None,
            vehicle_count,
            capacity,
            loaded_at: Utc::now(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "C101\n\n\
VEHICLE\n\
NUMBER     CAPACITY\n\
  2          200\n\n\
CUSTOMER\n\
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE TIME\n\n\
    0      40         50          0          0       1236          0\n\
    1      45         68         10        912        967         90\n\
    2      45         70         30        825        870         90\n";

    #[test]
    fn all_time_fields_are_minutes_times_sixty() {
        let instance = parse(SAMPLE, false).unwrap();
        assert_eq!(instance.waypoints.len(), 3);

        let wp1 = &instance.waypoints[1];
        let tw = wp1.time_window.unwrap();
        assert_eq!(tw.start, 912 * 60);
        assert_eq!(tw.end, 967 * 60);
        assert_eq!(wp1.service_time, 90 * 60);

        let depot_tw = instance.waypoints[0].time_window.unwrap();
        assert_eq!(depot_tw.start, 0);
        assert_eq!(depot_tw.end, 1236 * 60);
    }

    #[test]
    fn vehicle_header_and_depot_are_read() {
        let instance = parse(SAMPLE, false).unwrap();
        assert_eq!(instance.fleet.vehicles.len(), 2);
        assert_eq!(instance.meta.capacity, 200);
        assert_eq!(instance.depot_index, 0);
        assert!(instance.waypoints[0].depot);
    }

    #[test]
    fn computed_durations_are_distance_times_sixty() {
        let instance = parse(SAMPLE, true).unwrap();
        let matrix = instance.matrix.unwrap();
        let durations = matrix.durations.unwrap();
        let expected = (matrix.distances[0][1] * 60.0).round();
        assert_eq!(durations[0][1], expected);
        assert_eq!(durations[0][0], 0.0);
    }

    #[test]
    fn inverted_windows_are_swapped() {
        let text = "VEHICLE\nNUMBER CAPACITY\n1 100\n\
CUSTOMER\nCUST NO. XCOORD. YCOORD. DEMAND READY TIME DUE DATE SERVICE TIME\n\
0 0 0 0 0 1000 0\n\
1 5 5 10 200 100 10\n";
        let instance = parse(text, false).unwrap();
        let tw = instance.waypoints[1].time_window.unwrap();
        assert_eq!((tw.start, tw.end), (100 * 60, 200 * 60));
    }

    #[test]
    fn depot_defaults_to_smallest_id_when_zero_is_absent() {
        let text = "VEHICLE\nNUMBER CAPACITY\n1 100\n\
CUSTOMER\nCUST NO. XCOORD. YCOORD. DEMAND READY TIME DUE DATE SERVICE TIME\n\
2 0 0 0 0 1000 0\n\
3 5 5 10 0 500 10\n";
        let instance = parse(text, false).unwrap();
        assert_eq!(instance.depot_index, 2);
        assert!(instance.waypoints[2].depot);
    }

    #[test]
    fn missing_customer_table_is_an_input_error() {
        assert!(matches!(
            parse("VEHICLE\n1 100\n", false),
            Err(Error::InvalidInput(_))
        ));
    }
}
