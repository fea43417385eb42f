//! Local graph adapter: routes over a road graph built around the request
//! points instead of calling an online provider.
//!
//! The graph is built once per (centroid-bucket, buffer, network-type) key and
//! kept in a process-wide LRU; construction holds a per-key lock so concurrent
//! requests never build the same graph twice. Each request point is snapped to
//! its nearest graph node through an R-tree, then one Dijkstra per origin runs
//! over each of the two edge weights (length in meters, travel time in
//! seconds). Unreachable pairs are clamped to the finite sentinels.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use priority_queue::PriorityQueue;
use rstar::{primitives::GeomWithData, RTree};

use crate::error::{Error, Result};
use crate::matrix::haversine::haversine_m;
use crate::matrix::{
    MatrixAdapter, MatrixRequest, MatrixResult, UNREACHABLE_DISTANCE_M, UNREACHABLE_DURATION_S,
};
use crate::model::Coordinate;

// ============ Road graph ============

#[derive(Debug, Clone, Copy)]
struct Edge {
    target: usize,
    length_m: i64,
    travel_s: i64,
}

#[derive(Copy, Clone)]
pub enum EdgeWeight {
    Length,
    TravelTime,
}

pub struct RoadGraph {
    coords: Vec<Coordinate>,
    adjacency: Vec<Vec<Edge>>,
    spatial_index: RTree<GeomWithData<[f64; 2], usize>>,
}

impl RoadGraph {
    pub fn new(coords: Vec<Coordinate>, edges: Vec<(usize, usize, i64, i64)>) -> Self {
        let mut adjacency = vec![Vec::new(); coords.len()];
        for (from, to, length_m, travel_s) in edges {
            adjacency[from].push(Edge { target: to, length_m, travel_s });
            adjacency[to].push(Edge { target: from, length_m, travel_s });
        }

        let points: Vec<GeomWithData<[f64; 2], usize>> = coords
            .iter()
            .enumerate()
            .map(|(idx, c)| GeomWithData::new([c.lon, c.lat], idx))
            .collect();

        RoadGraph {
            coords,
            adjacency,
            spatial_index: RTree::bulk_load(points),
        }
    }

    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    /// Nearest graph node to `point`.
    pub fn snap(&self, point: Coordinate) -> Option<usize> {
        self.spatial_index
            .nearest_neighbor(&[point.lon, point.lat])
            .map(|hit| hit.data)
    }

    /// Single-source shortest paths over one edge weight. Unreachable nodes
    /// read `i64::MAX`.
    pub fn shortest_paths(&self, source: usize, weight: EdgeWeight) -> Vec<i64> {
        let n = self.coords.len();
        let mut dist = vec![i64::MAX; n];
        let mut pq: PriorityQueue<usize, Reverse<i64>> = PriorityQueue::new();

        dist[source] = 0;
        pq.push(source, Reverse(0));

        while let Some((u, Reverse(d))) = pq.pop() {
            if d > dist[u] {
                continue;
            }
            for edge in &self.adjacency[u] {
                let w = match weight {
                    EdgeWeight::Length => edge.length_m,
                    EdgeWeight::TravelTime => edge.travel_s,
                };
                let next = d.saturating_add(w);
                if next < dist[edge.target] {
                    dist[edge.target] = next;
                    pq.push(edge.target, Reverse(next));
                }
            }
        }

        dist
    }
}

// ============ Graph construction ============

/// Builds a road graph for a set of request points. The adapter owns a
/// default; tests inject their own (same role as the original's
/// graph-factory hook).
pub trait GraphBuilder: Send + Sync {
    fn build(&self, points: &[Coordinate], buffer_m: u32, network: &str) -> Result<RoadGraph>;
}

fn network_speed_mps(network: &str) -> f64 {
    match network {
        "walk" => 5.0 * 1000.0 / 3600.0,
        "bike" => 15.0 * 1000.0 / 3600.0,
        _ => 50.0 * 1000.0 / 3600.0,
    }
}

/// Default builder: a k-nearest-neighbour road approximation over the request
/// points, with haversine edge lengths and network-dependent travel times.
pub struct KnnGraphBuilder {
    pub neighbours: usize,
}

impl Default for KnnGraphBuilder {
    fn default() -> Self {
        KnnGraphBuilder { neighbours: 3 }
    }
}

impl GraphBuilder for KnnGraphBuilder {
    fn build(&self, points: &[Coordinate], _buffer_m: u32, network: &str) -> Result<RoadGraph> {
        let speed = network_speed_mps(network);
        let n = points.len();
        let mut edges = Vec::new();

        for i in 0..n {
            let mut nearest: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, haversine_m(points[i], points[j])))
                .collect();
            nearest.sort_by(|a, b| a.1.total_cmp(&b.1));

            for &(j, meters) in nearest.iter().take(self.neighbours) {
                if i < j {
                    edges.push((
                        i,
                        j,
                        meters.round() as i64,
                        (meters / speed).round() as i64,
                    ));
                }
            }
        }

        Ok(RoadGraph::new(points.to_vec(), edges))
    }
}

// ============ Process-wide graph LRU ============

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphKey {
    bucket_lat: i32,
    bucket_lon: i32,
    buffer_m: u32,
    network: String,
}

impl GraphKey {
    /// Buckets the centroid at 0.05° (~5 km) so nearby requests share a graph.
    pub fn new(centroid: Coordinate, buffer_m: u32, network: &str) -> Self {
        GraphKey {
            bucket_lat: (centroid.lat * 20.0).round() as i32,
            bucket_lon: (centroid.lon * 20.0).round() as i32,
            buffer_m,
            network: network.to_string(),
        }
    }
}

struct LruInner {
    graphs: HashMap<GraphKey, Arc<RoadGraph>>,
    order: VecDeque<GraphKey>,
    building: HashMap<GraphKey, Arc<Mutex<()>>>,
}

/// Keyed graph store with LRU eviction and per-key build locks.
pub struct GraphLru {
    capacity: usize,
    inner: Mutex<LruInner>,
}

impl GraphLru {
    pub fn new(capacity: usize) -> Self {
        GraphLru {
            capacity: capacity.max(1),
            inner: Mutex::new(LruInner {
                graphs: HashMap::new(),
                order: VecDeque::new(),
                building: HashMap::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_or_build<F>(&self, key: &GraphKey, build: F) -> Result<Arc<RoadGraph>>
    where
        F: FnOnce() -> Result<RoadGraph>,
    {
        if let Some(graph) = self.touch(key) {
            return Ok(graph);
        }

        let gate = {
            let mut inner = self.inner.lock();
            inner
                .building
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock();

        // A concurrent holder of the gate may have finished the build.
        if let Some(graph) = self.touch(key) {
            return Ok(graph);
        }

        let graph = Arc::new(build()?);
        let mut inner = self.inner.lock();
        while inner.graphs.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.graphs.remove(&oldest);
                }
                None => break,
            }
        }
        inner.graphs.insert(key.clone(), graph.clone());
        inner.order.push_back(key.clone());
        inner.building.remove(key);
        Ok(graph)
    }

    fn touch(&self, key: &GraphKey) -> Option<Arc<RoadGraph>> {
        let mut inner = self.inner.lock();
        let graph = inner.graphs.get(key).cloned()?;
        inner.order.retain(|k| k != key);
        inner.order.push_back(key.clone());
        Some(graph)
    }
}

// ============ Adapter ============

pub struct LocalGraphAdapter {
    buffer_m: u32,
    builder: Arc<dyn GraphBuilder>,
    lru: Arc<GraphLru>,
}

impl LocalGraphAdapter {
    pub fn new(buffer_m: u32, lru: Arc<GraphLru>) -> Self {
        LocalGraphAdapter {
            buffer_m,
            builder: Arc::new(KnnGraphBuilder::default()),
            lru,
        }
    }

    /// Test hook: replace the default graph builder.
    pub fn with_builder(mut self, builder: Arc<dyn GraphBuilder>) -> Self {
        self.builder = builder;
        self
    }
}

fn centroid(coords: &[Coordinate]) -> Coordinate {
    let n = coords.len() as f64;
    Coordinate {
        lat: coords.iter().map(|c| c.lat).sum::<f64>() / n,
        lon: coords.iter().map(|c| c.lon).sum::<f64>() / n,
    }
}

#[async_trait]
impl MatrixAdapter for LocalGraphAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        let all: Vec<Coordinate> = request
            .origins
            .iter()
            .chain(request.destinations.iter())
            .copied()
            .collect();
        if all.is_empty() {
            return Err(Error::InvalidInput(
                "local_graph: at least one coordinate is required".to_string(),
            ));
        }

        let network = request.mode.network_type();
        let key = GraphKey::new(centroid(&all), self.buffer_m, network);
        let buffer_m = self.buffer_m;
        let builder = self.builder.clone();
        let graph = self
            .lru
            .get_or_build(&key, || builder.build(&all, buffer_m, network))?;

        let origin_nodes: Vec<Option<usize>> =
            request.origins.iter().map(|&c| graph.snap(c)).collect();
        let dest_nodes: Vec<Option<usize>> =
            request.destinations.iter().map(|&c| graph.snap(c)).collect();

        let n_dest = request.destinations.len();
        let mut distances = vec![vec![UNREACHABLE_DISTANCE_M as f64; n_dest]; origin_nodes.len()];
        let mut durations = vec![vec![UNREACHABLE_DURATION_S as f64; n_dest]; origin_nodes.len()];

        for (i, origin) in origin_nodes.iter().enumerate() {
            let Some(source) = *origin else { continue };
            let lengths = graph.shortest_paths(source, EdgeWeight::Length);
            let times = graph.shortest_paths(source, EdgeWeight::TravelTime);

            for (j, dest) in dest_nodes.iter().enumerate() {
                let Some(target) = *dest else { continue };
                if lengths[target] != i64::MAX {
                    distances[i][j] = lengths[target] as f64;
                }
                if times[target] != i64::MAX {
                    durations[i][j] = times[target] as f64;
                }
            }
        }

        Ok(MatrixResult {
            distances,
            durations: Some(durations),
        })
    }
}
