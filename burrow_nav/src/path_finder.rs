// Background path search service.
//
// `PathFinder` accepts path requests at any time and resolves them over
// subsequent ticks. The flow for one request:
//
// 1. `request()` validates the destination against the current graph. A
//    destination that is out of bounds or not pathable can never succeed, so
//    the callback fires synchronously with an invalid `Path` and nothing is
//    queued.
// 2. Otherwise the request waits in a FIFO queue. Each `process()` call
//    admits at most `admissions_per_tick` queued requests and spawns one
//    search task per request on a dedicated `rayon::ThreadPool`. The task
//    holds a clone of the `Arc<NodeGraph>` it was admitted against, runs A*,
//    builds the smoothed `Path`, and sends `(RequestId, Path)` down an `mpsc`
//    channel.
// 3. The same `process()` call drains the channel with `try_recv` (it never
//    blocks) and invokes the callback of every finished request on the
//    calling thread.
//
// Callbacks never cross threads: they sit in a `BTreeMap` keyed by
// `RequestId` until their result comes back. `cancel()` drops a queued
// request outright or forgets the callback of an in-flight one; the search
// itself still runs to completion and its result is discarded.
//
// See also: `pathfinding.rs` for the A* search each task runs, `path.rs` for
// the `Path` handed to callbacks, `world.rs` which calls `process()` once per
// tick with its current graph snapshot.
//
// **Critical constraint: tick-thread delivery.** No search result touches
// shared state except through a callback invoked from `process()` or
// `flush()` on the owner's thread. Worker tasks only read their graph
// snapshot and write to the channel.

use crate::config::NavConfig;
use crate::node_graph::NodeGraph;
use crate::path::Path;
use crate::pathfinding::{StepCosts, astar};
use crate::types::{NodeId, RequestId, TileCoord};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

/// Completion callback for a path request. Runs on the thread that calls
/// `request`, `process`, or `flush`, never on a search worker.
pub type PathCallback = Box<dyn FnOnce(Path)>;

/// Search parameters copied into each worker task.
#[derive(Clone, Copy, Debug)]
struct SearchParams {
    costs: StepCosts,
    spline_subdivisions: u32,
    spline_tail_trim: f32,
}

/// A request waiting for admission.
#[derive(Debug)]
struct QueuedRequest {
    id: RequestId,
    start: NodeId,
    end: NodeId,
    exclude_start: bool,
}

/// Queue, worker pool, and callback registry for asynchronous path searches.
pub struct PathFinder {
    pool: rayon::ThreadPool,
    params: SearchParams,
    admissions_per_tick: usize,
    next_request_id: u64,
    queue: VecDeque<QueuedRequest>,
    callbacks: BTreeMap<RequestId, PathCallback>,
    in_flight: usize,
    results_tx: Sender<(RequestId, Path)>,
    results_rx: Receiver<(RequestId, Path)>,
}

impl PathFinder {
    /// Create a path finder with its own worker pool of
    /// `config.search_threads` threads.
    pub fn new(config: &NavConfig) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.search_threads.max(1))
            .thread_name(|i| format!("burrow-nav-search-{i}"))
            .build()?;
        let (results_tx, results_rx) = mpsc::channel();
        Ok(Self {
            pool,
            params: SearchParams {
                costs: StepCosts::from_config(config),
                spline_subdivisions: config.spline_subdivisions,
                spline_tail_trim: config.spline_tail_trim,
            },
            admissions_per_tick: config.admissions_per_tick.max(1),
            next_request_id: 0,
            queue: VecDeque::new(),
            callbacks: BTreeMap::new(),
            in_flight: 0,
            results_tx,
            results_rx,
        })
    }

    /// Submit a search from `start` to `end`.
    ///
    /// If `end` is out of bounds or not pathable in `graph`, `callback` runs
    /// before this returns, with an invalid `Path`. With `exclude_start`, the
    /// returned path omits the start tile (unless it is the only tile).
    pub fn request(
        &mut self,
        graph: &NodeGraph,
        start: TileCoord,
        end: TileCoord,
        callback: PathCallback,
        exclude_start: bool,
    ) -> RequestId {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;

        let end_node = graph.node_id(end).filter(|_| graph.is_pathable(end));
        let start_node = graph.node_id(start);
        match (start_node, end_node) {
            (Some(start), Some(end)) => {
                self.callbacks.insert(id, callback);
                self.queue.push_back(QueuedRequest {
                    id,
                    start,
                    end,
                    exclude_start,
                });
            }
            _ => {
                log::trace!("{id}: rejected {start} -> {end} without searching");
                callback(Path::invalid());
            }
        }
        id
    }

    /// Drop a request. Returns `false` if it already completed or never
    /// existed. An in-flight search keeps running but its result is ignored.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        if let Some(pos) = self.queue.iter().position(|r| r.id == id) {
            self.queue.remove(pos);
            self.callbacks.remove(&id);
            return true;
        }
        self.callbacks.remove(&id).is_some()
    }

    /// Admit queued requests against `graph` and deliver every finished
    /// result. Never blocks. Returns the ids whose callbacks ran.
    pub fn process(&mut self, graph: &Arc<NodeGraph>) -> Vec<RequestId> {
        for _ in 0..self.admissions_per_tick {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            self.spawn_search(graph, request);
        }

        let mut completed = Vec::new();
        while let Ok((id, path)) = self.results_rx.try_recv() {
            self.deliver(id, path, &mut completed);
        }
        completed
    }

    /// Admit every queued request and block until all searches finish.
    /// Intended for tools and tests that need a settled state.
    pub fn flush(&mut self, graph: &Arc<NodeGraph>) -> Vec<RequestId> {
        while let Some(request) = self.queue.pop_front() {
            self.spawn_search(graph, request);
        }
        let mut completed = Vec::new();
        while self.in_flight > 0 {
            match self.results_rx.recv() {
                Ok((id, path)) => self.deliver(id, path, &mut completed),
                Err(_) => break,
            }
        }
        completed
    }

    /// Requests queued or in flight.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.in_flight
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    fn spawn_search(&mut self, graph: &Arc<NodeGraph>, request: QueuedRequest) {
        let graph = Arc::clone(graph);
        let tx = self.results_tx.clone();
        let params = self.params;
        self.in_flight += 1;
        self.pool.spawn(move || {
            let path = run_search(&graph, &request, params);
            // The receiver lives as long as the PathFinder; a send error only
            // means the owner was dropped mid-search.
            let _ = tx.send((request.id, path));
        });
    }

    fn deliver(&mut self, id: RequestId, path: Path, completed: &mut Vec<RequestId>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match self.callbacks.remove(&id) {
            Some(callback) => {
                callback(path);
                completed.push(id);
            }
            None => log::debug!("{id}: result discarded, request was cancelled"),
        }
    }
}

/// Run one search to completion on the calling thread.
fn run_search(graph: &NodeGraph, request: &QueuedRequest, params: SearchParams) -> Path {
    let started = Instant::now();
    let result = astar(graph, request.start, request.end, params.costs);
    let elapsed = started.elapsed();
    match result {
        Some(found) => {
            log::trace!(
                "{}: found {} nodes, cost {}, expanded {} in {:?}",
                request.id,
                found.nodes.len(),
                found.total_cost,
                found.expanded,
                elapsed
            );
            let mut tiles: Vec<TileCoord> =
                found.nodes.iter().map(|&n| graph.node(n).coord).collect();
            // Trim before smoothing so waypoints and spline share a first point.
            if request.exclude_start && tiles.len() > 1 {
                tiles.remove(0);
            }
            Path::from_tiles(
                tiles,
                params.spline_subdivisions,
                params.spline_tail_trim,
                elapsed,
            )
        }
        None => {
            log::trace!("{}: no route after {:?}", request.id, elapsed);
            Path::from_tiles(
                Vec::new(),
                params.spline_subdivisions,
                params.spline_tail_trim,
                elapsed,
            )
        }
    }
}
