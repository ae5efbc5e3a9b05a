//! Best-first search over a [`NavGraph`].

use std::cmp::Ordering;

use glam::Vec3A;

use crate::{
    config::{PathfinderConfig, PathfinderConfigError, ReopenPolicy},
    geometry::GeometryQuery,
    graph::{NavGraph, NavNodeKey},
    heap::PriorityQueue,
    smoother::PathSmoother,
};

/// A route through a [`NavGraph`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// The waypoints from start to goal, both inclusive.
    pub nodes: Vec<NavNodeKey>,
    /// The accumulated search cost of reaching the goal, before any smoothing.
    pub cost: f32,
}

impl Path {
    /// The number of waypoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the path has no waypoints.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The start of the path.
    #[inline]
    pub fn first(&self) -> Option<NavNodeKey> {
        self.nodes.first().copied()
    }

    /// The goal of the path.
    #[inline]
    pub fn last(&self) -> Option<NavNodeKey> {
        self.nodes.last().copied()
    }

    /// The world positions of the waypoints. Waypoints missing from `graph` are skipped.
    pub fn positions<'a>(&'a self, graph: &'a NavGraph) -> impl Iterator<Item = Vec3A> + 'a {
        self.nodes.iter().filter_map(|&key| graph.position(key))
    }

    /// The summed straight-line distance between consecutive waypoints.
    pub fn world_length(&self, graph: &NavGraph) -> f32 {
        let positions: Vec<_> = self.positions(graph).collect();
        positions
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

impl IntoIterator for Path {
    type Item = NavNodeKey;
    type IntoIter = std::vec::IntoIter<NavNodeKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a NavNodeKey;
    type IntoIter = std::slice::Iter<'a, NavNodeKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Counters of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    /// How many nodes were taken from the open list and expanded.
    pub expanded: usize,
    /// How many entries were pushed onto the open list.
    pub pushed: usize,
    /// How many node visits were recorded for cleanup, duplicates included.
    pub affected: usize,
}

/// A snapshot of a node's fitness at the time it was queued.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    node: NavNodeKey,
    fitness: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fitness
            .total_cmp(&other.fitness)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Finds paths through a [`NavGraph`] with an A*-style best-first search.
///
/// The search keeps its bookkeeping on the nodes of the graph itself and restores it before
/// returning, so a graph can only be searched by one `generate_path` call at a time.
/// Taking the graph by `&mut` enforces this.
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    /// The settings used for every search.
    pub config: PathfinderConfig,
    last_stats: SearchStats,
}

impl PathFinder {
    /// Creates a pathfinder with the given settings.
    ///
    /// Settings outside their documented limits are logged as a warning and used anyway.
    /// Use [`PathFinder::try_new`] to reject them instead.
    pub fn new(config: PathfinderConfig) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!("Creating pathfinder with invalid config: {err}");
        }
        Self {
            config,
            last_stats: SearchStats::default(),
        }
    }

    /// Creates a pathfinder with the given settings after checking them with
    /// [`PathfinderConfig::validate`].
    pub fn try_new(config: PathfinderConfig) -> Result<Self, PathfinderConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            last_stats: SearchStats::default(),
        })
    }

    /// The counters of the most recent [`PathFinder::generate_path`] call.
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Searches a path from `start` to `goal`.
    ///
    /// Returns `None` if the goal cannot be reached, including when `start == goal`,
    /// or if the search expands more nodes than [`PathfinderConfig::max_expanded_nodes`] allows.
    /// If `smooth` is set, redundant waypoints are removed with a [`PathSmoother`] that
    /// checks shortcuts against `geometry`.
    ///
    /// Every node touched by the search has its [`SearchState`](crate::SearchState) reset
    /// before this returns, whatever the outcome.
    pub fn generate_path<G: GeometryQuery + ?Sized>(
        &mut self,
        graph: &mut NavGraph,
        geometry: &G,
        start: NavNodeKey,
        goal: NavNodeKey,
        smooth: bool,
    ) -> Option<Path> {
        let mut stats = SearchStats::default();
        let mut affected = Vec::new();

        let result = self.search(graph, start, goal, &mut affected, &mut stats);

        let result = result.map(|mut path| {
            tracing::debug!("Path found: {} nodes, cost {}", path.len(), path.cost);
            if smooth {
                let before = path.len();
                self.smooth_path(graph, geometry, &mut path);
                tracing::debug!("Smoothed path from {before} to {} nodes", path.len());
            }
            path
        });
        if result.is_none() {
            tracing::debug!("No path found after expanding {} nodes", stats.expanded);
        }

        stats.affected = affected.len();
        reset_node_variables(graph, &affected);
        self.last_stats = stats;
        result
    }

    /// Removes redundant waypoints from `path` in place.
    pub fn smooth_path<G: GeometryQuery + ?Sized>(
        &self,
        graph: &NavGraph,
        geometry: &G,
        path: &mut Path,
    ) {
        PathSmoother::new(&self.config, geometry).smooth(graph, &mut path.nodes);
    }

    fn search(
        &self,
        graph: &mut NavGraph,
        start: NavNodeKey,
        goal: NavNodeKey,
        affected: &mut Vec<NavNodeKey>,
        stats: &mut SearchStats,
    ) -> Option<Path> {
        let Some(goal_position) = graph.position(goal) else {
            tracing::error!("Goal node {goal:?} is not part of the navigation graph");
            return None;
        };
        let mut open_list = PriorityQueue::with_capacity(graph.len());
        let mut neighbors = Vec::new();

        let Some(start_node) = graph.node_mut(start) else {
            tracing::error!("Start node {start:?} is not part of the navigation graph");
            return None;
        };
        let state = &mut start_node.search;
        state.heuristic_cost_to_goal = start_node.position.distance(goal_position);
        state.fitness = state.lowest_cost_from_start + state.heuristic_cost_to_goal;
        state.open = true;
        open_list.push(OpenEntry {
            node: start,
            fitness: state.fitness,
        });
        stats.pushed += 1;
        // Recorded up front so an aborted search still cleans up the start
        affected.push(start);

        while let Some(entry) = open_list.pop() {
            let current = entry.node;
            let Some(current_node) = graph.node_mut(current) else {
                continue;
            };
            if current_node.search.closed {
                // Outdated entry of a requeued node
                continue;
            }
            if let Some(max) = self.config.max_expanded_nodes {
                if stats.expanded >= max {
                    tracing::debug!("Aborting search after expanding {max} nodes");
                    return None;
                }
            }

            affected.push(current);
            current_node.search.open = false;
            current_node.search.closed = true;
            stats.expanded += 1;

            let current_position = current_node.position;
            let current_cost = current_node.search.lowest_cost_from_start;
            neighbors.clear();
            neighbors.extend_from_slice(&current_node.neighbors);
            tracing::trace!(
                "Expanding {current:?} with {} neighbors, cost {current_cost}",
                neighbors.len()
            );

            for &neighbor in &neighbors {
                affected.push(neighbor);
                let Some(node) = graph.node_mut(neighbor) else {
                    continue;
                };
                if node.search.closed
                    || node.move_modifier >= self.config.untraversable_move_modifier
                {
                    continue;
                }

                let step = current_position.distance(node.position);
                let state = &mut node.search;
                if !state.open {
                    state.parent = Some(current);
                    state.lowest_cost_from_start = current_cost + step;
                    state.heuristic_cost_to_goal = node.position.distance(goal_position);
                    state.fitness = state.lowest_cost_from_start
                        + state.heuristic_cost_to_goal
                        + node.move_modifier;
                    state.open = true;
                    open_list.push(OpenEntry {
                        node: neighbor,
                        fitness: state.fitness,
                    });
                    stats.pushed += 1;
                } else if state.parent != Some(current) {
                    match self.config.reopen_policy {
                        ReopenPolicy::KeepPriority => {
                            // The fitness is left as it was, so the node keeps its place in the open list.
                            let candidate = current_cost + step + node.move_modifier;
                            if state.lowest_cost_from_start > candidate {
                                state.lowest_cost_from_start = candidate;
                                state.parent = Some(current);
                            }
                        }
                        ReopenPolicy::Requeue => {
                            let candidate = current_cost + step;
                            if state.lowest_cost_from_start > candidate {
                                state.lowest_cost_from_start = candidate;
                                state.parent = Some(current);
                                state.heuristic_cost_to_goal =
                                    node.position.distance(goal_position);
                                state.fitness =
                                    candidate + state.heuristic_cost_to_goal + node.move_modifier;
                                open_list.push(OpenEntry {
                                    node: neighbor,
                                    fitness: state.fitness,
                                });
                                stats.pushed += 1;
                            }
                        }
                    }
                }
                node.search.closed = false;

                if neighbor == goal {
                    return trace_path(graph, goal);
                }
            }
        }

        None
    }
}

/// Follows the parents from `goal` back to the start.
fn trace_path(graph: &NavGraph, goal: NavNodeKey) -> Option<Path> {
    let cost = graph.node(goal)?.search.lowest_cost_from_start;
    let mut nodes = Vec::new();
    let mut trace = Some(goal);
    while let Some(key) = trace {
        if nodes.len() > graph.len() {
            tracing::error!("Parent links of {goal:?} form a cycle, discarding path");
            return None;
        }
        nodes.push(key);
        trace = graph.node(key).and_then(|node| node.search.parent);
    }
    nodes.reverse();
    Some(Path { nodes, cost })
}

/// Restores the [`SearchState`](crate::SearchState) of every listed node to its default.
///
/// Nodes may be listed more than once. Keys that are not part of `graph` are ignored.
pub fn reset_node_variables(graph: &mut NavGraph, affected: &[NavNodeKey]) {
    for &key in affected {
        if let Some(node) = graph.node_mut(key) {
            node.search.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::OpenSky;

    fn line(count: usize) -> (NavGraph, Vec<NavNodeKey>) {
        let mut graph = NavGraph::new();
        let keys: Vec<_> = (0..count)
            .map(|i| graph.add_node([i as f32, 0.0, 0.0]))
            .collect();
        for pair in keys.windows(2) {
            graph.connect(pair[0], pair[1]).unwrap();
        }
        (graph, keys)
    }

    #[test]
    fn line_without_smoothing() {
        let (mut graph, keys) = line(5);
        let mut pathfinder = PathFinder::default();
        let path = pathfinder
            .generate_path(&mut graph, &OpenSky, keys[0], keys[4], false)
            .unwrap();
        assert_eq!(path.nodes, keys);
        assert_relative_eq!(path.cost, 4.0);
        assert_relative_eq!(path.world_length(&graph), 4.0);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn line_with_smoothing() {
        let (mut graph, keys) = line(5);
        let mut pathfinder = PathFinder::default();
        let path = pathfinder
            .generate_path(&mut graph, &OpenSky, keys[0], keys[4], true)
            .unwrap();
        assert_eq!(path.nodes, vec![keys[0], keys[4]]);
        assert_relative_eq!(path.cost, 4.0);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn disconnected_goal() {
        let (mut graph, keys) = line(3);
        let island = graph.add_node([10.0, 0.0, 0.0]);
        let mut pathfinder = PathFinder::default();
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[0], island, false);
        assert_eq!(path, None);
        assert!(graph.is_search_state_clean());
        assert_eq!(pathfinder.last_stats().expanded, 3);
    }

    #[test]
    fn start_equal_to_goal_is_not_found() {
        let (mut graph, keys) = line(3);
        let mut pathfinder = PathFinder::default();
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[1], keys[1], false);
        assert_eq!(path, None);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn untraversable_node_blocks_corridor() {
        let (mut graph, keys) = line(5);
        graph
            .set_move_modifier(keys[2], PathfinderConfig::UNTRAVERSABLE_MOVE_MODIFIER)
            .unwrap();
        let mut pathfinder = PathFinder::default();
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[0], keys[4], false);
        assert_eq!(path, None);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn untraversable_goal_is_never_reached() {
        let (mut graph, keys) = line(3);
        graph.set_move_modifier(keys[2], 5000.0).unwrap();
        let mut pathfinder = PathFinder::default();
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[0], keys[2], false);
        assert_eq!(path, None);
    }

    #[test]
    fn move_modifier_steers_search() {
        // Two routes of equal length around a square; the upper one is expensive.
        let mut graph = NavGraph::new();
        let start = graph.add_node([0.0, 0.0, 0.0]);
        let upper = graph.add_node([1.0, 0.0, 1.0]);
        let lower = graph.add_node([1.0, 0.0, -1.0]);
        let goal = graph.add_node([2.0, 0.0, 0.0]);
        graph.connect(start, upper).unwrap();
        graph.connect(start, lower).unwrap();
        graph.connect(upper, goal).unwrap();
        graph.connect(lower, goal).unwrap();
        graph.set_move_modifier(upper, 10.0).unwrap();

        let mut pathfinder = PathFinder::default();
        let path = pathfinder
            .generate_path(&mut graph, &OpenSky, start, goal, false)
            .unwrap();
        assert_eq!(path.nodes, vec![start, lower, goal]);
    }

    #[test]
    fn expansion_limit_aborts_and_cleans_up() {
        let (mut graph, keys) = line(10);
        let mut pathfinder = PathFinder::new(PathfinderConfig {
            max_expanded_nodes: Some(3),
            ..Default::default()
        });
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[0], keys[9], false);
        assert_eq!(path, None);
        assert_eq!(pathfinder.last_stats().expanded, 3);
        assert!(graph.is_search_state_clean());

        let mut pathfinder = PathFinder::new(PathfinderConfig {
            max_expanded_nodes: Some(0),
            ..Default::default()
        });
        let path = pathfinder.generate_path(&mut graph, &OpenSky, keys[0], keys[9], false);
        assert_eq!(path, None);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn unknown_keys_return_none() {
        let (mut graph, keys) = line(3);
        let removed = graph.add_node([5.0, 0.0, 0.0]);
        graph.remove_node(removed).unwrap();
        let mut pathfinder = PathFinder::default();
        assert_eq!(
            pathfinder.generate_path(&mut graph, &OpenSky, keys[0], removed, false),
            None
        );
        assert_eq!(
            pathfinder.generate_path(&mut graph, &OpenSky, removed, keys[0], false),
            None
        );
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn stats_are_recorded() {
        let (mut graph, keys) = line(5);
        let mut pathfinder = PathFinder::default();
        pathfinder
            .generate_path(&mut graph, &OpenSky, keys[0], keys[4], false)
            .unwrap();
        let stats = pathfinder.last_stats();
        // Nodes 0..=3 are expanded, the goal is found as a neighbor of 3
        assert_eq!(stats.expanded, 4);
        assert_eq!(stats.pushed, 5);
        assert!(stats.affected >= 5);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut graph, keys) = line(3);
        let node = graph.node_mut(keys[1]).unwrap();
        node.search.open = true;
        node.search.fitness = 3.0;
        node.search.parent = Some(keys[0]);

        reset_node_variables(&mut graph, &[keys[1], keys[1], keys[2]]);
        assert!(graph.is_search_state_clean());
        reset_node_variables(&mut graph, &[keys[1]]);
        assert!(graph.is_search_state_clean());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PathfinderConfig {
            smooth_angle_threshold: f32::NAN,
            ..Default::default()
        };
        let err = PathFinder::try_new(config.clone()).unwrap_err();
        assert!(matches!(err, PathfinderConfigError::SmoothAngleThreshold(v) if v.is_nan()));

        // `new` keeps the settings as given
        let pathfinder = PathFinder::new(config);
        assert!(pathfinder.config.smooth_angle_threshold.is_nan());

        assert!(PathFinder::try_new(PathfinderConfig::default()).is_ok());
    }

    #[test]
    fn path_accessors() {
        let (graph, keys) = line(3);
        let path = Path {
            nodes: keys.clone(),
            cost: 2.0,
        };
        assert_eq!(path.len(), 3);
        assert!(!path.is_empty());
        assert_eq!(path.first(), Some(keys[0]));
        assert_eq!(path.last(), Some(keys[2]));
        assert_eq!(
            path.positions(&graph).collect::<Vec<_>>(),
            vec![
                Vec3A::new(0.0, 0.0, 0.0),
                Vec3A::new(1.0, 0.0, 0.0),
                Vec3A::new(2.0, 0.0, 0.0)
            ]
        );
        assert_eq!((&path).into_iter().count(), 3);
        assert_eq!(path.into_iter().collect::<Vec<_>>(), keys);
    }
}
