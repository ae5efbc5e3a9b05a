//! The navigation graph searched by the [`PathFinder`](crate::PathFinder).
//!
//! Nodes live in a [`SlotMap`] and are addressed by [`NavNodeKey`]s, which stay valid
//! while other nodes are added or removed. Every node carries its own [`SearchState`],
//! which the pathfinder writes during a search and restores to its default before returning.

use glam::Vec3A;
use slotmap::SlotMap;
use thiserror::Error;

slotmap::new_key_type! {
    /// A stable handle to a node in a [`NavGraph`].
    pub struct NavNodeKey;
}

/// A point an agent can walk to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavNode {
    /// The world position of the node.
    pub position: Vec3A,
    /// The nodes that can be reached directly from this node, in search order.
    pub(crate) neighbors: Vec<NavNodeKey>,
    /// Additional cost for entering this node. `[Limit: >= 0]`
    ///
    /// Values at or above [`PathfinderConfig::untraversable_move_modifier`](crate::PathfinderConfig::untraversable_move_modifier)
    /// make the node impassable.
    pub(crate) move_modifier: f32,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub(crate) search: SearchState,
}

impl NavNode {
    /// The nodes that can be reached directly from this node.
    #[inline]
    pub fn neighbors(&self) -> &[NavNodeKey] {
        &self.neighbors
    }

    /// The additional cost of entering this node.
    #[inline]
    pub fn move_modifier(&self) -> f32 {
        self.move_modifier
    }

    /// The transient bookkeeping of the search currently running over this node.
    /// Equal to [`SearchState::default`] whenever no search is running.
    #[inline]
    pub fn search_state(&self) -> &SearchState {
        &self.search
    }
}

/// Per-node bookkeeping of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchState {
    /// Cost of the cheapest known route from the start to this node.
    pub lowest_cost_from_start: f32,
    /// Estimated remaining cost to the goal.
    pub heuristic_cost_to_goal: f32,
    /// Priority of the node in the open list. Lower is expanded first.
    pub fitness: f32,
    /// The predecessor on the cheapest known route.
    pub parent: Option<NavNodeKey>,
    /// Whether the node is waiting in the open list.
    pub open: bool,
    /// Whether the node has been expanded.
    pub closed: bool,
}

impl SearchState {
    /// Restores the defaults.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the state is equal to the defaults.
    #[inline]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// A set of nodes and directed edges between them.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavGraph {
    nodes: SlotMap<NavNodeKey, NavNode>,
}

impl NavGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Adds an unconnected node without a move modifier.
    pub fn add_node(&mut self, position: impl Into<Vec3A>) -> NavNodeKey {
        self.nodes.insert(NavNode {
            position: position.into(),
            neighbors: Vec::new(),
            move_modifier: 0.0,
            search: SearchState::default(),
        })
    }

    /// Removes a node and every edge leading to it.
    pub fn remove_node(&mut self, key: NavNodeKey) -> Result<NavNode, NavGraphError> {
        let node = self
            .nodes
            .remove(key)
            .ok_or(NavGraphError::UnknownNode(key))?;
        for other in self.nodes.values_mut() {
            other.neighbors.retain(|&neighbor| neighbor != key);
        }
        Ok(node)
    }

    /// Connects two nodes in both directions.
    pub fn connect(&mut self, a: NavNodeKey, b: NavNodeKey) -> Result<(), NavGraphError> {
        self.connect_one_way(a, b)?;
        self.connect_one_way(b, a)
    }

    /// Adds an edge from `from` to `to`. Adding an existing edge again is a no-op.
    pub fn connect_one_way(&mut self, from: NavNodeKey, to: NavNodeKey) -> Result<(), NavGraphError> {
        if from == to {
            return Err(NavGraphError::SelfLoop(from));
        }
        if !self.nodes.contains_key(to) {
            return Err(NavGraphError::UnknownNode(to));
        }
        let node = self
            .nodes
            .get_mut(from)
            .ok_or(NavGraphError::UnknownNode(from))?;
        if !node.neighbors.contains(&to) {
            node.neighbors.push(to);
        }
        Ok(())
    }

    /// Removes the edges between two nodes in both directions.
    pub fn disconnect(&mut self, a: NavNodeKey, b: NavNodeKey) -> Result<(), NavGraphError> {
        if !self.nodes.contains_key(b) {
            return Err(NavGraphError::UnknownNode(b));
        }
        let node_a = self.nodes.get_mut(a).ok_or(NavGraphError::UnknownNode(a))?;
        node_a.neighbors.retain(|&neighbor| neighbor != b);
        self.nodes[b].neighbors.retain(|&neighbor| neighbor != a);
        Ok(())
    }

    /// Sets the additional cost of entering a node.
    pub fn set_move_modifier(&mut self, key: NavNodeKey, modifier: f32) -> Result<(), NavGraphError> {
        if modifier.is_nan() || modifier < 0.0 {
            return Err(NavGraphError::InvalidMoveModifier(modifier));
        }
        let node = self
            .nodes
            .get_mut(key)
            .ok_or(NavGraphError::UnknownNode(key))?;
        node.move_modifier = modifier;
        Ok(())
    }

    /// Returns the node for `key`, if it exists.
    #[inline]
    pub fn node(&self, key: NavNodeKey) -> Option<&NavNode> {
        self.nodes.get(key)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, key: NavNodeKey) -> Option<&mut NavNode> {
        self.nodes.get_mut(key)
    }

    /// Whether `key` refers to a node of this graph.
    #[inline]
    pub fn contains(&self, key: NavNodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// The number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all node keys.
    pub fn keys(&self) -> impl Iterator<Item = NavNodeKey> + '_ {
        self.nodes.keys()
    }

    /// Iterates over all nodes and their keys.
    pub fn iter(&self) -> impl Iterator<Item = (NavNodeKey, &NavNode)> + '_ {
        self.nodes.iter()
    }

    /// The neighbors of a node. Empty if the node does not exist.
    pub fn neighbors(&self, key: NavNodeKey) -> &[NavNodeKey] {
        self.nodes
            .get(key)
            .map(|node| node.neighbors.as_slice())
            .unwrap_or_default()
    }

    /// The position of a node, if it exists.
    #[inline]
    pub fn position(&self, key: NavNodeKey) -> Option<Vec3A> {
        self.nodes.get(key).map(|node| node.position)
    }

    /// The straight-line distance between two nodes, if both exist.
    #[inline]
    pub fn distance(&self, a: NavNodeKey, b: NavNodeKey) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    /// Whether every node is free of search bookkeeping.
    pub fn is_search_state_clean(&self) -> bool {
        self.nodes.values().all(|node| node.search.is_clean())
    }
}

/// Errors that can occur when editing a [`NavGraph`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NavGraphError {
    /// The key does not belong to a node of the graph.
    #[error("node {0:?} is not part of the graph")]
    UnknownNode(NavNodeKey),
    /// A node cannot be its own neighbor.
    #[error("node {0:?} cannot be connected to itself")]
    SelfLoop(NavNodeKey),
    /// Move modifiers must be non-negative numbers.
    #[error("move modifier must be a non-negative number, but got {0}")]
    InvalidMoveModifier(f32),
}
