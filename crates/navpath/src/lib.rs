#![doc = include_str!("../../../readme.md")]

mod config;
mod geometry;
mod graph;
mod heap;
pub(crate) mod math;
mod pathfinder;
mod smoother;
mod trimesh;

pub use config::{PathfinderConfig, PathfinderConfigError, ReopenPolicy};
pub use geometry::{CollisionLayers, GeometryQuery, GeometryQueryError, OpenSky};
pub use graph::{NavGraph, NavGraphError, NavNode, NavNodeKey, SearchState};
pub use heap::PriorityQueue;
pub use math::Aabb3d;
pub use pathfinder::{Path, PathFinder, SearchStats, reset_node_variables};
pub use smoother::PathSmoother;
pub use trimesh::TriMesh;
