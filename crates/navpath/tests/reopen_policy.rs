//! A cheaper route to a node that is already in the open list only changes the search order
//! under [`ReopenPolicy::Requeue`].

use approx::assert_relative_eq;
use navpath::{NavGraph, NavNodeKey, OpenSky, PathFinder, PathfinderConfig, ReopenPolicy};

struct Detour {
    graph: NavGraph,
    start: NavNodeKey,
    mid: NavNodeKey,
    cross: NavNodeKey,
    side: Option<NavNodeKey>,
    goal: NavNodeKey,
}

/// `start` reaches `cross` cheaply through `mid`, but the move modifier of `mid` delays its
/// expansion until after `cross` has been discovered through the detour `pass`.
/// `side` is a third route whose fitness lies between the stale and the updated fitness of `cross`.
fn detour() -> Detour {
    let mut graph = NavGraph::new();
    let start = graph.add_node([0.0, 0.0, 0.0]);
    let pass = graph.add_node([2.0, 0.0, 3.5]);
    let mid = graph.add_node([1.0, 0.0, 0.0]);
    let side = graph.add_node([5.0, 0.0, 4.4]);
    let cross = graph.add_node([5.0, 0.0, 0.0]);
    let goal = graph.add_node([10.0, 0.0, 0.0]);

    graph.connect(start, pass).unwrap();
    graph.connect(start, mid).unwrap();
    graph.connect(start, side).unwrap();
    graph.connect(pass, cross).unwrap();
    graph.connect(mid, cross).unwrap();
    graph.connect(cross, goal).unwrap();
    graph.connect(side, goal).unwrap();
    graph.set_move_modifier(mid, 3.0).unwrap();

    Detour {
        graph,
        start,
        mid,
        cross,
        side: Some(side),
        goal,
    }
}

#[test]
fn keep_priority_follows_stale_fitness() {
    let mut detour = detour();
    let mut pathfinder = PathFinder::default();
    assert_eq!(pathfinder.config.reopen_policy, ReopenPolicy::KeepPriority);

    let path = pathfinder
        .generate_path(&mut detour.graph, &OpenSky, detour.start, detour.goal, false)
        .unwrap();
    assert_eq!(path.nodes, vec![detour.start, detour.side.unwrap(), detour.goal]);
    assert_relative_eq!(path.cost, 2.0 * 44.36_f32.sqrt(), epsilon = 1.0e-4);
    assert!(detour.graph.is_search_state_clean());
}

#[test]
fn requeue_finds_the_cheaper_route() {
    let mut detour = detour();
    let mut pathfinder = PathFinder::new(PathfinderConfig {
        reopen_policy: ReopenPolicy::Requeue,
        ..Default::default()
    });

    let path = pathfinder
        .generate_path(&mut detour.graph, &OpenSky, detour.start, detour.goal, false)
        .unwrap();
    assert_eq!(
        path.nodes,
        vec![detour.start, detour.mid, detour.cross, detour.goal]
    );
    assert_relative_eq!(path.cost, 10.0, epsilon = 1.0e-4);
    // `cross` was pushed twice
    assert_eq!(pathfinder.last_stats().pushed, 7);
    assert!(detour.graph.is_search_state_clean());
}

/// Same layout as [`detour`] without `side`, so the search has to finish through `cross`.
/// `cross` carries a move modifier of its own.
fn narrow_detour() -> Detour {
    let mut graph = NavGraph::new();
    let start = graph.add_node([0.0, 0.0, 0.0]);
    let pass = graph.add_node([2.0, 0.0, 3.5]);
    let mid = graph.add_node([1.0, 0.0, 0.0]);
    let cross = graph.add_node([5.0, 0.0, 0.0]);
    let goal = graph.add_node([10.0, 0.0, 0.0]);

    graph.connect(start, pass).unwrap();
    graph.connect(start, mid).unwrap();
    graph.connect(pass, cross).unwrap();
    graph.connect(mid, cross).unwrap();
    graph.connect(cross, goal).unwrap();
    graph.set_move_modifier(mid, 3.0).unwrap();
    graph.set_move_modifier(cross, 0.5).unwrap();

    Detour {
        graph,
        start,
        mid,
        cross,
        side: None,
        goal,
    }
}

#[test]
fn keep_priority_reparents_open_node() {
    let mut detour = narrow_detour();
    let mut pathfinder = PathFinder::default();

    let path = pathfinder
        .generate_path(&mut detour.graph, &OpenSky, detour.start, detour.goal, false)
        .unwrap();
    // `cross` is first reached through `pass`, then re-parented to `mid` while still open
    assert_eq!(
        path.nodes,
        vec![detour.start, detour.mid, detour.cross, detour.goal]
    );
    // The re-parented cost includes the move modifier of `cross`: 1 + 4 + 0.5 + 5
    assert_relative_eq!(path.cost, 10.5, epsilon = 1.0e-4);
    // The cheaper route does not queue `cross` a second time
    assert_eq!(pathfinder.last_stats().pushed, 5);
    assert!(detour.graph.is_search_state_clean());
}

#[test]
fn requeue_keeps_move_modifier_out_of_cost() {
    let mut detour = narrow_detour();
    let mut pathfinder = PathFinder::new(PathfinderConfig {
        reopen_policy: ReopenPolicy::Requeue,
        ..Default::default()
    });

    let path = pathfinder
        .generate_path(&mut detour.graph, &OpenSky, detour.start, detour.goal, false)
        .unwrap();
    assert_eq!(
        path.nodes,
        vec![detour.start, detour.mid, detour.cross, detour.goal]
    );
    assert_relative_eq!(path.cost, 10.0, epsilon = 1.0e-4);
    assert_eq!(pathfinder.last_stats().pushed, 6);
    assert!(detour.graph.is_search_state_clean());
}
