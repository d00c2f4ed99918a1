//! Grid-restricted A* between two coordinates around no-fly zones.
//!
//! Every move has the same length and cost (`PlannerRules::unit_length`) and
//! runs along one of 16 compass bearings. Explored positions are deduplicated
//! by the movement cell they round to. The returned polyline always ends on
//! the exact goal coordinate; an empty polyline means no route exists.

use crate::geometry::{self, distance, Edge, COMPASS_STEP_DEG};
use crate::models::{Coordinate, Region};
use crate::rules::PlannerRules;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

const COMPASS_DIRECTIONS: usize = 16;

/// Padding applied to zone bounding boxes before the cheap overlap test.
const BOUNDS_SLACK: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Goal reached
    Reached,
    /// Every reachable cell was explored without reaching the goal
    Exhausted,
    /// Gave up on reaching `max_expansions` expansions
    ExpansionLimit,
}

#[derive(Debug, Clone)]
pub struct PathSearch {
    pub outcome: SearchOutcome,
    /// Start, intermediate moves and the exact goal; empty unless reached
    pub path: Vec<Coordinate>,
    pub nodes_visited: usize,
}

impl PathSearch {
    pub fn is_reached(&self) -> bool {
        self.outcome == SearchOutcome::Reached
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
}

impl Bounds {
    fn around(point: Coordinate) -> Self {
        Self {
            min_lng: point.lng,
            min_lat: point.lat,
            max_lng: point.lng,
            max_lat: point.lat,
        }
    }

    fn of(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::around(*first);
        for point in rest {
            bounds.include(*point);
        }
        Some(bounds)
    }

    fn include(&mut self, point: Coordinate) {
        self.min_lng = self.min_lng.min(point.lng);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
    }

    fn merge(&mut self, other: &Bounds) {
        self.min_lng = self.min_lng.min(other.min_lng);
        self.min_lat = self.min_lat.min(other.min_lat);
        self.max_lng = self.max_lng.max(other.max_lng);
        self.max_lat = self.max_lat.max(other.max_lat);
    }

    fn padded(self, margin: f64) -> Self {
        Self {
            min_lng: self.min_lng - margin,
            min_lat: self.min_lat - margin,
            max_lng: self.max_lng + margin,
            max_lat: self.max_lat + margin,
        }
    }

    fn contains(&self, point: Coordinate) -> bool {
        point.lng >= self.min_lng
            && point.lng <= self.max_lng
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    fn overlaps_segment(&self, a: Coordinate, b: Coordinate) -> bool {
        a.lng.max(b.lng) >= self.min_lng
            && a.lng.min(b.lng) <= self.max_lng
            && a.lat.max(b.lat) >= self.min_lat
            && a.lat.min(b.lat) <= self.max_lat
    }
}

/// A no-fly polygon with its edges precomputed.
#[derive(Debug, Clone)]
struct Zone {
    edges: Vec<Edge>,
    bounds: Bounds,
}

impl Zone {
    fn from_region(region: &Region) -> Option<Self> {
        let bounds = Bounds::of(&region.vertices)?.padded(BOUNDS_SLACK);
        Some(Self {
            edges: geometry::region_edges(&region.vertices),
            bounds,
        })
    }

    /// True if moving from `from` to `to` enters or crosses this zone.
    fn blocks(&self, from: Coordinate, to: Coordinate) -> bool {
        if !self.bounds.overlaps_segment(from, to) {
            return false;
        }
        geometry::point_within_edges(to, &self.edges)
            || geometry::segment_crosses_edges(from, to, &self.edges)
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    parent: Option<usize>,
    position: Coordinate,
    g_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_score: FloatOrd,
    /// Push order; breaks `f_score` ties so earlier pushes pop first
    sequence: u64,
    index: usize,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.index.cmp(&other.index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    lng: i64,
    lat: i64,
}

impl CellKey {
    fn of(position: Coordinate, unit_length: f64) -> Self {
        Self {
            lng: (position.lng / unit_length).round() as i64,
            lat: (position.lat / unit_length).round() as i64,
        }
    }
}

/// A* search over a fixed set of no-fly zones.
///
/// Build one per planning call and reuse it for every leg; the zone edges
/// and bounds are computed once.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    zones: Vec<Zone>,
    zone_bounds: Option<Bounds>,
    rules: PlannerRules,
}

impl Pathfinder {
    pub fn new(no_fly_zones: &[Region], rules: PlannerRules) -> Self {
        let zones: Vec<Zone> = no_fly_zones.iter().filter_map(Zone::from_region).collect();
        let mut zone_bounds: Option<Bounds> = None;
        for zone in &zones {
            match zone_bounds.as_mut() {
                Some(bounds) => bounds.merge(&zone.bounds),
                None => zone_bounds = Some(zone.bounds),
            }
        }
        Self {
            zones,
            zone_bounds,
            rules,
        }
    }

    pub fn rules(&self) -> &PlannerRules {
        &self.rules
    }

    /// Find a path from `start` to `goal`. Empty when no route exists.
    pub fn find_path(&self, start: Coordinate, goal: Coordinate) -> Vec<Coordinate> {
        self.search(start, goal).path
    }

    /// True if a single move from `from` to `to` enters or crosses a no-fly zone.
    pub fn is_blocked(&self, from: Coordinate, to: Coordinate) -> bool {
        self.zones.iter().any(|zone| zone.blocks(from, to))
    }

    fn corridor(&self, start: Coordinate, goal: Coordinate) -> Option<Bounds> {
        let margin = self.rules.corridor_margin?;
        let mut bounds = Bounds::around(start);
        bounds.include(goal);
        if let Some(zone_bounds) = &self.zone_bounds {
            bounds.merge(zone_bounds);
        }
        Some(bounds.padded(margin))
    }

    /// Run the search and report how it ended.
    pub fn search(&self, start: Coordinate, goal: Coordinate) -> PathSearch {
        let unit = self.rules.unit_length;
        let corridor = self.corridor(start, goal);

        let mut nodes = vec![SearchNode {
            parent: None,
            position: start,
            g_score: 0.0,
        }];
        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        let mut sequence = 0u64;
        open_set.push(Reverse(OpenNode {
            f_score: FloatOrd(distance(start, goal)),
            sequence,
            index: 0,
        }));
        let mut visited: HashSet<CellKey> = HashSet::new();
        let mut nodes_visited = 0usize;

        while let Some(Reverse(current)) = open_set.pop() {
            let node = nodes[current.index];

            if distance(node.position, goal) < unit {
                let path = reconstruct_path(&nodes, current.index, goal);
                tracing::trace!(
                    "path found with {} moves after {} expansions",
                    path.len(),
                    nodes_visited
                );
                return PathSearch {
                    outcome: SearchOutcome::Reached,
                    path,
                    nodes_visited,
                };
            }

            if !visited.insert(CellKey::of(node.position, unit)) {
                continue;
            }
            nodes_visited += 1;
            if nodes_visited >= self.rules.max_expansions {
                tracing::debug!(
                    "search abandoned after {} expansions",
                    self.rules.max_expansions
                );
                return PathSearch {
                    outcome: SearchOutcome::ExpansionLimit,
                    path: Vec::new(),
                    nodes_visited,
                };
            }

            for direction in 0..COMPASS_DIRECTIONS {
                let angle = direction as f64 * COMPASS_STEP_DEG;
                let next = geometry::offset(node.position, angle, unit);

                if visited.contains(&CellKey::of(next, unit)) {
                    continue;
                }
                if corridor.is_some_and(|bounds| !bounds.contains(next)) {
                    continue;
                }
                if self.is_blocked(node.position, next) {
                    continue;
                }

                let g_score = node.g_score + unit;
                nodes.push(SearchNode {
                    parent: Some(current.index),
                    position: next,
                    g_score,
                });
                sequence += 1;
                open_set.push(Reverse(OpenNode {
                    f_score: FloatOrd(g_score + distance(next, goal)),
                    sequence,
                    index: nodes.len() - 1,
                }));
            }
        }

        PathSearch {
            outcome: SearchOutcome::Exhausted,
            path: Vec::new(),
            nodes_visited,
        }
    }
}

fn reconstruct_path(nodes: &[SearchNode], last: usize, goal: Coordinate) -> Vec<Coordinate> {
    let mut path = vec![goal];
    let mut current = Some(last);
    while let Some(index) = current {
        path.push(nodes[index].position);
        current = nodes[index].parent;
    }
    path.reverse();
    path
}

/// Find a path with default rules. Empty when no route exists.
pub fn find_path(start: Coordinate, goal: Coordinate, no_fly_zones: &[Region]) -> Vec<Coordinate> {
    Pathfinder::new(no_fly_zones, PlannerRules::default()).find_path(start, goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point_in_polygon, region_edges, segment_crosses_edges};
    use crate::rules::UNIT_LENGTH;

    fn c(lng: f64, lat: f64) -> Coordinate {
        Coordinate::new(lng, lat)
    }

    fn rect(name: &str, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Region {
        Region::new(
            name,
            vec![
                c(min_lng, min_lat),
                c(min_lng, max_lat),
                c(max_lng, max_lat),
                c(max_lng, min_lat),
                c(min_lng, min_lat),
            ],
        )
    }

    #[test]
    fn straight_path_ends_on_exact_goal() {
        let start = c(0.0, 0.0);
        let goal = c(0.003, 0.0);
        let path = find_path(start, goal, &[]);

        assert_eq!(path.len(), 22, "20 moves east plus start and goal");
        assert_eq!(path[0], start);
        let last = path[path.len() - 1];
        assert_eq!(last.lng.to_bits(), goal.lng.to_bits());
        assert_eq!(last.lat.to_bits(), goal.lat.to_bits());

        for pair in path[..path.len() - 1].windows(2) {
            assert_eq!(distance(pair[0], pair[1]), UNIT_LENGTH);
        }
    }

    #[test]
    fn start_within_reach_of_goal_returns_two_points() {
        let start = c(1.0, 1.0);
        let goal = c(1.00005, 1.0);
        let search = Pathfinder::new(&[], PlannerRules::default()).search(start, goal);
        assert!(search.is_reached());
        assert_eq!(search.path, vec![start, goal]);
        assert_eq!(search.nodes_visited, 0);
    }

    #[test]
    fn path_avoids_no_fly_zone() {
        let wall = rect("wall", 0.0025, -0.0015, 0.0035, 0.0015);
        let zones = vec![wall.clone()];
        let start = c(0.0, 0.0);
        let goal = c(0.006, 0.0);

        let path = find_path(start, goal, &zones);
        assert!(!path.is_empty(), "a detour exists");

        let edges = region_edges(&wall.vertices);
        let flown = &path[..path.len() - 1];
        for point in flown {
            assert!(
                !point_in_polygon(*point, &wall.vertices),
                "{point:?} is inside the zone"
            );
        }
        for pair in flown.windows(2) {
            assert!(
                !segment_crosses_edges(pair[0], pair[1], &edges),
                "{:?} -> {:?} crosses the zone",
                pair[0],
                pair[1]
            );
        }

        let direct = find_path(start, goal, &[]);
        assert!(path.len() > direct.len());
    }

    #[test]
    fn search_is_deterministic() {
        let zones = vec![rect("block", 0.001, -0.0005, 0.0015, 0.002)];
        let pathfinder = Pathfinder::new(&zones, PlannerRules::default());
        let start = c(0.0, 0.0);
        let goal = c(0.003, 0.0008);

        let first = pathfinder.find_path(start, goal);
        let second = pathfinder.find_path(start, goal);
        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
        assert_eq!(first, second);
    }

    #[test]
    fn enclosed_goal_exhausts_search() {
        let zones = vec![rect("cage", 0.004, -0.002, 0.008, 0.002)];
        let pathfinder = Pathfinder::new(&zones, PlannerRules::default().with_corridor_margin(Some(0.002)));
        let search = pathfinder.search(c(0.0, 0.0), c(0.006, 0.0));

        assert_eq!(search.outcome, SearchOutcome::Exhausted);
        assert!(search.path.is_empty());
        assert!(search.nodes_visited > 0);
    }

    #[test]
    fn expansion_limit_reports_no_route() {
        let pathfinder = Pathfinder::new(&[], PlannerRules::default().with_max_expansions(5));
        let search = pathfinder.search(c(0.0, 0.0), c(0.01, 0.0));

        assert_eq!(search.outcome, SearchOutcome::ExpansionLimit);
        assert!(search.path.is_empty());
    }

    #[test]
    fn reaching_the_expansion_cap_is_failure() {
        let (start, goal) = (c(0.0, 0.0), c(0.0015, 0.0));
        let needed = Pathfinder::new(&[], PlannerRules::default())
            .search(start, goal)
            .nodes_visited;
        assert!(needed > 0);

        let capped = Pathfinder::new(&[], PlannerRules::default().with_max_expansions(needed));
        let search = capped.search(start, goal);
        assert_eq!(
            search.outcome,
            SearchOutcome::ExpansionLimit,
            "a cap equal to the expansions needed must fail"
        );
        assert_eq!(search.nodes_visited, needed);

        let roomy = Pathfinder::new(&[], PlannerRules::default().with_max_expansions(needed + 1));
        assert!(roomy.search(start, goal).is_reached());
    }

    #[test]
    fn unbounded_search_still_finds_path() {
        let pathfinder = Pathfinder::new(&[], PlannerRules::default().with_corridor_margin(None));
        let path = pathfinder.find_path(c(0.0, 0.0), c(0.0, 0.0015));
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn blocked_move_detection() {
        let pathfinder = Pathfinder::new(&[rect("zone", 0.0, 0.0, 1.0, 1.0)], PlannerRules::default());
        assert!(pathfinder.is_blocked(c(-0.5, 0.5), c(0.5, 0.5)));
        assert!(pathfinder.is_blocked(c(-0.5, 0.5), c(1.5, 0.5)));
        assert!(!pathfinder.is_blocked(c(-0.5, 0.5), c(-0.4, 0.5)));
    }

    #[test]
    fn degenerate_regions_do_not_panic() {
        let zones = vec![Region::new("empty", Vec::new()), Region::new("dot", vec![c(0.001, 0.0)])];
        let pathfinder = Pathfinder::new(&zones, PlannerRules::default());
        let _ = pathfinder.search(c(0.0, 0.0), c(0.002, 0.0));
        let _ = pathfinder.search(c(f64::NAN, 0.0), c(0.002, 0.0));
    }
}
