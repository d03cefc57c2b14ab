//! Quadric edge collapse
//!
//! Greedy Garland-Heckbert simplification. Every vertex carries the summed
//! quadric of its incident face planes; the cheapest edge is collapsed to the
//! point minimising the combined quadric, and the heap is refreshed lazily
//! through per-vertex stamps.
//!
//! A collapse is skipped when it would break the surface:
//! - the edge is used by more than two faces, or the two one-rings share
//!   more vertices than the edge's faces account for (link condition)
//! - an interior edge joins two boundary vertices
//! - a surviving face would flip or become degenerate

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use glam::DVec3;
use tracing::{debug, warn};

use super::quadric::Quadric;
use crate::config::check_positive;
use crate::error::{Result, RockError};
use crate::mesh::{edge_face_map, edge_key, Mesh};

/// Smallest face count collapse will reduce to
pub const MIN_FACES: usize = 4;

/// Weight of the constraint planes that hold open boundaries in place
const BOUNDARY_WEIGHT: f64 = 100.0;

/// Ratio of twice the face area to its squared edge lengths below which a
/// face counts as degenerate
const SLIVER_EPSILON: f64 = 1e-8;

/// Edge collapse candidate in the priority queue
#[derive(Debug)]
struct CollapseCandidate {
    cost: f64,
    u: u32,
    v: u32,
    stamp_u: u32,
    stamp_v: u32,
    target: DVec3,
}

impl PartialEq for CollapseCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CollapseCandidate {}

impl PartialOrd for CollapseCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollapseCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, ties broken by vertex ids
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.u.cmp(&self.u))
            .then_with(|| other.v.cmp(&self.v))
    }
}

/// Mutable triangle soup with vertex-to-face adjacency
struct CollapseState {
    positions: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
    boundary: Vec<bool>,
    locked: Vec<bool>,
    removed: Vec<bool>,
    stamps: Vec<u32>,
    live_faces: usize,
    heap: BinaryHeap<CollapseCandidate>,
}

impl CollapseState {
    fn new(mesh: &Mesh) -> Self {
        let n = mesh.positions.len();
        let positions: Vec<DVec3> = mesh.positions.iter().map(|p| p.as_dvec3()).collect();
        let triangles: Vec<[u32; 3]> = mesh.faces.iter().map(|f| [f[0], f[1], f[2]]).collect();

        let mut vertex_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Quadric::default(); n];
        for (fi, t) in triangles.iter().enumerate() {
            let [a, b, c] = t.map(|v| positions[v as usize]);
            let normal = (b - a).cross(c - a).normalize_or_zero();
            let plane = Quadric::from_point_normal(a, normal);
            for &v in t {
                vertex_faces[v as usize].push(fi);
                quadrics[v as usize] += plane;
            }
        }

        let mut boundary = vec![false; n];
        let mut locked = vec![false; n];
        let mut edges: Vec<_> = edge_face_map(&mesh.faces).into_iter().collect();
        edges.sort_unstable_by_key(|&(key, _)| key);
        for ((a, b), faces) in edges {
            match faces.len() {
                1 => {
                    boundary[a as usize] = true;
                    boundary[b as usize] = true;
                    // Plane through the edge, perpendicular to its face
                    let t = triangles[faces[0]];
                    let [p0, p1, p2] = t.map(|v| positions[v as usize]);
                    let face_normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
                    let (pa, pb) = (positions[a as usize], positions[b as usize]);
                    let normal = (pb - pa).cross(face_normal).normalize_or_zero();
                    let constraint = Quadric::from_point_normal(pa, normal).scaled(BOUNDARY_WEIGHT);
                    quadrics[a as usize] += constraint;
                    quadrics[b as usize] += constraint;
                }
                2 => {}
                _ => {
                    locked[a as usize] = true;
                    locked[b as usize] = true;
                }
            }
        }

        let live_faces = triangles.len();
        Self {
            positions,
            face_alive: vec![true; triangles.len()],
            triangles,
            vertex_faces,
            quadrics,
            boundary,
            locked,
            removed: vec![false; n],
            stamps: vec![0; n],
            live_faces,
            heap: BinaryHeap::new(),
        }
    }

    /// Live faces around `v`
    fn faces_of(&self, v: u32) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(|&f| self.face_alive[f])
    }

    /// One-ring of `v`, sorted
    fn neighbors(&self, v: u32) -> Vec<u32> {
        let mut ring: Vec<u32> = self
            .faces_of(v)
            .flat_map(|f| self.triangles[f])
            .filter(|&w| w != v)
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }

    fn push_candidate(&mut self, a: u32, b: u32) {
        let (u, v) = edge_key(a, b);
        if self.locked[u as usize] || self.locked[v as usize] {
            return;
        }
        let q = self.quadrics[u as usize] + self.quadrics[v as usize];
        let target = q.optimal_point(self.positions[u as usize], self.positions[v as usize]);
        self.heap.push(CollapseCandidate {
            cost: q.evaluate(target).max(0.0),
            u,
            v,
            stamp_u: self.stamps[u as usize],
            stamp_v: self.stamps[v as usize],
            target,
        });
    }

    /// Queue every live edge, in a deterministic order
    fn rebuild_heap(&mut self) {
        self.heap.clear();
        let mut edges = HashSet::new();
        for (f, t) in self.triangles.iter().enumerate() {
            if !self.face_alive[f] {
                continue;
            }
            for i in 0..3 {
                edges.insert(edge_key(t[i], t[(i + 1) % 3]));
            }
        }
        let mut edges: Vec<(u32, u32)> = edges.into_iter().collect();
        edges.sort_unstable();
        for (a, b) in edges {
            self.push_candidate(a, b);
        }
    }

    fn is_current(&self, c: &CollapseCandidate) -> bool {
        !self.removed[c.u as usize]
            && !self.removed[c.v as usize]
            && self.stamps[c.u as usize] == c.stamp_u
            && self.stamps[c.v as usize] == c.stamp_v
    }

    /// Whether collapsing `u`–`v` into `target` keeps a manifold surface
    fn can_collapse(&self, u: u32, v: u32, target: DVec3) -> bool {
        let shared: Vec<usize> = self
            .faces_of(u)
            .filter(|&f| self.triangles[f].contains(&v))
            .collect();

        let interior = match shared.len() {
            2 => true,
            1 => false,
            _ => return false,
        };
        if interior && self.boundary[u as usize] && self.boundary[v as usize] {
            return false;
        }

        let ring_u = self.neighbors(u);
        let ring_v = self.neighbors(v);
        let common = ring_u.iter().filter(|w| ring_v.binary_search(w).is_ok()).count();
        if common != shared.len() {
            return false;
        }

        for w in [u, v] {
            for f in self.faces_of(w) {
                if shared.contains(&f) {
                    continue;
                }
                if !self.keeps_orientation(f, w, target) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether face `f` stays well shaped when vertex `w` moves to `target`
    fn keeps_orientation(&self, f: usize, w: u32, target: DVec3) -> bool {
        let t = self.triangles[f];
        let old = t.map(|v| self.positions[v as usize]);
        let new = t.map(|v| if v == w { target } else { self.positions[v as usize] });

        let old_normal = (old[1] - old[0]).cross(old[2] - old[0]);
        let new_normal = (new[1] - new[0]).cross(new[2] - new[0]);

        let edges = (new[1] - new[0]).length_squared()
            + (new[2] - new[1]).length_squared()
            + (new[0] - new[2]).length_squared();
        if new_normal.length() <= SLIVER_EPSILON * edges {
            return false;
        }
        new_normal.dot(old_normal) >= 0.0
    }

    /// Merge `v` into `u`, moving `u` to `target`
    fn collapse(&mut self, u: u32, v: u32, target: DVec3) {
        let (ui, vi) = (u as usize, v as usize);

        for f in self.vertex_faces[ui].clone() {
            if self.face_alive[f] && self.triangles[f].contains(&v) {
                self.face_alive[f] = false;
                self.live_faces -= 1;
            }
        }

        let moved: Vec<usize> = self.faces_of(v).collect();
        for &f in &moved {
            for slot in self.triangles[f].iter_mut() {
                if *slot == v {
                    *slot = u;
                }
            }
        }
        let mut faces = std::mem::take(&mut self.vertex_faces[ui]);
        faces.extend(moved);
        faces.retain(|&f| self.face_alive[f]);
        self.vertex_faces[ui] = faces;
        self.vertex_faces[vi].clear();

        self.positions[ui] = target;
        let merged = self.quadrics[ui] + self.quadrics[vi];
        self.quadrics[ui] = merged;
        self.boundary[ui] |= self.boundary[vi];
        self.removed[vi] = true;
        self.stamps[ui] += 1;

        for w in self.neighbors(u) {
            self.push_candidate(u, w);
        }
    }

    /// Collapse until `target` faces remain or no legal collapse is left
    fn run(&mut self, target: usize) {
        loop {
            let before = self.live_faces;
            self.rebuild_heap();

            while self.live_faces > target {
                let Some(c) = self.heap.pop() else {
                    break;
                };
                if !self.is_current(&c) || !self.can_collapse(c.u, c.v, c.target) {
                    continue;
                }
                self.collapse(c.u, c.v, c.target);
            }

            // Rejected edges may have become legal after later collapses
            if self.live_faces <= target || self.live_faces == before {
                break;
            }
        }
    }

    fn into_mesh(self) -> Result<Mesh> {
        let faces: Vec<Vec<u32>> = self
            .triangles
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, &alive)| alive)
            .map(|(t, _)| t.to_vec())
            .collect();

        if let Some(p) = self.positions.iter().find(|p| !p.is_finite()) {
            return Err(RockError::NumericInstability(format!(
                "edge collapse produced vertex {:?}",
                p
            )));
        }

        let mut mesh = Mesh::new(self.positions.iter().map(|p| p.as_vec3()).collect(), faces);
        mesh.compact();
        Ok(mesh)
    }
}

/// Number of faces collapse aims for
#[inline]
pub fn target_face_count(face_count: usize, ratio: f32) -> usize {
    ((face_count as f64 * ratio as f64).ceil() as usize).max(MIN_FACES)
}

/// Reduce the face count towards `ratio × faces` by quadric edge collapse
///
/// Polygons are fanned into triangles first, so the result is always a
/// triangle mesh. A ratio of 1.0 returns the input unchanged. The face count
/// never grows and never drops below 4.
///
/// # Errors
///
/// - `InvalidConfig` if `ratio` is outside (0, 1]
/// - `DegenerateMesh` if the input fails validation
/// - `NumericInstability` if a collapse target is not finite
#[tracing::instrument(skip(mesh), name = "decimate::collapse")]
pub fn collapse(mesh: &Mesh, ratio: f32) -> Result<Mesh> {
    check_positive("collapse ratio", ratio, 1.0)?;
    mesh.validate()?;

    if ratio >= 1.0 {
        return Ok(mesh.clone());
    }

    let target = target_face_count(mesh.face_count(), ratio);
    let triangulated = if mesh.is_triangulated() {
        mesh.clone()
    } else {
        mesh.triangulated()
    };

    let mut state = CollapseState::new(&triangulated);
    state.run(target);
    if state.live_faces > target {
        warn!(
            faces = state.live_faces,
            target, "edge collapse stopped above its target"
        );
    }

    let result = state.into_mesh()?;
    if result.face_count() > mesh.face_count() {
        // Fanning polygons produced more triangles than collapse could remove
        return Ok(mesh.clone());
    }

    debug!(
        faces_before = mesh.face_count(),
        faces_after = result.face_count(),
        target,
        "collapsed edges"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::IcosphereBuilder;
    use glam::Vec3;

    /// Flat `n × n` grid of quads in the z = 0 plane, split into triangles
    fn flat_grid(n: u32) -> Mesh {
        let mut positions = Vec::new();
        for y in 0..=n {
            for x in 0..=n {
                positions.push(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        let idx = |x: u32, y: u32| y * (n + 1) + x;
        let mut triangles = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let (a, b, c, d) = (idx(x, y), idx(x + 1, y), idx(x + 1, y + 1), idx(x, y + 1));
                triangles.push([a, b, c]);
                triangles.push([a, c, d]);
            }
        }
        Mesh::from_triangles(positions, &triangles)
    }

    #[test]
    fn test_ratio_one_is_identity() {
        let mesh = IcosphereBuilder::build(2, 1.0).unwrap();
        let result = collapse(&mesh, 1.0).unwrap();
        assert_eq!(result, mesh);
    }

    #[test]
    fn test_reaches_target_on_sphere() {
        let mesh = IcosphereBuilder::build(3, 1.0).unwrap();
        let result = collapse(&mesh, 0.25).unwrap();

        assert!(result.face_count() <= target_face_count(1280, 0.25));
        assert!(result.face_count() >= MIN_FACES);
        assert!(result.edge_stats().is_closed_manifold());
        assert_eq!(result.euler_characteristic(), 2);
        assert!(!result.has_duplicate_faces());
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_preserves_silhouette() {
        let mesh = IcosphereBuilder::build(3, 1.0).unwrap();
        let result = collapse(&mesh, 0.5).unwrap();
        for p in &result.positions {
            let r = p.length();
            assert!(r > 0.85 && r < 1.1, "vertex {:?} at radius {}", p, r);
        }
    }

    #[test]
    fn test_never_increases_faces() {
        let mesh = IcosphereBuilder::build(2, 1.0).unwrap();
        for ratio in [0.9, 0.5, 0.2, 0.05] {
            let result = collapse(&mesh, ratio).unwrap();
            assert!(result.face_count() <= mesh.face_count());
        }
    }

    #[test]
    fn test_extreme_ratio_keeps_a_solid() {
        let mesh = IcosphereBuilder::build(6, 1.0).unwrap();
        let result = collapse(&mesh, 0.01).unwrap();

        assert!(result.face_count() >= MIN_FACES);
        assert!(result.face_count() <= target_face_count(mesh.face_count(), 0.01));
        assert!(result.validate().is_ok());
        assert_eq!(result.edge_stats().non_manifold, 0);
    }

    #[test]
    fn test_down_to_minimum() {
        let mesh = IcosphereBuilder::build(1, 1.0).unwrap();
        let result = collapse(&mesh, 0.01).unwrap();
        assert!(result.face_count() >= MIN_FACES);
        assert!(result.edge_stats().is_closed_manifold());
    }

    #[test]
    fn test_flat_grid_stays_flat() {
        let mesh = flat_grid(8);
        let result = collapse(&mesh, 0.1).unwrap();

        assert!(result.face_count() < mesh.face_count());
        for p in &result.positions {
            assert!(p.z.abs() < 1e-5);
        }
        let (lo, hi) = result.bounds().unwrap();
        assert!((lo - Vec3::ZERO).length() < 1e-4);
        assert!((hi - Vec3::new(8.0, 8.0, 0.0)).length() < 1e-4);
        assert_eq!(result.edge_stats().non_manifold, 0);
    }

    #[test]
    fn test_polygons_are_triangulated() {
        let mesh = Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(1.0, 1.0, -1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(-1.0, 1.0, 1.0),
            ],
            vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![2, 3, 7, 6],
                vec![0, 4, 7, 3],
                vec![1, 2, 6, 5],
            ],
        );
        let result = collapse(&mesh, 0.9).unwrap();
        assert!(result.face_count() <= mesh.face_count());
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_deterministic() {
        let mesh = IcosphereBuilder::build(3, 1.0).unwrap();
        let a = collapse(&mesh, 0.1).unwrap();
        let b = collapse(&mesh, 0.1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_ratio() {
        let mesh = IcosphereBuilder::build(1, 1.0).unwrap();
        assert!(matches!(collapse(&mesh, 0.0), Err(RockError::InvalidConfig(_))));
        assert!(collapse(&mesh, 1.5).is_err());
    }
}
