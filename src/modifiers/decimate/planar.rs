//! Planar dissolve
//!
//! Merges neighbouring faces whose dihedral angle is below a limit into
//! larger polygons, then drops vertices left in the middle of an almost
//! straight edge chain. No vertex is moved, so the visible surface only
//! changes where the merged faces were not exactly coplanar.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use tracing::debug;

use crate::config::check_range;
use crate::error::Result;
use crate::mesh::{edge_face_map, Mesh};

/// Fewest faces a closed surface is left with
const MIN_CLOSED_FACES: usize = 4;

/// Merge candidate: an interior edge and the two faces beside it
struct EdgeCandidate {
    angle: f32,
    key: (u32, u32),
    faces: (usize, usize),
}

/// Vertex sets of the live loops
///
/// Two faces over the same vertices would fold the surface onto itself.
#[derive(Default)]
struct LoopKeys(HashMap<Vec<u32>, u32>);

impl LoopKeys {
    fn key(face: &[u32]) -> Vec<u32> {
        let mut key = face.to_vec();
        key.sort_unstable();
        key
    }

    fn insert(&mut self, face: &[u32]) {
        *self.0.entry(Self::key(face)).or_default() += 1;
    }

    fn remove(&mut self, face: &[u32]) {
        let key = Self::key(face);
        if let Some(count) = self.0.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.0.remove(&key);
            }
        }
    }

    fn contains(&self, face: &[u32]) -> bool {
        self.0.contains_key(&Self::key(face))
    }
}

/// Faces grouped into growing polygon regions
///
/// Every face of a region stays within the angle limit of the region's seed
/// face, so curvature cannot pile up across a chain of small bends.
struct Regions<'a> {
    parent: Vec<usize>,
    loops: Vec<Option<Vec<u32>>>,
    /// Number of region loops each vertex appears in
    uses: Vec<u32>,
    keys: LoopKeys,
    /// Normal of the face the region grew from
    seeds: &'a [Vec3],
    /// Largest angle between a member face and the seed
    spread: Vec<f32>,
    live: usize,
    min_regions: usize,
}

impl<'a> Regions<'a> {
    fn new(mesh: &Mesh, face_normals: &'a [Vec3], closed: bool) -> Self {
        let mut uses = vec![0; mesh.positions.len()];
        let mut keys = LoopKeys::default();
        for face in &mesh.faces {
            for &v in face {
                uses[v as usize] += 1;
            }
            keys.insert(face);
        }
        Self {
            parent: (0..mesh.faces.len()).collect(),
            loops: mesh.faces.iter().cloned().map(Some).collect(),
            uses,
            keys,
            seeds: face_normals,
            spread: vec![0.0; mesh.faces.len()],
            live: mesh.faces.len(),
            min_regions: if closed { MIN_CLOSED_FACES } else { 1 },
        }
    }

    fn find(&mut self, mut f: usize) -> usize {
        while self.parent[f] != f {
            self.parent[f] = self.parent[self.parent[f]];
            f = self.parent[f];
        }
        f
    }

    /// Spread of `a` after absorbing `b`, if every face stays within
    /// `angle_limit` of the seed of `a`
    fn merged_spread(&self, a: usize, b: usize, angle_limit: f32) -> Option<f32> {
        let apart = angle_between(self.seeds[a], self.seeds[b])?;
        let spread = self.spread[a].max(apart + self.spread[b]);
        (spread < angle_limit).then_some(spread)
    }

    /// Join regions `a` and `b` if they share one contiguous edge chain
    fn try_merge(&mut self, a: usize, b: usize, angle_limit: f32) -> bool {
        if self.live <= self.min_regions {
            return false;
        }
        let Some(spread) = self.merged_spread(a, b, angle_limit) else {
            return false;
        };
        let (Some(loop_a), Some(loop_b)) = (&self.loops[a], &self.loops[b]) else {
            return false;
        };
        let (la, lb) = (loop_a.len(), loop_b.len());

        // Directed edges of B, which run against A along the shared chain
        let b_edges: HashSet<(u32, u32)> = (0..lb)
            .map(|i| (loop_b[i], loop_b[(i + 1) % lb]))
            .collect();
        let shared: Vec<bool> = (0..la)
            .map(|i| b_edges.contains(&(loop_a[(i + 1) % la], loop_a[i])))
            .collect();

        let count = shared.iter().filter(|&&s| s).count();
        if count == 0 || count >= la || count >= lb {
            return false;
        }
        // The chain must be one run: exactly one shared edge follows an unshared one
        let starts: Vec<usize> = (0..la)
            .filter(|&i| shared[i] && !shared[(i + la - 1) % la])
            .collect();
        if starts.len() != 1 {
            return false;
        }
        let first = starts[0];
        let last = (first + count - 1) % la;
        let s = loop_a[first];
        let e = loop_a[(last + 1) % la];

        // Chain interior vertices must belong to these two faces only
        for k in 1..count {
            let v = loop_a[(first + k) % la];
            if self.uses[v as usize] != 2 {
                return false;
            }
        }

        let mut merged = Vec::with_capacity(la + lb - 2 * count);
        let mut i = (last + 1) % la;
        loop {
            merged.push(loop_a[i]);
            if loop_a[i] == s {
                break;
            }
            i = (i + 1) % la;
        }
        let Some(start_b) = loop_b.iter().position(|&v| v == s) else {
            return false;
        };
        let mut j = (start_b + 1) % lb;
        while loop_b[j] != e {
            merged.push(loop_b[j]);
            j = (j + 1) % lb;
        }

        let mut sorted = merged.clone();
        sorted.sort_unstable();
        if merged.len() < 3 || sorted.windows(2).any(|w| w[0] == w[1]) {
            return false;
        }

        self.keys.remove(loop_a);
        self.keys.remove(loop_b);
        if self.keys.contains(&merged) {
            self.keys.insert(loop_a);
            self.keys.insert(loop_b);
            return false;
        }
        self.keys.insert(&merged);

        for k in 1..count {
            let v = loop_a[(first + k) % la];
            self.uses[v as usize] = 0;
        }
        self.uses[s as usize] -= 1;
        self.uses[e as usize] -= 1;

        self.loops[a] = Some(merged);
        self.loops[b] = None;
        self.parent[b] = a;
        self.spread[a] = spread;
        self.live -= 1;
        true
    }
}

/// Merge faces across edges flatter than `angle_limit`, then remove
/// vertices whose two edges bend less than `angle_limit`
///
/// `angle_limit` is in radians. Vertices on open boundaries are only removed
/// when `dissolve_boundaries` is set; boundary edges are never dissolved.
///
/// # Errors
///
/// - `InvalidConfig` if `angle_limit` is outside [0, π]
/// - `DegenerateMesh` if the input fails validation
#[tracing::instrument(skip(mesh), name = "decimate::dissolve_planar")]
pub fn dissolve_planar(mesh: &Mesh, angle_limit: f32, dissolve_boundaries: bool) -> Result<Mesh> {
    check_range("planar angle limit", angle_limit, 0.0, std::f32::consts::PI)?;
    mesh.validate()?;

    let face_normals: Vec<Vec3> = mesh.faces.iter().map(|f| mesh.face_normal(f)).collect();

    let mut candidates: Vec<EdgeCandidate> = edge_face_map(&mesh.faces)
        .into_iter()
        .filter_map(|(key, faces)| {
            let &[f, g] = faces.as_slice() else {
                return None;
            };
            let angle = angle_between(face_normals[f], face_normals[g])?;
            (angle < angle_limit).then_some(EdgeCandidate {
                angle,
                key,
                faces: (f, g),
            })
        })
        .collect();
    candidates.sort_unstable_by(|a, b| a.angle.total_cmp(&b.angle).then(a.key.cmp(&b.key)));

    let closed = mesh.edge_stats().boundary == 0;
    let mut regions = Regions::new(mesh, &face_normals, closed);
    let mut merges = 0usize;
    for candidate in &candidates {
        let a = regions.find(candidate.faces.0);
        let b = regions.find(candidate.faces.1);
        if a != b && regions.try_merge(a, b, angle_limit) {
            merges += 1;
        }
    }

    let mut keys = regions.keys;
    let mut loops: Vec<Vec<u32>> = regions.loops.into_iter().flatten().collect();
    let removed = dissolve_vertices(
        &mesh.positions,
        &mut loops,
        &mut keys,
        angle_limit,
        dissolve_boundaries,
    );

    let mut result = Mesh::new(mesh.positions.clone(), loops);
    result.compact();

    debug!(
        faces_before = mesh.face_count(),
        faces_after = result.face_count(),
        merges,
        removed_vertices = removed,
        "dissolved planar faces"
    );
    Ok(result)
}

/// Remove vertices with exactly two edges bending less than `angle_limit`
///
/// Returns the number of vertices removed.
fn dissolve_vertices(
    positions: &[Vec3],
    loops: &mut [Vec<u32>],
    keys: &mut LoopKeys,
    angle_limit: f32,
    dissolve_boundaries: bool,
) -> usize {
    let n = positions.len();
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut vertex_loops: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (li, face) in loops.iter().enumerate() {
        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
            vertex_loops[a as usize].push(li);
        }
    }
    for ring in &mut adjacency {
        ring.sort_unstable();
        ring.dedup();
    }

    let bend = |adjacency: &[Vec<u32>], v: usize| -> Option<f32> {
        let &[p, q] = adjacency[v].as_slice() else {
            return None;
        };
        let d1 = positions[v] - positions[p as usize];
        let d2 = positions[q as usize] - positions[v];
        angle_between(d1.normalize_or_zero(), d2.normalize_or_zero())
    };

    let mut order: Vec<(f32, usize)> = (0..n)
        .filter_map(|v| bend(&adjacency, v).map(|angle| (angle, v)))
        .filter(|&(angle, _)| angle < angle_limit)
        .collect();
    order.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut removed = 0;
    for (_, v) in order {
        match bend(&adjacency, v) {
            Some(angle) if angle < angle_limit => {}
            _ => continue,
        }
        let on_boundary = vertex_loops[v].len() < 2;
        if on_boundary && !dissolve_boundaries {
            continue;
        }
        let (p, q) = (adjacency[v][0], adjacency[v][1]);
        if adjacency[p as usize].contains(&q) {
            continue;
        }
        if vertex_loops[v].iter().any(|&li| loops[li].len() <= 3) {
            continue;
        }

        let shrunk: Vec<Vec<u32>> = vertex_loops[v]
            .iter()
            .map(|&li| loops[li].iter().copied().filter(|&w| w as usize != v).collect())
            .collect();
        for &li in &vertex_loops[v] {
            keys.remove(&loops[li]);
        }
        let clash = shrunk.iter().enumerate().any(|(i, face)| {
            let key = LoopKeys::key(face);
            keys.contains(face) || shrunk[..i].iter().any(|other| LoopKeys::key(other) == key)
        });
        if clash {
            for &li in &vertex_loops[v] {
                keys.insert(&loops[li]);
            }
            continue;
        }
        for (&li, face) in vertex_loops[v].iter().zip(shrunk) {
            keys.insert(&face);
            loops[li] = face;
        }
        for (from, to) in [(p, q), (q, p)] {
            let ring = &mut adjacency[from as usize];
            ring.retain(|&w| w as usize != v);
            ring.push(to);
            ring.sort_unstable();
        }
        adjacency[v].clear();
        vertex_loops[v].clear();
        removed += 1;
    }
    removed
}

/// Angle between two unit vectors, `None` if either is zero
#[inline]
fn angle_between(a: Vec3, b: Vec3) -> Option<f32> {
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return None;
    }
    Some(a.dot(b).clamp(-1.0, 1.0).acos())
}
