use std::collections::HashMap;

use egui::Pos2;

/// Screen distance under which markers are merged, in points.
pub const CLUSTER_RADIUS: f32 = 80.0;

/// A group of markers drawn as one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices of the members, in input order.
    pub members: Vec<usize>,
    /// Screen position of the first member; every member lies within the
    /// radius of it.
    pub anchor: Pos2,
    /// Mean screen position of the members, where the symbol is drawn.
    pub center: Pos2,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Greedily groups projected markers.
///
/// Points are visited in order; each joins the nearest cluster whose anchor is
/// closer than `radius`, or starts a new one. A uniform grid with `radius`
/// sized cells keeps the neighbour search to the 3x3 cells around a point.
///
/// # Arguments
/// * `points` - `(index, screen position)` pairs.
/// * `radius` - Merge distance in points.
pub fn cluster_points(points: &[(usize, Pos2)], radius: f32) -> Vec<Cluster> {
    let radius = radius.max(1.0);
    let cell_of = |p: Pos2| ((p.x / radius).floor() as i32, (p.y / radius).floor() as i32);

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut sums: Vec<(f32, f32)> = Vec::new();
    let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();

    for &(index, position) in points {
        let (cx, cy) = cell_of(position);

        let mut nearest: Option<(usize, f32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &candidate in candidates {
                    let distance = clusters[candidate].anchor.distance(position);
                    if distance < radius && nearest.map_or(true, |(_, best)| distance < best) {
                        nearest = Some((candidate, distance));
                    }
                }
            }
        }

        match nearest {
            Some((found, _)) => {
                let cluster = &mut clusters[found];
                cluster.members.push(index);
                let sum = &mut sums[found];
                sum.0 += position.x;
                sum.1 += position.y;
                let n = cluster.members.len() as f32;
                cluster.center = Pos2::new(sum.0 / n, sum.1 / n);
            }
            None => {
                grid.entry((cx, cy)).or_default().push(clusters.len());
                clusters.push(Cluster {
                    members: vec![index],
                    anchor: position,
                    center: position,
                });
                sums.push((position.x, position.y));
            }
        }
    }

    clusters
}
