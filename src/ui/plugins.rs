use egui::{Align2, Color32, FontId, Painter, Pos2, Response, Stroke};
use walkers::{Plugin, Projector};

use crate::data::ski_data::{Coordinate, SkiDataset};
use crate::ui::cluster::{cluster_points, Cluster, CLUSTER_RADIUS};

const MARKER_RADIUS: f32 = 7.0;
const MARKER_HIT_RADIUS: f32 = 12.0;
const MARKER_COLOR: Color32 = Color32::from_rgb(0x2A, 0x81, 0xCB);

/// What the user clicked on the marker layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerClick {
    /// A single ski area.
    Area { name: String, coordinate: Coordinate },
    /// A cluster; members are given by name order.
    Cluster { members: Vec<(String, Coordinate)> },
}

/// One marker per ski area, clustered by screen distance.
#[derive(Default)]
pub struct SkiAreaMarkers {
    areas: Vec<(String, Coordinate)>,
    clicked: Option<MarkerClick>,
}

impl SkiAreaMarkers {
    /// Creates the layer from the dataset. Markers are kept in name order so
    /// clustering is stable between frames.
    pub fn new(dataset: &SkiDataset) -> Self {
        let mut areas: Vec<(String, Coordinate)> = dataset
            .ski_areas
            .iter()
            .map(|(name, coordinate)| (name.clone(), *coordinate))
            .collect();
        areas.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            areas,
            clicked: None,
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Returns and forgets the click of the last frame.
    pub fn take_click(&mut self) -> Option<MarkerClick> {
        self.clicked.take()
    }

    fn click_for(&self, cluster: &Cluster) -> MarkerClick {
        if cluster.is_single() {
            let (name, coordinate) = &self.areas[cluster.members[0]];
            MarkerClick::Area {
                name: name.clone(),
                coordinate: *coordinate,
            }
        } else {
            MarkerClick::Cluster {
                members: cluster
                    .members
                    .iter()
                    .map(|index| self.areas[*index].clone())
                    .collect(),
            }
        }
    }
}

/// Radius and fill of a cluster symbol, growing with its size.
fn cluster_style(count: usize) -> (f32, Color32) {
    if count < 10 {
        (15.0, Color32::from_rgb(110, 204, 57))
    } else if count < 100 {
        (19.0, Color32::from_rgb(240, 194, 12))
    } else {
        (23.0, Color32::from_rgb(241, 128, 23))
    }
}

fn hit_radius(cluster: &Cluster) -> f32 {
    if cluster.is_single() {
        MARKER_HIT_RADIUS
    } else {
        cluster_style(cluster.len()).0
    }
}

fn draw_label(painter: &Painter, anchor: Pos2, text: &str) {
    let galley = painter.layout_no_wrap(text.to_string(), FontId::proportional(13.0), Color32::BLACK);
    let rect = Align2::CENTER_BOTTOM
        .anchor_size(anchor, galley.size())
        .expand(4.0);
    painter.rect_filled(rect, 4.0, Color32::WHITE);
    painter.rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::GRAY));
    painter.galley(rect.min + egui::vec2(4.0, 4.0), galley, Color32::BLACK);
}

impl Plugin for &mut SkiAreaMarkers {
    fn run(&mut self, response: &Response, painter: Painter, projector: &Projector) {
        let visible = response.rect.expand(CLUSTER_RADIUS);
        let points: Vec<(usize, Pos2)> = self
            .areas
            .iter()
            .enumerate()
            .map(|(index, (_, coordinate))| {
                (index, projector.project(coordinate.to_position()).to_pos2())
            })
            .filter(|(_, position)| visible.contains(*position))
            .collect();

        let clusters = cluster_points(&points, CLUSTER_RADIUS);
        let hover = response.hover_pos();
        let click = if !response.changed() && response.clicked_by(egui::PointerButton::Primary) {
            response.interact_pointer_pos()
        } else {
            None
        };

        let mut hovered: Option<&Cluster> = None;
        let mut nearest_click: Option<(&Cluster, f32)> = None;

        for cluster in &clusters {
            if cluster.is_single() {
                painter.circle_filled(cluster.center, MARKER_RADIUS, MARKER_COLOR);
                painter.circle_stroke(cluster.center, MARKER_RADIUS, Stroke::new(2.0, Color32::WHITE));
            } else {
                let (radius, fill) = cluster_style(cluster.len());
                painter.circle_filled(cluster.center, radius + 4.0, fill.gamma_multiply(0.5));
                painter.circle_filled(cluster.center, radius, fill);
                painter.text(
                    cluster.center,
                    Align2::CENTER_CENTER,
                    cluster.len().to_string(),
                    FontId::proportional(12.0),
                    Color32::BLACK,
                );
            }

            let reach = hit_radius(cluster);
            if let Some(hover_pos) = hover {
                if hover_pos.distance(cluster.center) < reach {
                    hovered = Some(cluster);
                }
            }
            if let Some(click_pos) = click {
                let distance = click_pos.distance(cluster.center);
                if distance < reach && nearest_click.map_or(true, |(_, best)| distance < best) {
                    nearest_click = Some((cluster, distance));
                }
            }
        }

        if let Some(cluster) = hovered.filter(|cluster| cluster.is_single()) {
            let name = &self.areas[cluster.members[0]].0;
            draw_label(
                &painter,
                cluster.center - egui::vec2(0.0, MARKER_RADIUS + 4.0),
                name,
            );
        }

        if let Some((cluster, _)) = nearest_click {
            self.clicked = Some(self.click_for(cluster));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dataset() -> SkiDataset {
        SkiDataset::from_json(
            br#"{"ski_areas": {"Bansko": [41.8, 23.5], "Alpbach": [47.4, 11.9], "Kitzbuehel": [47.45, 12.39]},
                 "tile_url": "https://t/{z}/{x}/{y}.png"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_markers_are_sorted_by_name() {
        let markers = SkiAreaMarkers::new(&dataset());
        let names: Vec<&str> = markers.areas.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Alpbach", "Bansko", "Kitzbuehel"]);
    }

    #[test]
    fn test_click_for_single_and_cluster() {
        let markers = SkiAreaMarkers::new(&dataset());
        let single = Cluster {
            members: vec![1],
            anchor: Pos2::ZERO,
            center: Pos2::ZERO,
        };
        assert_eq!(
            markers.click_for(&single),
            MarkerClick::Area {
                name: "Bansko".to_string(),
                coordinate: Coordinate::new(41.8, 23.5)
            }
        );

        let group = Cluster {
            members: vec![0, 2],
            anchor: Pos2::ZERO,
            center: Pos2::ZERO,
        };
        match markers.click_for(&group) {
            MarkerClick::Cluster { members } => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].0, "Alpbach");
            }
            other => panic!("unexpected click {:?}", other),
        }
    }

    #[test]
    fn test_cluster_style_grows() {
        assert!(cluster_style(5).0 < cluster_style(50).0);
        assert!(cluster_style(50).0 < cluster_style(500).0);
    }
}
