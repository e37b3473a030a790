//! Scene renderer
//!
//! Draws the stylized tabletop view: a circular table with animated
//! decorative rings, one glowing disc per marker, connection lines between
//! nearby markers and a HUD with the detection summary. The only mutable
//! state is the animation counter; everything else is fixed layout
//! computed at construction.

mod draw;

pub use draw::{paint_commands, DrawCmd};

use egui::{pos2, Align2, Color32, Pos2};

use crate::detect::{Marker, MarkerClass};

const BACKGROUND: Color32 = Color32::from_rgb(20, 30, 50);
const TABLE_SURFACE: Color32 = Color32::from_rgb(0, 100, 200);
const CONNECTION_LINE: Color32 = Color32::from_rgb(255, 255, 255);
const OBJECT_GLOW: Color32 = Color32::from_rgb(100, 200, 255);
const TEXT_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

const TITLE_FONT_SIZE: f32 = 36.0;
const SMALL_FONT_SIZE: f32 = 24.0;

const MARKER_RADIUS: f32 = 20.0;
const ROTATION_TICK_LENGTH: f32 = 15.0;
/// Markers closer than this get a connection line.
const CONNECTION_DISTANCE: f32 = 300.0;
/// At most this many markers are listed in the HUD.
const HUD_MARKER_LINES: usize = 5;

const TITLE: &str = "Tangible Table";
const INSTRUCTIONS: [&str; 2] = ["ESC: quit", "Place colored blocks on the table to interact"];

/// Draw color for a marker category. Total over the closed enum; the glow
/// color doubles as the fallback for any future category.
fn class_color(class: MarkerClass) -> Color32 {
    match class {
        MarkerClass::GreenCube => Color32::from_rgb(0, 255, 0),
        MarkerClass::RedCube => Color32::from_rgb(255, 0, 0),
        MarkerClass::BlueCube => Color32::from_rgb(0, 0, 255),
    }
}

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Composes the tabletop display list once per tick.
pub struct SceneRenderer {
    height: u32,
    table_center: Pos2,
    table_radius: f32,
    animation_tick: u64,
    display: Vec<DrawCmd>,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let table_center = pos2((width / 2) as f32, (height / 2) as f32);
        let table_radius = (width.min(height) / 3) as f32;
        Self {
            height,
            table_center,
            table_radius,
            animation_tick: 0,
            display: vec![DrawCmd::Clear { color: BACKGROUND }],
        }
    }

    /// Recompose the display list for the given markers and advance the
    /// animation counter.
    pub fn render(&mut self, markers: &[Marker]) -> &[DrawCmd] {
        self.display = self.compose(markers, self.animation_tick);
        self.animation_tick += 1;
        &self.display
    }

    /// The most recently composed display list.
    pub fn commands(&self) -> &[DrawCmd] {
        &self.display
    }

    /// Pure composition at a fixed animation counter value.
    pub fn compose(&self, markers: &[Marker], tick: u64) -> Vec<DrawCmd> {
        let t = tick as f32;
        let mut out = Vec::with_capacity(16 + markers.len() * 8);

        out.push(DrawCmd::Clear { color: BACKGROUND });
        self.push_table(&mut out, t);
        for marker in markers {
            self.push_marker(&mut out, marker, t);
        }
        self.push_connections(&mut out, markers, t);
        self.push_hud(&mut out, markers);
        out
    }

    /// Table disc, border and three pulsing rings, phase-shifted per ring.
    fn push_table(&self, out: &mut Vec<DrawCmd>, t: f32) {
        out.push(DrawCmd::FilledCircle {
            center: self.table_center,
            radius: self.table_radius,
            color: TABLE_SURFACE,
        });
        out.push(DrawCmd::CircleOutline {
            center: self.table_center,
            radius: self.table_radius,
            width: 3.0,
            color: CONNECTION_LINE,
        });

        for i in 0..3 {
            let alpha = 50.0 + 30.0 * (0.05 * t + i as f32).sin();
            let radius = self.table_radius - 50.0 - 30.0 * i as f32;
            if radius > 0.0 {
                out.push(DrawCmd::CircleOutline {
                    center: self.table_center,
                    radius,
                    width: 2.0,
                    color: with_alpha(OBJECT_GLOW, alpha as u8),
                });
            }
        }
    }

    fn push_marker(&self, out: &mut Vec<DrawCmd>, marker: &Marker, t: f32) {
        let center = pos2(marker.position.0 as f32, marker.position.1 as f32);
        let color = class_color(marker.class);

        let glow_radius = 40.0 + 10.0 * (0.1 * t).sin();
        out.push(DrawCmd::FilledCircle {
            center,
            radius: glow_radius,
            color: with_alpha(color, 100),
        });
        out.push(DrawCmd::FilledCircle {
            center,
            radius: MARKER_RADIUS,
            color,
        });
        out.push(DrawCmd::CircleOutline {
            center,
            radius: MARKER_RADIUS,
            width: 2.0,
            color: CONNECTION_LINE,
        });

        let angle = marker.rotation.to_radians();
        let tip = pos2(
            center.x + ROTATION_TICK_LENGTH * angle.cos(),
            center.y + ROTATION_TICK_LENGTH * angle.sin(),
        );
        out.push(DrawCmd::Line {
            from: center,
            to: tip,
            width: 3.0,
            color: CONNECTION_LINE,
        });

        out.push(DrawCmd::Text {
            pos: pos2(center.x, center.y - 35.0),
            anchor: Align2::CENTER_CENTER,
            size: SMALL_FONT_SIZE,
            color: TEXT_COLOR,
            text: marker.id.to_string(),
        });
    }

    /// Translucent line plus midpoint dot for every close pair. Quadratic
    /// in marker count, which stays tiny at tabletop scale.
    fn push_connections(&self, out: &mut Vec<DrawCmd>, markers: &[Marker], t: f32) {
        if markers.len() < 2 {
            return;
        }

        for i in 0..markers.len() {
            for j in i + 1..markers.len() {
                let (ax, ay) = markers[i].position;
                let (bx, by) = markers[j].position;
                let dx = (bx - ax) as f32;
                let dy = (by - ay) as f32;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance >= CONNECTION_DISTANCE {
                    continue;
                }

                let alpha = 100.0 + 50.0 * (0.08 * t).sin();
                out.push(DrawCmd::Line {
                    from: pos2(ax as f32, ay as f32),
                    to: pos2(bx as f32, by as f32),
                    width: 2.0,
                    color: with_alpha(CONNECTION_LINE, alpha as u8),
                });
                out.push(DrawCmd::FilledCircle {
                    center: pos2(((ax + bx) / 2) as f32, ((ay + by) / 2) as f32),
                    radius: 5.0,
                    color: OBJECT_GLOW,
                });
            }
        }
    }

    fn push_hud(&self, out: &mut Vec<DrawCmd>, markers: &[Marker]) {
        out.push(DrawCmd::Text {
            pos: pos2(20.0, 20.0),
            anchor: Align2::LEFT_TOP,
            size: TITLE_FONT_SIZE,
            color: TEXT_COLOR,
            text: TITLE.to_string(),
        });
        out.push(DrawCmd::Text {
            pos: pos2(20.0, 70.0),
            anchor: Align2::LEFT_TOP,
            size: SMALL_FONT_SIZE,
            color: TEXT_COLOR,
            text: format!("Objects detected: {}", markers.len()),
        });

        for (i, marker) in markers.iter().take(HUD_MARKER_LINES).enumerate() {
            out.push(DrawCmd::Text {
                pos: pos2(20.0, 100.0 + 25.0 * i as f32),
                anchor: Align2::LEFT_TOP,
                size: SMALL_FONT_SIZE,
                color: TEXT_COLOR,
                text: format!(
                    "ID {}: {} at ({}, {})",
                    marker.id,
                    marker.class.label(),
                    marker.position.0,
                    marker.position.1
                ),
            });
        }

        for (i, line) in INSTRUCTIONS.iter().enumerate() {
            out.push(DrawCmd::Text {
                pos: pos2(20.0, self.height as f32 - 60.0 + 25.0 * i as f32),
                anchor: Align2::LEFT_TOP,
                size: SMALL_FONT_SIZE,
                color: TEXT_COLOR,
                text: (*line).to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u32, x: i32, y: i32) -> Marker {
        Marker {
            id,
            position: (x, y),
            rotation: 0.0,
            class: MarkerClass::GreenCube,
            confidence: 0.5,
        }
    }

    fn connection_lines(commands: &[DrawCmd], a: Pos2, b: Pos2) -> usize {
        commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCmd::Line { from, to, .. } if *from == a && *to == b))
            .count()
    }

    #[test]
    fn test_compose_starts_with_clear() {
        let scene = SceneRenderer::new(1920, 1080);
        let commands = scene.compose(&[], 0);
        assert_eq!(commands[0], DrawCmd::Clear { color: BACKGROUND });
    }

    #[test]
    fn test_compose_is_deterministic_at_fixed_tick() {
        let scene = SceneRenderer::new(1920, 1080);
        let markers = [marker(0, 400, 400), marker(1, 500, 480)];
        assert_eq!(scene.compose(&markers, 7), scene.compose(&markers, 7));
    }

    #[test]
    fn test_render_advances_animation() {
        let mut scene = SceneRenderer::new(1920, 1080);
        let markers = [marker(0, 400, 400)];
        let first = scene.render(&markers).to_vec();
        let second = scene.render(&markers).to_vec();
        assert_ne!(first, second, "counter-driven oscillation should differ");
    }

    #[test]
    fn test_close_markers_get_connection_and_midpoint() {
        let scene = SceneRenderer::new(1920, 1080);
        let markers = [marker(0, 100, 100), marker(1, 150, 100)];
        let commands = scene.compose(&markers, 0);

        assert_eq!(
            connection_lines(&commands, pos2(100.0, 100.0), pos2(150.0, 100.0)),
            1
        );
        let midpoint = commands.iter().any(|cmd| {
            matches!(
                cmd,
                DrawCmd::FilledCircle { center, radius, .. }
                    if *center == pos2(125.0, 100.0) && *radius == 5.0
            )
        });
        assert!(midpoint, "expected a midpoint dot at (125, 100)");
    }

    #[test]
    fn test_distant_markers_get_no_connection() {
        let scene = SceneRenderer::new(1920, 1080);
        let markers = [marker(0, 0, 0), marker(1, 1000, 1000)];
        let commands = scene.compose(&markers, 0);

        assert_eq!(connection_lines(&commands, pos2(0.0, 0.0), pos2(1000.0, 1000.0)), 0);
        let midpoint = commands.iter().any(|cmd| {
            matches!(
                cmd,
                DrawCmd::FilledCircle { center, radius, .. }
                    if *center == pos2(500.0, 500.0) && *radius == 5.0
            )
        });
        assert!(!midpoint);
    }

    #[test]
    fn test_rotation_tick_endpoint() {
        let scene = SceneRenderer::new(1920, 1080);
        let mut m = marker(0, 100, 100);
        m.rotation = 0.0;
        let commands = scene.compose(&[m], 0);
        assert_eq!(
            connection_lines(&commands, pos2(100.0, 100.0), pos2(115.0, 100.0)),
            1
        );
    }

    #[test]
    fn test_table_layout() {
        let scene = SceneRenderer::new(1920, 1080);
        let commands = scene.compose(&[], 0);

        // Table disc at the screen center, radius one third of the smaller
        // dimension.
        let table = commands.iter().find_map(|cmd| match cmd {
            DrawCmd::FilledCircle {
                center,
                radius,
                color,
            } if *color == TABLE_SURFACE => Some((*center, *radius)),
            _ => None,
        });
        assert_eq!(table, Some((pos2(960.0, 540.0), 360.0)));

        // All three decorative rings fit at this resolution.
        let rings = commands
            .iter()
            .filter(|cmd| {
                matches!(cmd, DrawCmd::CircleOutline { radius, width, .. }
                    if *width == 2.0 && *radius < 360.0)
            })
            .count();
        assert_eq!(rings, 3);
    }

    #[test]
    fn test_undersized_screen_skips_rings() {
        // Table radius 33: every ring radius goes non-positive.
        let scene = SceneRenderer::new(100, 100);
        let commands = scene.compose(&[], 0);
        let rings = commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCmd::CircleOutline { width, .. } if *width == 2.0))
            .count();
        assert_eq!(rings, 0);
    }

    #[test]
    fn test_hud_lists_at_most_five_markers() {
        let scene = SceneRenderer::new(1920, 1080);
        let markers: Vec<Marker> = (0..7).map(|i| marker(i, 300 + 400 * i as i32, 300)).collect();
        let commands = scene.compose(&markers, 0);

        let hud_lines = |prefix: &str| {
            commands
                .iter()
                .filter(|cmd| matches!(cmd, DrawCmd::Text { text, .. } if text.starts_with(prefix)))
                .count()
        };
        assert_eq!(hud_lines("ID 4:"), 1);
        assert_eq!(hud_lines("ID 5:"), 0);
        assert_eq!(hud_lines("Objects detected: 7"), 1);
    }
}
