//! Primitive draw commands and their translation to an egui painter.
//!
//! The renderer composes a display list instead of painting directly, so
//! the exact primitive sequence can be asserted in tests without a window.

use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Stroke};

/// One 2D drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Fill the whole surface.
    Clear { color: Color32 },
    FilledCircle {
        center: Pos2,
        radius: f32,
        color: Color32,
    },
    CircleOutline {
        center: Pos2,
        radius: f32,
        width: f32,
        color: Color32,
    },
    Line {
        from: Pos2,
        to: Pos2,
        width: f32,
        color: Color32,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        size: f32,
        color: Color32,
        text: String,
    },
}

/// Replay a display list onto a painter.
pub fn paint_commands(painter: &egui::Painter, commands: &[DrawCmd]) {
    for command in commands {
        match command {
            DrawCmd::Clear { color } => {
                painter.rect_filled(painter.clip_rect(), CornerRadius::ZERO, *color);
            }
            DrawCmd::FilledCircle {
                center,
                radius,
                color,
            } => {
                painter.circle_filled(*center, *radius, *color);
            }
            DrawCmd::CircleOutline {
                center,
                radius,
                width,
                color,
            } => {
                painter.circle_stroke(*center, *radius, Stroke::new(*width, *color));
            }
            DrawCmd::Line {
                from,
                to,
                width,
                color,
            } => {
                painter.line_segment([*from, *to], Stroke::new(*width, *color));
            }
            DrawCmd::Text {
                pos,
                anchor,
                size,
                color,
                text,
            } => {
                painter.text(*pos, *anchor, text, FontId::proportional(*size), *color);
            }
        }
    }
}
