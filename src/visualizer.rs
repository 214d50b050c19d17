// src/visualizer.rs
use eframe::egui;
use egui::{Color32, Pos2, Rect, Shape, Stroke};

use meaview::mea::electrode::{GRID_COLUMNS, GRID_ROWS};
use meaview::mea::vertex::Primitive;
use meaview::mea::{grid_lines, Frame, GridFrame, TraceFrame};

const TRACE_BLUE: Color32 = Color32::from_rgb(89, 128, 182);
const GRID_GRAY: Color32 = Color32::from_rgb(102, 102, 102);

/// Clip space (y up) to screen space inside `rect` (y down).
fn clip_to_screen(rect: Rect, clip: [f32; 2]) -> Pos2 {
    Pos2::new(
        rect.left() + (clip[0] + 1.0) * 0.5 * rect.width(),
        rect.top() + (1.0 - clip[1]) * 0.5 * rect.height(),
    )
}

pub fn draw_frame(painter: &egui::Painter, rect: Rect, frame: &Frame, top_margin_px: f32) {
    match frame {
        Frame::Grid(grid) => {
            painter.rect_filled(rect, 0.0, Color32::from_rgb(230, 232, 232));
            draw_grid(painter, rect, grid);
            draw_grid_lines(painter, rect);
        }
        Frame::Trace(trace) => {
            painter.rect_filled(rect, 0.0, Color32::from_gray(128));
            let mut area = rect;
            area.min.y += top_margin_px;
            draw_traces(painter, area, trace);
        }
    }
}

fn draw_grid(painter: &egui::Painter, rect: Rect, frame: &GridFrame) {
    let stroke = Stroke::new(1.0, TRACE_BLUE);
    for strip in frame.channel_strips() {
        let points: Vec<Pos2> = strip
            .iter()
            .map(|v| clip_to_screen(rect, frame.uniforms.project(*v)))
            .collect();
        stroke_points(painter, points, frame.primitive, stroke);
    }
}

fn draw_grid_lines(painter: &egui::Painter, rect: Rect) {
    let stroke = Stroke::new(2.0, GRID_GRAY);
    for pair in grid_lines(GRID_COLUMNS, GRID_ROWS).chunks_exact(2) {
        painter.line_segment(
            [clip_to_screen(rect, pair[0]), clip_to_screen(rect, pair[1])],
            stroke,
        );
    }
}

fn draw_traces(painter: &egui::Painter, rect: Rect, frame: &TraceFrame) {
    let stroke = Stroke::new(1.5, TRACE_BLUE);
    let painter = painter.with_clip_rect(rect);
    for (index, strip) in frame.strips() {
        let points: Vec<Pos2> = strip
            .iter()
            .map(|p| clip_to_screen(rect, frame.uniforms.project(*p, index as f32)))
            .collect();
        stroke_points(&painter, points, frame.primitive, stroke);
    }
}

fn stroke_points(painter: &egui::Painter, points: Vec<Pos2>, primitive: Primitive, stroke: Stroke) {
    match primitive {
        Primitive::LineStrip => {
            painter.add(Shape::line(points, stroke));
        }
        Primitive::Lines => {
            for pair in points.chunks_exact(2) {
                painter.line_segment([pair[0], pair[1]], stroke);
            }
        }
    }
}
