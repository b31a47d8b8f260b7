//! Annotation canvas.
//!
//! Loads an uploaded screenshot as a fixed-aspect background no larger than
//! 800×600, lets the user overlay rectangles and freehand strokes, and
//! flattens everything into a single PNG.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::crop::{decode_bitmap, encode_png};
use crate::error::CoreError;
use crate::types::{Point, SelectionRect};

/// Canvas bounds the background is fitted into.
pub const MAX_CANVAS_WIDTH: u32 = 800;
pub const MAX_CANVAS_HEIGHT: u32 = 600;

/// `#ef4444`
pub const STROKE_COLOR: Rgba<u8> = Rgba([0xef, 0x44, 0x44, 0xff]);
pub const STROKE_WIDTH: f64 = 3.0;

/// Rectangle inserted when the rectangle tool is picked.
pub const DEFAULT_RECTANGLE: SelectionRect = SelectionRect {
    left: 100.0,
    top: 100.0,
    width: 150.0,
    height: 100.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Rectangle,
    Draw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Rectangle {
        rect: SelectionRect,
        color: Rgba<u8>,
        width: f64,
    },
    Freehand {
        points: Vec<Point>,
        color: Rgba<u8>,
        width: f64,
    },
}

/// Fit `width × height` into `max_w × max_h` keeping the aspect ratio.
///
/// Images wider than the bound's aspect fill the width; all others fill the
/// height.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let aspect = f64::from(width) / f64::from(height.max(1));
    let bound_aspect = f64::from(max_w) / f64::from(max_h);
    if aspect > bound_aspect {
        (max_w, (f64::from(max_w) / aspect).round().max(1.0) as u32)
    } else {
        ((f64::from(max_h) * aspect).round().max(1.0) as u32, max_h)
    }
}

pub struct AnnotationCanvas {
    background: RgbaImage,
    annotations: Vec<Annotation>,
    tool: Tool,
}

impl AnnotationCanvas {
    /// Decode `bytes` and scale it onto a fitted canvas.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let source = decode_bitmap(bytes)?;
        let (w, h) = fit_within(
            source.width(),
            source.height(),
            MAX_CANVAS_WIDTH,
            MAX_CANVAS_HEIGHT,
        );
        let background = imageops::resize(&source, w, h, FilterType::Triangle);
        Ok(Self {
            background,
            annotations: Vec::new(),
            tool: Tool::Select,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.background.dimensions()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Switch tools. Picking the rectangle tool drops a default rectangle
    /// onto the canvas.
    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if tool == Tool::Rectangle {
            self.add_rectangle(DEFAULT_RECTANGLE);
        }
    }

    pub fn add_rectangle(&mut self, rect: SelectionRect) {
        self.annotations.push(Annotation::Rectangle {
            rect,
            color: STROKE_COLOR,
            width: STROKE_WIDTH,
        });
    }

    /// Record a freehand stroke. Only accepted while the draw tool is active.
    pub fn add_stroke(&mut self, points: Vec<Point>) -> bool {
        if self.tool != Tool::Draw || points.is_empty() {
            return false;
        }
        self.annotations.push(Annotation::Freehand {
            points,
            color: STROKE_COLOR,
            width: STROKE_WIDTH,
        });
        true
    }

    /// Remove every overlay, keeping the background.
    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Render background and overlays into raw pixels.
    pub fn render(&self) -> RgbaImage {
        let mut out = self.background.clone();
        for annotation in &self.annotations {
            match annotation {
                Annotation::Rectangle { rect, color, width } => {
                    draw_rect_outline(&mut out, rect, *color, *width);
                }
                Annotation::Freehand {
                    points,
                    color,
                    width,
                } => draw_polyline(&mut out, points, *color, *width),
            }
        }
        out
    }

    /// Render and encode as PNG.
    pub fn flatten(&self) -> Result<Vec<u8>, CoreError> {
        encode_png(&self.render())
    }
}

fn draw_rect_outline(img: &mut RgbaImage, rect: &SelectionRect, color: Rgba<u8>, width: f64) {
    let (x0, y0) = (rect.left, rect.top);
    let (x1, y1) = (rect.left + rect.width, rect.top + rect.height);
    draw_thick_line(img, x0, y0, x1, y0, color, width);
    draw_thick_line(img, x1, y0, x1, y1, color, width);
    draw_thick_line(img, x1, y1, x0, y1, color, width);
    draw_thick_line(img, x0, y1, x0, y0, color, width);
}

fn draw_polyline(img: &mut RgbaImage, points: &[Point], color: Rgba<u8>, width: f64) {
    if let [only] = points {
        draw_disc(img, only.x, only.y, width / 2.0, color);
        return;
    }
    for pair in points.windows(2) {
        draw_thick_line(img, pair[0].x, pair[0].y, pair[1].x, pair[1].y, color, width);
    }
}

fn draw_thick_line(
    img: &mut RgbaImage,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    color: Rgba<u8>,
    width: f64,
) {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let steps = (dx * dx + dy * dy).sqrt().max(1.0).ceil() as i32;
    let radius = (width.max(1.0) / 2.0).max(0.6);
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        draw_disc(img, x1 + dx * t, y1 + dy * t, radius, color);
    }
}

fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let min_x = ((cx - radius).floor() as i64).max(0);
    let max_x = ((cx + radius).ceil() as i64).min(w - 1);
    let min_y = ((cy - radius).floor() as i64).max(0);
    let max_y = ((cy + radius).ceil() as i64).min(h - 1);
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let ddx = x as f64 - cx;
            let ddy = y as f64 - cy;
            if ddx * ddx + ddy * ddy <= r2 {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
