// Skeleton overlay rendering
// Projects normalized landmarks onto a raster and draws joints and bones

use crate::models::{Landmark, CONNECTIONS};

/// Radius of a joint marker, in raster units
pub const MARKER_RADIUS: f64 = 3.0;

/// Width of a bone segment, in raster units
pub const SEGMENT_WIDTH: f64 = 2.0;

/// A position on the raster, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawing target for the skeleton overlay
pub trait Surface {
    /// Match the raster size of the frame being annotated
    fn resize(&mut self, width: f64, height: f64);

    fn clear(&mut self);

    fn fill_marker(&mut self, at: Point, radius: f64);

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64);
}

/// Redraw the skeleton from scratch.
///
/// Landmarks at or below the visibility threshold are skipped, as is every
/// connection touching a missing or skipped landmark.
pub fn render_landmarks<S: Surface + ?Sized>(
    surface: &mut S,
    landmarks: &[Landmark],
    width: f64,
    height: f64,
) {
    surface.resize(width, height);
    surface.clear();

    for landmark in landmarks.iter().filter(|lm| lm.is_visible()) {
        let (x, y) = landmark.project(width, height);
        surface.fill_marker(Point::new(x, y), MARKER_RADIUS);
    }

    for (a, b) in CONNECTIONS {
        let (Some(start), Some(end)) = (landmarks.get(a), landmarks.get(b)) else {
            continue;
        };

        if !(start.is_visible() && end.is_visible()) {
            continue;
        }

        let (x1, y1) = start.project(width, height);
        let (x2, y2) = end.project(width, height);
        surface.stroke_segment(Point::new(x1, y1), Point::new(x2, y2), SEGMENT_WIDTH);
    }
}

/// One recorded drawing primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Marker { at: Point, radius: f64 },
    Segment { from: Point, to: Point, width: f64 },
}

/// Surface that records primitives for later display
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn markers(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.shapes.iter().filter_map(|shape| match *shape {
            Shape::Marker { at, radius } => Some((at, radius)),
            Shape::Segment { .. } => None,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.shapes.iter().filter_map(|shape| match *shape {
            Shape::Segment { from, to, .. } => Some((from, to)),
            Shape::Marker { .. } => None,
        })
    }
}

impl Surface for Scene {
    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn fill_marker(&mut self, at: Point, radius: f64) {
        self.shapes.push(Shape::Marker { at, radius });
    }

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64) {
        self.shapes.push(Shape::Segment { from, to, width });
    }
}
