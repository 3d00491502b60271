use serde::{Deserialize, Serialize};

/// Number of body joints reported per frame by the inference service
pub const LANDMARK_COUNT: usize = 33;

/// Landmarks at or below this confidence are never drawn
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Skeleton edges as (start, end) landmark indices: face, shoulders, arms, torso, legs
pub const CONNECTIONS: [(usize, usize); 31] = [
    // Face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // Shoulders
    (11, 12),
    // Left arm
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    // Right arm
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    // Torso
    (11, 23),
    (12, 24),
    (23, 24),
    // Left leg
    (23, 25),
    (25, 27),
    (27, 29),
    (29, 31),
    // Right leg
    (24, 26),
    (26, 28),
    (28, 30),
    (30, 32),
];

/// A single body-joint position normalized to the image, with a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate (normalized 0-1, left to right)
    pub x: f32,
    /// Y coordinate (normalized 0-1, top to bottom)
    pub y: f32,
    /// Detection confidence (0-1). Missing on the wire means not visible.
    #[serde(default)]
    pub visibility: f32,
    /// Relative depth, not used for drawing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            visibility,
            z: None,
        }
    }

    /// Whether the landmark is confident enough to draw
    pub fn is_visible(&self) -> bool {
        self.visibility > VISIBILITY_THRESHOLD
    }

    /// Project onto a raster of the given size
    pub fn project(&self, width: f64, height: f64) -> (f64, f64) {
        (self.x as f64 * width, self.y as f64 * height)
    }
}
