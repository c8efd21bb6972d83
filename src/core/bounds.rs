use glam::Vec3;

/// Axis-aligned box around every position of a mesh.
///
/// `valid` stays false until the first point is expanded in, after which
/// `min <= max` holds on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub valid: bool,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bounds = Bounds::new();
        for p in points {
            bounds.expand(*p);
        }
        bounds
    }

    pub fn expand(&mut self, p: Vec3) {
        if !self.valid {
            self.min = p;
            self.max = p;
            self.valid = true;
            return;
        }
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest span over the three axes.
    pub fn max_extent(&self) -> f32 {
        (self.max - self.min).max_element()
    }
}
