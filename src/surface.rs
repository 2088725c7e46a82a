pub type Rgb = (u8, u8, u8);

// Row-major 2x3 affine matrix `[a c e; b d f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    // `self * other`: `other` is applied first.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Transform {
        self.then(&Transform {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        })
    }

    pub fn rotated(&self, radians: f32) -> Transform {
        let (sin, cos) = radians.sin_cos();
        self.then(&Transform {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Transform {
        self.then(&Transform {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    // Geometric mean of the axis scales, used to size strokes.
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub trait Surface {
    fn clear(&mut self);
    // Pull every pixel toward the background, keeping `keep` of its colour.
    fn fade(&mut self, keep: f32);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);

    fn set_global_alpha(&mut self, alpha: f32);
    fn set_fill_color(&mut self, color: Rgb);
    fn set_stroke_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32);
    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32, anticlockwise: bool);
    fn close_path(&mut self);

    fn fill(&mut self);
    fn stroke(&mut self);
}
