use super::shapes::{self, Shape, Stamp};
use crate::surface::{Rgb, Surface};

// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        (
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    // Direction of travel, fixed at creation
    pub angle: f32,
    pub speed: f32,
    pub color: Hsl,
    pub opacity: f32,
    pub size: f32,
    pub shape: Shape,
    rgb: Rgb,
    ticks: u32,
}

impl Particle {
    pub fn new(x: f32, y: f32, angle: f32, speed: f32, color: Hsl, size: f32, shape: Shape) -> Self {
        Self {
            x,
            y,
            angle,
            speed,
            color,
            opacity: 1.0,
            size,
            shape,
            rgb: color.to_rgb(),
            ticks: 0,
        }
    }

    pub fn advance(&mut self, damping: f32, decay: f32) {
        self.x += self.angle.cos() * self.speed;
        self.y += self.angle.sin() * self.speed;
        self.speed *= damping;
        self.ticks += 1;
        self.opacity = (1.0 - self.ticks as f32 * decay).max(0.0);
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            x: self.x,
            y: self.y,
            size: self.size,
            angle: self.angle,
            color: self.rgb,
            alpha: self.opacity,
        }
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        shapes::draw(surface, self.shape, &self.stamp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::surface::recording::Recorder;
    use std::f32::consts::FRAC_PI_2;

    fn red() -> Hsl {
        Hsl {
            hue: 0.0,
            saturation: 100.0,
            lightness: 50.0,
        }
    }

    #[test]
    fn test_hsl_to_rgb() {
        assert_eq!(red().to_rgb(), (255, 0, 0));
        let green = Hsl { hue: 120.0, ..red() };
        assert_eq!(green.to_rgb(), (0, 255, 0));
        let blue = Hsl { hue: 240.0, ..red() };
        assert_eq!(blue.to_rgb(), (0, 0, 255));
        let wrapped = Hsl { hue: 360.0, ..red() };
        assert_eq!(wrapped.to_rgb(), (255, 0, 0));
        let bright = Hsl { hue: 0.0, saturation: 100.0, lightness: 60.0 };
        assert_eq!(bright.to_rgb(), (255, 51, 51));
        let grey = Hsl { hue: 200.0, saturation: 0.0, lightness: 50.0 };
        assert_eq!(grey.to_rgb(), (128, 128, 128));
    }

    #[test]
    fn test_advance_moves_along_angle() {
        let mut particle = Particle::new(10.0, 10.0, FRAC_PI_2, 2.0, red(), 1.0, Shape::Circle);
        particle.advance(0.5, 0.1);

        assert!((particle.x - 10.0).abs() < 1e-5);
        assert!((particle.y - 12.0).abs() < 1e-5);
        assert!((particle.speed - 1.0).abs() < 1e-6);
        assert!((particle.angle - FRAC_PI_2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_opacity_after_k_ticks() {
        let decay = 0.02;
        let mut particle = Particle::new(0.0, 0.0, 0.0, 3.0, red(), 2.0, Shape::Star);
        assert_eq!(particle.opacity, 1.0);

        for k in 1..=60 {
            let before = particle.opacity;
            particle.advance(0.98, decay);
            let expected = (1.0 - k as f32 * decay).max(0.0);
            assert!((particle.opacity - expected).abs() < 1e-4, "tick {k}");
            assert!(particle.opacity <= before);
        }
        assert_eq!(particle.opacity, 0.0);
        assert!(!particle.is_alive());
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut particle = Particle::new(15.0, 12.0, 0.7, 1.0, red(), 4.0, Shape::Heart);
        particle.advance(0.98, 0.3);
        let before = particle.clone();

        let mut canvas = Canvas::new(30, 30, (0, 0, 0));
        particle.render(&mut canvas);
        let first = canvas.pixels().to_vec();
        canvas.clear();
        particle.render(&mut canvas);
        assert_eq!(canvas.pixels(), &first[..]);

        let mut a = Recorder::new();
        let mut b = Recorder::new();
        particle.render(&mut a);
        particle.render(&mut b);
        assert_eq!(a.ops, b.ops);

        assert_eq!(particle.x, before.x);
        assert_eq!(particle.opacity, before.opacity);
        assert_eq!(particle.speed, before.speed);
    }

    #[test]
    fn test_stamp_carries_opacity() {
        let mut particle = Particle::new(0.0, 0.0, 0.0, 1.0, red(), 2.0, Shape::Kite);
        particle.advance(1.0, 0.25);
        let stamp = particle.stamp();
        assert!((stamp.alpha - 0.75).abs() < 1e-6);
        assert_eq!(stamp.color, (255, 0, 0));
    }
}
