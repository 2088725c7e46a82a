use std::f32::consts::TAU;

use tracing::debug;

use super::particle::{Hsl, Particle};
use super::shapes::Shape;
use crate::config::BurstConfig;
use crate::surface::{Rgb, Surface};

// A rocket flying in a straight line to its target, then a burst of
// particles once it gets there.
#[derive(Debug, Clone)]
pub struct Firework {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub speed: f32,
    pub angle: f32,
    pub distance: f32,
    pub progress: f32,
    pub radius: f32,
    pub color: Rgb,
    detonated: bool,
    // Zero for a rocket launched onto its own target
    dir_x: f32,
    dir_y: f32,
    particles: Vec<Particle>,
}

impl Firework {
    pub fn new(x: f32, y: f32, target_x: f32, target_y: f32, speed: f32, radius: f32, color: Rgb) -> Self {
        let (dx, dy) = (target_x - x, target_y - y);
        let angle = dy.atan2(dx);
        let distance = dx.hypot(dy);
        let (dir_x, dir_y) = if distance > 0.0 {
            (angle.cos(), angle.sin())
        } else {
            (0.0, 0.0)
        };

        Self {
            x,
            y,
            target_x,
            target_y,
            speed,
            angle,
            distance,
            progress: 0.0,
            radius,
            color,
            detonated: false,
            dir_x,
            dir_y,
            particles: Vec::new(),
        }
    }

    pub fn is_detonated(&self) -> bool {
        self.detonated
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_finished(&self) -> bool {
        self.detonated && self.particles.is_empty()
    }

    pub fn advance(&mut self, burst: &BurstConfig, palette: &[Shape], rng: &mut fastrand::Rng) {
        if !self.detonated {
            self.progress += self.speed;
            self.x += self.dir_x * self.speed;
            self.y += self.dir_y * self.speed;

            if self.progress >= self.distance {
                self.detonated = true;
                self.detonate(burst, palette, rng);
            }
        }

        for particle in &mut self.particles {
            particle.advance(burst.damping, burst.decay);
        }
        self.particles.retain(Particle::is_alive);
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        if !self.detonated {
            surface.save();
            surface.set_fill_color(self.color);
            surface.begin_path();
            surface.arc(self.x, self.y, self.radius, 0.0, TAU, false);
            surface.fill();
            surface.restore();
        }

        for particle in &self.particles {
            particle.render(surface);
        }
    }

    fn detonate(&mut self, burst: &BurstConfig, palette: &[Shape], rng: &mut fastrand::Rng) {
        let shape = Shape::random(palette, rng).unwrap_or(Shape::Circle);
        debug!(x = self.x, y = self.y, %shape, count = burst.count, "detonated");

        self.particles.reserve(burst.count);
        for _ in 0..burst.count {
            let angle = rng.f32() * TAU;
            let speed = burst.speed.sample(rng);
            let color = Hsl {
                hue: rng.f32() * 360.0,
                saturation: burst.saturation,
                lightness: burst.lightness,
            };
            let size = burst.size.sample(rng);
            self.particles
                .push(Particle::new(self.x, self.y, angle, speed, color, size, shape));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Span;
    use crate::surface::recording::{Op, Recorder};

    const LIME: Rgb = (0, 255, 0);

    fn burst() -> BurstConfig {
        BurstConfig {
            count: 100,
            speed: Span::new(2.0, 6.0),
            size: Span::new(2.0, 6.0),
            decay: 0.02,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_precomputes_geometry() {
        let fw = Firework::new(100.0, 500.0, 300.0, 100.0, 5.0, 2.0, LIME);
        assert!((fw.distance - 447.2136).abs() < 1e-3);
        assert!((fw.angle - (-400.0f32).atan2(200.0)).abs() < 1e-6);
        assert_eq!(fw.progress, 0.0);
        assert!(!fw.is_detonated());
        assert!(fw.particles().is_empty());
    }

    #[test]
    fn test_detonates_exactly_once_when_progress_reaches_distance() {
        let burst = burst();
        let palette = Shape::ALL;
        let mut rng = fastrand::Rng::with_seed(11);
        let mut fw = Firework::new(0.0, 0.0, 10.0, 0.0, 3.0, 1.0, LIME);

        let mut last_progress = 0.0;
        let mut detonations = 0;
        for tick in 1..=4 {
            let was = fw.is_detonated();
            fw.advance(&burst, &palette, &mut rng);
            assert!(fw.progress >= last_progress);
            last_progress = fw.progress;
            if !was && fw.is_detonated() {
                detonations += 1;
                assert_eq!(tick, 4);
            }
        }
        assert_eq!(detonations, 1);
        assert!((fw.progress - 12.0).abs() < 1e-5);

        for _ in 0..10 {
            fw.advance(&burst, &palette, &mut rng);
        }
        // No movement after detonation
        assert!((fw.progress - 12.0).abs() < 1e-5);
        assert!((fw.x - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_burst_size_and_shared_shape() {
        let burst = burst();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut fw = Firework::new(0.0, 0.0, 0.0, -5.0, 5.0, 1.0, LIME);
        fw.advance(&burst, &Shape::ALL, &mut rng);

        assert!(fw.is_detonated());
        assert_eq!(fw.particles().len(), 100);
        let shape = fw.particles()[0].shape;
        assert!(fw.particles().iter().all(|p| p.shape == shape));
        for p in fw.particles() {
            assert!((0.0..TAU).contains(&p.angle));
            assert!((0.0..360.0).contains(&p.color.hue));
            assert!(p.size >= 2.0 && p.size < 6.0);
            // Particles have advanced once with the detonation tick
            assert!((p.opacity - 0.98).abs() < 1e-6);
        }
    }

    #[test]
    fn test_particles_are_pruned_once_faded() {
        let burst = BurstConfig {
            count: 10,
            decay: 0.25,
            ..burst()
        };
        let mut rng = fastrand::Rng::with_seed(9);
        let mut fw = Firework::new(0.0, 0.0, 1.0, 0.0, 5.0, 1.0, LIME);

        fw.advance(&burst, &[Shape::Circle], &mut rng);
        assert_eq!(fw.particles().len(), 10);
        fw.advance(&burst, &[Shape::Circle], &mut rng);
        fw.advance(&burst, &[Shape::Circle], &mut rng);
        assert_eq!(fw.particles().len(), 10);
        assert!(!fw.is_finished());
        fw.advance(&burst, &[Shape::Circle], &mut rng);
        assert!(fw.particles().is_empty());
        assert!(fw.is_finished());
    }

    #[test]
    fn test_zero_distance_detonates_in_place() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut fw = Firework::new(40.0, 40.0, 40.0, 40.0, 3.0, 1.0, LIME);
        assert_eq!(fw.distance, 0.0);

        fw.advance(&burst(), &Shape::ALL, &mut rng);
        assert!(fw.is_detonated());
        assert_eq!(fw.x, 40.0);
        assert_eq!(fw.y, 40.0);
        assert_eq!(fw.particles().len(), 100);
    }

    #[test]
    fn test_render_marker_until_detonation() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut fw = Firework::new(10.0, 90.0, 10.0, 10.0, 5.0, 2.0, LIME);

        let mut rec = Recorder::new();
        fw.render(&mut rec);
        assert!(rec.ops.contains(&Op::FillColor(LIME)));
        assert!(rec.ops.contains(&Op::Arc(10.0, 90.0, 2.0, 0.0, TAU, false)));

        while !fw.is_detonated() {
            fw.advance(&burst(), &[Shape::Square], &mut rng);
        }
        let mut rec = Recorder::new();
        fw.render(&mut rec);
        assert!(!rec.ops.contains(&Op::FillColor(LIME)));
        assert_eq!(rec.count(&Op::Fill), fw.particles().len());
    }
}
