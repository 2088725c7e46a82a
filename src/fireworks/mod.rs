pub mod firework;
pub mod particle;
pub mod shapes;

use tracing::{debug, info};

use crate::config::ShowConfig;
use crate::error::Result;
use crate::surface::Surface;
use firework::Firework;
use shapes::Shape;

pub struct Show {
    config: ShowConfig,
    palette: Vec<Shape>,
    width: f32,
    height: f32,
    fireworks: Vec<Firework>,
    rng: fastrand::Rng,
    launched: u64,
}

impl Show {
    pub fn new(config: ShowConfig, width: usize, height: usize) -> Result<Self> {
        config.validate()?;
        let palette = config.palette()?;
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        info!(width, height, shapes = palette.len(), "show ready");

        Ok(Self {
            config,
            palette,
            width: width as f32,
            height: height as f32,
            fireworks: Vec::new(),
            rng,
            launched: 0,
        })
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        info!(width, height, "resized");
        self.width = width as f32;
        self.height = height as f32;
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn palette(&self) -> &[Shape] {
        &self.palette
    }

    pub fn live_particles(&self) -> usize {
        self.fireworks.iter().map(|fw| fw.particles().len()).sum()
    }

    pub fn launched(&self) -> u64 {
        self.launched
    }

    // Put a rocket in the air from `(x, y)` towards `(target_x, target_y)`.
    pub fn launch(&mut self, x: f32, y: f32, target_x: f32, target_y: f32) {
        let rocket = &self.config.rocket;
        let speed = rocket.speed.sample(&mut self.rng);
        let radius = rocket.radius.sample(&mut self.rng);
        self.launch_with_speed(x, y, target_x, target_y, speed, radius);
    }

    pub fn launch_with_speed(&mut self, x: f32, y: f32, target_x: f32, target_y: f32, speed: f32, radius: f32) {
        debug!(target_x, target_y, speed, "launch");
        self.fireworks.push(Firework::new(
            x,
            y,
            target_x,
            target_y,
            speed,
            radius,
            self.config.rocket.color.0,
        ));
        self.launched += 1;
    }

    fn maybe_launch(&mut self) {
        if self.rng.f32() >= self.config.spawn_probability {
            return;
        }
        let x = self.width / 2.0;
        let y = self.height - self.config.launch_offset;
        let target_x = self.rng.f32() * self.width;
        let target_y = self.rng.f32() * self.height * self.config.target_band;
        self.launch(x, y, target_x, target_y);
    }

    pub fn advance(&mut self) {
        let burst = &self.config.burst;
        for firework in &mut self.fireworks {
            firework.advance(burst, &self.palette, &mut self.rng);
        }
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        for firework in &self.fireworks {
            firework.render(surface);
        }
    }

    // Drop fireworks that have detonated and have no particles left.
    pub fn prune(&mut self) {
        self.fireworks.retain(|fw| !fw.is_finished());
    }

    // One display frame: erase, maybe launch, advance, draw, prune.
    pub fn frame(&mut self, surface: &mut dyn Surface) {
        if self.config.persistence > 0.0 {
            surface.fade(self.config.persistence);
        } else {
            surface.clear();
        }

        self.maybe_launch();
        self.advance();
        self.render(surface);
        self.prune();
    }
}
