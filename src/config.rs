use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fireworks::shapes::Shape;
use crate::surface::Rgb;

// Shapes of the original single-file show.
pub const CLASSIC_SHAPES: [Shape; 6] = [
    Shape::Circle,
    Shape::Heart,
    Shape::Flower,
    Shape::Star,
    Shape::Triangle,
    Shape::Spiral,
];

// Particle decay used together with the classic palette.
pub const CLASSIC_DECAY: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        self.min + rng.f32() * (self.max - self.min)
    }

    fn check(&self, name: &str) -> Result<()> {
        if !(self.min > 0.0 && self.min <= self.max) {
            return Err(Error::InvalidConfig(format!(
                "{name} must satisfy 0 < min <= max (got {}..{})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

// Colour written as `RRGGBB` (an optional leading `#` is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HexColor(pub Rgb);

impl TryFrom<String> for HexColor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        parse_hex_color(&value)
            .map(HexColor)
            .ok_or_else(|| Error::InvalidConfig(format!("invalid hex color `{value}`")))
    }
}

pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    pub speed: Span,
    // Radius of the ascending marker
    pub radius: Span,
    pub color: HexColor,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            speed: Span::new(0.6, 1.5),
            radius: Span::new(0.6, 1.2),
            color: HexColor((0, 255, 0)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub count: usize,
    pub speed: Span,
    pub size: Span,
    // HSL saturation in percent
    pub saturation: f32,
    // HSL lightness in percent
    pub lightness: f32,
    // Per-tick speed multiplier
    pub damping: f32,
    // Per-tick opacity decrement
    pub decay: f32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: 100,
            speed: Span::new(0.4, 1.2),
            size: Span::new(0.8, 2.0),
            saturation: 100.0,
            lightness: 60.0,
            damping: 0.98,
            decay: 0.015,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    // Chance of a launch on any tick
    pub spawn_probability: f32,
    // Launch point distance above the bottom edge
    pub launch_offset: f32,
    // Fraction of the height, from the top, where targets are picked
    pub target_band: f32,
    // Share of the previous frame kept on screen (0 = full clear)
    pub persistence: f32,
    pub fps: u32,
    pub seed: Option<u64>,
    pub background: HexColor,
    pub shapes: Vec<String>,
    pub rocket: RocketConfig,
    pub burst: BurstConfig,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.05,
            launch_offset: 2.0,
            target_band: 0.5,
            persistence: 0.0,
            fps: 60,
            seed: None,
            background: HexColor((0, 0, 0)),
            shapes: Shape::ALL.iter().map(|shape| shape.name().to_string()).collect(),
            rocket: RocketConfig::default(),
            burst: BurstConfig::default(),
        }
    }
}

impl ShowConfig {
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn classic(mut self) -> Self {
        self.shapes = CLASSIC_SHAPES.iter().map(|shape| shape.name().to_string()).collect();
        self.burst.decay = CLASSIC_DECAY;
        self
    }

    pub fn palette(&self) -> Result<Vec<Shape>> {
        let mut palette = Vec::with_capacity(self.shapes.len());
        for name in &self.shapes {
            match name.parse::<Shape>() {
                Ok(shape) => palette.push(shape),
                Err(e) => warn!("Skipping palette entry: {e}"),
            }
        }
        if palette.is_empty() {
            return Err(Error::InvalidConfig("shape palette is empty".into()));
        }
        Ok(palette)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(Error::InvalidConfig(format!(
                "spawn_probability must be within 0..=1 (got {})",
                self.spawn_probability
            )));
        }
        if !(self.launch_offset >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "launch_offset must not be negative (got {})",
                self.launch_offset
            )));
        }
        if !(0.0..=1.0).contains(&self.target_band) {
            return Err(Error::InvalidConfig(format!(
                "target_band must be within 0..=1 (got {})",
                self.target_band
            )));
        }
        if !(0.0..1.0).contains(&self.persistence) {
            return Err(Error::InvalidConfig(format!(
                "persistence must be within 0..1 (got {})",
                self.persistence
            )));
        }
        if self.fps == 0 {
            return Err(Error::InvalidConfig("fps must be positive".into()));
        }
        if self.burst.count == 0 {
            return Err(Error::InvalidConfig("burst.count must be positive".into()));
        }
        if !(self.burst.damping > 0.0 && self.burst.damping <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "burst.damping must be within (0, 1] (got {})",
                self.burst.damping
            )));
        }
        if !(self.burst.decay > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "burst.decay must be positive (got {})",
                self.burst.decay
            )));
        }
        self.rocket.speed.check("rocket.speed")?;
        self.rocket.radius.check("rocket.radius")?;
        self.burst.speed.check("burst.speed")?;
        self.burst.size.check("burst.size")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.palette().unwrap().len(), Shape::ALL.len());
        assert_eq!(config.burst.count, 100);
        assert!((config.spawn_probability - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShowConfig::from_toml(
            r##"
            spawn_probability = 0.5
            background = "#1a1b26"

            [burst]
            count = 40
            speed = { min = 1.0, max = 2.0 }
            "##,
        )
        .unwrap();

        assert!((config.spawn_probability - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.background, HexColor((0x1a, 0x1b, 0x26)));
        assert_eq!(config.burst.count, 40);
        assert_eq!(config.burst.speed, Span::new(1.0, 2.0));
        assert!((config.burst.damping - 0.98).abs() < f32::EPSILON);
        assert_eq!(config.rocket.color, HexColor((0, 255, 0)));
    }

    #[test]
    fn test_bad_hex_color_is_a_parse_error() {
        assert!(ShowConfig::from_toml(r#"background = "zzzzzz""#).is_err());
        assert_eq!(parse_hex_color("ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex_color("fff"), None);
    }

    #[test]
    fn test_classic_preset() {
        let config = ShowConfig::default().classic();
        assert_eq!(config.palette().unwrap(), CLASSIC_SHAPES.to_vec());
        assert!((config.burst.decay - CLASSIC_DECAY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_palette_entries_are_skipped() {
        let config = ShowConfig {
            shapes: vec!["heart".into(), "not-a-shape".into(), "polygon-7".into()],
            ..Default::default()
        };
        assert_eq!(config.palette().unwrap(), vec![Shape::Heart, Shape::Heptagon]);

        let config = ShowConfig {
            shapes: vec!["blob".into()],
            ..Default::default()
        };
        assert!(matches!(config.palette(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = ShowConfig::default();
        config.spawn_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = ShowConfig::default();
        config.burst.speed = Span::new(6.0, 2.0);
        assert!(config.validate().is_err());

        let mut config = ShowConfig::default();
        config.burst.decay = 0.0;
        assert!(config.validate().is_err());

        let mut config = ShowConfig::default();
        config.burst.count = 0;
        assert!(config.validate().is_err());

        let mut config = ShowConfig::default();
        config.persistence = 1.0;
        assert!(config.validate().is_err());

        let mut config = ShowConfig::default();
        config.launch_offset = -1.0;
        assert!(config.validate().is_err());
        config.launch_offset = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_span_sample_stays_in_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        let span = Span::new(2.0, 6.0);
        for _ in 0..1000 {
            let v = span.sample(&mut rng);
            assert!((2.0..6.0).contains(&v));
        }
    }

    #[test]
    fn test_example_file_parses() {
        let config = ShowConfig::from_toml(include_str!("../skyburst.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.palette().unwrap().len(), 16);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("skyburst-load-{}.toml", std::process::id()));
        fs::write(&path, "fps = 30\nshapes = [\"star\", \"cube\"]\n").unwrap();
        let config = ShowConfig::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.fps, 30);
        assert_eq!(config.palette().unwrap(), vec![Shape::Star, Shape::Cube]);
        assert_eq!(config.burst.count, 100);
    }

    #[test]
    fn test_bad_toml_on_disk_is_parse_error() {
        let path = std::env::temp_dir().join(format!("skyburst-bad-{}.toml", std::process::id()));
        fs::write(&path, "fps = \"fast\"\n[burst\n").unwrap();
        let err = ShowConfig::load_from(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        match err {
            Error::ParseConfig { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected a parse error, got {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = ShowConfig::load_from("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::ReadConfig { .. }));
    }
}
