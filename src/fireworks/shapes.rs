use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::Error;
use crate::surface::{Rgb, Surface};

const SPIRAL_TURNS: usize = 10;
const SPIRAL_WIDTH: f32 = 1.0;
const WIRE_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    // Orientation for the shapes that rotate with their direction
    pub angle: f32,
    pub color: Rgb,
    pub alpha: f32,
}

pub type Recipe = fn(&mut dyn Surface, &Stamp);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Heart,
    Flower,
    Star,
    Triangle,
    Spiral,
    Square,
    Pentagon,
    Hexagon,
    Heptagon,
    Octagon,
    Nonagon,
    Decagon,
    Hendecagon,
    Dodecagon,
    Tridecagon,
    Tetradecagon,
    Pentadecagon,
    Hexadecagon,
    Heptadecagon,
    Octadecagon,
    Enneadecagon,
    Icosagon,
    Rectangle,
    Rhombus,
    Parallelogram,
    Trapezoid,
    Kite,
    Crescent,
    Cube,
    Prism,
    Tetrahedron,
    Octahedron,
    Dodecahedron,
}

impl Shape {
    pub const ALL: [Shape; 34] = [
        Shape::Circle,
        Shape::Heart,
        Shape::Flower,
        Shape::Star,
        Shape::Triangle,
        Shape::Spiral,
        Shape::Square,
        Shape::Pentagon,
        Shape::Hexagon,
        Shape::Heptagon,
        Shape::Octagon,
        Shape::Nonagon,
        Shape::Decagon,
        Shape::Hendecagon,
        Shape::Dodecagon,
        Shape::Tridecagon,
        Shape::Tetradecagon,
        Shape::Pentadecagon,
        Shape::Hexadecagon,
        Shape::Heptadecagon,
        Shape::Octadecagon,
        Shape::Enneadecagon,
        Shape::Icosagon,
        Shape::Rectangle,
        Shape::Rhombus,
        Shape::Parallelogram,
        Shape::Trapezoid,
        Shape::Kite,
        Shape::Crescent,
        Shape::Cube,
        Shape::Prism,
        Shape::Tetrahedron,
        Shape::Octahedron,
        Shape::Dodecahedron,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Heart => "heart",
            Shape::Flower => "flower",
            Shape::Star => "star",
            Shape::Triangle => "triangle",
            Shape::Spiral => "spiral",
            Shape::Square => "square",
            Shape::Pentagon => "pentagon",
            Shape::Hexagon => "hexagon",
            Shape::Heptagon => "heptagon",
            Shape::Octagon => "octagon",
            Shape::Nonagon => "nonagon",
            Shape::Decagon => "decagon",
            Shape::Hendecagon => "hendecagon",
            Shape::Dodecagon => "dodecagon",
            Shape::Tridecagon => "tridecagon",
            Shape::Tetradecagon => "tetradecagon",
            Shape::Pentadecagon => "pentadecagon",
            Shape::Hexadecagon => "hexadecagon",
            Shape::Heptadecagon => "heptadecagon",
            Shape::Octadecagon => "octadecagon",
            Shape::Enneadecagon => "enneadecagon",
            Shape::Icosagon => "icosagon",
            Shape::Rectangle => "rectangle",
            Shape::Rhombus => "rhombus",
            Shape::Parallelogram => "parallelogram",
            Shape::Trapezoid => "trapezoid",
            Shape::Kite => "kite",
            Shape::Crescent => "crescent",
            Shape::Cube => "cube",
            Shape::Prism => "prism",
            Shape::Tetrahedron => "tetrahedron",
            Shape::Octahedron => "octahedron",
            Shape::Dodecahedron => "dodecahedron",
        }
    }

    pub const fn sides(self) -> Option<usize> {
        match self {
            Shape::Triangle => Some(3),
            Shape::Square => Some(4),
            Shape::Pentagon => Some(5),
            Shape::Hexagon => Some(6),
            Shape::Heptagon => Some(7),
            Shape::Octagon => Some(8),
            Shape::Nonagon => Some(9),
            Shape::Decagon => Some(10),
            Shape::Hendecagon => Some(11),
            Shape::Dodecagon => Some(12),
            Shape::Tridecagon => Some(13),
            Shape::Tetradecagon => Some(14),
            Shape::Pentadecagon => Some(15),
            Shape::Hexadecagon => Some(16),
            Shape::Heptadecagon => Some(17),
            Shape::Octadecagon => Some(18),
            Shape::Enneadecagon => Some(19),
            Shape::Icosagon => Some(20),
            _ => None,
        }
    }

    // Regular polygon with `sides` sides, for 5..=20.
    pub fn polygon(sides: usize) -> Option<Shape> {
        Shape::ALL
            .iter()
            .copied()
            .find(|shape| shape.sides() == Some(sides) && sides >= 5)
    }

    pub const fn is_stroked(self) -> bool {
        matches!(
            self,
            Shape::Spiral
                | Shape::Cube
                | Shape::Prism
                | Shape::Tetrahedron
                | Shape::Octahedron
                | Shape::Dodecahedron
        )
    }

    pub fn recipe(self) -> Recipe {
        match self {
            Shape::Circle => circle,
            Shape::Heart => heart,
            Shape::Flower => flower,
            Shape::Star => star,
            Shape::Triangle => triangle,
            Shape::Spiral => spiral,
            Shape::Square => square,
            Shape::Pentagon => polygon::<5>,
            Shape::Hexagon => polygon::<6>,
            Shape::Heptagon => polygon::<7>,
            Shape::Octagon => polygon::<8>,
            Shape::Nonagon => polygon::<9>,
            Shape::Decagon => polygon::<10>,
            Shape::Hendecagon => polygon::<11>,
            Shape::Dodecagon => polygon::<12>,
            Shape::Tridecagon => polygon::<13>,
            Shape::Tetradecagon => polygon::<14>,
            Shape::Pentadecagon => polygon::<15>,
            Shape::Hexadecagon => polygon::<16>,
            Shape::Heptadecagon => polygon::<17>,
            Shape::Octadecagon => polygon::<18>,
            Shape::Enneadecagon => polygon::<19>,
            Shape::Icosagon => polygon::<20>,
            Shape::Rectangle => rectangle,
            Shape::Rhombus => rhombus,
            Shape::Parallelogram => parallelogram,
            Shape::Trapezoid => trapezoid,
            Shape::Kite => kite,
            Shape::Crescent => crescent,
            Shape::Cube => cube,
            Shape::Prism => prism,
            Shape::Tetrahedron => tetrahedron,
            Shape::Octahedron => octahedron,
            Shape::Dodecahedron => dodecahedron,
        }
    }

    pub fn random(palette: &[Shape], rng: &mut fastrand::Rng) -> Option<Shape> {
        if palette.is_empty() {
            None
        } else {
            Some(palette[rng.usize(0..palette.len())])
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = Error;

    // Accepts the kebab-case names and `polygon-N` for N in 5..=20.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(shape) = Shape::ALL.iter().copied().find(|shape| shape.name() == name) {
            return Ok(shape);
        }
        name.strip_prefix("polygon-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(Shape::polygon)
            .ok_or_else(|| Error::UnknownShape(s.to_string()))
    }
}

// Paint one stamp. Colour and alpha are set up here; the recipe only builds
// paths. No state leaks past the call.
pub fn draw(surface: &mut dyn Surface, shape: Shape, stamp: &Stamp) {
    surface.save();
    surface.set_global_alpha(stamp.alpha);
    if shape.is_stroked() {
        surface.set_stroke_color(stamp.color);
    } else {
        surface.set_fill_color(stamp.color);
    }
    (shape.recipe())(surface, stamp);
    surface.restore();
}

// Paint by identifier. An unknown identifier is logged and nothing is
// drawn; returns whether anything was painted.
pub fn draw_named(surface: &mut dyn Surface, name: &str, stamp: &Stamp) -> bool {
    match name.parse::<Shape>() {
        Ok(shape) => {
            draw(surface, shape, stamp);
            true
        }
        Err(e) => {
            warn!(x = stamp.x, y = stamp.y, "{e}, skipping draw");
            false
        }
    }
}

// === Recipes ===

fn fill_outline(surface: &mut dyn Surface, points: &[(f32, f32)], scale: f32) {
    surface.begin_path();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            surface.move_to(x * scale, y * scale);
        } else {
            surface.line_to(x * scale, y * scale);
        }
    }
    surface.close_path();
    surface.fill();
}

fn circle(surface: &mut dyn Surface, p: &Stamp) {
    surface.begin_path();
    surface.arc(p.x, p.y, p.size, 0.0, TAU, false);
    surface.fill();
}

fn heart(surface: &mut dyn Surface, p: &Stamp) {
    let s = p.size;
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    surface.begin_path();
    surface.move_to(0.0, -s);
    surface.bezier_curve_to(s, -s, s, s, 0.0, s);
    surface.bezier_curve_to(-s, s, -s, -s, 0.0, -s);
    surface.fill();
}

fn flower(surface: &mut dyn Surface, p: &Stamp) {
    for i in 0..6 {
        let a = i as f32 * PI / 3.0;
        surface.begin_path();
        surface.arc(
            p.x + a.cos() * p.size,
            p.y + a.sin() * p.size,
            p.size / 2.0,
            0.0,
            TAU,
            false,
        );
        surface.fill();
    }
}

fn star(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    surface.begin_path();
    // Five vertices at 72° steps, radii alternating 2s and s
    for i in 0..5 {
        let a = i as f32 * TAU / 5.0;
        let r = if i % 2 == 0 { p.size * 2.0 } else { p.size };
        surface.line_to(a.cos() * r, a.sin() * r);
    }
    surface.close_path();
    surface.fill();
}

fn triangle(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.begin_path();
    for i in 0..3 {
        let a = i as f32 * TAU / 3.0;
        surface.line_to(a.cos() * p.size, a.sin() * p.size);
    }
    surface.close_path();
    surface.fill();
}

fn spiral(surface: &mut dyn Surface, p: &Stamp) {
    surface.begin_path();
    for i in 0..SPIRAL_TURNS {
        let r = i as f32 * p.size * 0.5;
        let a = i as f32 * PI * 0.3;
        surface.line_to(p.x + a.cos() * r, p.y + a.sin() * r);
    }
    surface.set_line_width(SPIRAL_WIDTH);
    surface.stroke();
}

fn square(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)], p.size);
}

fn regular_polygon(surface: &mut dyn Surface, p: &Stamp, sides: usize) {
    surface.translate(p.x, p.y);
    surface.begin_path();
    for i in 0..sides {
        let a = i as f32 * TAU / sides as f32 - FRAC_PI_2;
        let (x, y) = (a.cos() * p.size, a.sin() * p.size);
        if i == 0 {
            surface.move_to(x, y);
        } else {
            surface.line_to(x, y);
        }
    }
    surface.close_path();
    surface.fill();
}

fn polygon<const N: usize>(surface: &mut dyn Surface, p: &Stamp) {
    regular_polygon(surface, p, N);
}

fn rectangle(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(-1.4, -0.8), (1.4, -0.8), (1.4, 0.8), (-1.4, 0.8)], p.size);
}

fn rhombus(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(0.0, -1.4), (0.8, 0.0), (0.0, 1.4), (-0.8, 0.0)], p.size);
}

fn parallelogram(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(-0.6, -0.7), (1.2, -0.7), (0.6, 0.7), (-1.2, 0.7)], p.size);
}

fn trapezoid(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(-0.6, -0.7), (0.6, -0.7), (1.2, 0.7), (-1.2, 0.7)], p.size);
}

fn kite(surface: &mut dyn Surface, p: &Stamp) {
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    fill_outline(surface, &[(0.0, -1.3), (0.8, -0.4), (0.0, 1.3), (-0.8, -0.4)], p.size);
}

// Disc of radius `size` minus a disc of the same radius offset along +x.
fn crescent(surface: &mut dyn Surface, p: &Stamp) {
    let r = p.size;
    let offset = r * 0.6;
    let xi = offset / 2.0;
    let yi = (r * r - xi * xi).sqrt();
    let outer = yi.atan2(xi);

    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    surface.begin_path();
    surface.arc(0.0, 0.0, r, outer, TAU - outer, false);
    surface.arc(
        offset,
        0.0,
        r,
        (-yi).atan2(xi - offset),
        yi.atan2(xi - offset),
        true,
    );
    surface.close_path();
    surface.fill();
}

fn wireframe(surface: &mut dyn Surface, p: &Stamp, vertices: &[(f32, f32)], edges: &[(usize, usize)]) {
    let s = p.size;
    surface.translate(p.x, p.y);
    surface.rotate(p.angle);
    surface.begin_path();
    for &(a, b) in edges {
        let (ax, ay) = vertices[a];
        let (bx, by) = vertices[b];
        surface.move_to(ax * s, ay * s);
        surface.line_to(bx * s, by * s);
    }
    surface.set_line_width(WIRE_WIDTH);
    surface.stroke();
}

fn cube(surface: &mut dyn Surface, p: &Stamp) {
    const VERTICES: [(f32, f32); 8] = [
        (-0.8, -0.4),
        (0.4, -0.4),
        (0.4, 0.8),
        (-0.8, 0.8),
        (-0.4, -0.8),
        (0.8, -0.8),
        (0.8, 0.4),
        (-0.4, 0.4),
    ];
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (1, 2), (2, 3), (3, 0),
        (4, 5), (5, 6), (6, 7), (7, 4),
        (0, 4), (1, 5), (2, 6), (3, 7),
    ];
    wireframe(surface, p, &VERTICES, &EDGES);
}

fn prism(surface: &mut dyn Surface, p: &Stamp) {
    const VERTICES: [(f32, f32); 6] = [
        (-0.8, 0.7),
        (0.4, 0.7),
        (-0.2, -0.5),
        (-0.4, 0.4),
        (0.8, 0.4),
        (0.2, -0.8),
    ];
    const EDGES: [(usize, usize); 9] = [
        (0, 1), (1, 2), (2, 0),
        (3, 4), (4, 5), (5, 3),
        (0, 3), (1, 4), (2, 5),
    ];
    wireframe(surface, p, &VERTICES, &EDGES);
}

fn tetrahedron(surface: &mut dyn Surface, p: &Stamp) {
    const VERTICES: [(f32, f32); 4] = [(0.0, -1.0), (-0.9, 0.6), (0.9, 0.6), (0.2, 0.1)];
    const EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (2, 3), (3, 1)];
    wireframe(surface, p, &VERTICES, &EDGES);
}

fn octahedron(surface: &mut dyn Surface, p: &Stamp) {
    const VERTICES: [(f32, f32); 6] = [
        (0.0, -1.2),
        (0.0, 1.2),
        (-1.0, 0.1),
        (0.35, 0.35),
        (1.0, -0.1),
        (-0.35, -0.35),
    ];
    const EDGES: [(usize, usize); 12] = [
        (2, 3), (3, 4), (4, 5), (5, 2),
        (0, 2), (0, 3), (0, 4), (0, 5),
        (1, 2), (1, 3), (1, 4), (1, 5),
    ];
    wireframe(surface, p, &VERTICES, &EDGES);
}

// Schlegel diagram: outer pentagon, middle decagon, inner pentagon.
fn dodecahedron(surface: &mut dyn Surface, p: &Stamp) {
    const OUTER: f32 = 1.0;
    const MIDDLE: f32 = 0.62;
    const INNER: f32 = 0.32;

    let at = |radius: f32, angle: f32| (angle.cos() * radius, angle.sin() * radius);
    let step = TAU / 5.0;

    // 0..5 outer, 5..15 decagon (even = under outer, odd = between), 15..20 inner
    let mut vertices = [(0.0f32, 0.0f32); 20];
    for i in 0..5 {
        let a = i as f32 * step - FRAC_PI_2;
        vertices[i] = at(OUTER, a);
        vertices[5 + 2 * i] = at(MIDDLE, a);
        vertices[6 + 2 * i] = at(MIDDLE, a + step / 2.0);
        vertices[15 + i] = at(INNER, a + step / 2.0);
    }

    let mut edges = [(0usize, 0usize); 30];
    for i in 0..5 {
        edges[i] = (i, (i + 1) % 5);
        edges[5 + i] = (i, 5 + 2 * i);
        edges[10 + i] = (6 + 2 * i, 15 + i);
        edges[15 + i] = (15 + i, 15 + (i + 1) % 5);
    }
    for i in 0..10 {
        edges[20 + i] = (5 + i, 5 + (i + 1) % 10);
    }

    wireframe(surface, p, &vertices, &edges);
}
