use std::f32::consts::TAU;

use crate::surface::{Rgb, Surface, Transform};

const BEZIER_STEPS: usize = 16;
const MIN_ARC_STEPS: usize = 8;
const MAX_ARC_STEPS: usize = 256;

#[derive(Debug, Clone, Copy)]
struct State {
    transform: Transform,
    alpha: f32,
    fill: Rgb,
    stroke: Rgb,
    line_width: f32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            alpha: 1.0,
            fill: (0, 0, 0),
            stroke: (0, 0, 0),
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Subpath {
    points: Vec<(f32, f32)>,
    closed: bool,
}

pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    background: Rgb,
    state: State,
    stack: Vec<State>,
    subpaths: Vec<Subpath>,
    coverage: Vec<bool>,
    touched: Vec<usize>,
    // Reused per scanline: (x, winding direction)
    crossings: Vec<(f32, i32)>,
}

fn mix(dst: Rgb, src: Rgb, t: f32) -> Rgb {
    (
        (dst.0 as f32 * (1.0 - t) + src.0 as f32 * t).round() as u8,
        (dst.1 as f32 * (1.0 - t) + src.1 as f32 * t).round() as u8,
        (dst.2 as f32 * (1.0 - t) + src.2 as f32 * t).round() as u8,
    )
}

fn distance_to_segment(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + dx * t, a.1 + dy * t);
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width * height],
            background,
            state: State::default(),
            stack: Vec::new(),
            subpaths: Vec::new(),
            coverage: vec![false; width * height],
            touched: Vec::with_capacity(256),
            crossings: Vec::with_capacity(32),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![self.background; width * height];
        self.coverage = vec![false; width * height];
        self.touched.clear();
        self.subpaths.clear();
        self.stack.clear();
        self.state = State::default();
    }

    pub fn columns(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.height
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    fn current_point(&self) -> Option<(f32, f32)> {
        self.subpaths.last().and_then(|sub| sub.points.last().copied())
    }

    fn push_point(&mut self, point: (f32, f32)) {
        match self.subpaths.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(point),
            _ => self.subpaths.push(Subpath {
                points: vec![point],
                closed: false,
            }),
        }
    }

    fn mark(&mut self, x: usize, y: usize) {
        let idx = y * self.width + x;
        if !self.coverage[idx] {
            self.coverage[idx] = true;
            self.touched.push(idx);
        }
    }

    fn blend_covered(&mut self, color: Rgb) {
        let alpha = self.state.alpha.clamp(0.0, 1.0);
        for &idx in &self.touched {
            if alpha > 0.0 {
                self.pixels[idx] = mix(self.pixels[idx], color, alpha);
            }
            self.coverage[idx] = false;
        }
        self.touched.clear();
    }

    fn path_bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let mut bounds: Option<(f32, f32, f32, f32)> = None;
        for &(x, y) in self.subpaths.iter().flat_map(|sub| sub.points.iter()) {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    fn scan_fill(&mut self) {
        let Some((_, min_y, _, max_y)) = self.path_bounds() else {
            return;
        };
        if self.width == 0 || self.height == 0 {
            return;
        }

        let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
        let last_row = ((max_y - 0.5).floor()).min(self.height as f32 - 1.0);
        if last_row < 0.0 {
            return;
        }
        let last_row = last_row as usize;

        // Swap out so the edges can be walked while marking coverage
        let subpaths = std::mem::take(&mut self.subpaths);
        let mut crossings = std::mem::take(&mut self.crossings);

        for y in first_row..=last_row {
            let yc = y as f32 + 0.5;
            crossings.clear();

            for sub in subpaths.iter().filter(|sub| sub.points.len() >= 3) {
                let n = sub.points.len();
                for i in 0..n {
                    let (x1, y1) = sub.points[i];
                    let (x2, y2) = sub.points[(i + 1) % n];
                    if y1 <= yc && y2 > yc {
                        crossings.push((x1 + (yc - y1) / (y2 - y1) * (x2 - x1), 1));
                    } else if y2 <= yc && y1 > yc {
                        crossings.push((x1 + (yc - y1) / (y2 - y1) * (x2 - x1), -1));
                    }
                }
            }

            crossings.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let start = (pair[0].0 - 0.5).ceil().max(0.0) as usize;
                let end = (pair[1].0 - 0.5).ceil().min(self.width as f32);
                if end <= 0.0 {
                    continue;
                }
                for x in start..end as usize {
                    self.mark(x, y);
                }
            }
        }

        self.crossings = crossings;
        self.subpaths = subpaths;
    }

    // A shape smaller than a pixel still lights the pixel under its centre.
    fn mark_centre_if_empty(&mut self) {
        if !self.touched.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.path_bounds() else {
            return;
        };
        let (cx, cy) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
        if cx >= 0.0 && cy >= 0.0 && (cx as usize) < self.width && (cy as usize) < self.height {
            self.mark(cx as usize, cy as usize);
        }
    }

    fn mark_segment(&mut self, a: (f32, f32), b: (f32, f32), half: f32) {
        let min_x = (a.0.min(b.0) - half - 0.5).floor().max(0.0) as usize;
        let min_y = (a.1.min(b.1) - half - 0.5).floor().max(0.0) as usize;
        let max_x = (a.0.max(b.0) + half + 0.5).ceil().min(self.width as f32);
        let max_y = (a.1.max(b.1) + half + 0.5).ceil().min(self.height as f32);
        if max_x <= 0.0 || max_y <= 0.0 {
            return;
        }

        for y in min_y..max_y as usize {
            for x in min_x..max_x as usize {
                if distance_to_segment(x as f32 + 0.5, y as f32 + 0.5, a, b) <= half {
                    self.mark(x, y);
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    fn fade(&mut self, keep: f32) {
        let keep = keep.clamp(0.0, 1.0);
        let bg = self.background;
        for px in &mut self.pixels {
            *px = mix(bg, *px, keep);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.translated(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.rotated(radians);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.scaled(sx, sy);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha;
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        if width > 0.0 && width.is_finite() {
            self.state.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let point = self.state.transform.apply(x, y);
        self.subpaths.push(Subpath {
            points: vec![point],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let point = self.state.transform.apply(x, y);
        self.push_point(point);
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        let t = self.state.transform;
        let p1 = t.apply(c1x, c1y);
        let p2 = t.apply(c2x, c2y);
        let p3 = t.apply(x, y);
        let p0 = match self.current_point() {
            Some(p) => p,
            None => {
                self.push_point(p1);
                p1
            }
        };

        for step in 1..=BEZIER_STEPS {
            let s = step as f32 / BEZIER_STEPS as f32;
            let u = 1.0 - s;
            let w0 = u * u * u;
            let w1 = 3.0 * u * u * s;
            let w2 = 3.0 * u * s * s;
            let w3 = s * s * s;
            self.push_point((
                w0 * p0.0 + w1 * p1.0 + w2 * p2.0 + w3 * p3.0,
                w0 * p0.1 + w1 * p1.1 + w2 * p2.1 + w3 * p3.1,
            ));
        }
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32, anticlockwise: bool) {
        if !(radius >= 0.0) {
            return;
        }

        let sweep = if anticlockwise {
            let span = start - end;
            if span >= TAU { -TAU } else { -span.rem_euclid(TAU) }
        } else {
            let span = end - start;
            if span >= TAU { TAU } else { span.rem_euclid(TAU) }
        };

        let device_radius = radius * self.state.transform.scale_factor();
        let steps = ((sweep.abs() * device_radius).ceil() as usize).clamp(MIN_ARC_STEPS, MAX_ARC_STEPS);

        let t = self.state.transform;
        let first = t.apply(cx + radius * start.cos(), cy + radius * start.sin());
        self.push_point(first);
        for step in 1..=steps {
            let angle = start + sweep * step as f32 / steps as f32;
            let point = t.apply(cx + radius * angle.cos(), cy + radius * angle.sin());
            self.push_point(point);
        }
    }

    fn close_path(&mut self) {
        let Some(sub) = self.subpaths.last_mut() else {
            return;
        };
        if sub.closed {
            return;
        }
        sub.closed = true;
        let first = sub.points[0];
        self.subpaths.push(Subpath {
            points: vec![first],
            closed: false,
        });
    }

    fn fill(&mut self) {
        self.scan_fill();
        self.mark_centre_if_empty();
        let color = self.state.fill;
        self.blend_covered(color);
    }

    fn stroke(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let half = (self.state.line_width * self.state.transform.scale_factor() * 0.5).max(0.5);
        let subpaths = std::mem::take(&mut self.subpaths);

        for sub in &subpaths {
            for seg in sub.points.windows(2) {
                self.mark_segment(seg[0], seg[1], half);
            }
            if sub.closed && sub.points.len() > 2 {
                let last = sub.points[sub.points.len() - 1];
                self.mark_segment(last, sub.points[0], half);
            }
        }

        self.subpaths = subpaths;
        let color = self.state.stroke;
        self.blend_covered(color);
    }
}
