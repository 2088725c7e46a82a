use std::io::{self, Write};

use crate::canvas::Canvas;
use crate::surface::Rgb;

pub struct Presenter {
    output_buf: Vec<u8>,
}

impl Presenter {
    pub fn new(canvas: &Canvas) -> Self {
        Self {
            output_buf: Vec::with_capacity(canvas.columns() * canvas.rows() * 25),
        }
    }

    pub fn encode(&mut self, canvas: &Canvas) -> io::Result<&[u8]> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let width = canvas.columns();
        let height = canvas.rows();
        let pixels = canvas.pixels();

        // Never matches a real colour on the first cell of a row
        let mut prev_top: Option<Rgb> = None;
        let mut prev_bot: Option<Rgb> = None;

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = pixels[y * width + x];
                let bot = if y + 1 < height {
                    pixels[(y + 1) * width + x]
                } else {
                    top
                };

                if prev_top != Some(top) {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = Some(top);
                }
                if prev_bot != Some(bot) {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = Some(bot);
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = None;
            prev_bot = None;
            if y + 2 < height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        Ok(&self.output_buf)
    }

    pub fn present<W: Write>(&mut self, canvas: &Canvas, out: &mut W) -> io::Result<()> {
        let frame = self.encode(canvas)?;
        out.write_all(frame)?;
        out.flush()
    }
}
