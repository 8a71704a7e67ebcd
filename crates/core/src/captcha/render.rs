//! PNG rendering of challenge responses with a built-in 5x7 bitmap font.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::Rng;

/// Characters a challenge may contain (no 0/O, 1/I ambiguity).
pub const GLYPH_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const SCALE: u32 = 4;
const GAP: u32 = 8;
const MARGIN: u32 = 12;
const NOISE_DOTS: u32 = 400;
const NOISE_LINES: u32 = 4;

const BACKGROUND: Rgb<u8> = Rgb([245, 245, 240]);

/// Row bitmaps, top to bottom; bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        _ => return None,
    };
    Some(rows)
}

/// Image size for a response of `len` characters.
pub fn image_size(len: usize) -> (u32, u32) {
    let len = len.max(1) as u32;
    let width = MARGIN * 2 + len * (GLYPH_WIDTH * SCALE + GAP) - GAP;
    let height = MARGIN * 2 + GLYPH_HEIGHT * SCALE;
    (width, height)
}

/// Render `text` as a noisy PNG. Characters outside [`GLYPH_ALPHABET`] are
/// left blank.
pub fn render_png(text: &str) -> Result<Vec<u8>, image::ImageError> {
    let len = text.chars().count();
    let (width, height) = image_size(len);
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let mut rng = rand::rng();

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let ink = Rgb([
            rng.random_range(0..120u8),
            rng.random_range(0..120u8),
            rng.random_range(0..120u8),
        ]);
        let x0 = MARGIN + i as u32 * (GLYPH_WIDTH * SCALE + GAP);
        let y0 = rng.random_range(MARGIN / 2..=MARGIN + MARGIN / 2);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..SCALE {
                    for dx in 0..SCALE {
                        let x = x0 + col * SCALE + dx;
                        let y = y0 + row as u32 * SCALE + dy;
                        if x < width && y < height {
                            img.put_pixel(x, y, ink);
                        }
                    }
                }
            }
        }
    }

    for _ in 0..NOISE_DOTS {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        let shade = rng.random_range(100..220u8);
        img.put_pixel(x, y, Rgb([shade, shade, shade]));
    }

    for _ in 0..NOISE_LINES {
        let (x_start, y_start) = (0i64, i64::from(rng.random_range(0..height)));
        let (x_end, y_end) = (i64::from(width - 1), i64::from(rng.random_range(0..height)));
        let steps = x_end - x_start;
        for step in 0..=steps {
            let x = x_start + step;
            let y = y_start + (y_end - y_start) * step / steps.max(1);
            img.put_pixel(x as u32, y as u32, Rgb([90, 90, 90]));
        }
    }

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
