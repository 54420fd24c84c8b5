//! A wrapper around the 64x32 pixel display buffer and the built-in hex font

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Value of a lit pixel in the buffer returned by `Graphics::get_pixels`. Unlit
/// pixels are 0, so the buffer can be handed straight to a 0RGB framebuffer
pub const PIXEL_ON: u32 = 0xFFFFFF;

/// Number of bytes (rows) in each glyph of the font
pub const NUM_BYTES_IN_FONT_CHAR: u8 = 5;

/// The 16 5-byte hex glyphs (0-F) loaded at address 0
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Monochrome display. Only the clear and draw ops write to it
pub struct Graphics {
    buffer: Vec<u32>,
}

impl Graphics {
    pub fn new() -> Self {
        Graphics {
            buffer: vec![0; WIDTH * HEIGHT],
        }
    }

    /// Given x and y coordinate for a pixel, return the index of that pixel in
    /// the buffer. Coordinates past the edge wrap around to the other side
    pub fn get_graphics_idx(x: u8, y: u8) -> usize {
        let column = x as usize % WIDTH;
        let row = (y as usize % HEIGHT) * WIDTH;

        column + row
    }

    /// XOR a single pixel onto the buffer. Returns true if a lit pixel was
    /// turned off, which is a collision as far as the draw op is concerned
    pub fn xor_set(&mut self, x: u8, y: u8, enabled: bool) -> bool {
        if !enabled {
            return false;
        }

        let idx = Graphics::get_graphics_idx(x, y);
        let was_on = self.buffer[idx] == PIXEL_ON;
        self.buffer[idx] = if was_on { 0 } else { PIXEL_ON };

        was_on
    }

    /// Draw one sprite row of 8 pixels starting at (x, y), MSB leftmost. Every
    /// pixel wraps on its own, so a row starting at x = 63 continues at x = 0
    pub fn draw_row(&mut self, x: u8, y: u8, row: u8) -> bool {
        let mut collision = false;
        for bit in 0..8u8 {
            let enabled = (row >> (7 - bit)) & 1 == 1;
            let px = ((x as usize + bit as usize) % WIDTH) as u8;
            collision |= self.xor_set(px, y, enabled);
        }
        collision
    }

    pub fn clear(&mut self) {
        for pixel in self.buffer.iter_mut() {
            *pixel = 0;
        }
    }

    pub fn is_on(&self, x: u8, y: u8) -> bool {
        self.buffer[Graphics::get_graphics_idx(x, y)] == PIXEL_ON
    }

    /// The whole display, row major, one u32 per pixel
    pub fn get_pixels(&self) -> &[u32] {
        &self.buffer
    }

    /// Renders the display as text, one line per row, '#' for lit pixels
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((WIDTH + 1) * HEIGHT);
        for row in self.buffer.chunks(WIDTH) {
            for pixel in row {
                out.push(if *pixel == PIXEL_ON { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Self::new()
    }
}
