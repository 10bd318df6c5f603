//! Raster fonts: glyph atlases, line printing and word wrap.
//!
//! A font is a set of cropped U8 glyph images with vertical offsets.
//! Printing colors each glyph through the silhouette primitive, so glyph
//! anti-aliasing blends like any other alpha edge. Glyphs land on whole
//! pixels; there is no sub-pixel placement.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::draw_silhouette;
use crate::image::color::Color;
use crate::image::pixel::Raster;
use crate::image::{ImageRgba, ImageU8};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("the atlas of {width}x{height} pixels is too small for a 16x16 glyph grid")]
    AtlasTooSmall { width: i32, height: i32 },
    #[error("could not parse the font data: {0}")]
    BadFontData(String),
}

struct RasterChar {
    image: ImageU8,
    width: i32,
    offset_y: i32,
}

/// A fixed-size raster font. Cheap to clone and share.
#[derive(Clone)]
pub struct RasterFont {
    inner: Arc<FontInner>,
}

struct FontInner {
    name: String,
    size: i32,
    spacing: i32,
    space_width: i32,
    tab_width: i32,
    widest: i32,
    characters: Vec<RasterChar>,
    indices: HashMap<char, usize>,
}

/// Tight bound of the lit pixels inside a search region, or `None` for an
/// empty cell.
fn glyph_bound(image: &ImageU8, search: IRect) -> Option<IRect> {
    let mut min_x = search.right();
    let mut max_x = search.left() - 1;
    let mut min_y = search.bottom();
    let mut max_y = search.top() - 1;
    for y in search.top()..search.bottom() {
        for x in search.left()..search.right() {
            if image.read_border(x, y, 0) != 0 {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }
    let bound = IRect::from_corners(min_x, min_y, max_x + 1, max_y + 1);
    bound.has_area().then_some(bound)
}

struct FontBuilder {
    characters: Vec<RasterChar>,
    indices: HashMap<char, usize>,
    widest: i32,
}

impl FontBuilder {
    fn new() -> Self {
        Self { characters: Vec::new(), indices: HashMap::new(), widest: 0 }
    }

    fn register(&mut self, character: char, image: ImageU8, offset_y: i32) {
        if self.indices.contains_key(&character) {
            return;
        }
        let width = image.width();
        self.widest = self.widest.max(width);
        self.characters.push(RasterChar { image, width, offset_y });
        self.indices.insert(character, self.characters.len() - 1);
    }
}

impl RasterFont {
    /// Build a font from a 16x16 glyph grid covering Latin-1, where glyph
    /// `(column, row)` is the character `row * 16 + column`. Each cell is
    /// cropped to its lit pixels; empty cells print as spaces.
    pub fn from_atlas(name: &str, atlas: &ImageU8) -> Result<RasterFont, FontError> {
        let cell_width = atlas.width() / 16;
        let cell_height = atlas.height() / 16;
        if cell_width < 1 || cell_height < 1 {
            return Err(FontError::AtlasTooSmall { width: atlas.width(), height: atlas.height() });
        }
        let mut builder = FontBuilder::new();
        for row in 0..16 {
            for column in 0..16 {
                let cell = IRect::new(column * cell_width, row * cell_height, cell_width, cell_height);
                if let Some(bound) = glyph_bound(atlas, cell) {
                    let Some(character) = char::from_u32((row * 16 + column) as u32) else {
                        continue;
                    };
                    let glyph = atlas.sub_image(bound).expect("glyph bound inside atlas");
                    builder.register(character, glyph, bound.top() - cell.top());
                }
            }
        }
        let size = cell_height;
        Ok(RasterFont {
            inner: Arc::new(FontInner {
                name: name.into(),
                size,
                spacing: (size / 16).max(1),
                space_width: (size / 2).max(1),
                tab_width: (size / 2).max(1) * 4,
                widest: builder.widest,
                characters: builder.characters,
                indices: builder.indices,
            }),
        })
    }

    /// Rasterize the printable ASCII range of a TTF font at `pixel_size`
    /// into a raster font.
    pub fn from_ttf(name: &str, data: &[u8], pixel_size: f32) -> Result<RasterFont, FontError> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|message| FontError::BadFontData(message.to_string()))?;
        let line = font
            .horizontal_line_metrics(pixel_size)
            .ok_or_else(|| FontError::BadFontData("missing horizontal line metrics".into()))?;
        let ascent = line.ascent.round() as i32;
        let mut builder = FontBuilder::new();
        for code in 33u8..=126 {
            let character = code as char;
            let (metrics, bitmap) = font.rasterize(character, pixel_size);
            if metrics.width == 0 || metrics.height == 0 {
                continue;
            }
            let Ok(glyph) = ImageU8::create(metrics.width as i32, metrics.height as i32) else {
                continue;
            };
            for y in 0..metrics.height {
                for x in 0..metrics.width {
                    glyph.write_pixel(x as i32, y as i32, bitmap[y * metrics.width + x]);
                }
            }
            let offset_y = ascent - metrics.height as i32 - metrics.ymin;
            builder.register(character, glyph, offset_y);
        }
        let size = (line.ascent - line.descent).round() as i32;
        let space_width = font.metrics(' ', pixel_size).advance_width.round().max(1.0) as i32;
        Ok(RasterFont {
            inner: Arc::new(FontInner {
                name: name.into(),
                size,
                spacing: (size / 16).max(1),
                space_width,
                tab_width: space_width * 4,
                widest: builder.widest,
                characters: builder.characters,
                indices: builder.indices,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Line height in pixels.
    pub fn size(&self) -> i32 {
        self.inner.size
    }

    /// Horizontal stride of a printed character, including spacing.
    /// Unmapped characters advance one space width, line controls none.
    pub fn character_width(&self, character: char) -> i32 {
        if character == '\0' || character == '\n' || character == '\r' {
            return 0;
        }
        match self.inner.indices.get(&character) {
            Some(&index) => self.inner.characters[index].width + self.inner.spacing,
            None => self.inner.space_width,
        }
    }

    /// Width used per character when printing as a monospace grid.
    pub fn monospace_width(&self) -> i32 {
        self.inner.widest + self.inner.spacing
    }

    /// Pixel width of a single line, honoring tab stops.
    pub fn line_width(&self, text: &str) -> i32 {
        let mut width = 0;
        for character in text.chars() {
            if character == '\t' {
                width = tab_jump(width, 0, self.inner.tab_width);
            } else {
                width += self.character_width(character);
            }
        }
        width
    }

    /// Print one character, returning its horizontal stride.
    pub fn print_character(&self, target: &ImageRgba, character: char, location: IVector2, color: Color) -> i32 {
        if let Some(&index) = self.inner.indices.get(&character) {
            let glyph = &self.inner.characters[index];
            draw_silhouette(target, &glyph.image, color, location.x, location.y + glyph.offset_y);
        }
        self.character_width(character)
    }

    /// Print one line without wrapping. Tabs jump to the next tab stop from
    /// the line origin.
    pub fn print_line(&self, target: &ImageRgba, text: &str, location: IVector2, color: Color) {
        let mut position = location;
        for character in text.chars() {
            if character == '\t' {
                position.x = tab_jump(position.x, location.x, self.inner.tab_width);
            } else {
                position.x += self.print_character(target, character, position, color);
            }
        }
    }

    /// Print word-wrapped text inside `bound`. Explicit line breaks are
    /// kept, words wrap at spaces, and a word wider than the bound is split
    /// wherever it overflows.
    pub fn print_multi_line(&self, target: &ImageRgba, text: &str, bound: IRect, color: Color) {
        let mut y = bound.top();
        for paragraph in text.split('\n') {
            let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
            let mut line = String::new();
            let mut line_width = 0;
            for word in split_keeping_spaces(paragraph) {
                let word_width = self.line_width(word);
                if line_width + word_width > bound.width() && !line.is_empty() {
                    self.print_line(target, line.trim_end(), IVector2::new(bound.left(), y), color);
                    y += self.inner.size;
                    line.clear();
                    line_width = 0;
                    if word.trim().is_empty() {
                        continue;
                    }
                }
                if word_width > bound.width() {
                    // Overlong word: split at character granularity.
                    for character in word.chars() {
                        let step = self.character_width(character);
                        if line_width + step > bound.width() && !line.is_empty() {
                            self.print_line(target, line.trim_end(), IVector2::new(bound.left(), y), color);
                            y += self.inner.size;
                            line.clear();
                            line_width = 0;
                        }
                        line.push(character);
                        line_width += step;
                    }
                } else {
                    line.push_str(word);
                    line_width += word_width;
                }
            }
            self.print_line(target, line.trim_end(), IVector2::new(bound.left(), y), color);
            y += self.inner.size;
        }
    }
}

/// Jump to the next tab stop measured from the line origin. Landing exactly
/// on a stop jumps a full tab width.
fn tab_jump(position: i32, origin: i32, tab_width: i32) -> i32 {
    let local = position - origin;
    position + (tab_width - local % tab_width)
}

/// Split into alternating words and space runs, keeping both.
fn split_keeping_spaces(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (index, character) in text.char_indices() {
        let space = character == ' ';
        if Some(space) != in_space {
            if index > start {
                parts.push(&text[start..index]);
            }
            start = index;
            in_space = Some(space);
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

lazy_static::lazy_static! {
    static ref DEFAULT_FONT: RasterFont = RasterFont::from_ttf(
        "DejaVu Sans Mono",
        include_bytes!("../../assets/DejaVuSansMono.ttf"),
        16.0,
    )
    .expect("parsing the embedded default font");
}

/// The process-wide default font, parsed lazily from the embedded TTF.
pub fn default_font() -> RasterFont {
    DEFAULT_FONT.clone()
}
