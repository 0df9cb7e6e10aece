//! Text for strata scenes, backed by cosmic-text.
//!
//! One process-wide font system and swash cache sit behind a mutex;
//! [`CosmicText`] exposes them through the scene's [`TextMeasure`] and
//! [`FontMetrics`] contracts and packs rasterized glyphs into a
//! [`ShelfAtlas`]. Renderers drain [`CosmicText::take_uploads`] each frame
//! and copy the bitmaps into their atlas texture.

pub mod atlas;

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use ahash::AHasher;
use anyhow::Context;
use cosmic_text::{Attrs, Buffer, CacheKey, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use strata_core::{Size, Vec2};
use strata_scene::text::{FontMetrics, GlyphInfo, TextMeasure};

pub use atlas::{AtlasSlot, ShelfAtlas};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey(pub u64);

pub struct ShapedGlyph {
    pub key: GlyphKey,
    /// Pen position of the glyph on its line.
    pub x: f32,
    /// Baseline y from the top of the line.
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub bearing_x: f32,
    pub bearing_y: f32,
    pub advance: f32,
}

pub struct GlyphBitmap {
    pub key: GlyphKey,
    pub w: u32,
    pub h: u32,
    pub content: SwashContent,
    /// A8 for masks, RGBA8 for color glyphs.
    pub data: Vec<u8>,
}

struct Engine {
    fs: FontSystem,
    cache: SwashCache,
    key_map: HashMap<GlyphKey, CacheKey>,
}

impl Engine {
    fn get_image(&mut self, key: CacheKey) -> Option<cosmic_text::SwashImage> {
        self.cache.get_image(&mut self.fs, key).clone()
    }

    fn buffer(&mut self, text: &str, px: f32) -> Buffer {
        let mut buf = Buffer::new(&mut self.fs, Metrics::new(px, line_height(px)));
        {
            let mut b = buf.borrow_with(&mut self.fs);
            b.set_size(None, None);
            b.set_text(text, &Attrs::new(), Shaping::Advanced, None);
            b.shape_until_scroll(true);
        }
        buf
    }
}

static ENGINE: OnceCell<Mutex<Engine>> = OnceCell::new();

fn engine() -> &'static Mutex<Engine> {
    ENGINE.get_or_init(|| {
        log::debug!("strata-text: loading system fonts");
        Mutex::new(Engine {
            fs: FontSystem::new(),
            cache: SwashCache::new(),
            key_map: HashMap::new(),
        })
    })
}

fn line_height(px: f32) -> f32 {
    px * 1.3
}

fn key_from_cachekey(k: &CacheKey) -> GlyphKey {
    let mut h = AHasher::default();
    k.hash(&mut h);
    GlyphKey(h.finish())
}

/// Adds the font at `path` to the shared font system.
pub fn load_font_file(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let data = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    anyhow::ensure!(!data.is_empty(), "font file {} is empty", path.display());
    engine().lock().fs.db_mut().load_font_data(data);
    log::info!("strata-text: loaded font {}", path.display());
    Ok(())
}

/// Shapes one line (no wrapping). Glyph positions are relative to the top
/// of the line.
pub fn shape_line(text: &str, px: f32) -> Vec<ShapedGlyph> {
    let mut eng = engine().lock();
    let buf = eng.buffer(text, px);

    let mut out = Vec::new();
    for run in buf.layout_runs() {
        for g in run.glyphs {
            let phys = g.physical((0.0, run.line_y), 1.0);
            let key = key_from_cachekey(&phys.cache_key);
            eng.key_map.insert(key, phys.cache_key);

            let (w, h, left, top) = match eng.get_image(phys.cache_key) {
                Some(img) => (
                    img.placement.width as f32,
                    img.placement.height as f32,
                    img.placement.left as f32,
                    img.placement.top as f32,
                ),
                None => (0.0, 0.0, 0.0, 0.0),
            };

            out.push(ShapedGlyph {
                key,
                x: g.x + g.x_offset,
                y: run.line_y,
                w,
                h,
                bearing_x: left,
                bearing_y: top,
                advance: g.w,
            });
        }
    }
    out
}

/// Width of a shaped line: the right edge of its last glyph.
pub fn line_width(text: &str, px: f32) -> f32 {
    let mut eng = engine().lock();
    let buf = eng.buffer(text, px);
    buf.layout_runs()
        .flat_map(|run| run.glyphs.iter())
        .map(|g| g.x + g.w)
        .fold(0.0, f32::max)
}

/// Rasterizes a glyph previously returned by [`shape_line`]. Pixels are
/// copied out of the cache.
pub fn rasterize(key: GlyphKey) -> Option<GlyphBitmap> {
    let mut eng = engine().lock();
    let &ck = eng.key_map.get(&key)?;
    let img = eng.get_image(ck)?;
    Some(GlyphBitmap {
        key,
        w: img.placement.width,
        h: img.placement.height,
        content: img.content,
        data: img.data,
    })
}

/// A rasterized glyph waiting to be copied into the renderer's atlas.
pub struct AtlasUpload {
    pub slot: AtlasSlot,
    pub bitmap: GlyphBitmap,
}

/// Scene text backend. `base_px` is the font size at text scale 1.
pub struct CosmicText {
    base_px: f32,
    atlas: RefCell<ShelfAtlas>,
    glyphs: RefCell<HashMap<(char, u32), Option<GlyphInfo>>>,
    uploads: RefCell<Vec<AtlasUpload>>,
    atlas_generation: std::cell::Cell<u32>,
}

impl CosmicText {
    pub fn new(base_px: f32) -> Self {
        Self {
            base_px,
            atlas: RefCell::new(ShelfAtlas::new(512, 4096)),
            glyphs: RefCell::new(HashMap::new()),
            uploads: RefCell::new(Vec::new()),
            atlas_generation: std::cell::Cell::new(0),
        }
    }

    pub fn base_px(&self) -> f32 {
        self.base_px
    }

    fn px(&self, scale: f32) -> f32 {
        (self.base_px * scale).max(1.0)
    }

    pub fn atlas_size(&self) -> u32 {
        self.atlas.borrow().size()
    }

    /// Glyph bitmaps packed since the last call. After the atlas grew, the
    /// renderer must recreate its texture at [`atlas_size`](Self::atlas_size)
    /// first.
    pub fn take_uploads(&self) -> Vec<AtlasUpload> {
        std::mem::take(&mut *self.uploads.borrow_mut())
    }

    fn lookup(&self, ch: char, px: f32) -> Option<GlyphInfo> {
        let size_key = px.round() as u32;
        if let Some(hit) = self.glyphs.borrow().get(&(ch, size_key)) {
            return *hit;
        }

        let mut buf = [0u8; 4];
        let shaped = shape_line(ch.encode_utf8(&mut buf), px);
        let info = shaped.first().map(|g| {
            let mut info = GlyphInfo {
                advance: shaped.iter().map(|s| s.advance).sum(),
                offset: Vec2::new(g.bearing_x, g.y - g.bearing_y),
                size: Size::default(),
                uv0: Vec2::ZERO,
                uv1: Vec2::ZERO,
            };
            if g.w > 0.0 && g.h > 0.0 {
                if let Some((slot, size)) = self.pack(g.key, size_key) {
                    let (uv0, uv1) = slot.uv(size);
                    info.size = Size {
                        width: slot.w as f32,
                        height: slot.h as f32,
                    };
                    info.uv0 = uv0;
                    info.uv1 = uv1;
                }
            }
            info
        });
        self.glyphs.borrow_mut().insert((ch, size_key), info);
        info
    }

    fn pack(&self, key: GlyphKey, px: u32) -> Option<(AtlasSlot, u32)> {
        let bitmap = rasterize(key)?;
        if bitmap.w == 0 || bitmap.h == 0 || bitmap.data.is_empty() {
            return None;
        }
        let mut atlas = self.atlas.borrow_mut();
        let slot = atlas.insert(key, px, bitmap.w, bitmap.h)?;
        if atlas.generation() != self.atlas_generation.get() {
            // Earlier slots are gone; re-resolve those glyphs lazily.
            self.atlas_generation.set(atlas.generation());
            self.glyphs.borrow_mut().clear();
            self.uploads.borrow_mut().clear();
        }
        let size = atlas.size();
        self.uploads.borrow_mut().push(AtlasUpload { slot, bitmap });
        Some((slot, size))
    }
}

impl Default for CosmicText {
    fn default() -> Self {
        Self::new(32.0)
    }
}

impl TextMeasure for CosmicText {
    fn measure(&self, text: &str, scale: f32) -> Size {
        let px = self.px(scale);
        Size {
            width: line_width(text, px),
            height: line_height(px),
        }
    }
}

impl FontMetrics for CosmicText {
    fn line_height(&self, scale: f32) -> f32 {
        line_height(self.px(scale))
    }

    fn glyph(&self, ch: char, scale: f32) -> Option<GlyphInfo> {
        self.lookup(ch, self.px(scale))
    }

    fn advance(&self, text: &str, scale: f32) -> f32 {
        line_width(text, self.px(scale))
    }
}
