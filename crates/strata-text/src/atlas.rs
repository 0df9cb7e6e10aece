//! CPU side of a square glyph atlas: shelf packing with 1px gutters, keyed by
//! glyph and pixel size. The renderer owns the texture and copies the
//! bitmaps at the slots handed out here.

use std::collections::HashMap;

use strata_core::Vec2;

use crate::GlyphKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasSlot {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl AtlasSlot {
    /// Normalized texture coordinates of the slot's corners.
    pub fn uv(&self, atlas_size: u32) -> (Vec2, Vec2) {
        let s = atlas_size as f32;
        (
            Vec2::new(self.x as f32 / s, self.y as f32 / s),
            Vec2::new((self.x + self.w) as f32 / s, (self.y + self.h) as f32 / s),
        )
    }
}

pub struct ShelfAtlas {
    size: u32,
    max_size: u32,
    next_x: u32,
    next_y: u32,
    row_h: u32,
    /// Bumped whenever the atlas grows and every slot is dropped.
    generation: u32,
    slots: HashMap<(GlyphKey, u32), AtlasSlot>,
}

impl ShelfAtlas {
    pub fn new(size: u32, max_size: u32) -> Self {
        Self {
            size,
            max_size: max_size.max(size),
            next_x: 1,
            next_y: 1,
            row_h: 0,
            generation: 0,
            slots: HashMap::new(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: GlyphKey, px: u32) -> Option<AtlasSlot> {
        self.slots.get(&(key, px)).copied()
    }

    /// Returns the slot of `key` at `px`, packing a new `w`x`h` one when it
    /// is not there yet. A full atlas doubles (up to its maximum) and starts
    /// over empty; `None` once it cannot grow.
    pub fn insert(&mut self, key: GlyphKey, px: u32, w: u32, h: u32) -> Option<AtlasSlot> {
        if let Some(slot) = self.get(key, px) {
            return Some(slot);
        }
        let w = w.max(1);
        let h = h.max(1);
        let slot = match self.pack(w, h) {
            Some(slot) => slot,
            None => {
                if !self.grow() {
                    log::warn!("ShelfAtlas: full at {}px, dropping {}x{} glyph", self.size, w, h);
                    return None;
                }
                self.pack(w, h)?
            }
        };
        self.slots.insert((key, px), slot);
        Some(slot)
    }

    fn pack(&mut self, w: u32, h: u32) -> Option<AtlasSlot> {
        if self.next_x + w + 1 >= self.size && self.next_x > 1 {
            self.next_x = 1;
            self.next_y += self.row_h + 1;
            self.row_h = 0;
        }
        if self.next_x + w + 1 >= self.size || self.next_y + h + 1 >= self.size {
            return None;
        }
        let slot = AtlasSlot {
            x: self.next_x,
            y: self.next_y,
            w,
            h,
        };
        self.next_x += w + 1;
        self.row_h = self.row_h.max(h + 1);
        Some(slot)
    }

    fn grow(&mut self) -> bool {
        let new_size = (self.size * 2).min(self.max_size);
        if new_size == self.size {
            return false;
        }
        log::debug!("ShelfAtlas: growing {} -> {}", self.size, new_size);
        self.size = new_size;
        self.clear();
        self.generation += 1;
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.next_x = 1;
        self.next_y = 1;
        self.row_h = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_packing_with_gutters() {
        let mut atlas = ShelfAtlas::new(16, 16);
        let a = atlas.insert(GlyphKey(1), 12, 6, 4).unwrap();
        let b = atlas.insert(GlyphKey(2), 12, 6, 4).unwrap();
        let c = atlas.insert(GlyphKey(3), 12, 3, 3).unwrap();
        assert_eq!(a, AtlasSlot { x: 1, y: 1, w: 6, h: 4 });
        assert_eq!(b, AtlasSlot { x: 8, y: 1, w: 6, h: 4 });
        // next shelf starts below the tallest glyph plus the gutter
        assert_eq!(c, AtlasSlot { x: 1, y: 7, w: 3, h: 3 });
        assert_eq!(atlas.len(), 3);
    }

    #[test]
    fn test_same_glyph_and_size_reuses_slot() {
        let mut atlas = ShelfAtlas::new(64, 64);
        let a = atlas.insert(GlyphKey(7), 16, 5, 5).unwrap();
        assert_eq!(atlas.insert(GlyphKey(7), 16, 5, 5), Some(a));
        let other_size = atlas.insert(GlyphKey(7), 24, 8, 8).unwrap();
        assert_ne!(other_size, a);
        assert_eq!(atlas.len(), 2);
    }

    #[test]
    fn test_full_atlas_grows_then_gives_up() {
        let mut atlas = ShelfAtlas::new(16, 32);
        atlas.insert(GlyphKey(1), 8, 10, 10).unwrap();
        let big = atlas.insert(GlyphKey(2), 8, 12, 12).unwrap();
        assert_eq!(atlas.size(), 32);
        assert_eq!(atlas.generation(), 1);
        // growing dropped the earlier slot
        assert_eq!(atlas.get(GlyphKey(1), 8), None);
        assert_eq!(big, AtlasSlot { x: 1, y: 1, w: 12, h: 12 });

        assert_eq!(atlas.insert(GlyphKey(3), 8, 40, 40), None);
        assert_eq!(atlas.size(), 32);
    }

    #[test]
    fn test_uv_spans_the_slot() {
        let slot = AtlasSlot { x: 16, y: 32, w: 16, h: 8 };
        let (uv0, uv1) = slot.uv(64);
        assert_eq!(uv0, Vec2::new(0.25, 0.5));
        assert_eq!(uv1, Vec2::new(0.5, 0.625));
    }
}
