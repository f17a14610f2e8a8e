//! A filtered cursor over the glyph album.

use crate::album::{Album, GlyphTraits};
use crate::ggg::{lookup_flags, ClassDefinitionTable};
use crate::tables::gdef;

const INVALID_VERSION: u64 = u64::MAX;

/// A bidirectional cursor over an [`Album`] that skips ignored glyphs.
///
/// Which glyphs are ignored is controlled by two inputs: the feature
/// mask of the feature unit being applied (a slot is visited only when
/// its feature bits are a subset of the unit's mask) and the lookup
/// flag of the lookup being applied (base/ligature/mark filtering plus
/// the GDEF-driven mark attachment rules). Removed slots are always
/// ignored.
///
/// A locator is a plain value: it does not borrow the album, it carries
/// a snapshot of the album's version instead. Using a locator whose
/// snapshot is stale is a programming bug and trips a debug assertion.
#[derive(Clone, Copy, Debug)]
pub struct Locator<'a> {
    version: u64,
    start: usize,
    limit: usize,
    state: usize,
    index: Option<usize>,
    // Packed like `Album::glyph_mask`: anti-feature-mask high, ignored traits low.
    ignore_mask: u32,
    lookup_flag: u16,
    mark_filtering_set: Option<u16>,
    mark_attach_classes: Option<ClassDefinitionTable<'a>>,
    gdef: Option<gdef::Table<'a>>,
}

impl<'a> Locator<'a> {
    /// Creates a locator over no range. Call [`reset`](Self::reset) before use.
    pub fn new(gdef: Option<&gdef::Table<'a>>) -> Locator<'a> {
        Locator {
            version: INVALID_VERSION,
            start: 0,
            limit: 0,
            state: 0,
            index: None,
            // Removed slots are invisible even before a lookup flag is set.
            ignore_mask: u32::from(GlyphTraits::REMOVED.0),
            lookup_flag: 0,
            mark_filtering_set: None,
            mark_attach_classes: gdef.and_then(|t| t.mark_attach_classes()),
            gdef: gdef.copied(),
        }
    }

    /// Restricts the cursor to `[start, start + count)` and rewinds it.
    pub fn reset(&mut self, album: &Album, start: usize, count: usize) {
        debug_assert!(start.checked_add(count).map_or(false, |end| end <= album.len()));

        self.version = album.version();
        self.start = start;
        self.limit = start + count;
        self.state = start;
        self.index = None;
    }

    /// Inserts `count` slots at the cursor's next position.
    ///
    /// The visited range grows by `count`; the current index is undefined
    /// until the next [`move_next`](Self::move_next).
    pub fn reserve_glyphs(&mut self, album: &mut Album, count: usize) {
        debug_assert_eq!(self.version, album.version());

        album.reserve_glyphs(self.state, count);

        self.version = album.version();
        self.limit += count;
        self.index = None;
    }

    /// Sets the feature mask glyphs must stay within to be visited.
    pub fn set_feature_mask(&mut self, mask: u16) {
        let anti = !mask;
        self.ignore_mask = (self.ignore_mask & 0x0000_FFFF) | (u32::from(anti) << 16);
    }

    /// Derives the ignored glyph categories from a raw lookup flag.
    ///
    /// `mark_filtering_set` is the lookup's GDEF mark glyph set index,
    /// present when the flag has `USE_MARK_FILTERING_SET`.
    pub fn set_lookup_flag(&mut self, flag: u16, mark_filtering_set: Option<u16>) {
        let mut traits = GlyphTraits::REMOVED;

        if flag & lookup_flags::IGNORE_BASE_GLYPHS != 0 {
            traits |= GlyphTraits::BASE;
        }

        if flag & lookup_flags::IGNORE_LIGATURES != 0 {
            traits |= GlyphTraits::LIGATURE;
        }

        if flag & lookup_flags::IGNORE_MARKS != 0 {
            traits |= GlyphTraits::MARK;
        }

        self.lookup_flag = flag;
        self.mark_filtering_set = mark_filtering_set;
        self.ignore_mask = (self.ignore_mask & 0xFFFF_0000) | u32::from(traits.0);
    }

    fn is_ignored_glyph(&self, album: &Album, index: usize) -> bool {
        let glyph_mask = album.glyph_mask(index);

        if self.ignore_mask & glyph_mask != 0 {
            return true;
        }

        // The remaining rules only ever filter marks out.
        if glyph_mask & u32::from(GlyphTraits::MARK.0) == 0 {
            return false;
        }

        let attach_type = self.lookup_flag >> 8;
        if attach_type != 0 {
            if let Some(classes) = self.mark_attach_classes {
                if classes.get(album.glyph(index)).0 != attach_type {
                    return true;
                }
            }
        }

        if self.lookup_flag & lookup_flags::USE_MARK_FILTERING_SET != 0 {
            if let (Some(set_index), Some(gdef)) = (self.mark_filtering_set, &self.gdef) {
                if gdef.has_mark_glyph_sets() && !gdef.is_mark_glyph(album.glyph(index), set_index) {
                    return true;
                }
            }
        }

        false
    }

    /// Advances to the next non-ignored glyph.
    ///
    /// Returns `false` at the end of the range.
    pub fn move_next(&mut self, album: &Album) -> bool {
        debug_assert!(self.state <= self.limit);
        debug_assert_eq!(self.version, album.version());

        while self.state < self.limit {
            let index = self.state;
            self.state += 1;

            if !self.is_ignored_glyph(album, index) {
                self.index = Some(index);
                return true;
            }
        }

        false
    }

    /// Advances `count` times. Returns `false` if the range ran out.
    pub fn skip(&mut self, album: &Album, count: usize) -> bool {
        for _ in 0..count {
            if !self.move_next(album) {
                return false;
            }
        }

        true
    }

    /// Moves the cursor so the next [`move_next`](Self::move_next) starts at `index`.
    ///
    /// Jumping to the limit is legal: `move_next` then returns `false`.
    pub fn jump_to(&mut self, index: usize) {
        debug_assert!(index <= self.limit);

        self.state = index;
    }

    /// Returns the closest non-ignored index after `index`.
    ///
    /// Does not move the cursor.
    pub fn get_after(&self, album: &Album, index: usize) -> Option<usize> {
        debug_assert!(index < self.limit);
        debug_assert_eq!(self.version, album.version());

        (index + 1..self.limit).find(|&i| !self.is_ignored_glyph(album, i))
    }

    /// Returns the closest non-ignored index before `index`.
    ///
    /// Does not move the cursor.
    pub fn get_before(&self, album: &Album, index: usize) -> Option<usize> {
        debug_assert!(index < self.limit);
        debug_assert_eq!(self.version, album.version());

        (self.start..index).rev().find(|&i| !self.is_ignored_glyph(album, i))
    }

    /// Adopts the position of `sibling`, so glyphs it consumed are not
    /// visited again. Both locators must walk the same album.
    pub fn take_state(&mut self, sibling: &Locator) {
        debug_assert!(sibling.state <= self.limit);

        self.state = sibling.state;
    }

    /// The index yielded by the last successful [`move_next`](Self::move_next).
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    // The album grew by `added` slots under a sibling cursor; adopt the
    // new version and widen the range accordingly.
    pub(crate) fn resync(&mut self, album: &Album, added: usize) {
        self.version = album.version();
        self.limit += added;
    }
}
