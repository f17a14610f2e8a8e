//! The shaping driver: walks the album and dispatches lookups.

use crate::album::{Album, GlyphTraits};
use crate::context;
use crate::ggg::{LayoutTable, Lookup};
use crate::locator::Locator;
use crate::pattern::{FeatureKind, FeatureUnit, Pattern};
use crate::position;
use crate::substitute;
use crate::tables::gdef::GlyphClass;
use crate::{GlyphId, ShapeError};

// Bounds nested contextual lookups; adversarial fonts can otherwise
// chain lookups into unbounded recursion.
const MAX_NESTING_DEPTH: usize = 64;

const GSUB_EXTENSION_TYPE: u16 = 7;
const GPOS_EXTENSION_TYPE: u16 = 9;


/// Applies a compiled [`Pattern`] to an [`Album`].
///
/// One processor drives one shaping pass; the album is exclusively
/// borrowed for the pass. The pattern (and the font data behind it)
/// may be shared between passes.
#[allow(missing_debug_implementations)]
pub struct TextProcessor<'a, 'f> {
    pub(crate) pattern: &'a Pattern<'f>,
    pub(crate) album: &'a mut Album,
    pub(crate) locator: Locator<'f>,
    pub(crate) feature_kind: FeatureKind,
    table: Option<LayoutTable<'f>>,
    depth: usize,
}

impl<'a, 'f> TextProcessor<'a, 'f> {
    /// Creates a processor for one shaping pass.
    pub fn new(pattern: &'a Pattern<'f>, album: &'a mut Album) -> TextProcessor<'a, 'f> {
        let gdef = pattern.font.and_then(|font| font.gdef.as_ref());
        TextProcessor {
            pattern,
            album,
            locator: Locator::new(gdef),
            feature_kind: FeatureKind::Substitution,
            table: None,
            depth: 0,
        }
    }

    /// Seeds every slot's traits from the font's GDEF glyph classes.
    ///
    /// Call once after the album is filled and before [`shape`](Self::shape).
    pub fn discover_glyphs(&mut self) {
        for index in 0..self.album.len() {
            let traits = self.glyph_traits(self.album.glyph(index));
            self.album.set_traits(index, traits);
        }
    }

    /// Applies every feature unit of the pattern: GSUB units first,
    /// then GPOS units.
    pub fn shape(&mut self) {
        let pattern = self.pattern;

        if let Some(gsub) = pattern.font.and_then(|font| font.gsub) {
            self.apply_units(FeatureKind::Substitution, gsub.table, pattern.gsub_units());
        }

        if let Some(gpos) = pattern.font.and_then(|font| font.gpos) {
            self.apply_units(FeatureKind::Positioning, gpos.table, pattern.gpos_units());
        }
    }

    fn apply_units(&mut self, kind: FeatureKind, table: LayoutTable<'f>, units: &[FeatureUnit]) {
        self.feature_kind = kind;
        self.table = Some(table);

        for unit in units {
            self.locator.set_feature_mask(unit.feature_mask);
            self.locator.reset(self.album, 0, self.album.len());

            while self.locator.move_next(self.album) {
                for &index in &unit.lookup_indices {
                    match self.apply_lookup(index) {
                        // The first applied lookup wins at this position.
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => {
                            warn!("lookup {} skipped: {}", index, e);
                        }
                    }
                }
            }
        }
    }

    /// Applies the lookup at `index` of the current table at the current
    /// locator position. Also the entry point for nested contextual lookups.
    pub(crate) fn apply_lookup(&mut self, index: u16) -> Result<bool, ShapeError> {
        let table = match self.table {
            Some(table) => table,
            None => return Ok(false),
        };
        let lookup = table.lookups.get(index).ok_or(ShapeError::TruncatedTable)?;

        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ShapeError::NestedLookupTooDeep);
        }

        self.depth += 1;
        let result = self.apply_lookup_impl(&lookup);
        self.depth -= 1;
        result
    }

    fn apply_lookup_impl(&mut self, lookup: &Lookup<'f>) -> Result<bool, ShapeError> {
        self.locator.set_lookup_flag(lookup.flag, lookup.mark_filtering_set);

        for subtable in lookup.subtables {
            if self.apply_subtable(lookup.lookup_type, subtable)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Dispatches one subtable by the enclosing lookup's type.
    pub(crate) fn apply_subtable(
        &mut self,
        lookup_type: u16,
        data: &'f [u8],
    ) -> Result<bool, ShapeError> {
        match self.feature_kind {
            FeatureKind::Substitution => match lookup_type {
                1 => substitute::apply_single(self, data),
                2 => substitute::apply_multiple(self, data),
                3 => substitute::apply_alternate(self, data),
                4 => substitute::apply_ligature(self, data),
                5 => context::apply_context(self, data),
                6 => context::apply_chain_context(self, data),
                7 => context::apply_extension(self, data),
                8 => {
                    warn!("reverse chaining substitution is not supported");
                    Ok(false)
                }
                _ => Err(ShapeError::MalformedSubtable),
            },
            FeatureKind::Positioning => match lookup_type {
                1 => position::apply_single(self, data),
                2 => position::apply_pair(self, data),
                3 => position::apply_cursive(self, data),
                4 => position::apply_mark_to_base(self, data),
                5 => position::apply_mark_to_ligature(self, data),
                6 => position::apply_mark_to_mark(self, data),
                7 => context::apply_context(self, data),
                8 => context::apply_chain_context(self, data),
                9 => context::apply_extension(self, data),
                _ => Err(ShapeError::MalformedSubtable),
            },
        }
    }

    /// The extension lookup type of the current family.
    pub(crate) fn extension_lookup_type(&self) -> u16 {
        match self.feature_kind {
            FeatureKind::Substitution => GSUB_EXTENSION_TYPE,
            FeatureKind::Positioning => GPOS_EXTENSION_TYPE,
        }
    }

    /// Derives traits for a glyph from its GDEF class.
    pub(crate) fn glyph_traits(&self, glyph: GlyphId) -> GlyphTraits {
        let gdef = match self.pattern.font.and_then(|font| font.gdef) {
            Some(gdef) => gdef,
            None => return GlyphTraits::NONE,
        };

        match gdef.glyph_class(glyph) {
            Some(GlyphClass::Base) => GlyphTraits::BASE,
            Some(GlyphClass::Ligature) => GlyphTraits::LIGATURE,
            Some(GlyphClass::Mark) => GlyphTraits::MARK,
            Some(GlyphClass::Component) => GlyphTraits::COMPONENT,
            None => GlyphTraits::NONE,
        }
    }
}
