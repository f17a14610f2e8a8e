//! Compiled feature selections.

use alloc::vec::Vec;
use core::ops::Range;

use crate::{Font, Tag, TextDirection};


/// The two families of layout lookups.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum FeatureKind {
    /// GSUB lookups.
    Substitution,
    /// GPOS lookups.
    Positioning,
}


/// A group of features that are applied simultaneously.
///
/// The smallest granule of shaping execution: the driver walks the album
/// once per unit, with the unit's feature mask installed in the locator.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FeatureUnit {
    /// The slice of [`Pattern::feature_tags`] naming the member features.
    pub covered_range: Range<usize>,
    /// OR of the member features' masks.
    pub feature_mask: u16,
    /// Union of the member features' lookup indices, ascending, deduplicated.
    pub lookup_indices: Vec<u16>,
}


/// An immutable, compiled feature selection for one script and language.
///
/// Built once by a [`PatternBuilder`] and then shared by any number of
/// shaping passes (wrap it in `Rc`/`Arc` for sharing; the pattern itself
/// is never mutated again).
#[derive(Clone, Debug)]
pub struct Pattern<'a> {
    /// The font the pattern was compiled against.
    pub font: Option<&'a Font<'a>>,
    /// Script tag.
    pub script_tag: Tag,
    /// Language tag.
    pub language_tag: Tag,
    /// Direction implied by the script.
    pub default_direction: TextDirection,
    /// Every feature tag referenced, in insertion order. GSUB feature
    /// tags precede GPOS feature tags.
    pub feature_tags: Vec<Tag>,
    feature_units: Vec<FeatureUnit>,
    gsub_count: usize,
    gpos_count: usize,
}

impl<'a> Pattern<'a> {
    /// All feature units: GSUB units first, then GPOS units.
    #[inline]
    pub fn units(&self) -> &[FeatureUnit] {
        &self.feature_units
    }

    /// The GSUB feature units.
    #[inline]
    pub fn gsub_units(&self) -> &[FeatureUnit] {
        &self.feature_units[..self.gsub_count]
    }

    /// The GPOS feature units.
    #[inline]
    pub fn gpos_units(&self) -> &[FeatureUnit] {
        &self.feature_units[self.gsub_count..]
    }

    /// Number of GSUB feature units.
    #[inline]
    pub fn gsub_count(&self) -> usize {
        self.gsub_count
    }

    /// Number of GPOS feature units.
    #[inline]
    pub fn gpos_count(&self) -> usize {
        self.gpos_count
    }
}

impl PartialEq for Pattern<'_> {
    fn eq(&self, other: &Self) -> bool {
        let same_font = match (self.font, other.font) {
            (Some(a), Some(b)) => core::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_font
            && self.script_tag == other.script_tag
            && self.language_tag == other.language_tag
            && self.default_direction == other.default_direction
            && self.feature_tags == other.feature_tags
            && self.feature_units == other.feature_units
            && self.gsub_count == other.gsub_count
            && self.gpos_count == other.gpos_count
    }
}


#[derive(Clone, Debug)]
struct PendingFeature {
    tag: Tag,
    mask: u16,
    lookup_indices: Vec<u16>,
}


/// Builds a [`Pattern`] incrementally.
///
/// Call order: optional setters, then for each kind (substitution first)
/// [`begin_features`](Self::begin_features), any number of
/// [`add_feature`](Self::add_feature)/[`add_lookup`](Self::add_lookup)
/// groups sealed by [`make_feature_unit`](Self::make_feature_unit),
/// then [`end_features`](Self::end_features), and finally
/// [`build`](Self::build).
#[derive(Default, Debug)]
pub struct PatternBuilder<'a> {
    font: Option<&'a Font<'a>>,
    script_tag: Tag,
    language_tag: Tag,
    direction: TextDirection,
    feature_tags: Vec<Tag>,
    feature_units: Vec<FeatureUnit>,
    gsub_count: usize,
    gpos_count: usize,
    kind: Option<FeatureKind>,
    pending: Vec<PendingFeature>,
}

impl<'a> PatternBuilder<'a> {
    /// Creates an empty builder.
    pub fn new() -> PatternBuilder<'a> {
        PatternBuilder::default()
    }

    /// Sets the font the pattern is compiled against.
    pub fn set_font(&mut self, font: &'a Font<'a>) {
        self.font = Some(font);
    }

    /// Sets the script tag and its implied direction.
    pub fn set_script(&mut self, tag: Tag, direction: TextDirection) {
        self.script_tag = tag;
        self.direction = direction;
    }

    /// Sets the language tag.
    pub fn set_language(&mut self, tag: Tag) {
        self.language_tag = tag;
    }

    /// Opens a feature section of `kind`.
    ///
    /// All substitution sections must precede positioning sections, and
    /// the previous section must have been closed.
    pub fn begin_features(&mut self, kind: FeatureKind) {
        debug_assert!(self.kind.is_none());
        debug_assert!(self.pending.is_empty());
        // GSUB units always precede GPOS units.
        debug_assert!(kind == FeatureKind::Positioning || self.gpos_count == 0);

        self.kind = Some(kind);
    }

    /// Adds a feature to the unit under construction.
    ///
    /// Adding a tag already present in the open unit ORs the masks
    /// instead of duplicating the tag.
    pub fn add_feature(&mut self, tag: Tag, mask: u16) {
        debug_assert!(self.kind.is_some());

        if let Some(existing) = self.pending.iter_mut().find(|f| f.tag == tag) {
            existing.mask |= mask;
            return;
        }

        self.pending.push(PendingFeature {
            tag,
            mask,
            lookup_indices: Vec::new(),
        });
    }

    /// Adds a lookup index to the most recently added feature.
    ///
    /// Indices may arrive in any order and may repeat; the stored list
    /// stays ascending and deduplicated.
    pub fn add_lookup(&mut self, index: u16) {
        debug_assert!(!self.pending.is_empty());

        if let Some(feature) = self.pending.last_mut() {
            if let Err(pos) = feature.lookup_indices.binary_search(&index) {
                feature.lookup_indices.insert(pos, index);
            }
        }
    }

    /// Seals the accumulated features into one feature unit.
    ///
    /// A unit with zero lookups is still emitted.
    pub fn make_feature_unit(&mut self) {
        debug_assert!(self.kind.is_some());
        debug_assert!(!self.pending.is_empty());

        let start = self.feature_tags.len();
        let mut feature_mask = 0;
        let mut lookup_indices: Vec<u16> = Vec::new();

        for feature in self.pending.drain(..) {
            self.feature_tags.push(feature.tag);
            feature_mask |= feature.mask;
            for index in feature.lookup_indices {
                if let Err(pos) = lookup_indices.binary_search(&index) {
                    lookup_indices.insert(pos, index);
                }
            }
        }

        self.feature_units.push(FeatureUnit {
            covered_range: start..self.feature_tags.len(),
            feature_mask,
            lookup_indices,
        });

        match self.kind {
            Some(FeatureKind::Substitution) => self.gsub_count += 1,
            Some(FeatureKind::Positioning) => self.gpos_count += 1,
            None => {}
        }
    }

    /// Closes the current feature section.
    ///
    /// A still-open unit is committed as if by
    /// [`make_feature_unit`](Self::make_feature_unit).
    pub fn end_features(&mut self) {
        debug_assert!(self.kind.is_some());

        if !self.pending.is_empty() {
            self.make_feature_unit();
        }

        self.kind = None;
    }

    /// Finalizes the pattern. The builder is consumed: no scratch state
    /// outlives the build.
    pub fn build(self) -> Pattern<'a> {
        debug_assert!(self.kind.is_none());
        debug_assert!(self.pending.is_empty());

        Pattern {
            font: self.font,
            script_tag: self.script_tag,
            language_tag: self.language_tag,
            default_direction: self.direction,
            feature_tags: self.feature_tags,
            feature_units: self.feature_units,
            gsub_count: self.gsub_count,
            gpos_count: self.gpos_count,
        }
    }
}
