// https://docs.microsoft.com/en-us/typography/opentype/spec/gdef

use crate::GlyphId;
use crate::ggg::{Class, ClassDefinitionTable, CoverageTable};
use crate::parser::{LazyArray16, Offset, Offset16, Offset32, Stream};


/// A [glyph class](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef#glyph-class-definition-table).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
#[allow(missing_docs)]
pub enum GlyphClass {
    Base      = 1,
    Ligature  = 2,
    Mark      = 3,
    Component = 4,
}


/// A parsed [Glyph Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef).
#[derive(Clone, Copy, Default, Debug)]
pub struct Table<'a> {
    glyph_classes: Option<ClassDefinitionTable<'a>>,
    mark_attach_classes: Option<ClassDefinitionTable<'a>>,
    mark_glyph_coverage_offsets: Option<(&'a [u8], LazyArray16<'a, Offset32>)>,
}

impl<'a> Table<'a> {
    /// Parses the table from `data`.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let version: u32 = s.read()?;
        if !(version == 0x00010000 || version == 0x00010002 || version == 0x00010003) {
            return None;
        }

        let glyph_class_def_offset: Option<Offset16> = s.read()?;
        s.skip::<Offset16>(); // attachListOffset
        s.skip::<Offset16>(); // ligCaretListOffset
        let mark_attach_class_def_offset: Option<Offset16> = s.read()?;

        let mut mark_glyph_sets_def_offset: Option<Offset16> = None;
        if version > 0x00010000 {
            mark_glyph_sets_def_offset = s.read()?;
        }

        let mut table = Table::default();

        if let Some(offset) = glyph_class_def_offset {
            if let Some(subdata) = data.get(offset.to_usize()..) {
                table.glyph_classes = Some(ClassDefinitionTable::new(subdata));
            }
        }

        if let Some(offset) = mark_attach_class_def_offset {
            if let Some(subdata) = data.get(offset.to_usize()..) {
                table.mark_attach_classes = Some(ClassDefinitionTable::new(subdata));
            }
        }

        if let Some(offset) = mark_glyph_sets_def_offset {
            if let Some(subdata) = data.get(offset.to_usize()..) {
                let mut s = Stream::new(subdata);
                let format: u16 = s.read()?;
                if format == 1 {
                    if let Some(array) = s.read_array16::<Offset32>() {
                        table.mark_glyph_coverage_offsets = Some((subdata, array));
                    }
                }
            }
        }

        Some(table)
    }

    /// Checks that the table has a glyph class definition.
    #[inline]
    pub fn has_glyph_classes(&self) -> bool {
        self.glyph_classes.is_some()
    }

    /// Returns the class of `glyph`.
    #[inline]
    pub fn glyph_class(&self, glyph: GlyphId) -> Option<GlyphClass> {
        match self.glyph_classes?.get(glyph).0 {
            1 => Some(GlyphClass::Base),
            2 => Some(GlyphClass::Ligature),
            3 => Some(GlyphClass::Mark),
            4 => Some(GlyphClass::Component),
            _ => None,
        }
    }

    /// Returns the mark attachment class of `glyph`.
    ///
    /// All glyphs not assigned to a class fall into Class 0.
    #[inline]
    pub fn glyph_mark_attachment_class(&self, glyph: GlyphId) -> Class {
        self.mark_attach_classes
            .map(|def| def.get(glyph))
            .unwrap_or(Class(0))
    }

    /// Checks that `glyph` is in the mark glyph set at `set_index`.
    ///
    /// Returns `false` when the table has no mark glyph sets (version < 1.2).
    pub fn is_mark_glyph(&self, glyph: GlyphId, set_index: u16) -> bool {
        self.is_mark_glyph_impl(glyph, set_index).is_some()
    }

    fn is_mark_glyph_impl(&self, glyph: GlyphId, set_index: u16) -> Option<()> {
        let (data, offsets) = self.mark_glyph_coverage_offsets?;
        let offset = offsets.get(set_index)?;
        let coverage = CoverageTable::new(data.get(offset.to_usize()..)?);
        if coverage.contains(glyph) {
            Some(())
        } else {
            None
        }
    }

    pub(crate) fn mark_attach_classes(&self) -> Option<ClassDefinitionTable<'a>> {
        self.mark_attach_classes
    }

    pub(crate) fn has_mark_glyph_sets(&self) -> bool {
        self.mark_glyph_coverage_offsets.is_some()
    }
}
