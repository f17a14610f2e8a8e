//! Common tables for GDEF, GPOS and GSUB.

use crate::{GlyphId, Tag};
use crate::parser::*;


/// Lookup flag bits controlling which glyph categories a lookup ignores.
pub mod lookup_flags {
    #![allow(missing_docs)]

    pub const RIGHT_TO_LEFT: u16 = 0x0001;
    pub const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    pub const IGNORE_LIGATURES: u16 = 0x0004;
    pub const IGNORE_MARKS: u16 = 0x0008;
    pub const USE_MARK_FILTERING_SET: u16 = 0x0010;
    /// The high byte selects a mark attachment class; zero means no filtering.
    pub const MARK_ATTACHMENT_TYPE_MASK: u16 = 0xFF00;
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table
#[derive(Clone, Copy, Debug)]
struct RangeRecord {
    start: GlyphId,
    end: GlyphId,
    value: u16, // start coverage index or glyph class
}

impl RangeRecord {
    #[inline]
    fn against(&self, glyph: GlyphId) -> core::cmp::Ordering {
        use core::cmp::Ordering;
        if glyph < self.start {
            Ordering::Greater
        } else if glyph > self.end {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

impl FromData for RangeRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        RangeRecord {
            start: s.read(),
            end: s.read(),
            value: s.read(),
        }
    }
}


/// A [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table).
#[derive(Clone, Copy, Debug)]
pub(crate) struct CoverageTable<'a> {
    data: &'a [u8],
}

impl<'a> CoverageTable<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        CoverageTable { data }
    }

    /// Returns the coverage index of `glyph`, or `None` when not covered.
    pub fn index(&self, glyph: GlyphId) -> Option<u16> {
        let mut s = Stream::new(self.data);
        let format: u16 = s.read()?;

        match format {
            1 => {
                let glyphs = s.read_array16::<GlyphId>()?;
                glyphs.binary_search(&glyph).map(|(index, _)| index)
            }
            2 => {
                let records = s.read_array16::<RangeRecord>()?;
                let (_, record) = records.binary_search_by(|r| r.against(glyph))?;
                Some(record.value.wrapping_add(glyph.0 - record.start.0))
            }
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, glyph: GlyphId) -> bool {
        self.index(glyph).is_some()
    }
}


/// Resolves a coverage table offset against the start of a subtable.
pub(crate) fn coverage_at<'a>(
    data: &'a [u8],
    offset: Offset16,
) -> Result<CoverageTable<'a>, crate::ShapeError> {
    data.get(offset.to_usize()..)
        .map(CoverageTable::new)
        .ok_or(crate::ShapeError::TruncatedTable)
}


/// A value of [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table).
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct Class(pub u16);

impl FromData for Class {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        Class(SafeStream::new(data).read())
    }
}


/// A [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table).
#[derive(Clone, Copy, Debug)]
pub(crate) struct ClassDefinitionTable<'a> {
    data: &'a [u8],
}

impl<'a> ClassDefinitionTable<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        ClassDefinitionTable { data }
    }

    /// Any glyph not included in the range of covered glyph IDs
    /// automatically belongs to Class 0.
    pub fn get(&self, glyph: GlyphId) -> Class {
        self.get_impl(glyph).unwrap_or(Class(0))
    }

    fn get_impl(&self, glyph: GlyphId) -> Option<Class> {
        let mut s = Stream::new(self.data);
        let format: u16 = s.read()?;
        match format {
            1 => {
                let start: GlyphId = s.read()?;

                // Prevent underflow.
                if glyph < start {
                    return None;
                }

                let classes = s.read_array16::<Class>()?;
                classes.get(glyph.0 - start.0)
            }
            2 => {
                let records = s.read_array16::<RangeRecord>()?;
                let (_, record) = records.binary_search_by(|r| r.against(glyph))?;
                Some(Class(record.value))
            }
            _ => None,
        }
    }
}


// ScriptList and FeatureList entries share this layout.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TagRecord {
    pub tag: Tag,
    pub offset: Offset16,
}

impl FromData for TagRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        TagRecord {
            tag: s.read(),
            offset: s.read(),
        }
    }
}


/// A [Script List](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#slTbl_sRec).
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct ScriptList<'a> {
    data: &'a [u8], // Data from beginning of ScriptList.
    records: LazyArray16<'a, TagRecord>,
}

impl<'a> ScriptList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let records = Stream::new(data).read_array16()?;
        Some(ScriptList { data, records })
    }

    /// Returns the script with `tag`.
    ///
    /// Uses binary search: script records are ordered by tag.
    pub fn get(&self, tag: Tag) -> Option<Script<'a>> {
        let (_, record) = self.records.binary_search_by(|r| r.tag.cmp(&tag))?;
        let data = self.data.get(record.offset.to_usize()..)?;
        let mut s = Stream::new(data);
        let default_lang_offset: Option<Offset16> = s.read()?;
        let records = s.read_array16()?;
        Some(Script {
            data,
            tag,
            default_lang_offset,
            records,
        })
    }
}


/// A font script.
#[allow(missing_debug_implementations)]
#[derive(Clone, Copy)]
pub struct Script<'a> {
    data: &'a [u8], // Data from beginning of ScriptTable.
    tag: Tag,
    default_lang_offset: Option<Offset16>,
    records: LazyArray16<'a, TagRecord>,
}

impl<'a> Script<'a> {
    /// Returns script's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Parses script's default language system.
    pub fn default_language(&self) -> Option<LangSys<'a>> {
        let data = self.data.get(self.default_lang_offset?.to_usize()..)?;
        parse_lang_sys_table(data, Tag::from_bytes(b"dflt"))
    }

    /// Returns the language system with `tag`.
    ///
    /// Uses binary search: language records are ordered by tag.
    pub fn language_by_tag(&self, tag: Tag) -> Option<LangSys<'a>> {
        let (_, record) = self.records.binary_search_by(|r| r.tag.cmp(&tag))?;
        let data = self.data.get(record.offset.to_usize()..)?;
        parse_lang_sys_table(data, tag)
    }
}

fn parse_lang_sys_table(data: &[u8], tag: Tag) -> Option<LangSys> {
    let mut s = Stream::new(data);
    s.skip::<u16>(); // lookupOrder (reserved)

    let required_feature_index = match s.read::<u16>()? {
        0xFFFF => None, // no required feature
        n => Some(n),
    };

    Some(LangSys {
        tag,
        required_feature_index,
        feature_indices: s.read_array16()?,
    })
}

/// A language system of a script.
#[derive(Clone, Copy, Debug)]
pub struct LangSys<'a> {
    /// Language tag.
    pub tag: Tag,
    /// Index of a feature required by this language system.
    pub required_feature_index: Option<u16>,
    /// Indices into the feature list.
    pub feature_indices: LazyArray16<'a, u16>,
}


/// A [Feature List](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#flTbl).
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct FeatureList<'a> {
    data: &'a [u8], // Data from beginning of FeatureList.
    records: LazyArray16<'a, TagRecord>,
}

impl<'a> FeatureList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let records = Stream::new(data).read_array16()?;
        Some(FeatureList { data, records })
    }

    pub fn get(&self, index: u16) -> Option<Feature<'a>> {
        let record = self.records.get(index)?;
        let data = self.data.get(record.offset.to_usize()..)?;
        let mut s = Stream::new(data);
        s.skip::<Offset16>(); // featureParams
        Some(Feature {
            tag: record.tag,
            lookup_indices: s.read_array16()?,
        })
    }
}


/// A font feature.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Feature<'a> {
    pub tag: Tag,
    pub lookup_indices: LazyArray16<'a, u16>,
}


/// A [Lookup List](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lulTbl).
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct LookupList<'a> {
    data: &'a [u8], // Data from beginning of LookupList.
    offsets: LazyArray16<'a, Offset16>,
}

impl<'a> LookupList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let offsets = Stream::new(data).read_array16()?;
        Some(LookupList { data, offsets })
    }

    pub fn get(&self, index: u16) -> Option<Lookup<'a>> {
        let data = self.data.get(self.offsets.get(index)?.to_usize()..)?;
        let mut s = Stream::new(data);
        let lookup_type: u16 = s.read()?;
        let flag: u16 = s.read()?;
        let subtables = s.read_offsets16(data)?;

        // Present only when the flag requests it.
        let mut mark_filtering_set = None;
        if flag & lookup_flags::USE_MARK_FILTERING_SET != 0 {
            mark_filtering_set = Some(s.read::<u16>()?);
        }

        Some(Lookup {
            lookup_type,
            flag,
            subtables,
            mark_filtering_set,
        })
    }
}


/// A font lookup: a typed list of subtables plus a glyph filter.
#[derive(Clone, Copy, Debug)]
pub struct Lookup<'a> {
    /// Lookup type, interpreted per table kind (GSUB or GPOS).
    pub lookup_type: u16,
    /// Raw lookup flag.
    pub flag: u16,
    /// Subtables, in application order.
    pub subtables: Offsets16<'a>,
    /// GDEF mark glyph set index, when the flag selects one.
    pub mark_filtering_set: Option<u16>,
}


/// Shared layout of the GSUB and GPOS tables.
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct LayoutTable<'a> {
    pub scripts: ScriptList<'a>,
    pub features: FeatureList<'a>,
    pub lookups: LookupList<'a>,
}

impl<'a> LayoutTable<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let version: u32 = s.read()?;
        // 1.1 only adds feature variations, which this engine does not read.
        if !(version == 0x00010000 || version == 0x00010001) {
            return None;
        }

        let script_list_offset: Offset16 = s.read()?;
        let feature_list_offset: Offset16 = s.read()?;
        let lookup_list_offset: Offset16 = s.read()?;

        Some(LayoutTable {
            scripts: ScriptList::parse(data.get(script_list_offset.to_usize()..)?)?,
            features: FeatureList::parse(data.get(feature_list_offset.to_usize()..)?)?,
            lookups: LookupList::parse(data.get(lookup_list_offset.to_usize()..)?)?,
        })
    }
}
