//! GPOS subtable appliers.
//!
//! Positioning never rewrites glyphs: appliers only adjust the album's
//! per-slot offsets and advances, and record attachments via traits.

use crate::album::GlyphTraits;
use crate::ggg::{coverage_at, ClassDefinitionTable};
use crate::parser::{FromData, Offset, Offset16, SafeStream, Stream};
use crate::processor::TextProcessor;
use crate::{ShapeError, TextDirection};


mod value_formats {
    pub const X_PLACEMENT: u16 = 0x0001;
    pub const Y_PLACEMENT: u16 = 0x0002;
    pub const X_ADVANCE: u16 = 0x0004;
    pub const Y_ADVANCE: u16 = 0x0008;
    // Device table offsets; parsed over, never applied.
    pub const DEVICE_MASK: u16 = 0x00F0;
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#value-record
#[derive(Clone, Copy, Default, Debug)]
struct ValueRecord {
    x_placement: i16,
    y_placement: i16,
    x_advance: i16,
}

impl ValueRecord {
    fn size(format: u16) -> usize {
        ((format & 0x00FF).count_ones() as usize) * 2
    }

    fn parse(s: &mut Stream, format: u16) -> Option<ValueRecord> {
        use value_formats::*;

        let mut record = ValueRecord::default();
        if format & X_PLACEMENT != 0 {
            record.x_placement = s.read()?;
        }
        if format & Y_PLACEMENT != 0 {
            record.y_placement = s.read()?;
        }
        if format & X_ADVANCE != 0 {
            record.x_advance = s.read()?;
        }
        if format & Y_ADVANCE != 0 {
            // Vertical layout is out of scope; the value is parsed over
            // only to keep the stream aligned.
            s.skip::<i16>();
        }
        for bit in 0..4 {
            if format & (DEVICE_MASK & (0x0010 << bit)) != 0 {
                s.skip::<u16>();
            }
        }

        Some(record)
    }

    fn apply(&self, p: &mut TextProcessor, index: usize) {
        p.album
            .adjust_offset(index, i32::from(self.x_placement), i32::from(self.y_placement));
        p.album.adjust_advance(index, i32::from(self.x_advance));
    }
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables
#[derive(Clone, Copy, Default, Debug)]
struct Anchor {
    x: i16,
    y: i16,
}

fn anchor_at(data: &[u8], offset: Offset16) -> Result<Anchor, ShapeError> {
    let anchor_data = data
        .get(offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let mut s = Stream::new(anchor_data);
    // Formats 2 and 3 add a contour point / device offsets after the
    // design units; all three start with format, x, y.
    let _format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    Ok(Anchor {
        x: s.read().ok_or(ShapeError::TruncatedTable)?,
        y: s.read().ok_or(ShapeError::TruncatedTable)?,
    })
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-1-single-adjustment-positioning-subtable
pub(crate) fn apply_single(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let glyph = p.album.glyph(index);

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    match format {
        1 => {
            let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let record = ValueRecord::parse(&mut s, value_format).ok_or(ShapeError::TruncatedTable)?;

            if coverage_at(data, coverage_offset)?.index(glyph).is_none() {
                return Ok(false);
            }

            record.apply(p, index);
            Ok(true)
        }
        2 => {
            let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;

            let coverage_index = match coverage_at(data, coverage_offset)?.index(glyph) {
                Some(coverage_index) => coverage_index,
                None => return Ok(false),
            };
            if coverage_index >= value_count {
                return Err(ShapeError::MalformedSubtable);
            }

            let size = ValueRecord::size(value_format);
            s.read_bytes(usize::from(coverage_index) * size)
                .ok_or(ShapeError::TruncatedTable)?;
            let record = ValueRecord::parse(&mut s, value_format).ok_or(ShapeError::TruncatedTable)?;

            record.apply(p, index);
            Ok(true)
        }
        _ => {
            warn!("unsupported single positioning format {}", format);
            Ok(false)
        }
    }
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-2-pair-adjustment-positioning-subtable
pub(crate) fn apply_pair(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let first = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let second = match p.locator.get_after(p.album, first) {
        Some(index) => index,
        None => return Ok(false),
    };

    let first_glyph = p.album.glyph(first);
    let second_glyph = p.album.glyph(second);

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let applied = match format {
        1 => {
            let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format1: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format2: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let set_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;

            let coverage_index = match coverage_at(data, coverage_offset)?.index(first_glyph) {
                Some(coverage_index) => coverage_index,
                None => return Ok(false),
            };
            let set_offset = set_offsets
                .get(coverage_index)
                .ok_or(ShapeError::MalformedSubtable)?;
            let set_data = data
                .get(set_offset.to_usize()..)
                .ok_or(ShapeError::TruncatedTable)?;

            let mut s = Stream::new(set_data);
            let pair_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;

            let mut found = None;
            for _ in 0..pair_count {
                let candidate: crate::GlyphId = s.read().ok_or(ShapeError::TruncatedTable)?;
                if candidate == second_glyph {
                    let value1 =
                        ValueRecord::parse(&mut s, value_format1).ok_or(ShapeError::TruncatedTable)?;
                    let value2 =
                        ValueRecord::parse(&mut s, value_format2).ok_or(ShapeError::TruncatedTable)?;
                    found = Some((value1, value2));
                    break;
                }

                let skip = ValueRecord::size(value_format1) + ValueRecord::size(value_format2);
                s.read_bytes(skip).ok_or(ShapeError::TruncatedTable)?;
            }

            match found {
                Some((value1, value2)) => {
                    value1.apply(p, first);
                    value2.apply(p, second);
                    Some(value_format2 != 0)
                }
                None => None,
            }
        }
        2 => {
            let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format1: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let value_format2: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let class_def1_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let class_def2_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let class1_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let class2_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;

            if coverage_at(data, coverage_offset)?.index(first_glyph).is_none() {
                return Ok(false);
            }

            let class_def1 = class_def_at(data, class_def1_offset)?;
            let class_def2 = class_def_at(data, class_def2_offset)?;
            let class1 = class_def1.get(first_glyph).0;
            let class2 = class_def2.get(second_glyph).0;
            if class1 >= class1_count || class2 >= class2_count {
                return Ok(false);
            }

            let record_size = ValueRecord::size(value_format1) + ValueRecord::size(value_format2);
            let skip = (usize::from(class1) * usize::from(class2_count) + usize::from(class2))
                * record_size;
            s.read_bytes(skip).ok_or(ShapeError::TruncatedTable)?;
            let value1 = ValueRecord::parse(&mut s, value_format1).ok_or(ShapeError::TruncatedTable)?;
            let value2 = ValueRecord::parse(&mut s, value_format2).ok_or(ShapeError::TruncatedTable)?;

            value1.apply(p, first);
            value2.apply(p, second);
            Some(value_format2 != 0)
        }
        _ => {
            warn!("unsupported pair positioning format {}", format);
            None
        }
    };

    match applied {
        Some(second_positioned) => {
            // The second glyph may open a pair of its own, unless it
            // already received a value here.
            if second_positioned {
                p.locator.jump_to(second + 1);
            } else {
                p.locator.jump_to(second);
            }
            Ok(true)
        }
        None => Ok(false),
    }
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-3-cursive-attachment-positioning-subtable
#[derive(Clone, Copy, Debug)]
struct EntryExitRecord {
    entry: Option<Offset16>,
    exit: Option<Offset16>,
}

impl FromData for EntryExitRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        EntryExitRecord {
            entry: s.read(),
            exit: s.read(),
        }
    }
}

pub(crate) fn apply_cursive(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let first = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let second = match p.locator.get_after(p.album, first) {
        Some(index) => index,
        None => return Ok(false),
    };

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported cursive positioning format {}", format);
        return Ok(false);
    }

    let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let records = s.read_array16::<EntryExitRecord>().ok_or(ShapeError::TruncatedTable)?;
    let coverage = coverage_at(data, coverage_offset)?;

    let first_record = match coverage.index(p.album.glyph(first)) {
        Some(coverage_index) => records.get(coverage_index).ok_or(ShapeError::MalformedSubtable)?,
        None => return Ok(false),
    };
    let second_record = match coverage.index(p.album.glyph(second)) {
        Some(coverage_index) => records.get(coverage_index).ok_or(ShapeError::MalformedSubtable)?,
        None => return Ok(false),
    };

    // The exit anchor of the first glyph joins the entry anchor of the
    // second one.
    let (exit_offset, entry_offset) = match (first_record.exit, second_record.entry) {
        (Some(exit), Some(entry)) => (exit, entry),
        _ => return Ok(false),
    };
    let exit = anchor_at(data, exit_offset)?;
    let entry = anchor_at(data, entry_offset)?;

    match p.pattern.default_direction {
        TextDirection::LeftToRight => {
            p.album.set_advance(first, i32::from(exit.x) + p.album.offset(first).0);

            let dx = i32::from(entry.x) + p.album.offset(second).0;
            p.album.adjust_advance(second, -dx);
            p.album
                .adjust_offset(second, -dx, i32::from(exit.y) - i32::from(entry.y));
            p.album.insert_traits(second, GlyphTraits::ATTACHED);
        }
        TextDirection::RightToLeft => {
            p.album.set_advance(second, i32::from(entry.x) + p.album.offset(second).0);

            let dx = i32::from(exit.x) + p.album.offset(first).0;
            p.album.adjust_advance(first, -dx);
            p.album
                .adjust_offset(first, -dx, i32::from(entry.y) - i32::from(exit.y));
            p.album.insert_traits(first, GlyphTraits::ATTACHED);
        }
    }

    // Let the second glyph continue the chain.
    p.locator.jump_to(second);
    Ok(true)
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-4-mark-to-base-attachment-positioning-subtable
#[derive(Clone, Copy, Debug)]
struct MarkRecord {
    class: u16,
    anchor_offset: Offset16,
}

impl FromData for MarkRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        MarkRecord {
            class: s.read(),
            anchor_offset: s.read(),
        }
    }
}

/// Reads the mark's class and anchor from a MarkArray.
fn mark_array_entry(data: &[u8], index: u16) -> Result<(u16, Anchor), ShapeError> {
    let mut s = Stream::new(data);
    let records = s.read_array16::<MarkRecord>().ok_or(ShapeError::TruncatedTable)?;
    let record = records.get(index).ok_or(ShapeError::MalformedSubtable)?;
    let anchor = anchor_at(data, record.anchor_offset)?;
    Ok((record.class, anchor))
}

/// Reads an anchor from an anchor matrix: `row_count` rows of
/// `column_count` anchor offsets each, after a leading count field.
///
/// Returns `Ok(None)` for a NULL anchor offset.
fn matrix_anchor(
    data: &[u8],
    row: u16,
    column_count: u16,
    column: u16,
) -> Result<Option<Anchor>, ShapeError> {
    let row_count: u16 = Stream::read_at(data, 0).ok_or(ShapeError::TruncatedTable)?;
    if row >= row_count || column >= column_count {
        return Err(ShapeError::MalformedSubtable);
    }

    let position = 2 + (usize::from(row) * usize::from(column_count) + usize::from(column)) * 2;
    let offset: Option<Offset16> =
        Stream::read_at(data, position).ok_or(ShapeError::TruncatedTable)?;
    match offset {
        Some(offset) => anchor_at(data, offset).map(Some),
        None => Ok(None),
    }
}

/// The nearest preceding glyph that is not a mark, per the current filter.
fn preceding_non_mark(p: &TextProcessor, index: usize) -> Option<usize> {
    let mut candidate = p.locator.get_before(p.album, index);
    while let Some(i) = candidate {
        if !p.album.traits(i).contains(GlyphTraits::MARK) {
            return Some(i);
        }
        candidate = p.locator.get_before(p.album, i);
    }
    None
}

fn attach_mark(p: &mut TextProcessor, mark_index: usize, mark: Anchor, target: Anchor) {
    let dx = i32::from(target.x) - i32::from(mark.x);
    let dy = i32::from(target.y) - i32::from(mark.y);
    p.album.adjust_offset(mark_index, dx, dy);
    p.album.insert_traits(mark_index, GlyphTraits::ATTACHED);
}

pub(crate) fn apply_mark_to_base(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let mark_index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    if !p.album.traits(mark_index).contains(GlyphTraits::MARK) {
        return Ok(false);
    }

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported mark-to-base format {}", format);
        return Ok(false);
    }

    let mark_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let base_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark_class_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let base_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;

    let mark_coverage_index = match coverage_at(data, mark_coverage_offset)?
        .index(p.album.glyph(mark_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let base_index = match preceding_non_mark(p, mark_index) {
        Some(index) => index,
        None => return Ok(false),
    };
    let base_coverage_index = match coverage_at(data, base_coverage_offset)?
        .index(p.album.glyph(base_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let mark_array = data
        .get(mark_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let (mark_class, mark_anchor) = mark_array_entry(mark_array, mark_coverage_index)?;
    if mark_class >= mark_class_count {
        return Err(ShapeError::MalformedSubtable);
    }

    let base_array = data
        .get(base_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let base_anchor =
        match matrix_anchor(base_array, base_coverage_index, mark_class_count, mark_class)? {
            Some(anchor) => anchor,
            None => return Ok(false),
        };

    attach_mark(p, mark_index, mark_anchor, base_anchor);
    Ok(true)
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-5-mark-to-ligature-attachment-positioning-subtable
pub(crate) fn apply_mark_to_ligature(
    p: &mut TextProcessor,
    data: &[u8],
) -> Result<bool, ShapeError> {
    let mark_index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    if !p.album.traits(mark_index).contains(GlyphTraits::MARK) {
        return Ok(false);
    }

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported mark-to-ligature format {}", format);
        return Ok(false);
    }

    let mark_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let ligature_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark_class_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let ligature_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;

    let mark_coverage_index = match coverage_at(data, mark_coverage_offset)?
        .index(p.album.glyph(mark_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let ligature_index = match preceding_non_mark(p, mark_index) {
        Some(index) => index,
        None => return Ok(false),
    };
    let ligature_coverage_index = match coverage_at(data, ligature_coverage_offset)?
        .index(p.album.glyph(ligature_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let mark_array = data
        .get(mark_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let (mark_class, mark_anchor) = mark_array_entry(mark_array, mark_coverage_index)?;
    if mark_class >= mark_class_count {
        return Err(ShapeError::MalformedSubtable);
    }

    // LigatureArray -> LigatureAttach for the covered ligature.
    let ligature_array = data
        .get(ligature_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let attach_offsets = Stream::new(ligature_array)
        .read_array16::<Offset16>()
        .ok_or(ShapeError::TruncatedTable)?;
    let attach_offset = attach_offsets
        .get(ligature_coverage_index)
        .ok_or(ShapeError::MalformedSubtable)?;
    let attach_data = ligature_array
        .get(attach_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;

    let component_count: u16 = Stream::read_at(attach_data, 0).ok_or(ShapeError::TruncatedTable)?;
    if component_count == 0 {
        return Ok(false);
    }

    // Without per-character association into the ligature, attach to the
    // last component that defines an anchor for the mark's class.
    for component in (0..component_count).rev() {
        if let Some(anchor) =
            matrix_anchor(attach_data, component, mark_class_count, mark_class)?
        {
            attach_mark(p, mark_index, mark_anchor, anchor);
            return Ok(true);
        }
    }

    Ok(false)
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-6-mark-to-mark-attachment-positioning-subtable
pub(crate) fn apply_mark_to_mark(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let mark_index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    if !p.album.traits(mark_index).contains(GlyphTraits::MARK) {
        return Ok(false);
    }

    // The attachment target is the closest preceding mark the filter
    // lets through.
    let target_index = match p.locator.get_before(p.album, mark_index) {
        Some(index) => index,
        None => return Ok(false),
    };
    if !p.album.traits(target_index).contains(GlyphTraits::MARK) {
        return Ok(false);
    }

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported mark-to-mark format {}", format);
        return Ok(false);
    }

    let mark1_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark2_coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark_class_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark1_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let mark2_array_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;

    let mark1_coverage_index = match coverage_at(data, mark1_coverage_offset)?
        .index(p.album.glyph(mark_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };
    let mark2_coverage_index = match coverage_at(data, mark2_coverage_offset)?
        .index(p.album.glyph(target_index))
    {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let mark1_array = data
        .get(mark1_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let (mark_class, mark_anchor) = mark_array_entry(mark1_array, mark1_coverage_index)?;
    if mark_class >= mark_class_count {
        return Err(ShapeError::MalformedSubtable);
    }

    let mark2_array = data
        .get(mark2_array_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let target_anchor =
        match matrix_anchor(mark2_array, mark2_coverage_index, mark_class_count, mark_class)? {
            Some(anchor) => anchor,
            None => return Ok(false),
        };

    attach_mark(p, mark_index, mark_anchor, target_anchor);
    Ok(true)
}

fn class_def_at<'a>(
    data: &'a [u8],
    offset: Offset16,
) -> Result<ClassDefinitionTable<'a>, ShapeError> {
    data.get(offset.to_usize()..)
        .map(ClassDefinitionTable::new)
        .ok_or(ShapeError::TruncatedTable)
}
