//! GSUB subtable appliers.
//!
//! Every applier operates at the locator's current index and reports
//! whether the subtable matched there. Match decisions are made before
//! the first album mutation, so a failed application never leaves the
//! album half-rewritten.

use alloc::vec::Vec;

use crate::album::GlyphTraits;
use crate::ggg::coverage_at;
use crate::parser::{Offset, Offset16, Stream};
use crate::processor::TextProcessor;
use crate::{GlyphId, ShapeError};


fn write_substitute(p: &mut TextProcessor, index: usize, glyph: GlyphId) {
    let traits = p.glyph_traits(glyph);
    p.album.set_glyph(index, glyph);
    p.album.set_traits(index, traits);
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-1-single-substitution-subtable
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
            let delta: i16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let coverage = coverage_at(data, coverage_offset)?;
            if coverage.index(glyph).is_none() {
                return Ok(false);
            }

            // The delta is added modulo 65536.
            let substitute = GlyphId(glyph.0.wrapping_add(delta as u16));
            write_substitute(p, index, substitute);
            Ok(true)
        }
        2 => {
            let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
            let substitutes = s.read_array16::<GlyphId>().ok_or(ShapeError::TruncatedTable)?;
            let coverage = coverage_at(data, coverage_offset)?;
            let coverage_index = match coverage.index(glyph) {
                Some(coverage_index) => coverage_index,
                None => return Ok(false),
            };

            let substitute = substitutes
                .get(coverage_index)
                .ok_or(ShapeError::MalformedSubtable)?;
            write_substitute(p, index, substitute);
            Ok(true)
        }
        _ => {
            warn!("unsupported single substitution format {}", format);
            Ok(false)
        }
    }
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-2-multiple-substitution-subtable
pub(crate) fn apply_multiple(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let glyph = p.album.glyph(index);

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported multiple substitution format {}", format);
        return Ok(false);
    }

    let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let sequence_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let coverage = coverage_at(data, coverage_offset)?;
    let coverage_index = match coverage.index(glyph) {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let sequence_offset = sequence_offsets
        .get(coverage_index)
        .ok_or(ShapeError::MalformedSubtable)?;
    let sequence_data = data
        .get(sequence_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let substitutes = Stream::new(sequence_data)
        .read_array16::<GlyphId>()
        .ok_or(ShapeError::TruncatedTable)?;

    // An empty sequence would delete the glyph, which the format forbids.
    let count = substitutes.len();
    if count == 0 {
        return Ok(false);
    }

    write_substitute(p, index, substitutes.get(0).ok_or(ShapeError::TruncatedTable)?);

    if count > 1 {
        p.locator.reserve_glyphs(p.album, usize::from(count) - 1);
        for k in 1..count {
            if let Some(substitute) = substitutes.get(k) {
                write_substitute(p, index + usize::from(k), substitute);
            }
        }
    }

    // The produced glyphs are not re-examined by this lookup.
    p.locator.jump_to(index + usize::from(count));
    Ok(true)
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-3-alternate-substitution-subtable
pub(crate) fn apply_alternate(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let glyph = p.album.glyph(index);

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported alternate substitution format {}", format);
        return Ok(false);
    }

    let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let set_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let coverage = coverage_at(data, coverage_offset)?;
    let coverage_index = match coverage.index(glyph) {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let set_offset = set_offsets
        .get(coverage_index)
        .ok_or(ShapeError::MalformedSubtable)?;
    let set_data = data
        .get(set_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let alternates = Stream::new(set_data)
        .read_array16::<GlyphId>()
        .ok_or(ShapeError::TruncatedTable)?;

    // Alternate selection is a concern of the layer above; the engine
    // takes the first one.
    let substitute = alternates.get(0).ok_or(ShapeError::MalformedSubtable)?;
    write_substitute(p, index, substitute);
    Ok(true)
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-4-ligature-substitution-subtable
pub(crate) fn apply_ligature(p: &mut TextProcessor, data: &[u8]) -> Result<bool, ShapeError> {
    let index = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let glyph = p.album.glyph(index);

    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported ligature substitution format {}", format);
        return Ok(false);
    }

    let coverage_offset: Offset16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let set_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let coverage = coverage_at(data, coverage_offset)?;
    let coverage_index = match coverage.index(glyph) {
        Some(coverage_index) => coverage_index,
        None => return Ok(false),
    };

    let set_offset = set_offsets
        .get(coverage_index)
        .ok_or(ShapeError::MalformedSubtable)?;
    let set_data = data
        .get(set_offset.to_usize()..)
        .ok_or(ShapeError::TruncatedTable)?;
    let ligature_offsets = Stream::new(set_data)
        .read_array16::<Offset16>()
        .ok_or(ShapeError::TruncatedTable)?;

    // Ligatures are ordered by preference; the first full match wins.
    for ligature_offset in ligature_offsets {
        let ligature_data = set_data
            .get(ligature_offset.to_usize()..)
            .ok_or(ShapeError::TruncatedTable)?;
        let mut s = Stream::new(ligature_data);
        let ligature: GlyphId = s.read().ok_or(ShapeError::TruncatedTable)?;
        let component_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
        if component_count == 0 {
            continue;
        }

        // The first component is the covered glyph itself.
        let components = s
            .read_array16_with_count::<GlyphId>(component_count - 1)
            .ok_or(ShapeError::TruncatedTable)?;

        let mut parts = Vec::with_capacity(usize::from(component_count) - 1);
        let mut previous = index;
        let mut matched = true;
        for component in components {
            match p.locator.get_after(p.album, previous) {
                Some(next) if p.album.glyph(next) == component => {
                    parts.push(next);
                    previous = next;
                }
                _ => {
                    matched = false;
                    break;
                }
            }
        }

        if !matched {
            continue;
        }

        let traits = p.glyph_traits(ligature) | GlyphTraits::LIGATURE;
        p.album.set_glyph(index, ligature);
        p.album.set_traits(index, traits);

        // Consumed components keep their slots for association
        // bookkeeping; the removed trait hides them from every cursor.
        let association = p.album.association(index);
        for part in parts {
            p.album.insert_traits(part, GlyphTraits::REMOVED);
            p.album.set_association(part, association);
        }

        return Ok(true);
    }

    Ok(false)
}
