//! Contextual lookups: extension indirection, (chained) context
//! matching and nested lookup application.

use crate::ggg::coverage_at;
use crate::parser::{FromData, LazyArray16, Offset, Offset16, Offset32, SafeStream, Stream};
use crate::processor::TextProcessor;
use crate::ShapeError;


// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#sequence-lookup-record
#[derive(Clone, Copy, Debug)]
struct SequenceLookupRecord {
    sequence_index: u16,
    lookup_list_index: u16,
}

impl FromData for SequenceLookupRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        SequenceLookupRecord {
            sequence_index: s.read(),
            lookup_list_index: s.read(),
        }
    }
}


// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#7-extension-substitution
//
// The same layout backs GPOS extension positioning (type 9).
pub(crate) fn apply_extension<'a, 'f>(
    p: &mut TextProcessor<'a, 'f>,
    data: &'f [u8],
) -> Result<bool, ShapeError> {
    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 1 {
        warn!("unsupported extension format {}", format);
        return Ok(false);
    }

    let lookup_type: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let offset: Offset32 = s.read().ok_or(ShapeError::TruncatedTable)?;

    // An extension must not point at another extension.
    if lookup_type == p.extension_lookup_type() {
        return Err(ShapeError::MalformedSubtable);
    }

    let inner = data.get(offset.to_usize()..).ok_or(ShapeError::TruncatedTable)?;
    p.apply_subtable(lookup_type, inner)
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#seqctxt3
pub(crate) fn apply_context<'a, 'f>(
    p: &mut TextProcessor<'a, 'f>,
    data: &'f [u8],
) -> Result<bool, ShapeError> {
    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 3 {
        // Formats 1 and 2 key their rules off per-glyph rule sets and
        // are not handled here.
        warn!("unsupported context format {}", format);
        return Ok(false);
    }

    // Unlike the chained variant, both counts precede both arrays here.
    let glyph_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let record_count: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    let input_offsets = s
        .read_array16_with_count::<Offset16>(glyph_count)
        .ok_or(ShapeError::TruncatedTable)?;
    let records = s
        .read_array16_with_count::<SequenceLookupRecord>(record_count)
        .ok_or(ShapeError::TruncatedTable)?;

    apply_chain(
        p,
        data,
        LazyArray16::default(),
        input_offsets,
        LazyArray16::default(),
        records,
    )
}

// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#chseqctxt3
pub(crate) fn apply_chain_context<'a, 'f>(
    p: &mut TextProcessor<'a, 'f>,
    data: &'f [u8],
) -> Result<bool, ShapeError> {
    let mut s = Stream::new(data);
    let format: u16 = s.read().ok_or(ShapeError::TruncatedTable)?;
    if format != 3 {
        warn!("unsupported chained context format {}", format);
        return Ok(false);
    }

    let backtrack_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let input_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let lookahead_offsets = s.read_array16::<Offset16>().ok_or(ShapeError::TruncatedTable)?;
    let records = s
        .read_array16::<SequenceLookupRecord>()
        .ok_or(ShapeError::TruncatedTable)?;

    apply_chain(p, data, backtrack_offsets, input_offsets, lookahead_offsets, records)
}

/// Matches backtrack/input/lookahead coverage sequences around the
/// current glyph and, on a match, applies the nested lookups.
fn apply_chain<'a, 'f>(
    p: &mut TextProcessor<'a, 'f>,
    data: &'f [u8],
    backtrack: LazyArray16<'f, Offset16>,
    input: LazyArray16<'f, Offset16>,
    lookahead: LazyArray16<'f, Offset16>,
    records: LazyArray16<'f, SequenceLookupRecord>,
) -> Result<bool, ShapeError> {
    let start = match p.locator.index() {
        Some(index) => index,
        None => return Ok(false),
    };

    // At least one input glyph is required.
    if input.len() == 0 {
        return Ok(false);
    }

    let first = coverage_at(data, input.get(0).ok_or(ShapeError::TruncatedTable)?)?;
    if first.index(p.album.glyph(start)).is_none() {
        return Ok(false);
    }

    // Match the remaining input glyphs.
    let mut last_input = start;
    for k in 1..input.len() {
        let next = match p.locator.get_after(p.album, last_input) {
            Some(next) => next,
            None => return Ok(false),
        };
        let coverage = coverage_at(data, input.get(k).ok_or(ShapeError::TruncatedTable)?)?;
        if coverage.index(p.album.glyph(next)).is_none() {
            return Ok(false);
        }
        last_input = next;
    }

    // Backtrack coverages are stored in reverse text order: entry k
    // matches the k-th glyph before the input sequence.
    let mut before = start;
    for k in 0..backtrack.len() {
        let previous = match p.locator.get_before(p.album, before) {
            Some(previous) => previous,
            None => return Ok(false),
        };
        let coverage = coverage_at(data, backtrack.get(k).ok_or(ShapeError::TruncatedTable)?)?;
        if coverage.index(p.album.glyph(previous)).is_none() {
            return Ok(false);
        }
        before = previous;
    }

    let mut after = last_input;
    for k in 0..lookahead.len() {
        let next = match p.locator.get_after(p.album, after) {
            Some(next) => next,
            None => return Ok(false),
        };
        let coverage = coverage_at(data, lookahead.get(k).ok_or(ShapeError::TruncatedTable)?)?;
        if coverage.index(p.album.glyph(next)).is_none() {
            return Ok(false);
        }
        after = next;
    }

    apply_sequence_records(p, records, start, last_input - start + 1)?;
    Ok(true)
}

/// Applies nested lookups at designated positions of the matched input
/// span `[start, start + count)`.
fn apply_sequence_records(
    p: &mut TextProcessor,
    records: LazyArray16<SequenceLookupRecord>,
    start: usize,
    count: usize,
) -> Result<(), ShapeError> {
    let outer = p.locator;
    let len_before = p.album.len();

    let mut result = Ok(());
    for record in records {
        // Confine the locator to the input span and step to the
        // record's designated glyph.
        p.locator.reset(p.album, start, count);
        if !p.locator.skip(p.album, usize::from(record.sequence_index)) {
            continue;
        }
        if !p.locator.move_next(p.album) {
            continue;
        }

        if let Err(e) = p.apply_lookup(record.lookup_list_index) {
            result = Err(e);
            break;
        }
    }

    // Hand the nested cursor's position back to the outer one, so the
    // outer traversal resumes past whatever the nested lookups consumed
    // or inserted. Without this the outer loop would revisit or skip
    // glyphs after an insertion.
    let mut outer = outer;
    let added = p.album.len() - len_before;
    if added > 0 {
        outer.resync(p.album, added);
    }
    outer.take_state(&p.locator);
    p.locator = outer;

    result
}
