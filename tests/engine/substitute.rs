use ot_shaper::{lookup_flags, GlyphTraits};

use crate::*;

#[test]
fn single_delta() {
    let mut album = album_of(&[10, 11, 12]);
    let subtable = single_subst_delta(&[11], 5);

    apply_gsub(&[(1, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![10, 16, 12]);
}

#[test]
fn single_delta_wraps() {
    let mut album = album_of(&[0xFFFF]);
    let subtable = single_subst_delta(&[0xFFFF], 1);

    apply_gsub(&[(1, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![0]);
}

#[test]
fn single_from_list() {
    // Format 2: explicit substitute per covered glyph.
    let mut subtable = Vec::new();
    push16(&mut subtable, 2); // format
    push16(&mut subtable, 10); // coverageOffset
    push16(&mut subtable, 2); // glyphCount
    push16(&mut subtable, 20); // substitute [0]
    push16(&mut subtable, 21); // substitute [1]
    subtable.extend_from_slice(&coverage(&[5, 6]));

    let mut album = album_of(&[5, 6, 7]);
    apply_gsub(&[(1, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![20, 21, 7]);
}

#[test]
fn multiple_inserts_slots() {
    let mut album = album_of(&[1, 2, 3]);
    let subtable = multiple_subst(&[2], &[&[21, 22, 23]]);

    apply_gsub(&[(2, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1, 21, 22, 23, 3]);
    // Inserted slots belong to the replaced glyph's cluster.
    assert_eq!(album.association(2), 1);
    assert_eq!(album.association(3), 1);
}

#[test]
fn multiple_with_empty_sequence_is_not_applied() {
    let mut album = album_of(&[2]);
    let subtable = multiple_subst(&[2], &[&[]]);

    apply_gsub(&[(2, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![2]);
}

#[test]
fn ligature_consumes_components() {
    // f + i -> fi, with a mark sitting between the components.
    let mut album = album_of(&[30, 90, 31]);
    album.set_traits(1, GlyphTraits::MARK);
    let subtable = ligature_subst(30, &[(40, &[31])]);

    apply_gsub(
        &[(4, lookup_flags::IGNORE_MARKS, vec![subtable])],
        &mut album,
        &[0],
    );

    assert_eq!(glyphs_of(&album), vec![40, 90, 31]);
    assert!(album.traits(0).contains(GlyphTraits::LIGATURE));
    assert!(album.traits(2).contains(GlyphTraits::REMOVED));
    // The mark survives untouched.
    assert_eq!(album.traits(1), GlyphTraits::MARK);
}

#[test]
fn ligature_prefers_first_full_match() {
    // Both f+f+i and f+i are defined; the longer one is listed first.
    let mut album = album_of(&[30, 30, 31]);
    let subtable = ligature_subst(30, &[(41, &[30, 31]), (40, &[31])]);

    apply_gsub(&[(4, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![41, 30, 31]);
    assert!(album.traits(1).contains(GlyphTraits::REMOVED));
    assert!(album.traits(2).contains(GlyphTraits::REMOVED));
}

#[test]
fn removed_slots_invisible_to_later_lookups() {
    // The ligature hides its components; a following delta lookup in the
    // same unit pass must not see them.
    let mut album = album_of(&[30, 31, 32]);
    let ligature = ligature_subst(30, &[(40, &[31])]);
    let delta = single_subst_delta(&[31, 32], 100);

    apply_gsub(
        &[(4, 0, vec![ligature]), (1, 0, vec![delta])],
        &mut album,
        &[0, 1],
    );

    // Glyph 31 is removed, so only 32 was shifted.
    assert_eq!(glyphs_of(&album), vec![40, 31, 132]);
    assert!(album.traits(1).contains(GlyphTraits::REMOVED));
}

#[test]
fn alternate_takes_first() {
    let mut subtable = Vec::new();
    push16(&mut subtable, 1); // format
    push16(&mut subtable, 8); // coverageOffset
    push16(&mut subtable, 1); // alternateSetCount
    push16(&mut subtable, 14); // alternateSetOffset (past the coverage)
    subtable.extend_from_slice(&coverage(&[7]));
    push16(&mut subtable, 2); // glyphCount
    push16(&mut subtable, 70); // alternate [0]
    push16(&mut subtable, 71); // alternate [1]

    let mut album = album_of(&[7]);
    apply_gsub(&[(3, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![70]);
}

#[test]
fn extension_wraps_substitution() {
    let mut album = album_of(&[10]);
    let inner = single_subst_delta(&[10], 3);
    let subtable = extension(1, &inner);

    apply_gsub(&[(7, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![13]);
}

#[test]
fn truncated_subtable_is_skipped() {
    // The subtable claims a coverage offset past its end.
    let mut subtable = Vec::new();
    push16(&mut subtable, 1); // format
    push16(&mut subtable, 100); // coverageOffset: out of bounds
    push16(&mut subtable, 1); // delta

    let mut album = album_of(&[10]);
    apply_gsub(&[(1, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![10]);
}
