use ot_shaper::{lookup_flags, GlyphTraits};

use crate::*;

// Album [A, M, B, C] with M a mark; chain rule: backtrack [A],
// input [B, C], ignoring marks; the nested lookup rewrites B.
#[test]
fn chain_matches_across_ignored_mark() {
    let mut album = album_of(&[1, 9, 3, 4]);
    album.set_traits(1, GlyphTraits::MARK);

    let chain = chain_context3(
        &[coverage(&[1])],
        &[coverage(&[3]), coverage(&[4])],
        &[],
        &[(0, 1)],
    );
    let rewrite = single_subst_delta(&[3], 10);

    apply_gsub(
        &[
            (6, lookup_flags::IGNORE_MARKS, vec![chain]),
            (1, 0, vec![rewrite]),
        ],
        &mut album,
        &[0],
    );

    assert_eq!(glyphs_of(&album), vec![1, 9, 13, 4]);
}

#[test]
fn chain_requires_backtrack() {
    // Same rule, but nothing precedes the input sequence.
    let mut album = album_of(&[3, 4]);

    let chain = chain_context3(
        &[coverage(&[1])],
        &[coverage(&[3]), coverage(&[4])],
        &[],
        &[(0, 1)],
    );
    let rewrite = single_subst_delta(&[3], 10);

    apply_gsub(&[(6, 0, vec![chain]), (1, 0, vec![rewrite])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![3, 4]);
}

#[test]
fn chain_requires_lookahead() {
    let mut album = album_of(&[1, 3]);

    let chain = chain_context3(
        &[],
        &[coverage(&[3])],
        &[coverage(&[5])],
        &[(0, 1)],
    );
    let rewrite = single_subst_delta(&[3], 10);

    apply_gsub(&[(6, 0, vec![chain]), (1, 0, vec![rewrite])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1, 3]);
}

#[test]
fn chain_with_empty_input_is_not_matched() {
    let mut album = album_of(&[1, 3]);

    let chain = chain_context3(&[], &[], &[], &[(0, 1)]);
    let rewrite = single_subst_delta(&[1, 3], 10);

    apply_gsub(&[(6, 0, vec![chain]), (1, 0, vec![rewrite])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1, 3]);
}

#[test]
fn records_apply_at_their_sequence_index() {
    // Two records: rewrite input glyph 0 and input glyph 2.
    let mut album = album_of(&[3, 4, 5]);

    let chain = chain_context3(
        &[],
        &[coverage(&[3]), coverage(&[4]), coverage(&[5])],
        &[],
        &[(0, 1), (2, 1)],
    );
    let rewrite = single_subst_delta(&[3, 5], 10);

    apply_gsub(&[(6, 0, vec![chain]), (1, 0, vec![rewrite])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![13, 4, 15]);
}

#[test]
fn nested_insertion_keeps_outer_cursor_valid() {
    // The nested lookup is a multiple substitution: the album grows
    // mid-chain and the outer traversal must keep going past it.
    let mut album = album_of(&[1, 2, 7]);

    let chain = chain_context3(&[coverage(&[1])], &[coverage(&[2])], &[], &[(0, 1)]);
    let split = multiple_subst(&[2], &[&[21, 22]]);
    let tail = single_subst_delta(&[7], 10);

    apply_gsub(
        &[(6, 0, vec![chain]), (2, 0, vec![split]), (1, 0, vec![tail])],
        &mut album,
        &[0, 2],
    );

    // The split happened and the glyph after the span was still visited
    // by the later lookup.
    assert_eq!(glyphs_of(&album), vec![1, 21, 22, 17]);
}

#[test]
fn nested_ligature_hides_consumed_glyph_from_outer_pass() {
    // The nested ligature consumes the second input glyph; the outer
    // traversal resumes inside the span and must skip the removed slot,
    // so the later delta lookup never sees it.
    let mut album = album_of(&[1, 2, 3]);

    let chain = chain_context3(&[], &[coverage(&[2]), coverage(&[3])], &[], &[(0, 1)]);
    let ligature = ligature_subst(2, &[(40, &[3])]);
    let tail = single_subst_delta(&[3], 10);

    apply_gsub(
        &[(6, 0, vec![chain]), (4, 0, vec![ligature]), (1, 0, vec![tail])],
        &mut album,
        &[0, 2],
    );

    assert_eq!(glyphs_of(&album), vec![1, 40, 3]);
    assert!(album.traits(2).contains(GlyphTraits::REMOVED));
}

#[test]
fn plain_context_format3() {
    // GSUB type 5, format 3: input-only matching.
    let mut album = album_of(&[3, 4]);

    let mut subtable = Vec::new();
    push16(&mut subtable, 3); // format
    push16(&mut subtable, 2); // glyphCount
    push16(&mut subtable, 1); // seqLookupCount
    push16(&mut subtable, 14); // coverageOffset [0]
    push16(&mut subtable, 20); // coverageOffset [1]
    push16(&mut subtable, 1); // sequenceIndex
    push16(&mut subtable, 1); // lookupListIndex
    subtable.extend_from_slice(&coverage(&[3]));
    subtable.extend_from_slice(&coverage(&[4]));

    let rewrite = single_subst_delta(&[4], 10);

    apply_gsub(
        &[(5, 0, vec![subtable]), (1, 0, vec![rewrite])],
        &mut album,
        &[0],
    );

    assert_eq!(glyphs_of(&album), vec![3, 14]);
}

#[test]
fn self_referential_chain_hits_depth_limit() {
    // Lookup 0 invokes itself through its context record. The recursion
    // guard must abort it without corrupting the album.
    let mut album = album_of(&[1, 2]);

    let chain = chain_context3(&[], &[coverage(&[1]), coverage(&[2])], &[], &[(0, 0)]);

    apply_gsub(&[(6, 0, vec![chain])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1, 2]);
}

#[test]
fn extension_to_extension_is_rejected() {
    let inner = single_subst_delta(&[1], 10);
    let nested = extension(1, &inner);
    let outer = extension(7, &nested);

    let mut album = album_of(&[1]);
    apply_gsub(&[(7, 0, vec![outer])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1]);
}

#[test]
fn unsupported_chain_format_is_skipped() {
    let mut subtable = Vec::new();
    push16(&mut subtable, 1); // format 1: not supported
    push16(&mut subtable, 0);

    let mut album = album_of(&[1]);
    apply_gsub(&[(6, 0, vec![subtable])], &mut album, &[0]);

    assert_eq!(glyphs_of(&album), vec![1]);
}
