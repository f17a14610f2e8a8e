use pretty_assertions::assert_eq;

use ot_shaper::{FeatureKind, Font, PatternBuilder, Tag, TextDirection};

#[test]
fn no_features() {
    let font = Font::from_table_slices(None, None, None);

    let mut builder = PatternBuilder::new();
    builder.set_font(&font);
    builder.set_script(Tag::from_bytes(b"arab"), TextDirection::RightToLeft);
    builder.set_language(Tag::from_bytes(b"URDU"));
    let pattern = builder.build();

    assert_eq!(pattern.script_tag, Tag::from_bytes(b"arab"));
    assert_eq!(pattern.language_tag, Tag::from_bytes(b"URDU"));
    assert_eq!(pattern.default_direction, TextDirection::RightToLeft);
    assert!(pattern.feature_tags.is_empty());
    assert!(pattern.units().is_empty());
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (0, 0));
}

#[test]
fn distinct_substitution_features() {
    let mut builder = PatternBuilder::new();
    builder.begin_features(FeatureKind::Substitution);

    builder.add_feature(Tag::from_bytes(b"ccmp"), 0x01);
    builder.make_feature_unit();

    builder.add_feature(Tag::from_bytes(b"liga"), 0x02);
    builder.make_feature_unit();

    builder.add_feature(Tag::from_bytes(b"clig"), 0x04);
    builder.make_feature_unit();

    builder.end_features();
    let pattern = builder.build();

    assert_eq!(
        pattern.feature_tags,
        vec![
            Tag::from_bytes(b"ccmp"),
            Tag::from_bytes(b"liga"),
            Tag::from_bytes(b"clig"),
        ]
    );
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (3, 0));

    let ranges: Vec<_> = pattern.units().iter().map(|u| u.covered_range.clone()).collect();
    assert_eq!(ranges, vec![0..1, 1..2, 2..3]);

    let masks: Vec<_> = pattern.units().iter().map(|u| u.feature_mask).collect();
    assert_eq!(masks, vec![0x01, 0x02, 0x04]);
}

#[test]
fn distinct_positioning_features() {
    let mut builder = PatternBuilder::new();
    builder.begin_features(FeatureKind::Positioning);

    builder.add_feature(Tag::from_bytes(b"dist"), 0x01);
    builder.make_feature_unit();

    builder.add_feature(Tag::from_bytes(b"kern"), 0x02);
    builder.make_feature_unit();

    builder.add_feature(Tag::from_bytes(b"mark"), 0x04);
    builder.make_feature_unit();

    builder.end_features();
    let pattern = builder.build();

    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (0, 3));

    let ranges: Vec<_> = pattern.units().iter().map(|u| u.covered_range.clone()).collect();
    assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
}

#[test]
fn simultaneous_features() {
    let mut builder = PatternBuilder::new();

    builder.begin_features(FeatureKind::Substitution);
    builder.add_feature(Tag::from_bytes(b"ccmp"), 0x01);
    builder.add_feature(Tag::from_bytes(b"liga"), 0x02);
    builder.add_feature(Tag::from_bytes(b"clig"), 0x04);
    builder.make_feature_unit();
    builder.end_features();

    builder.begin_features(FeatureKind::Positioning);
    builder.add_feature(Tag::from_bytes(b"dist"), 0x01);
    builder.add_feature(Tag::from_bytes(b"kern"), 0x02);
    builder.add_feature(Tag::from_bytes(b"mark"), 0x04);
    builder.make_feature_unit();
    builder.end_features();

    let pattern = builder.build();

    assert_eq!(
        pattern.feature_tags,
        vec![
            Tag::from_bytes(b"ccmp"),
            Tag::from_bytes(b"liga"),
            Tag::from_bytes(b"clig"),
            Tag::from_bytes(b"dist"),
            Tag::from_bytes(b"kern"),
            Tag::from_bytes(b"mark"),
        ]
    );
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (1, 1));

    assert_eq!(pattern.units()[0].covered_range, 0..3);
    assert_eq!(pattern.units()[0].feature_mask, 0x07);
    assert_eq!(pattern.units()[1].covered_range, 3..6);
    assert_eq!(pattern.units()[1].feature_mask, 0x07);
}

#[test]
fn lookup_index_sorting() {
    let mut builder = PatternBuilder::new();

    builder.begin_features(FeatureKind::Substitution);
    builder.add_feature(Tag::from_bytes(b"ccmp"), 0);
    for &index in &[4, 0, 2, 3, 1] {
        builder.add_lookup(index);
    }
    builder.make_feature_unit();
    builder.end_features();

    builder.begin_features(FeatureKind::Positioning);
    builder.add_feature(Tag::from_bytes(b"dist"), 0);
    for &index in &[7, 5, 6, 4, 8] {
        builder.add_lookup(index);
    }
    builder.make_feature_unit();
    builder.end_features();

    let pattern = builder.build();

    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (1, 1));
    assert_eq!(pattern.units()[0].lookup_indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(pattern.units()[1].lookup_indices, vec![4, 5, 6, 7, 8]);
}

#[test]
fn lookup_index_sorting_with_collision() {
    let mut builder = PatternBuilder::new();

    builder.begin_features(FeatureKind::Substitution);
    builder.add_feature(Tag::from_bytes(b"ccmp"), 0);
    for &index in &[7, 3, 5, 1, 0] {
        builder.add_lookup(index);
    }
    builder.add_feature(Tag::from_bytes(b"liga"), 0);
    for &index in &[2, 1, 4, 7, 6] {
        builder.add_lookup(index);
    }
    builder.make_feature_unit();
    builder.end_features();

    let pattern = builder.build();

    assert_eq!(
        pattern.feature_tags,
        vec![Tag::from_bytes(b"ccmp"), Tag::from_bytes(b"liga")]
    );
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (1, 0));
    assert_eq!(pattern.units()[0].covered_range, 0..2);
    assert_eq!(pattern.units()[0].lookup_indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn rebuild_produces_equal_pattern() {
    let font = Font::from_table_slices(None, None, None);

    let build = || {
        let mut builder = PatternBuilder::new();
        builder.set_font(&font);
        builder.set_script(Tag::from_bytes(b"latn"), TextDirection::LeftToRight);
        builder.begin_features(FeatureKind::Substitution);
        builder.add_feature(Tag::from_bytes(b"liga"), 0x01);
        builder.add_lookup(3);
        builder.add_lookup(1);
        builder.make_feature_unit();
        builder.end_features();
        builder.build()
    };

    assert_eq!(build(), build());
}
