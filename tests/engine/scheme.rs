use ot_shaper::{Font, ShapingScheme, Tag, TextDirection};

// One script ('arab') with a default language system referencing one
// feature ('liga' with lookups 1 and 0) and an empty lookup list.
const GSUB: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, // version: 1.0
    0x00, 0x0A, // scriptListOffset: 10
    0x00, 0x1E, // featureListOffset: 30
    0x00, 0x2E, // lookupListOffset: 46
    // ScriptList
    0x00, 0x01, // scriptCount: 1
    0x61, 0x72, 0x61, 0x62, // 'arab'
    0x00, 0x08, // scriptOffset: 8
    // Script
    0x00, 0x04, // defaultLangSysOffset: 4
    0x00, 0x00, // langSysCount: 0
    // LangSys
    0x00, 0x00, // lookupOrder
    0xFF, 0xFF, // requiredFeatureIndex: none
    0x00, 0x01, // featureIndexCount: 1
    0x00, 0x00, // featureIndex [0]: 0
    // FeatureList
    0x00, 0x01, // featureCount: 1
    0x6C, 0x69, 0x67, 0x61, // 'liga'
    0x00, 0x08, // featureOffset: 8
    // Feature
    0x00, 0x00, // featureParams
    0x00, 0x02, // lookupIndexCount: 2
    0x00, 0x01, // lookupListIndex [0]: 1
    0x00, 0x00, // lookupListIndex [1]: 0
    // LookupList
    0x00, 0x00, // lookupCount: 0
];

#[test]
fn builds_unit_from_font_headers() {
    let font = Font::from_table_slices(Some(GSUB), None, None);
    let scheme = ShapingScheme::new(
        &font,
        Tag::from_bytes(b"arab"),
        Tag::from_bytes(b"URDU"),
        TextDirection::RightToLeft,
    );

    let pattern = scheme.build_pattern(&[(Tag::from_bytes(b"liga"), 0x02)]);

    assert_eq!(pattern.script_tag, Tag::from_bytes(b"arab"));
    assert_eq!(pattern.default_direction, TextDirection::RightToLeft);
    assert_eq!(pattern.feature_tags, vec![Tag::from_bytes(b"liga")]);
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (1, 0));
    assert_eq!(pattern.units()[0].feature_mask, 0x02);
    // Sorted, although the font lists them as [1, 0].
    assert_eq!(pattern.units()[0].lookup_indices, vec![0, 1]);
}

#[test]
fn unknown_features_are_skipped() {
    let font = Font::from_table_slices(Some(GSUB), None, None);
    let scheme = ShapingScheme::new(
        &font,
        Tag::from_bytes(b"arab"),
        Tag::from_bytes(b"dflt"),
        TextDirection::RightToLeft,
    );

    let pattern = scheme.build_pattern(&[(Tag::from_bytes(b"smcp"), 0x01)]);

    assert!(pattern.units().is_empty());
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (0, 0));
}

#[test]
fn missing_script_yields_no_units() {
    let font = Font::from_table_slices(Some(GSUB), None, None);
    let scheme = ShapingScheme::new(
        &font,
        Tag::from_bytes(b"grek"),
        Tag::from_bytes(b"dflt"),
        TextDirection::LeftToRight,
    );

    let pattern = scheme.build_pattern(&[(Tag::from_bytes(b"liga"), 0x01)]);

    assert!(pattern.units().is_empty());
}

#[test]
fn required_feature_is_applied_first() {
    let mut gsub = GSUB.to_vec();
    // Patch the required feature index from none to 0.
    gsub[24] = 0x00;
    gsub[25] = 0x00;

    let font = Font::from_table_slices(Some(&gsub[..]), None, None);
    let scheme = ShapingScheme::new(
        &font,
        Tag::from_bytes(b"arab"),
        Tag::from_bytes(b"dflt"),
        TextDirection::RightToLeft,
    );

    let pattern = scheme.build_pattern(&[]);

    assert_eq!(pattern.feature_tags, vec![Tag::from_bytes(b"liga")]);
    assert_eq!((pattern.gsub_count(), pattern.gpos_count()), (1, 0));
    assert_eq!(pattern.units()[0].feature_mask, 0);
    assert_eq!(pattern.units()[0].lookup_indices, vec![0, 1]);
}
