//! Builds patterns from the font's own layout headers.

use crate::ggg::LayoutTable;
use crate::pattern::{FeatureKind, Pattern, PatternBuilder};
use crate::{Font, Tag, TextDirection};


/// Resolves a script, language and feature selection against a font's
/// GSUB and GPOS headers and compiles the result into a [`Pattern`].
///
/// Each selected feature becomes its own feature unit, in selection
/// order; grouping features into simultaneous units is script-specific
/// knowledge that belongs to the caller, which can always drive a
/// [`PatternBuilder`] directly.
#[derive(Clone, Copy, Debug)]
pub struct ShapingScheme<'a> {
    font: &'a Font<'a>,
    script_tag: Tag,
    language_tag: Tag,
    direction: TextDirection,
}

impl<'a> ShapingScheme<'a> {
    /// Creates a scheme for one script and language.
    pub fn new(
        font: &'a Font<'a>,
        script_tag: Tag,
        language_tag: Tag,
        direction: TextDirection,
    ) -> ShapingScheme<'a> {
        ShapingScheme {
            font,
            script_tag,
            language_tag,
            direction,
        }
    }

    /// Compiles a pattern for the `(tag, mask)` feature selections.
    ///
    /// Features the font does not define for the resolved language
    /// system are skipped. A language's required feature is always
    /// applied first, with an empty mask.
    pub fn build_pattern(&self, features: &[(Tag, u16)]) -> Pattern<'a> {
        let mut builder = PatternBuilder::new();
        builder.set_font(self.font);
        builder.set_script(self.script_tag, self.direction);
        builder.set_language(self.language_tag);

        if let Some(gsub) = self.font.gsub {
            self.add_features(&mut builder, FeatureKind::Substitution, &gsub.table, features);
        }

        if let Some(gpos) = self.font.gpos {
            self.add_features(&mut builder, FeatureKind::Positioning, &gpos.table, features);
        }

        builder.build()
    }

    fn add_features(
        &self,
        builder: &mut PatternBuilder<'a>,
        kind: FeatureKind,
        table: &LayoutTable<'a>,
        features: &[(Tag, u16)],
    ) {
        // Fall back to the default script, then to the default language
        // system, the way every OpenType consumer resolves them.
        let script = match table
            .scripts
            .get(self.script_tag)
            .or_else(|| table.scripts.get(Tag::from_bytes(b"DFLT")))
        {
            Some(script) => script,
            None => return,
        };

        let lang_sys = match script
            .language_by_tag(self.language_tag)
            .or_else(|| script.default_language())
        {
            Some(lang_sys) => lang_sys,
            None => return,
        };

        builder.begin_features(kind);

        if let Some(required) = lang_sys.required_feature_index {
            if let Some(feature) = table.features.get(required) {
                builder.add_feature(feature.tag, 0);
                for index in feature.lookup_indices {
                    builder.add_lookup(index);
                }
                builder.make_feature_unit();
            }
        }

        for &(tag, mask) in features {
            let found = lang_sys.feature_indices.into_iter().find_map(|feature_index| {
                let feature = table.features.get(feature_index)?;
                if feature.tag == tag {
                    Some(feature)
                } else {
                    None
                }
            });

            if let Some(feature) = found {
                builder.add_feature(tag, mask);
                for index in feature.lookup_indices {
                    builder.add_lookup(index);
                }
                builder.make_feature_unit();
            }
        }

        builder.end_features();
    }
}
