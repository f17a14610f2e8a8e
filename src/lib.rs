/*!
A safe OpenType lookup application engine.

`ot-shaper` implements the core of a complex-text shaper: given a run of
glyphs (an [`Album`]) and a compiled feature selection (a [`Pattern`]),
it applies the font's GSUB and GPOS lookups — substitutions, ligatures,
pair and mark positioning, contextual and chained-contextual rules —
while honoring per-lookup glyph filtering and per-position feature masks.

## Features

- Zero unsafe.
- Zero required dependencies. Logging is enabled by default.
- `no_std` compatible (allocation is still required).
- Parses untrusted font tables with bounds-checked, big-endian reads only;
  malformed data is skipped, never trusted.

## What this crate is not

It is not a full shaper: character-to-glyph mapping, Unicode analysis
(joining, reordering, bidi) and font file loading live above this layer.
The caller locates the raw `GSUB`, `GPOS` and `GDEF` tables, fills an
album with mapped glyphs and drives a [`TextProcessor`].

## Example

```
use ot_shaper::{Album, Font, GlyphId, PatternBuilder, TextProcessor};

let font = Font::from_table_slices(None, None, None);

let mut builder = PatternBuilder::new();
builder.set_font(&font);
let pattern = builder.build();

let mut album = Album::new();
album.add_glyph(GlyphId(36), 0);

let mut processor = TextProcessor::new(&pattern, &mut album);
processor.discover_glyphs();
processor.shape();
```

## Safety

- The library must not panic on any font data. Any panic is considered
  a critical bug and should be reported.
- The library forbids the unsafe code.
*/

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]

extern crate alloc;

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

use core::fmt;

#[cfg(feature = "logging")]
macro_rules! warn {
    ($($arg:tt)+) => (
        log::log!(log::Level::Warn, $($arg)+);
    )
}

#[cfg(not(feature = "logging"))]
macro_rules! warn {
    ($($arg:tt)+) => {{}} // do nothing
}

mod album;
mod context;
mod ggg;
mod locator;
pub mod parser;
mod pattern;
mod position;
mod processor;
mod scheme;
mod substitute;
pub mod tables;

use parser::{FromData, SafeStream};

pub use album::{Album, GlyphTraits};
pub use ggg::{lookup_flags, Class, LangSys, Lookup, Script};
pub use locator::Locator;
pub use pattern::{FeatureKind, FeatureUnit, Pattern, PatternBuilder};
pub use processor::TextProcessor;
pub use scheme::ShapingScheme;
pub use tables::gdef::GlyphClass;
pub use tables::gpos::PositioningTable;
pub use tables::gsub::SubstitutionTable;


/// A type-safe wrapper for glyph ID.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Default, Debug, Hash)]
pub struct GlyphId(pub u16);

impl FromData for GlyphId {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        GlyphId(SafeStream::new(data).read())
    }
}


/// A 4-byte tag.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Default, Hash)]
pub struct Tag(pub u32);

impl Tag {
    /// Creates a `Tag` from bytes.
    #[inline]
    pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Tag(((bytes[0] as u32) << 24)
            | ((bytes[1] as u32) << 16)
            | ((bytes[2] as u32) << 8)
            | (bytes[3] as u32))
    }

    /// Returns tag as a 4-element byte array.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [
            (self.0 >> 24 & 0xff) as u8,
            (self.0 >> 16 & 0xff) as u8,
            (self.0 >> 8 & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = self.to_bytes();
        for c in b.iter() {
            if c.is_ascii_graphic() || *c == b' ' {
                write!(f, "{}", *c as char)?;
            } else {
                write!(f, "\\x{:02x}", c)?;
            }
        }
        Ok(())
    }
}

impl FromData for Tag {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        Tag(SafeStream::new(data).read())
    }
}


/// A text direction.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum TextDirection {
    #[allow(missing_docs)]
    LeftToRight,
    #[allow(missing_docs)]
    RightToLeft,
}

impl Default for TextDirection {
    #[inline]
    fn default() -> Self {
        TextDirection::LeftToRight
    }
}


/// A lookup application error.
///
/// Errors never abort shaping as a whole: the driver skips the failing
/// lookup application and continues at the next glyph.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ShapeError {
    /// A binary read went past the end of a table.
    TruncatedTable,
    /// A subtable field has an impossible value.
    MalformedSubtable,
    /// Nested contextual lookups exceeded the recursion limit.
    NestedLookupTooDeep,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShapeError::TruncatedTable => write!(f, "a table read went out of bounds"),
            ShapeError::MalformedSubtable => write!(f, "a subtable field has an impossible value"),
            ShapeError::NestedLookupTooDeep => write!(f, "nested lookups are too deep"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ShapeError {}


/// Shaping-related tables of a font.
///
/// This layer performs no font file parsing: the caller locates the raw
/// `GSUB`, `GPOS` and `GDEF` tables and hands over their byte slices.
/// A table with an invalid header is treated as absent.
#[derive(Clone, Copy, Default)]
pub struct Font<'a> {
    /// Parsed `GSUB` table, if any.
    pub gsub: Option<SubstitutionTable<'a>>,
    /// Parsed `GPOS` table, if any.
    pub gpos: Option<PositioningTable<'a>>,
    /// Parsed `GDEF` table, if any.
    pub gdef: Option<tables::gdef::Table<'a>>,
}

impl<'a> Font<'a> {
    /// Creates a `Font` from raw table slices.
    pub fn from_table_slices(
        gsub: Option<&'a [u8]>,
        gpos: Option<&'a [u8]>,
        gdef: Option<&'a [u8]>,
    ) -> Self {
        Font {
            gsub: gsub.and_then(SubstitutionTable::parse),
            gpos: gpos.and_then(PositioningTable::parse),
            gdef: gdef.and_then(tables::gdef::Table::parse),
        }
    }
}

impl fmt::Debug for Font<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Font()")
    }
}
