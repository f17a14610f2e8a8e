// https://docs.microsoft.com/en-us/typography/opentype/spec/gsub

use crate::Tag;
use crate::ggg::{LayoutTable, Lookup, Script};

/// A parsed [Glyph Substitution Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub).
#[derive(Clone, Copy)]
pub struct SubstitutionTable<'a> {
    pub(crate) table: LayoutTable<'a>,
}

impl<'a> SubstitutionTable<'a> {
    /// Parses the table from `data`.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        LayoutTable::parse(data).map(|table| SubstitutionTable { table })
    }

    /// Returns the script with `tag`.
    #[inline]
    pub fn script(&self, tag: Tag) -> Option<Script<'a>> {
        self.table.scripts.get(tag)
    }

    /// Returns the lookup at `index` in the lookup list.
    #[inline]
    pub fn lookup(&self, index: u16) -> Option<Lookup<'a>> {
        self.table.lookups.get(index)
    }
}

impl core::fmt::Debug for SubstitutionTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "SubstitutionTable()")
    }
}
