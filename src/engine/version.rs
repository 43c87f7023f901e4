//! KEEPSAKE - Format Versions
//! Closed set of container layouts, identified by the dotted tag stored in
//! the file header, and the dispatch from tag to reader/writer.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::container::{LoadReport, V100Format};
use super::region::Region;

/// Reader/writer pair for one container layout (everything after the header).
pub trait ContainerFormat {
    /// Parse every zone in `body`. Corrupt zones are skipped and counted.
    fn read_zones(&self, body: &str) -> (BTreeMap<String, Region>, LoadReport);

    /// Write one zone per region, in map order.
    fn write_zones(
        &self,
        regions: &BTreeMap<String, Region>,
        out: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Returns the human-readable name of this layout.
    fn name(&self) -> &str;
}

/// Container layout revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Length-prefixed zones: `(` + 30 digits + `)` + region block.
    V100,
}

impl FormatVersion {
    /// Version written by default.
    pub const CURRENT: FormatVersion = FormatVersion::V100;

    /// Every known version, newest last.
    pub const ALL: [FormatVersion; 1] = [FormatVersion::V100];

    /// Dotted header tag, always five characters.
    pub fn tag(self) -> &'static str {
        match self {
            FormatVersion::V100 => "1.0.0",
        }
    }

    /// Look up a version by its exact header tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.tag() == tag)
    }

    /// Version used to read a file declaring `tag`.
    /// Unrecognized tags fall back to the current layout instead of failing.
    pub fn resolve(tag: &str) -> Self {
        match Self::from_tag(tag) {
            Some(version) => version,
            None => {
                log::warn!(
                    "Unrecognized format version {:?}, reading as {}",
                    tag,
                    Self::CURRENT
                );
                Self::CURRENT
            }
        }
    }

    /// Reader/writer for this version.
    pub fn format(self) -> &'static dyn ContainerFormat {
        match self {
            FormatVersion::V100 => &V100Format,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
