//! KEEPSAKE - Container File
//! Header handling and the version-100 zone layout.
//!
//! ## Layout
//! ```text
//! [1.0.0](000000000000000000000000000012)TOOLS{61,31}(0000...)...
//! ```
//! - Header: `[` + five-character dotted version tag + `]`
//! - Zone: `(` + 30 zero-padded decimal digits + `)` giving the character
//!   length of the region block that immediately follows
//!
//! Lengths count characters, not bytes. A zero length ends the stream.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::error::{KeepsakeError, Result};

use super::region::{self, Region};
use super::version::{ContainerFormat, FormatVersion};

/// Header length in characters: `[x.y.z]`.
pub const HEADER_LEN: usize = 7;

/// Zone length field width in characters, brackets included.
pub const LENGTH_FIELD_LEN: usize = 32;

/// Digits inside a zone length field.
pub const LENGTH_DIGITS: usize = 30;

/// Outcome of reading a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Version tag exactly as found in the header.
    pub declared_version: String,
    /// Zones parsed into regions.
    pub zones_loaded: usize,
    /// Zones dropped because their block was malformed.
    pub zones_skipped: usize,
    /// Entries dropped inside otherwise readable zones.
    pub entries_discarded: usize,
}

/// The version-100 container layout.
pub struct V100Format;

impl ContainerFormat for V100Format {
    fn read_zones(&self, body: &str) -> (BTreeMap<String, Region>, LoadReport) {
        let mut regions = BTreeMap::new();
        let mut report = LoadReport::default();
        let mut rest = body;

        while !rest.is_empty() {
            let Some((field, after_field)) = split_at_chars(rest, LENGTH_FIELD_LEN) else {
                log::error!("Truncated zone length field, ignoring the rest of the file");
                break;
            };
            let Some(amount) = parse_length_field(field) else {
                log::error!("Unreadable zone length field {:?}, ignoring the rest of the file", field);
                break;
            };
            if amount == 0 {
                break;
            }
            let Some((zone, after_zone)) = split_at_chars(after_field, amount) else {
                log::error!("Unexpected end of file inside a zone of {} characters", amount);
                report.zones_skipped += 1;
                break;
            };
            rest = after_zone;

            match region::parse_zone(zone) {
                Ok((region, discarded)) => {
                    report.zones_loaded += 1;
                    report.entries_discarded += discarded;
                    if let Some(previous) = regions.insert(region.name().to_string(), region) {
                        log::warn!("Region {} stored twice, keeping the later zone", previous.name());
                    }
                }
                Err(e) => {
                    log::warn!("Skipping unreadable zone: {}", e);
                    report.zones_skipped += 1;
                }
            }
        }

        (regions, report)
    }

    fn write_zones(
        &self,
        regions: &BTreeMap<String, Region>,
        out: &mut dyn Write,
    ) -> std::io::Result<()> {
        for region in regions.values() {
            let storable = region.to_storable_string();
            write!(out, "({:0width$})", storable.chars().count(), width = LENGTH_DIGITS)?;
            out.write_all(storable.as_bytes())?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "v100-length-prefixed"
    }
}

/// Render the header for `version`.
pub fn header(version: FormatVersion) -> String {
    format!("[{}]", version.tag())
}

/// Parse a whole container: header, then zones with the matching layout.
pub fn parse(content: &str) -> Result<(BTreeMap<String, Region>, LoadReport)> {
    let (header, body) = split_at_chars(content, HEADER_LEN).ok_or_else(|| {
        KeepsakeError::InvalidFile(format!(
            "header needs {} characters, found {}",
            HEADER_LEN,
            content.chars().count()
        ))
    })?;
    let tag = header
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(header);

    let version = FormatVersion::resolve(tag);
    let format = version.format();
    log::debug!("Reading container declared as {:?} with {}", tag, format.name());
    let (regions, mut report) = format.read_zones(body);
    report.declared_version = tag.to_string();
    Ok((regions, report))
}

/// Read and parse the container at `path`.
pub fn load(path: &Path) -> Result<(BTreeMap<String, Region>, LoadReport)> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => {
            KeepsakeError::InvalidFile(format!("{:?} is not valid UTF-8 text", path))
        }
        _ => KeepsakeError::file_op("read", path, e),
    })?;
    parse(&content)
}

/// Create `path` (which must not exist) and write a full container into it.
/// The handle is closed before returning.
pub fn create(
    path: &Path,
    version: FormatVersion,
    regions: &BTreeMap<String, Region>,
    sync: bool,
) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| KeepsakeError::file_op("create", path, e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(header(version).as_bytes())
        .and_then(|_| version.format().write_zones(regions, &mut writer))
        .map_err(|e| KeepsakeError::file_op("write", path, e))?;

    let file = writer
        .into_inner()
        .map_err(|e| KeepsakeError::file_op("write", path, e.into_error()))?;
    if sync {
        file.sync_all()
            .map_err(|e| KeepsakeError::file_op("sync", path, e))?;
    }
    Ok(())
}

/// Split `s` after `n` characters, or `None` if it is shorter.
fn split_at_chars(s: &str, n: usize) -> Option<(&str, &str)> {
    let idx = s
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(n)?;
    Some(s.split_at(idx))
}

fn parse_length_field(field: &str) -> Option<usize> {
    let digits = field.strip_prefix('(')?.strip_suffix(')')?;
    if digits.len() != LENGTH_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Key;

    fn zone(block: &str) -> String {
        format!("({:030}){}", block.chars().count(), block)
    }

    fn regions(blocks: &[Region]) -> BTreeMap<String, Region> {
        blocks
            .iter()
            .map(|r| (r.name().to_string(), r.clone()))
            .collect()
    }

    #[test]
    fn test_header_only() {
        let (regions, report) = parse("[1.0.0]").unwrap();
        assert!(regions.is_empty());
        assert_eq!(report.declared_version, "1.0.0");
        assert_eq!(report.zones_loaded, 0);
    }

    #[test]
    fn test_short_header_is_invalid() {
        assert!(matches!(parse("[1.0"), Err(KeepsakeError::InvalidFile(_))));
        assert!(matches!(parse(""), Err(KeepsakeError::InvalidFile(_))));
    }

    #[test]
    fn test_write_then_parse() {
        let mut tools = Region::new("tools");
        tools.add_item(Key::from("hammer"), vec!["steel".into()]);
        let table = regions(&[tools, Region::new("empty")]);

        let mut buf = header(FormatVersion::V100).into_bytes();
        V100Format.write_zones(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("[1.0.0](000000000000000000000000000007)EMPTY{}"));
        let (parsed, report) = parse(&text).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(report.zones_loaded, 2);
    }

    #[test]
    fn test_unknown_version_still_loads() {
        let text = format!("[7.7.7]{}", zone("A{61,31}"));
        let (parsed, report) = parse(&text).unwrap();
        assert_eq!(report.declared_version, "7.7.7");
        assert!(parsed.contains_key("A"));
    }

    #[test]
    fn test_malformed_zone_is_skipped() {
        let text = format!("[1.0.0]{}{}{}", zone("A{}"), zone("{broken"), zone("C{63}"));
        let (parsed, report) = parse(&text).unwrap();
        assert_eq!(parsed.keys().cloned().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(report.zones_skipped, 1);
        assert_eq!(report.zones_loaded, 2);
    }

    #[test]
    fn test_zero_length_ends_stream() {
        let text = format!("[1.0.0]{}({:030}){}", zone("A{}"), 0, zone("B{}"));
        let (parsed, _) = parse(&text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_truncated_zone_keeps_earlier_zones() {
        let text = format!("[1.0.0]{}({:030})B{{", zone("A{}"), 50);
        let (parsed, report) = parse(&text).unwrap();
        assert!(parsed.contains_key("A"));
        assert_eq!(report.zones_skipped, 1);
    }

    #[test]
    fn test_garbage_length_field_stops_reading() {
        let text = format!("[1.0.0]{}(not-a-number-at-all-but-32-chars)", zone("A{}"));
        let (parsed, _) = parse(&text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_lengths_count_characters() {
        assert_eq!(split_at_chars("héllo", 2), Some(("hé", "llo")));
        assert_eq!(split_at_chars("ab", 2), Some(("ab", "")));
        assert_eq!(split_at_chars("ab", 3), None);
        assert_eq!(split_at_chars("", 0), Some(("", "")));
    }
}
