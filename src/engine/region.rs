//! KEEPSAKE - Region
//! A named collection of records and its single-block text form.
//!
//! ## Storable Format
//! ```text
//! NAME{key,value,value-key,value-key}
//! ```
//! Every key and value token is codec-encoded, so the only raw `,`, `-`, `{`
//! and `}` characters are structural. Entries are written in key order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KeepsakeError, Result};
use crate::types::{canonical_name, Key, Record};

use super::codec;

const ENTRY_SEPARATOR: &str = "-";
const TOKEN_SEPARATOR: &str = ",";

/// A named mapping from [`Key`] to an ordered list of values.
///
/// Regions are plain values: the engine takes ownership of whatever is handed
/// to `replace_region`, and later edits to a caller's copy are not visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    name: String,
    records: BTreeMap<Key, Vec<String>>,
}

impl Region {
    /// Create an empty region. The name is stored upper-cased.
    pub fn new(name: &str) -> Self {
        Self {
            name: canonical_name(name),
            records: BTreeMap::new(),
        }
    }

    /// The canonical (upper-case) region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of records in the region.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a new record. Returns `false` if the key is already present.
    pub fn add_item(&mut self, key: Key, values: Vec<String>) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, values);
        true
    }

    /// Replace the values of an existing record. Returns `false` if the key is absent.
    pub fn replace_item(&mut self, key: Key, values: Vec<String>) -> bool {
        match self.records.get_mut(&key) {
            Some(existing) => {
                *existing = values;
                true
            }
            None => false,
        }
    }

    /// Remove a record. Returns `false` if the key is absent.
    pub fn remove_item(&mut self, key: &Key) -> bool {
        self.records.remove(key).is_some()
    }

    /// Values stored under `key`, in insertion order.
    pub fn get_item(&self, key: &Key) -> Option<&[String]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.records.keys()
    }

    /// Owned snapshot of every record, in key order.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .iter()
            .map(|(key, values)| Record::new(key.clone(), values.clone()))
            .collect()
    }

    /// Serialize into the single-block storable form.
    ///
    /// One shape does not survive a round trip: a region whose only record is
    /// the empty key with no values writes `NAME{}`, which reads back empty.
    /// With any other record present, or with at least one value, the
    /// empty key round-trips.
    pub fn to_storable_string(&self) -> String {
        let entries: Vec<String> = self
            .records
            .iter()
            .map(|(key, values)| {
                std::iter::once(codec::encode(key.as_str()))
                    .chain(values.iter().map(|v| codec::encode(v)))
                    .collect::<Vec<_>>()
                    .join(TOKEN_SEPARATOR)
            })
            .collect();
        format!("{}{{{}}}", self.name, entries.join(ENTRY_SEPARATOR))
    }

    /// Parse the storable form. Undecodable entries are dropped with a warning;
    /// only a block without a usable name/body split is an error.
    pub fn from_storable_string(text: &str) -> Result<Self> {
        parse_zone(text).map(|(region, _)| region)
    }
}

/// Parse a zone body, returning the region and the number of discarded entries.
pub(crate) fn parse_zone(text: &str) -> Result<(Region, usize)> {
    let (name, body) = split_block(text)?;
    let mut region = Region::new(name);
    let mut discarded = 0;

    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return Ok((region, discarded)),
    };

    for entry in body.split(ENTRY_SEPARATOR) {
        match parse_entry(entry) {
            Ok((key, values)) => {
                if !region.add_item(key.clone(), values) {
                    log::warn!(
                        "Region {}: duplicate key {:?} in stored data, discarding",
                        region.name,
                        key.as_str()
                    );
                    discarded += 1;
                }
            }
            Err(e) => {
                log::warn!("Region {}: unable to decode an entry ({}), discarding", region.name, e);
                discarded += 1;
            }
        }
    }

    Ok((region, discarded))
}

fn split_block(text: &str) -> Result<(&str, Option<&str>)> {
    let (name, body) = match text.split_once('{') {
        Some((name, rest)) => {
            let body = rest.strip_suffix('}').ok_or_else(|| {
                KeepsakeError::MalformedZone(format!("region {:?} body is not closed", name))
            })?;
            if body.contains(['{', '}']) {
                return Err(KeepsakeError::MalformedZone(format!(
                    "region {:?} body contains stray braces",
                    name
                )));
            }
            (name, Some(body))
        }
        None if text.contains('}') => {
            return Err(KeepsakeError::MalformedZone("unbalanced braces".into()))
        }
        None => (text, None),
    };

    if name.is_empty() {
        return Err(KeepsakeError::MalformedZone("missing region name".into()));
    }
    Ok((name, body))
}

fn parse_entry(entry: &str) -> Result<(Key, Vec<String>)> {
    let mut tokens = entry.split(TOKEN_SEPARATOR);
    let key = match tokens.next() {
        Some(token) => Key::new(codec::decode(token)?),
        None => return Err(KeepsakeError::InvalidEncoding("empty entry".into())),
    };
    let values = tokens.map(codec::decode).collect::<Result<Vec<_>>>()?;
    Ok((key, values))
}
