//! Binary dependency table read by runtime loaders.
//!
//! Layout, all integers little-endian `i32`:
//!
//! ```text
//! magic      4 bytes, b"ABDB"
//! count      number of strings in the table
//! strings    `count` length-prefixed UTF-8 strings (7-bit varint length)
//! records    repeated until end of stream:
//!            name index, short name, content hash, export code,
//!            dependency count, dependency indices
//! ```
//!
//! The string table holds every full asset path referenced by any record, so
//! record names and dependencies are written as indices into it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use abforge_common::ExportKind;

use crate::error::CacheError;

/// Magic bytes identifying a dependency table.
pub const MAGIC: [u8; 4] = *b"ABDB";

/// One bundle entry of the dependency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRecord {
    /// Full asset path of the bundle's primary asset.
    pub name: String,
    /// Display name: the file name of the primary asset.
    pub short_name: String,
    /// Content hash of the primary asset, hex encoded.
    pub hash: String,
    /// Export classification of the primary asset.
    pub export: ExportKind,
    /// Full asset paths of the bundles this bundle depends on.
    pub dependencies: Vec<String>,
}

/// A decoded dependency table.
#[derive(Debug, Default)]
pub struct DependencyTable {
    records: BTreeMap<String, BundleRecord>,
    short_names: HashMap<String, String>,
}

impl DependencyTable {
    /// Looks up a record by full asset path.
    pub fn get(&self, name: &str) -> Option<&BundleRecord> {
        self.records.get(name)
    }

    /// Resolves a short display name to the full asset path of the first
    /// record that used it.
    pub fn full_name(&self, short_name: &str) -> Option<&str> {
        self.short_names.get(short_name).map(String::as_str)
    }

    /// Iterates over the records in asset path order.
    pub fn records(&self) -> impl Iterator<Item = &BundleRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: BundleRecord) {
        self.short_names
            .entry(record.short_name.clone())
            .or_insert_with(|| record.name.clone());
        self.records.insert(record.name.clone(), record);
    }
}

/// Encodes records into the binary layout.
///
/// Records are written in asset path order and the string table is sorted, so
/// the same set of records always produces the same bytes. Dependency order
/// within a record is preserved.
pub fn encode(records: &[BundleRecord]) -> Result<Vec<u8>, CacheError> {
    let strings: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| {
            std::iter::once(r.name.as_str()).chain(r.dependencies.iter().map(String::as_str))
        })
        .collect();
    let index: HashMap<&str, i32> = strings
        .iter()
        .enumerate()
        .map(|(i, s)| to_i32(i).map(|n| (*s, n)))
        .collect::<Result<_, _>>()?;

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    write_i32(&mut out, to_i32(strings.len())?);
    for s in &strings {
        write_string(&mut out, s);
    }

    let mut sorted: Vec<&BundleRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for record in sorted {
        write_i32(&mut out, index[record.name.as_str()]);
        write_string(&mut out, &record.short_name);
        write_string(&mut out, &record.hash);
        write_i32(&mut out, record.export.code());
        write_i32(&mut out, to_i32(record.dependencies.len())?);
        for dep in &record.dependencies {
            write_i32(&mut out, index[dep.as_str()]);
        }
    }
    Ok(out)
}

/// Decodes a dependency table.
///
/// A stream shorter than the magic tag, or one that does not start with it,
/// is not a dependency table and decodes to an empty table. A stream that
/// starts with the tag but has an inconsistent body is an error.
pub fn decode(bytes: &[u8]) -> Result<DependencyTable, CacheError> {
    let mut table = DependencyTable::default();
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Ok(table);
    }

    let mut reader = Reader {
        bytes,
        pos: MAGIC.len(),
    };

    let count = reader.read_count()?;
    let mut strings = Vec::with_capacity(count.min(bytes.len()));
    for _ in 0..count {
        strings.push(reader.read_string()?);
    }
    let lookup = |index: i32| -> Result<String, CacheError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| strings.get(i))
            .cloned()
            .ok_or_else(|| CacheError::malformed(format!("string index {index} out of range")))
    };

    while !reader.at_end() {
        let name = lookup(reader.read_i32()?)?;
        let short_name = reader.read_string()?;
        let hash = reader.read_string()?;
        let export = ExportKind::from_code(reader.read_i32()?)
            .map_err(|e| CacheError::malformed(e.to_string()))?;
        let dep_count = reader.read_count()?;
        let mut dependencies = Vec::with_capacity(dep_count.min(bytes.len()));
        for _ in 0..dep_count {
            dependencies.push(lookup(reader.read_i32()?)?);
        }
        table.insert(BundleRecord {
            name,
            short_name,
            hash,
            export,
            dependencies,
        });
    }

    Ok(table)
}

/// Reads and decodes the dependency table at `path`.
///
/// A missing file decodes to an empty table.
pub fn read_file(path: &Path) -> Result<DependencyTable, CacheError> {
    match std::fs::read(path) {
        Ok(bytes) => decode(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DependencyTable::default()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// Encodes `records` and writes them to `path`, replacing any previous table.
pub fn write_file(path: &Path, records: &[BundleRecord]) -> Result<(), CacheError> {
    let bytes = encode(records)?;
    std::fs::write(path, bytes).map_err(|e| CacheError::io(path, e))
}

fn to_i32(n: usize) -> Result<i32, CacheError> {
    i32::try_from(n).map_err(|_| CacheError::malformed(format!("{n} does not fit in an int32")))
}

fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    let mut len = s.len() as u32;
    while len >= 0x80 {
        out.push((len as u8) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&[u8], CacheError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CacheError::malformed(format!("truncated at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, CacheError> {
        let raw = self.take(4)?;
        Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_count(&mut self) -> Result<usize, CacheError> {
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| CacheError::malformed(format!("negative count {n}")))
    }

    fn read_len(&mut self) -> Result<usize, CacheError> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.take(1)?[0];
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(CacheError::malformed("string length prefix too long"))
    }

    fn read_string(&mut self) -> Result<String, CacheError> {
        let len = self.read_len()?;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| CacheError::malformed(e.to_string()))
    }
}
