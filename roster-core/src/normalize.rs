//! Header-agnostic row normalization
//!
//! Uploaded sheets name their columns however they like. Each header is
//! matched against three families (name, phone, note) and the first
//! non-empty value in each family wins.

use crate::CanonicalRecord;
use serde::{Deserialize, Serialize};

/// One raw row as read from a file: ordered `(header, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Column family a header belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFamily {
    Name,
    Phone,
    Note,
}

impl HeaderFamily {
    /// Classify a header. Families are checked in name, phone, note order.
    pub fn classify(header: &str) -> Option<Self> {
        let key = header.trim().to_lowercase();
        if is_name_like(&key) {
            Some(HeaderFamily::Name)
        } else if key.contains("phone") || key.contains("mobile") {
            Some(HeaderFamily::Phone)
        } else if key.contains("note") || key.contains("remark") || key.contains("comment") {
            Some(HeaderFamily::Note)
        } else {
            None
        }
    }
}

/// Words that may precede `name` in a first-name header. Anything else
/// (`last`, `company`, `user`, `file`) names something other than the contact.
const NAME_QUALIFIERS: [&str; 4] = ["first", "full", "given", "contact"];

fn is_name_like(key: &str) -> bool {
    if key.contains("firstname") || key.contains("first_name") || key.contains("first name") {
        return true;
    }
    let words: Vec<&str> = key
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    match words.as_slice() {
        ["name"] => true,
        [qualifier, "name"] => NAME_QUALIFIERS.contains(qualifier),
        [single] => single
            .strip_suffix("name")
            .is_some_and(|q| NAME_QUALIFIERS.contains(&q)),
        _ => false,
    }
}

/// Normalize one row. Returns `None` when the name or phone is missing.
pub fn normalize_row(row: &RawRow) -> Option<CanonicalRecord> {
    let mut first_name: Option<&str> = None;
    let mut phone: Option<&str> = None;
    let mut notes: Option<&str> = None;

    for (header, value) in row.cells() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let slot = match HeaderFamily::classify(header) {
            Some(HeaderFamily::Name) => &mut first_name,
            Some(HeaderFamily::Phone) => &mut phone,
            Some(HeaderFamily::Note) => &mut notes,
            None => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Some(CanonicalRecord {
        first_name: first_name?.to_string(),
        phone: phone?.to_string(),
        notes: notes.unwrap_or_default().to_string(),
    })
}

/// Normalize a batch of rows, dropping the ones that lack required fields.
/// Output order follows input order.
pub fn normalize_rows<'a, I>(rows: I) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    rows.into_iter().filter_map(normalize_row).collect()
}
