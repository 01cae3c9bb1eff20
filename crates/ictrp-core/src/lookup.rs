//! The `Lookup` trait: a curated key → value table merged into the trial
//! records.
//!
//! Implemented by the CSV-backed tables in `ictrp-tables`. The pipeline only
//! sees this abstraction, so tests can hand it a plain `HashMap`.

use std::collections::HashMap;

/// A left-join table. A key with no entry means the row still needs manual
/// curation.
pub trait Lookup {
  /// Look up the curated value for `key`.
  fn lookup(&self, key: &str) -> Option<&str>;

  /// Number of entries.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Lookup for HashMap<String, String> {
  fn lookup(&self, key: &str) -> Option<&str> { self.get(key).map(String::as_str) }

  fn len(&self) -> usize { HashMap::len(self) }
}
