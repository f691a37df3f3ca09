//! Core metadata (`PKG-INFO`) of the sample project.
//!
//! The sdist check compares the embedded `PKG-INFO` byte-for-byte. Parsing into fields is only
//! used to name the first field that differs, so a mismatch report points at something
//! more useful than "the text changed".

use crate::error::{HarnessError, HarnessResult};

/// The exact `PKG-INFO` the backend must write for the sample project.
pub const EXPECTED_PKG_INFO: &str = "\
Metadata-Version: 2.1
Name: cmake-example
Version: 0.0.1
Requires-Python: >=3.7
Provides-Extra: test
Requires-Dist: pytest>=6.0; extra == \"test\"
";

/// One `Key: Value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// Parsed core metadata headers, in file order. Repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreMetadata {
    pub fields: Vec<MetadataField>,
}

impl CoreMetadata {
    /// Parse the header block. Stops at the first blank line (start of the description body).
    /// Continuation lines (leading whitespace) are appended to the previous value.
    pub fn parse(text: &str) -> Self {
        let mut fields: Vec<MetadataField> = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            if line.starts_with([' ', '\t']) {
                if let Some(last) = fields.last_mut() {
                    last.value.push('\n');
                    last.value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                fields.push(MetadataField {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                });
            }
        }
        Self { fields }
    }

    /// First value of a header, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// All values of a repeatable header (`Requires-Dist`, `Provides-Extra`, ...).
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
            .collect()
    }
}

/// Name the first header where `actual` departs from `expected`.
///
/// Returns `None` when the headers agree, which means the texts differ only in layout
/// (line endings, trailing newline, spacing).
pub fn first_differing_field(expected: &CoreMetadata, actual: &CoreMetadata) -> Option<String> {
    let len = expected.fields.len().max(actual.fields.len());
    (0..len).find_map(|i| match (expected.fields.get(i), actual.fields.get(i)) {
        (Some(e), Some(a)) if e == a => None,
        (Some(e), _) => Some(e.name.clone()),
        (None, Some(a)) => Some(a.name.clone()),
        (None, None) => None,
    })
}

/// Compare `PKG-INFO` text byte-for-byte.
pub fn verify_pkg_info(expected: &str, actual: &str) -> HarnessResult<()> {
    if expected == actual {
        return Ok(());
    }
    let what = match first_differing_field(&CoreMetadata::parse(expected), &CoreMetadata::parse(actual)) {
        Some(field) => format!("PKG-INFO field `{}`", field),
        None => "PKG-INFO layout".to_string(),
    };
    Err(HarnessError::mismatch(what, expected, actual))
}
