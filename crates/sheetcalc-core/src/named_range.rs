//! Defined names
//!
//! A defined name maps an identifier to formula text that the engine evaluates on
//! demand, so a name can stand for a reference, a constant or a whole expression:
//!
//! ```text
//! sales1   -> Sheet1!$A$1:$D$1
//! TaxRate  -> 0.0725
//! Total    -> =SUM(sales1)
//! ```
//!
//! Names are case-insensitive. A sheet-scoped name shadows a workbook-scoped one of
//! the same spelling for formulas on that sheet.

use crate::cell::CellAddress;
use ahash::AHashMap;
use lazy_regex::regex_is_match;

/// Scope of a defined name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NameScope {
    /// Visible from every sheet
    Workbook,
    /// Visible only from the sheet with this index
    Sheet(usize),
}

/// A defined name
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedRange {
    /// The name as it was defined
    pub name: String,
    pub scope: NameScope,
    /// Formula text the name stands for, with or without a leading `=`
    pub refers_to: String,
    pub comment: Option<String>,
}

impl NamedRange {
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        Self {
            name: name.into(),
            scope,
            refers_to: refers_to.into(),
            comment: None,
        }
    }

    /// Workbook-scoped name
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    /// Name scoped to one sheet
    pub fn sheet_scope(
        name: impl Into<String>,
        refers_to: impl Into<String>,
        sheet_index: usize,
    ) -> Self {
        Self::new(name, refers_to, NameScope::Sheet(sheet_index))
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The formula text without a leading `=`
    pub fn expression(&self) -> &str {
        self.refers_to.strip_prefix('=').unwrap_or(&self.refers_to)
    }

    /// Whether `name` is usable as a defined name
    ///
    /// Names start with a letter, `_` or `\`, continue with letters, digits, `_` and
    /// `.`, and must not read as a cell reference or an R1C1 token.
    pub fn is_valid_name(name: &str) -> bool {
        if !regex_is_match!(r"^[\p{L}_\\][\p{L}\p{N}_.]*$", name) {
            return false;
        }
        if CellAddress::parse(name).is_ok() {
            return false;
        }
        !regex_is_match!(r"^(?i)(r|c|r[0-9]+c[0-9]+|r[0-9]+|c[0-9]+)$", name)
    }
}

/// Defined names of a workbook, keyed case-insensitively per scope
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    ranges: AHashMap<(String, NameScope), NamedRange>,
}

impl NamedRangeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str, scope: NameScope) -> (String, NameScope) {
        (name.to_lowercase(), scope)
    }

    /// Add a name; fails if the name is malformed or already defined in that scope
    pub fn define(&mut self, range: NamedRange) -> Result<(), String> {
        if !NamedRange::is_valid_name(&range.name) {
            return Err(format!("'{}' is not a valid name", range.name));
        }
        let key = Self::key(&range.name, range.scope);
        if self.ranges.contains_key(&key) {
            return Err(format!("Name '{}' already exists in this scope", range.name));
        }
        self.ranges.insert(key, range);
        Ok(())
    }

    /// Add or replace a name
    pub fn define_or_update(&mut self, range: NamedRange) {
        let key = Self::key(&range.name, range.scope);
        self.ranges.insert(key, range);
    }

    /// Look a name up as seen from `current_sheet`: sheet scope first, then workbook
    pub fn get(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        self.get_exact(name, NameScope::Sheet(current_sheet))
            .or_else(|| self.get_exact(name, NameScope::Workbook))
    }

    pub fn get_exact(&self, name: &str, scope: NameScope) -> Option<&NamedRange> {
        self.ranges.get(&Self::key(name, scope))
    }

    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        self.ranges.remove(&Self::key(name, scope))
    }

    pub fn contains(&self, name: &str, scope: NameScope) -> bool {
        self.ranges.contains_key(&Self::key(name, scope))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.values()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_strips_equals() {
        assert_eq!(NamedRange::workbook_scope("Total", "=SUM(A1:A10)").expression(), "SUM(A1:A10)");
        assert_eq!(NamedRange::workbook_scope("Rate", "0.05").expression(), "0.05");
    }

    #[test]
    fn test_name_validation() {
        for good in ["sales1", "Tax_Rate", "_x", "my.name", "Données", "\\path"] {
            assert!(NamedRange::is_valid_name(good), "{good}");
        }
        for bad in ["", "1abc", "A1", "xfd100", "R1C1", "r", "C", "R3", "has space", "a-b"] {
            assert!(!NamedRange::is_valid_name(bad), "{bad}");
        }
    }

    #[test]
    fn test_scope_lookup() {
        let mut names = NamedRangeCollection::new();
        names.define(NamedRange::workbook_scope("Rate", "0.05")).unwrap();
        names.define(NamedRange::sheet_scope("Rate", "0.08", 0)).unwrap();

        assert_eq!(names.get("Rate", 0).unwrap().refers_to, "0.08");
        assert_eq!(names.get("Rate", 1).unwrap().refers_to, "0.05");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_case_insensitive() {
        let mut names = NamedRangeCollection::new();
        names.define(NamedRange::workbook_scope("TaxRate", "0.05")).unwrap();

        assert!(names.get("taxrate", 0).is_some());
        assert!(names.get("TAXRATE", 3).is_some());
        assert!(names.define(NamedRange::workbook_scope("TAXRATE", "0.10")).is_err());

        names.define_or_update(NamedRange::workbook_scope("TAXRATE", "0.10"));
        assert_eq!(names.get("taxrate", 0).unwrap().refers_to, "0.10");
        assert!(names.remove("taxRate", NameScope::Workbook).is_some());
        assert!(names.is_empty());
    }
}
