//! A link table of workbooks that can reference each other by name

use ahash::AHashMap;
use log::debug;
use sheetcalc_core::{CellRange, CellType, Workbook};

use crate::provider::{CellDataProvider, ExternalWorkbook, Resolver};
use crate::value::FormulaValue;

/// Workbooks registered under link names
///
/// `[Book]Sheet1!A1` in any workbook of the environment finds `Book` through the
/// link table, matching names case-insensitively. Links are looked up each time a
/// formula is evaluated, so renaming or removing one affects formulas that were
/// parsed earlier.
///
/// # Example
/// ```rust
/// use sheetcalc_core::Workbook;
/// use sheetcalc_formula::WorkbookEnvironment;
///
/// let mut env = WorkbookEnvironment::new();
/// env.add(Workbook::new());
/// assert!(env.view("book1").is_some());
/// assert!(env.rename_link("Book1", "Ledger"));
/// assert!(env.view("book1").is_none());
/// ```
#[derive(Debug, Default)]
pub struct WorkbookEnvironment {
    links: AHashMap<String, Link>,
}

#[derive(Debug)]
struct Link {
    name: String,
    workbook: Workbook,
}

impl WorkbookEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workbook under its own name, replacing any workbook linked
    /// under the same name
    pub fn add(&mut self, workbook: Workbook) -> Option<Workbook> {
        let name = workbook.name().to_string();
        self.add_as(&name, workbook)
    }

    /// Register a workbook under an explicit link name
    pub fn add_as(&mut self, name: &str, workbook: Workbook) -> Option<Workbook> {
        let link = Link {
            name: name.to_string(),
            workbook,
        };
        self.links
            .insert(name.to_lowercase(), link)
            .map(|old| old.workbook)
    }

    pub fn get(&self, name: &str) -> Option<&Workbook> {
        self.links.get(&name.to_lowercase()).map(|l| &l.workbook)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Workbook> {
        self.links
            .get_mut(&name.to_lowercase())
            .map(|l| &mut l.workbook)
    }

    /// Move a workbook to a new link name; false if `old` is not linked or
    /// `new` is already taken by another workbook
    pub fn rename_link(&mut self, old: &str, new: &str) -> bool {
        let old_key = old.to_lowercase();
        let new_key = new.to_lowercase();
        if old_key != new_key && self.links.contains_key(&new_key) {
            return false;
        }
        match self.links.remove(&old_key) {
            Some(mut link) => {
                link.name = new.to_string();
                self.links.insert(new_key, link);
                true
            }
            None => false,
        }
    }

    /// Drop a link, handing back its workbook
    pub fn remove_link(&mut self, name: &str) -> Option<Workbook> {
        self.links.remove(&name.to_lowercase()).map(|l| l.workbook)
    }

    /// Link names, in no particular order
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.values().map(|l| l.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// A workbook as a provider/resolver whose external lookups go through
    /// this environment
    pub fn view(&self, name: &str) -> Option<BookView<'_>> {
        match self.links.get(&name.to_lowercase()) {
            Some(link) => Some(BookView {
                env: self,
                workbook: &link.workbook,
            }),
            None => {
                debug!("no workbook linked as '{}'", name);
                None
            }
        }
    }
}

/// One workbook of a [`WorkbookEnvironment`]
#[derive(Debug, Clone, Copy)]
pub struct BookView<'a> {
    env: &'a WorkbookEnvironment,
    workbook: &'a Workbook,
}

impl<'a> BookView<'a> {
    pub fn workbook(&self) -> &'a Workbook {
        self.workbook
    }
}

impl CellDataProvider for BookView<'_> {
    fn cell_type(&self, sheet: usize, row: u32, col: u16) -> CellType {
        self.workbook.cell_type(sheet, row, col)
    }

    fn cell_value(&self, sheet: usize, row: u32, col: u16) -> FormulaValue {
        self.workbook.cell_value(sheet, row, col)
    }

    fn formula_text(&self, sheet: usize, row: u32, col: u16) -> Option<String> {
        CellDataProvider::formula_text(self.workbook, sheet, row, col)
    }

    fn sheet_count(&self) -> usize {
        self.workbook.sheet_count()
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.workbook.sheet_index(name)
    }

    fn sheet_name(&self, index: usize) -> Option<String> {
        CellDataProvider::sheet_name(self.workbook, index)
    }

    fn used_range(&self, sheet: usize) -> Option<CellRange> {
        CellDataProvider::used_range(self.workbook, sheet)
    }

    fn date_1904(&self) -> bool {
        CellDataProvider::date_1904(self.workbook)
    }
}

impl Resolver for BookView<'_> {
    fn resolve_name(&self, name: &str, scope_sheet: usize) -> Option<String> {
        self.workbook.resolve_name(name, scope_sheet)
    }

    fn resolve_external_workbook(&self, name: &str) -> Option<Box<dyn ExternalWorkbook + '_>> {
        let view = self.env.view(name)?;
        Some(Box::new(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(name: &str, value: f64) -> Workbook {
        let mut wb = Workbook::new();
        wb.set_name(name);
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_value("A1", value)
            .unwrap();
        wb
    }

    #[test]
    fn test_links_are_case_insensitive() {
        let mut env = WorkbookEnvironment::new();
        env.add(book("Alpha", 1.0));
        env.add(book("Beta", 2.0));
        assert_eq!(env.len(), 2);

        let alpha = env.view("ALPHA").unwrap();
        let beta = alpha.resolve_external_workbook("beta").unwrap();
        assert_eq!(beta.as_provider().cell_value(0, 0, 0), FormulaValue::Number(2.0));
        assert!(alpha.resolve_external_workbook("Gamma").is_none());
    }

    #[test]
    fn test_rename_and_remove_links() {
        let mut env = WorkbookEnvironment::new();
        env.add(book("Alpha", 1.0));
        env.add(book("Beta", 2.0));

        assert!(!env.rename_link("Alpha", "beta"));
        assert!(env.rename_link("Beta", "Gamma"));
        assert!(env.view("Beta").is_none());
        assert_eq!(env.get("gamma").unwrap().name(), "Beta");

        assert!(env.remove_link("gamma").is_some());
        let alpha = env.view("Alpha").unwrap();
        assert!(alpha.resolve_external_workbook("Gamma").is_none());
    }
}
