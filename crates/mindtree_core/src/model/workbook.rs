//! Workbook: the ordered collection of sheets in one document.

use crate::model::sheet::Sheet;

/// Document root. Owns its sheets; sheets never outlive it.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, position: usize) -> Option<&Sheet> {
        self.sheets.get(position)
    }

    pub fn sheet_mut(&mut self, position: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(position)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets
    }
}

impl From<Vec<Sheet>> for Workbook {
    fn from(sheets: Vec<Sheet>) -> Self {
        Self::with_sheets(sheets)
    }
}
