//! Workbook type - the decoded document

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// A decoded workbook
///
/// Holds the worksheets in directory order plus global settings.
#[derive(Debug, Default)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Workbook settings
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a worksheet by name. Sheet names are compared case-insensitively.
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        let lower = name.to_lowercase();
        self.worksheets
            .iter()
            .find(|ws| ws.name().to_lowercase() == lower)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a worksheet, returning its index
    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot be empty".into(),
            ));
        }

        if self.worksheet_by_name(name).is_some() {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }

        Ok(())
    }
}

/// Workbook-level settings read from the globals substream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// Use the 1904 date system (Mac) instead of 1900
    pub date_1904: bool,
    /// Code page declared by the producer (1200 = UTF-16)
    pub codepage: Option<u16>,
}
