//! E2E tests for the XLS reader: build BIFF8 workbook streams byte by byte,
//! decode them with XlsReader, and assert on the resulting workbook.

mod common;

// Re-export common utilities for use in submodules
pub use common::*;
