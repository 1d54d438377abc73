//! # biffsheets-xls
//!
//! BIFF8 (.xls) workbook stream decoder for biffsheets.
//!
//! The decoder walks the record stream, builds the shared string table from
//! the workbook globals and then folds each sheet's records into cells,
//! resolving formula results that the file stores in a trailing STRING record.
//!
//! ```no_run
//! use biffsheets_xls::XlsReader;
//!
//! let file = std::fs::File::open("book.xls")?;
//! let workbook = XlsReader::read(file)?;
//! for sheet in workbook.worksheets() {
//!     println!("{}: {} cells", sheet.name(), sheet.cell_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod biff;
pub mod cells;
pub mod error;
pub mod formula;
pub mod reader;
pub mod sst;

pub use error::{XlsError, XlsResult};
pub use reader::{AssemblerState, ReadOptions, XlsReader};
pub use sst::SharedStringTable;
