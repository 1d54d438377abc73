//! BIFF8 record type constants.
//!
//! Reference: [MS-XLS] §2.3, Record Enumeration

// ── Stream structure ────────────────────────────────────────────────────
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// ── Workbook globals ────────────────────────────────────────────────────
pub const BOUNDSHEET: u16 = 0x0085; // Sheet name, type, visibility, stream offset
pub const SST: u16 = 0x00FC; // Shared String Table
pub const DATEMODE: u16 = 0x0022; // 1900 vs 1904 date system (a.k.a. DATE1904)
pub const CODEPAGE: u16 = 0x0042; // Code page (should be 1200 = UTF-16 for BIFF8)

// ── Cell records ────────────────────────────────────────────────────────
pub const LABELSST: u16 = 0x00FD; // Cell containing SST string index
pub const LABEL: u16 = 0x0204; // Cell with inline string (rare in BIFF8)
pub const NUMBER: u16 = 0x0203; // Cell with IEEE 754 double
pub const RK: u16 = 0x027E; // Cell with compressed number (RK encoding)
pub const MULRK: u16 = 0x00BD; // Multiple RK values in one row
pub const BLANK: u16 = 0x0201; // Empty cell with formatting
pub const MULBLANK: u16 = 0x00BE; // Multiple blanks with formatting
pub const BOOLERR: u16 = 0x0205; // Boolean or error cell

// ── Formula records ─────────────────────────────────────────────────────
pub const FORMULA: u16 = 0x0006; // Formula cell with cached result
pub const STRING: u16 = 0x0207; // Cached string result for preceding FORMULA
pub const SHRFMLA: u16 = 0x04BC; // Shared formula body, follows its first FORMULA
pub const ARRAY: u16 = 0x0221; // Array formula body, follows its first FORMULA
pub const TABLE: u16 = 0x0236; // Data table body, follows its first FORMULA

// ── BOF subtypes (the `dt` field) ───────────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;
pub const BOF_CHART: u16 = 0x0020;
pub const BOF_MACRO: u16 = 0x0040;

/// BIFF version we support.
pub const BIFF8_VERSION: u16 = 0x0600;

/// Human-readable record name for log lines.
pub fn name(record_type: u16) -> &'static str {
    match record_type {
        BOF => "BOF",
        EOF => "EOF",
        CONTINUE => "CONTINUE",
        BOUNDSHEET => "BOUNDSHEET",
        SST => "SST",
        DATEMODE => "DATEMODE",
        CODEPAGE => "CODEPAGE",
        LABELSST => "LABELSST",
        LABEL => "LABEL",
        NUMBER => "NUMBER",
        RK => "RK",
        MULRK => "MULRK",
        BLANK => "BLANK",
        MULBLANK => "MULBLANK",
        BOOLERR => "BOOLERR",
        FORMULA => "FORMULA",
        STRING => "STRING",
        SHRFMLA => "SHRFMLA",
        ARRAY => "ARRAY",
        TABLE => "TABLE",
        _ => "?",
    }
}
