//! Employee records as read from the CSV export.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column names of the export, in file order
pub mod columns {
    pub const EMPLOYEE_NO: &str = "Employee No";
    pub const NAME_AR: &str = "Name (Arabic)";
    pub const NAME_EN: &str = "Name (English)";
    pub const DEPARTMENT: &str = "Department";
    pub const JOB_TITLE: &str = "Job Title";
    pub const COMPANY: &str = "Company";
    pub const NATIONALITY: &str = "Nationality";
    pub const PASSPORT_NO: &str = "Passport No";
    pub const CARD_NO: &str = "Card No";
    pub const CARD_EXPIRY: &str = "Card Expiry";

    /// Every column the reader requires to be present in the header row
    pub const REQUIRED: [&str; 10] = [
        EMPLOYEE_NO,
        NAME_AR,
        NAME_EN,
        DEPARTMENT,
        JOB_TITLE,
        COMPANY,
        NATIONALITY,
        PASSPORT_NO,
        CARD_NO,
        CARD_EXPIRY,
    ];
}

/// One data row keyed by column header. Values are already trimmed.
pub type RawRow = IndexMap<String, String>;

/// An employee row after field extraction.
///
/// `employee_no` is already normalized; every other field is the trimmed
/// source text. `card_expiry` is `None` when the cell was empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_no: String,
    pub name_ar: String,
    pub name_en: String,
    pub department_ar: String,
    pub job_ar: String,
    pub company_ar: String,
    pub nationality_ar: String,
    pub passport_no: String,
    pub card_no: String,
    pub card_expiry: Option<String>,
}

impl EmployeeRecord {
    /// Build a record from a raw row, normalizing the employee number.
    ///
    /// Missing cells are treated as empty; header presence is enforced by the
    /// reader before any row is produced.
    pub fn from_row(row: &RawRow) -> Result<Self, crate::ImportError> {
        let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();

        let card_expiry = field(columns::CARD_EXPIRY);

        Ok(Self {
            employee_no: crate::normalize::normalize_employee_number(&field(columns::EMPLOYEE_NO))?,
            name_ar: field(columns::NAME_AR),
            name_en: field(columns::NAME_EN),
            department_ar: field(columns::DEPARTMENT),
            job_ar: field(columns::JOB_TITLE),
            company_ar: field(columns::COMPANY),
            nationality_ar: field(columns::NATIONALITY),
            passport_no: field(columns::PASSPORT_NO),
            card_no: field(columns::CARD_NO),
            card_expiry: if card_expiry.is_empty() { None } else { Some(card_expiry) },
        })
    }
}
