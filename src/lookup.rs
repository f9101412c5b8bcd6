//! Static lookup tables for companies, jobs, departments and nationalities.
//!
//! The built-in tables cover the labels found in the HR export. A YAML file
//! can replace any of them wholesale:
//!
//! ```yaml
//! companies:
//!   "ركس دبي (ش.ذ.م.م)": { code: REXDUBAI, name_en: Rex Dubai LLC, name_ar: ركس دبي }
//! departments:
//!   SALES01: { code: SALES, name_en: Sales Department, name_ar: قسم المبيعات }
//! nationalities:
//!   الهند: India
//! default_department: OPS
//! ```
//!
//! Tables missing from the file keep their built-in contents. Once loaded,
//! a [`Mappings`] value is never mutated.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Department used when a known job code has no explicit department
pub const DEFAULT_DEPARTMENT: &str = "OPS";

/// Stable code plus bilingual display names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub code: String,
    pub name_en: String,
    pub name_ar: String,
}

impl LookupEntry {
    pub fn new(code: &str, name_en: &str, name_ar: &str) -> Self {
        Self {
            code: code.to_string(),
            name_en: name_en.to_string(),
            name_ar: name_ar.to_string(),
        }
    }
}

/// Exact-match table from a key (source label or job code) to an entry.
///
/// Iteration follows insertion order so generated SQL is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable {
    entries: IndexMap<String, LookupEntry>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_rows(rows: &[(&str, &str, &str, &str)]) -> Self {
        rows.iter()
            .map(|(key, code, en, ar)| (key.to_string(), LookupEntry::new(code, en, ar)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&LookupEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LookupEntry)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries.values()
    }

    /// Entries deduplicated by code, first occurrence wins
    pub fn unique_by_code(&self) -> Vec<&LookupEntry> {
        let mut seen: IndexMap<&str, &LookupEntry> = IndexMap::new();
        for entry in self.entries.values() {
            seen.entry(entry.code.as_str()).or_insert(entry);
        }
        seen.into_values().collect()
    }
}

impl FromIterator<(String, LookupEntry)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (String, LookupEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The full set of lookup tables used by the normalizer and the emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mappings {
    /// Company label -> company
    pub companies: LookupTable,
    /// Job label -> job
    pub jobs: LookupTable,
    /// Job code -> department
    pub departments: LookupTable,
    /// Nationality label -> English name
    pub nationalities: IndexMap<String, String>,
    /// Department code assigned to jobs without a department entry
    pub default_department: String,
}

/// On-disk shape of a mapping file; every table is optional
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MappingFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    companies: Option<LookupTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jobs: Option<LookupTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    departments: Option<LookupTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nationalities: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_department: Option<String>,
}

static BUILTIN: OnceLock<Mappings> = OnceLock::new();

impl Mappings {
    /// Built-in tables, initialised on first use and shared for the process
    pub fn builtin() -> &'static Mappings {
        BUILTIN.get_or_init(builtin_tables)
    }

    /// Load a YAML mapping file layered over the built-in tables.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| ImportError::io(path, e))?;

        let mappings = Self::from_yaml_str(&contents).map_err(|e| match e {
            ImportError::MappingConfig { path: None, message } => {
                ImportError::mapping(Some(path.to_path_buf()), message)
            }
            other => other,
        })?;

        tracing::info!(
            path = %path.display(),
            companies = mappings.companies.len(),
            jobs = mappings.jobs.len(),
            "loaded mapping overrides"
        );

        Ok(mappings)
    }

    /// Parse YAML mapping overrides layered over the built-in tables.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ImportError> {
        let file: MappingFile = serde_yaml::from_str(contents)
            .map_err(|e| ImportError::mapping(None, format!("Failed to parse YAML: {}", e)))?;

        let base = Self::builtin();
        let mappings = Self {
            companies: file.companies.unwrap_or_else(|| base.companies.clone()),
            jobs: file.jobs.unwrap_or_else(|| base.jobs.clone()),
            departments: file.departments.unwrap_or_else(|| base.departments.clone()),
            nationalities: file.nationalities.unwrap_or_else(|| base.nationalities.clone()),
            default_department: file
                .default_department
                .unwrap_or_else(|| base.default_department.clone()),
        };

        mappings.validate()?;
        Ok(mappings)
    }

    /// Render the effective tables as a YAML mapping file
    pub fn to_yaml(&self) -> Result<String, ImportError> {
        let file = MappingFile {
            companies: Some(self.companies.clone()),
            jobs: Some(self.jobs.clone()),
            departments: Some(self.departments.clone()),
            nationalities: Some(self.nationalities.clone()),
            default_department: Some(self.default_department.clone()),
        };

        serde_yaml::to_string(&file)
            .map_err(|e| ImportError::mapping(None, format!("Failed to render YAML: {}", e)))
    }

    /// Check that codes are present and the default department exists.
    pub fn validate(&self) -> Result<(), ImportError> {
        let tables = [
            ("companies", &self.companies),
            ("jobs", &self.jobs),
            ("departments", &self.departments),
        ];

        for (name, table) in tables {
            if let Some((key, _)) = table.iter().find(|(_, e)| e.code.trim().is_empty()) {
                return Err(ImportError::mapping(
                    None,
                    format!("{} entry '{}' has an empty code", name, key),
                ));
            }
        }

        let default_known = self
            .departments
            .values()
            .any(|d| d.code == self.default_department);

        if !default_known {
            return Err(ImportError::mapping(
                None,
                format!(
                    "default department '{}' is not defined in departments",
                    self.default_department
                ),
            ));
        }

        Ok(())
    }

    /// Departments deduplicated by code, in first-seen order
    pub fn unique_departments(&self) -> Vec<&LookupEntry> {
        self.departments.unique_by_code()
    }
}

impl Default for Mappings {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

const COMPANIES: &[(&str, &str, &str, &str)] = &[
    ("يوني فود للتجارة العامة ش ذ م م", "UNIFOOD", "Unifood Trading LLC", "يوني فود للتجارة العامة"),
    ("ركس دبي (ش.ذ.م.م)", "REXDUBAI", "Rex Dubai LLC", "ركس دبي"),
    ("ليموزين 409 لتاجير الشاحنات", "LIMO409", "Limousine 409 Truck Rental", "ليموزين 409 لتأجير الشاحنات"),
    ("ليفرج للتجارة العامة ش ذ م م", "LEVERAGE", "Leverage General Trading LLC", "ليفرج للتجارة العامة"),
    ("اس كيو اف تي للمخازن العامة", "SQFT", "SQFT General Warehouses", "اس كيو اف تي للمخازن العامة"),
];

// Some source labels use Persian code points (ی, ھ); the canonical names do not.
const JOBS: &[(&str, &str, &str, &str)] = &[
    ("موظف مبيعات", "SALES01", "Sales Employee", "موظف مبيعات"),
    ("محاسب", "ACCT01", "Accountant", "محاسب"),
    ("عامل الشحن والتفريغ", "LOAD01", "Loading Worker", "عامل الشحن والتفريغ"),
    ("ممثل مبيعات تجاري", "SALESREP", "Sales Representative", "ممثل مبيعات تجاري"),
    ("عامل مساعد بمتجر", "STOREASS", "Store Assistant", "عامل مساعد بمتجر"),
    ("كاتب ملفات", "FILECLK", "File Clerk", "كاتب ملفات"),
    ("مراسل", "MSGR01", "Messenger", "مراسل"),
    ("سائق شاحنة ثقیلة", "HTRUCKDR", "Heavy Truck Driver", "سائق شاحنة ثقيلة"),
    ("سائق مركبة خفيفة", "LDRV01", "Light Vehicle Driver", "سائق مركبة خفيفة"),
    ("مسؤول إداري", "ADMOFF", "Administrative Officer", "مسؤول إداري"),
    ("مھندس كومبیوتر", "COMPENG", "Computer Engineer", "مهندس كمبيوتر"),
    ("مدير التسويق", "MKTMGR", "Marketing Manager", "مدير التسويق"),
    ("أخصائي تسويق", "MKTSPC", "Marketing Specialist", "أخصائي تسويق"),
];

const DEPARTMENTS: &[(&str, &str, &str, &str)] = &[
    ("SALES01", "SALES", "Sales Department", "قسم المبيعات"),
    ("SALESREP", "SALES", "Sales Department", "قسم المبيعات"),
    ("ACCT01", "FINANCE", "Finance Department", "قسم المالية"),
    ("LOAD01", "OPS", "Operations Department", "قسم العمليات"),
    ("STOREASS", "OPS", "Operations Department", "قسم العمليات"),
    ("FILECLK", "ADMIN", "Administration Department", "قسم الإدارة"),
    ("MSGR01", "ADMIN", "Administration Department", "قسم الإدارة"),
    ("HTRUCKDR", "OPS", "Operations Department", "قسم العمليات"),
    ("LDRV01", "OPS", "Operations Department", "قسم العمليات"),
    ("ADMOFF", "ADMIN", "Administration Department", "قسم الإدارة"),
    ("COMPENG", "IT", "IT Department", "قسم تكنولوجيا المعلومات"),
    ("MKTMGR", "MARKETING", "Marketing Department", "قسم التسويق"),
    ("MKTSPC", "MARKETING", "Marketing Department", "قسم التسويق"),
];

const NATIONALITIES: &[(&str, &str)] = &[
    ("الهند", "India"),
    ("باكستان", "Pakistan"),
    ("إيران", "Iran"),
];

fn builtin_tables() -> Mappings {
    Mappings {
        companies: LookupTable::from_rows(COMPANIES),
        jobs: LookupTable::from_rows(JOBS),
        departments: LookupTable::from_rows(DEPARTMENTS),
        nationalities: NATIONALITIES
            .iter()
            .map(|(ar, en)| (ar.to_string(), en.to_string()))
            .collect(),
        default_department: DEFAULT_DEPARTMENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_sizes() {
        let m = Mappings::builtin();
        assert_eq!(m.companies.len(), 5);
        assert_eq!(m.jobs.len(), 13);
        assert_eq!(m.departments.len(), 13);
        assert_eq!(m.nationalities.len(), 3);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_unique_departments_keep_first_seen_order() {
        let codes: Vec<&str> = Mappings::builtin()
            .unique_departments()
            .into_iter()
            .map(|d| d.code.as_str())
            .collect();
        assert_eq!(codes, vec!["SALES", "FINANCE", "OPS", "ADMIN", "IT", "MARKETING"]);
    }

    #[test]
    fn test_yaml_override_replaces_only_given_tables() {
        let yaml = r#"
companies:
  "Acme Arabic": { code: ACME, name_en: Acme LLC, name_ar: أكمي }
"#;
        let m = Mappings::from_yaml_str(yaml).unwrap();
        assert_eq!(m.companies.len(), 1);
        assert_eq!(m.companies.get("Acme Arabic").unwrap().code, "ACME");
        assert_eq!(m.jobs.len(), 13);
        assert_eq!(m.default_department, "OPS");
    }

    #[test]
    fn test_unknown_default_department_is_rejected() {
        let yaml = "default_department: LOGISTICS\n";
        let err = Mappings::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("LOGISTICS"));
    }

    #[test]
    fn test_empty_code_is_rejected() {
        let yaml = r#"
jobs:
  "Clerk": { code: "  ", name_en: Clerk, name_ar: كاتب }
"#;
        assert!(matches!(
            Mappings::from_yaml_str(yaml),
            Err(ImportError::MappingConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Mappings::from_yaml_str("companys: {}\n").is_err());
    }

    #[test]
    fn test_yaml_export_reloads_to_same_tables() {
        let yaml = Mappings::builtin().to_yaml().unwrap();
        let reloaded = Mappings::from_yaml_str(&yaml).unwrap();
        assert_eq!(&reloaded, Mappings::builtin());
    }
}
