//! SQL script generation.
//!
//! The script is a single transaction: dimension rows first (companies,
//! departments, jobs), then employees, then verification queries. Every
//! insert is keyed on its natural code and skips rows that already exist, so
//! the script is safe to run repeatedly.

use std::fmt;
use std::str::FromStr;

use crate::lookup::{LookupEntry, Mappings};
use crate::normalize::ResolvedEmployee;

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    #[default]
    PostgreSQL,
    MySQL,
    MariaDB,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::PostgreSQL => "postgresql",
            DatabaseType::MySQL => "mysql",
            DatabaseType::MariaDB => "mariadb",
        }
    }

    /// MySQL and MariaDB share syntax and both lack `ON CONFLICT`
    pub fn is_mysql_like(&self) -> bool {
        matches!(self, DatabaseType::MySQL | DatabaseType::MariaDB)
    }

    /// Detect the dialect from a connection URL scheme
    pub fn from_url(url: &str) -> Option<DatabaseType> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(DatabaseType::PostgreSQL)
        } else if url.starts_with("mysql://") {
            Some(DatabaseType::MySQL)
        } else if url.starts_with("mariadb://") {
            Some(DatabaseType::MariaDB)
        } else {
            None
        }
    }

    fn begin(&self) -> &'static str {
        if self.is_mysql_like() {
            "START TRANSACTION;"
        } else {
            "BEGIN;"
        }
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(DatabaseType::PostgreSQL),
            "mysql" => Ok(DatabaseType::MySQL),
            "mariadb" => Ok(DatabaseType::MariaDB),
            other => Err(format!(
                "Unsupported database type: '{}'. Supported types: postgresql, mysql, mariadb",
                other
            )),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
///
/// Single quotes are doubled for every dialect. MySQL and MariaDB also treat
/// backslash as an escape character under the default `sql_mode`, so it is
/// doubled there as well.
pub fn escape_sql_string(value: &str, dialect: DatabaseType) -> String {
    let quoted = value.replace('\'', "''");
    if dialect.is_mysql_like() {
        quoted.replace('\\', "\\\\")
    } else {
        quoted
    }
}

/// Render an optional value as a quoted literal or `NULL`
pub fn sql_literal(value: Option<&str>, dialect: DatabaseType) -> String {
    match value {
        Some(v) => format!("'{}'", escape_sql_string(v, dialect)),
        None => "NULL".to_string(),
    }
}

const DIMENSION_COLUMNS: [&str; 3] = ["code", "name_en", "name_ar"];

const EMPLOYEE_COLUMNS: [&str; 10] = [
    "employee_no",
    "name_en",
    "name_ar",
    "nationality",
    "company_id",
    "department_id",
    "job_id",
    "passport_no",
    "card_no",
    "card_expiry",
];

/// A generated script, one entry per output line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlScript {
    lines: Vec<String>,
}

impl SqlScript {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Count of `INSERT INTO <table>` statements in the script
    pub fn insert_count(&self, table: &str) -> usize {
        let prefix = format!("INSERT INTO {} ", table);
        self.lines.iter().filter(|l| l.starts_with(&prefix)).count()
    }
}

impl fmt::Display for SqlScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Renders lookup tables and resolved employees as an idempotent SQL script
pub struct SqlEmitter<'a> {
    mappings: &'a Mappings,
    dialect: DatabaseType,
}

impl<'a> SqlEmitter<'a> {
    pub fn new(mappings: &'a Mappings, dialect: DatabaseType) -> Self {
        Self { mappings, dialect }
    }

    pub fn dialect(&self) -> DatabaseType {
        self.dialect
    }

    fn literal(&self, value: &str) -> String {
        sql_literal(Some(value), self.dialect)
    }

    fn id_lookup(&self, table: &str, code: &str) -> String {
        format!("(SELECT id FROM {} WHERE code = {})", table, self.literal(code))
    }

    /// Build the complete script for `employees`
    pub fn emit(&self, employees: &[ResolvedEmployee]) -> SqlScript {
        let mut script = SqlScript::default();

        self.write_header(&mut script);
        script.push(self.dialect.begin());
        script.blank();

        script.push("-- Step 1: Insert Companies (skip if exists)");
        script.blank();
        for company in self.mappings.companies.values() {
            self.write_dimension(&mut script, "companies", company);
        }

        script.push("-- Step 2: Insert Departments (skip if exists)");
        script.blank();
        for department in self.mappings.unique_departments() {
            self.write_dimension(&mut script, "departments", department);
        }

        script.push("-- Step 3: Insert Jobs (skip if exists)");
        script.blank();
        for job in self.mappings.jobs.values() {
            self.write_dimension(&mut script, "jobs", job);
        }

        script.push("-- Step 4: Insert Employees (skip if employee_no exists)");
        script.blank();
        for employee in employees {
            self.write_employee(&mut script, employee);
        }

        script.push("COMMIT;");
        script.blank();
        write_verification_queries(&mut script);

        tracing::debug!(
            dialect = %self.dialect,
            employees = employees.len(),
            lines = script.lines.len(),
            "rendered SQL script"
        );

        script
    }

    fn write_header(&self, script: &mut SqlScript) {
        script.push("-- SAFE EMPLOYEE DATA IMPORT");
        script.push("-- Generated automatically from CSV data");
        script.push(format!("-- Target database: {}", self.dialect));
        script.push("-- This script will:");
        script.push("--   1. Create missing companies, departments, and jobs");
        script.push("--   2. Insert employees with conflict handling (skip duplicates)");
        script.push("--   3. Preserve existing data");
        script.blank();
    }

    fn write_dimension(&self, script: &mut SqlScript, table: &str, entry: &LookupEntry) {
        let values = [
            self.literal(&entry.code),
            self.literal(&entry.name_en),
            self.literal(&entry.name_ar),
        ];

        script.push(format!("INSERT INTO {} ({})", table, DIMENSION_COLUMNS.join(", ")));
        if self.dialect.is_mysql_like() {
            script.push(format!("SELECT {}", values.join(", ")));
            script.push("FROM DUAL");
            script.push(format!(
                "WHERE NOT EXISTS (SELECT 1 FROM {} WHERE code = {});",
                table, values[0]
            ));
        } else {
            script.push(format!("VALUES ({})", values.join(", ")));
            script.push("ON CONFLICT (code) DO NOTHING;");
        }
        script.blank();
    }

    fn write_employee(&self, script: &mut SqlScript, employee: &ResolvedEmployee) {
        let employee_no = self.literal(&employee.employee_no);
        let values = [
            employee_no.clone(),
            self.literal(&employee.name_en),
            self.literal(&employee.name_ar),
            self.literal(&employee.nationality),
            self.id_lookup("companies", &employee.company_code),
            self.id_lookup("departments", &employee.department_code),
            self.id_lookup("jobs", &employee.job_code),
            self.literal(&employee.passport_no),
            self.literal(&employee.card_no),
            sql_literal(employee.card_expiry.as_deref(), self.dialect),
        ];

        script.push("INSERT INTO employees (");
        script.push(format!("  {},", EMPLOYEE_COLUMNS[0..4].join(", ")));
        script.push(format!("  {},", EMPLOYEE_COLUMNS[4..7].join(", ")));
        script.push(format!("  {}", EMPLOYEE_COLUMNS[7..10].join(", ")));
        script.push(")");

        if self.dialect.is_mysql_like() {
            script.push("SELECT");
            push_value_list(script, &values);
            script.push("FROM DUAL");
            script.push(format!(
                "WHERE NOT EXISTS (SELECT 1 FROM employees WHERE employee_no = {});",
                employee_no
            ));
        } else {
            script.push("VALUES (");
            push_value_list(script, &values);
            script.push(")");
            script.push("ON CONFLICT (employee_no) DO NOTHING;");
        }
        script.blank();
    }
}

fn push_value_list(script: &mut SqlScript, values: &[String]) {
    let last = values.len().saturating_sub(1);
    for (i, value) in values.iter().enumerate() {
        let comma = if i < last { "," } else { "" };
        script.push(format!("  {}{}", value, comma));
    }
}

fn write_verification_queries(script: &mut SqlScript) {
    script.push("-- Verification Queries");
    for table in ["companies", "departments", "jobs", "employees"] {
        script.push(format!("SELECT COUNT(*) as total_{} FROM {};", table, table));
    }
    script.blank();
    script.push("-- View inserted employees");
    script.push("SELECT e.employee_no, e.name_en, c.name_en as company, d.name_en as department, j.name_en as job");
    script.push("FROM employees e");
    script.push("JOIN companies c ON e.company_id = c.id");
    script.push("JOIN departments d ON e.department_id = d.id");
    script.push("JOIN jobs j ON e.job_id = j.id");
    script.push("ORDER BY e.employee_no;");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> ResolvedEmployee {
        ResolvedEmployee {
            employee_no: "123457000000".to_string(),
            name_en: "Sa'id O'Neil".to_string(),
            name_ar: "سعيد".to_string(),
            nationality: "India".to_string(),
            company_code: "REXDUBAI".to_string(),
            department_code: "SALES".to_string(),
            job_code: "SALES01".to_string(),
            passport_no: "P'1".to_string(),
            card_no: "C1".to_string(),
            card_expiry: None,
        }
    }

    fn employee_block(script: &SqlScript) -> Vec<String> {
        let lines = script.lines();
        let start = lines
            .iter()
            .position(|l| l == "INSERT INTO employees (")
            .unwrap();
        let end = lines[start..]
            .iter()
            .position(|l| l.trim().is_empty())
            .unwrap();
        lines[start..start + end].to_vec()
    }

    #[test]
    fn test_escape_sql_string() {
        let pg = DatabaseType::PostgreSQL;
        assert_eq!(escape_sql_string("O'Neil", pg), "O''Neil");
        assert_eq!(escape_sql_string("''", pg), "''''");
        assert_eq!(escape_sql_string("plain", pg), "plain");
        assert_eq!(escape_sql_string(r"C:\dir\", pg), r"C:\dir\");
    }

    #[test]
    fn test_mysql_escaping_doubles_backslashes() {
        let mysql = DatabaseType::MySQL;
        assert_eq!(escape_sql_string(r"Ali\", mysql), r"Ali\\");
        assert_eq!(escape_sql_string(r"O\'Neil", DatabaseType::MariaDB), r"O\\''Neil");
        assert_eq!(sql_literal(None, mysql), "NULL");
    }

    #[test]
    fn test_trailing_backslash_cannot_close_mysql_literal() {
        let mut emp = employee();
        emp.name_en = r"Ali\".to_string();

        let mysql = SqlEmitter::new(Mappings::builtin(), DatabaseType::MySQL).emit(&[emp.clone()]);
        assert!(employee_block(&mysql).iter().any(|l| l == r"  'Ali\\',"));

        let pg = SqlEmitter::new(Mappings::builtin(), DatabaseType::PostgreSQL).emit(&[emp]);
        assert!(employee_block(&pg).iter().any(|l| l == r"  'Ali\',"));
    }

    #[test]
    fn test_database_type_parsing() {
        assert_eq!("pg".parse::<DatabaseType>().unwrap(), DatabaseType::PostgreSQL);
        assert_eq!("MySQL".parse::<DatabaseType>().unwrap(), DatabaseType::MySQL);
        assert!("oracle".parse::<DatabaseType>().is_err());
        assert_eq!(DatabaseType::from_url("mysql://u@h/db"), Some(DatabaseType::MySQL));
        assert_eq!(DatabaseType::from_url("sqlite://x"), None);
    }

    #[test]
    fn test_script_structure_and_order() {
        let mappings = Mappings::builtin();
        let script = SqlEmitter::new(mappings, DatabaseType::PostgreSQL).emit(&[employee()]);
        let text = script.to_string();

        let begin = text.find("BEGIN;").unwrap();
        let companies = text.find("INSERT INTO companies").unwrap();
        let departments = text.find("INSERT INTO departments").unwrap();
        let jobs = text.find("INSERT INTO jobs").unwrap();
        let employees = text.find("INSERT INTO employees").unwrap();
        let commit = text.find("COMMIT;").unwrap();
        let verify = text.find("SELECT COUNT(*) as total_companies").unwrap();

        assert!(begin < companies && companies < departments && departments < jobs);
        assert!(jobs < employees && employees < commit && commit < verify);
        assert!(text.ends_with("ORDER BY e.employee_no;"));

        assert_eq!(script.insert_count("companies"), 5);
        assert_eq!(script.insert_count("departments"), 6);
        assert_eq!(script.insert_count("jobs"), 13);
        assert_eq!(script.insert_count("employees"), 1);
    }

    #[test]
    fn test_employee_statement_has_ten_values_with_escaping() {
        let script = SqlEmitter::new(Mappings::builtin(), DatabaseType::PostgreSQL).emit(&[employee()]);
        let block = employee_block(&script);

        let values_at = block.iter().position(|l| l == "VALUES (").unwrap();
        let values: Vec<&String> = block[values_at + 1..]
            .iter()
            .take_while(|l| l.starts_with("  "))
            .collect();

        assert_eq!(values.len(), 10);
        assert_eq!(values[1], "  'Sa''id O''Neil',");
        assert_eq!(values[4], "  (SELECT id FROM companies WHERE code = 'REXDUBAI'),");
        assert_eq!(values[5], "  (SELECT id FROM departments WHERE code = 'SALES'),");
        assert_eq!(values[6], "  (SELECT id FROM jobs WHERE code = 'SALES01'),");
        assert_eq!(values[7], "  'P''1',");
        assert_eq!(values[9], "  NULL");
        assert_eq!(block.last().unwrap(), "ON CONFLICT (employee_no) DO NOTHING;");
    }

    #[test]
    fn test_card_expiry_renders_quoted_when_present() {
        let mut emp = employee();
        emp.card_expiry = Some("2026-01-31".to_string());
        let script = SqlEmitter::new(Mappings::builtin(), DatabaseType::PostgreSQL).emit(&[emp]);
        assert!(script.lines().iter().any(|l| l == "  '2026-01-31'"));
    }

    #[test]
    fn test_every_insert_is_conflict_guarded() {
        for dialect in [DatabaseType::PostgreSQL, DatabaseType::MySQL] {
            let script = SqlEmitter::new(Mappings::builtin(), dialect).emit(&[employee()]);
            let inserts = script.lines().iter().filter(|l| l.starts_with("INSERT INTO")).count();
            let guard = if dialect.is_mysql_like() { "WHERE NOT EXISTS" } else { "ON CONFLICT" };
            let guards = script.lines().iter().filter(|l| l.starts_with(guard)).count();
            assert_eq!(inserts, guards, "dialect {}", dialect);
        }
    }

    #[test]
    fn test_mysql_emulates_upsert_with_not_exists() {
        let script = SqlEmitter::new(Mappings::builtin(), DatabaseType::MySQL).emit(&[employee()]);
        let text = script.to_string();

        assert!(text.contains("START TRANSACTION;"));
        assert!(!text.contains("ON CONFLICT"));
        assert!(text.contains(
            "WHERE NOT EXISTS (SELECT 1 FROM companies WHERE code = 'UNIFOOD');"
        ));
        assert!(text.contains(
            "WHERE NOT EXISTS (SELECT 1 FROM employees WHERE employee_no = '123457000000');"
        ));
    }

    #[test]
    fn test_postgres_dimension_statement_shape() {
        let script = SqlEmitter::new(Mappings::builtin(), DatabaseType::PostgreSQL).emit(&[]);
        let lines = script.lines();
        let at = lines
            .iter()
            .position(|l| l == "INSERT INTO departments (code, name_en, name_ar)")
            .unwrap();
        assert_eq!(lines[at + 1], "VALUES ('SALES', 'Sales Department', 'قسم المبيعات')");
        assert_eq!(lines[at + 2], "ON CONFLICT (code) DO NOTHING;");
    }
}
