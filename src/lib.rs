//! # employee-sql: CSV employee exports to idempotent SQL
//!
//! Converts an HR spreadsheet export into a SQL script that loads companies,
//! departments, jobs and employees into a relational schema. Running the
//! script twice leaves the database in the same state as running it once.
//!
//! ## Pipeline
//!
//! 1. **Reader** ([`reader`]): parses the CSV, skips rows without an employee
//!    number and trims every cell.
//! 2. **Normalizer** ([`normalize`]): maps Arabic company and job labels to
//!    stable codes, infers the department from the job, translates
//!    nationalities and repairs employee numbers mangled into exponent form.
//! 3. **Emitter** ([`sql`]): renders dimension rows and employees as
//!    conflict-skipping inserts, with foreign keys resolved by sub-query on
//!    the natural code.
//! 4. **Writer** ([`writer`]): writes the script and reports run counts.
//!
//! ## Example
//!
//! ```no_run
//! use employee_sql::{pipeline, RunConfig};
//!
//! let config = RunConfig::new("employees.csv", "import.sql");
//! let report = pipeline::generate(&config)?;
//! println!("{}", report.summary);
//! # Ok::<(), employee_sql::ImportError>(())
//! ```

pub mod config;
pub mod error;
pub mod lookup;
pub mod normalize;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod sql;
pub mod writer;

pub use config::{detect_database_type, load_mappings, RunConfig};
pub use error::ImportError;
pub use lookup::{LookupEntry, LookupTable, Mappings};
pub use normalize::{normalize_employee_number, Normalizer, Resolution, ResolvedEmployee, SkipReason};
pub use pipeline::{RunReport, SkippedRecord};
pub use reader::{read_employees, RowReader};
pub use record::EmployeeRecord;
pub use sql::{escape_sql_string, DatabaseType, SqlEmitter, SqlScript};
pub use writer::{write_script, RunSummary};
