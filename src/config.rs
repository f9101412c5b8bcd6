//! Run configuration and its resolution from CLI flags and the environment.

use std::path::{Path, PathBuf};

use crate::error::ImportError;
use crate::lookup::Mappings;
use crate::sql::DatabaseType;

/// Environment variable selecting the SQL dialect
pub const DATABASE_TYPE_ENV: &str = "EMPLOYEE_SQL_DATABASE_TYPE";

/// Environment variable pointing at a mapping override file
pub const MAPPINGS_ENV: &str = "EMPLOYEE_SQL_MAPPINGS";

pub const DEFAULT_INPUT: &str = "employees.csv";
pub const DEFAULT_OUTPUT: &str = "SAFE_COMPLETE_DATA_INSERT.sql";

/// Everything a pipeline run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mappings: Mappings,
    pub database: DatabaseType,
}

impl RunConfig {
    /// Config with built-in mappings and the PostgreSQL dialect
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            mappings: Mappings::default(),
            database: DatabaseType::default(),
        }
    }

    pub fn with_mappings(mut self, mappings: Mappings) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_database(mut self, database: DatabaseType) -> Self {
        self.database = database;
        self
    }
}

/// Determine the dialect with precedence: CLI > env var > DATABASE_URL > default
pub fn detect_database_type(cli_override: Option<&str>) -> Result<DatabaseType, String> {
    if let Some(db_type) = cli_override {
        let parsed = db_type.parse::<DatabaseType>()?;
        tracing::info!(database = %parsed, "using database type from CLI flag");
        return Ok(parsed);
    }

    if let Ok(db_type) = std::env::var(DATABASE_TYPE_ENV) {
        let parsed = db_type
            .parse::<DatabaseType>()
            .map_err(|e| format!("{} (from {})", e, DATABASE_TYPE_ENV))?;
        tracing::info!(database = %parsed, "using database type from {}", DATABASE_TYPE_ENV);
        return Ok(parsed);
    }

    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        if let Some(parsed) = DatabaseType::from_url(&database_url) {
            tracing::info!(database = %parsed, "detected database type from DATABASE_URL");
            return Ok(parsed);
        }
    }

    tracing::debug!("using default database type: postgresql");
    Ok(DatabaseType::default())
}

/// Load mappings from the CLI path, then the env var, else the built-in tables
pub fn load_mappings(cli_path: Option<&Path>) -> Result<Mappings, ImportError> {
    let env_path = std::env::var_os(MAPPINGS_ENV).map(PathBuf::from);

    match cli_path.map(Path::to_path_buf).or(env_path) {
        Some(path) => Mappings::load_from_file(path),
        None => Ok(Mappings::default()),
    }
}
