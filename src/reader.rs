//! CSV reader producing raw rows keyed by header.
//!
//! Rows whose `Employee No` cell is empty or whitespace-only are skipped.
//! Every value is trimmed before it is handed out.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ImportError;
use crate::record::{columns, EmployeeRecord, RawRow};

/// Lazy iterator over the data rows of an employee export
pub struct RowReader<R: io::Read> {
    inner: csv::Reader<R>,
    headers: Vec<String>,
    record: csv::StringRecord,
    path: PathBuf,
    skipped_blank: usize,
}

impl RowReader<File> {
    /// Open `path` and validate its header row.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ImportError::io(path, e))?;
        Self::with_path(file, path.to_path_buf())
    }
}

impl<R: io::Read> RowReader<R> {
    /// Wrap any reader; `path` is only used in error messages.
    pub fn from_reader(reader: R) -> Result<Self, ImportError> {
        Self::with_path(reader, PathBuf::from("<input>"))
    }

    fn with_path(reader: R, path: PathBuf) -> Result<Self, ImportError> {
        let mut inner = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = inner
            .headers()
            .map_err(|e| attach_path(e.into(), &path))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|required| !headers.iter().any(|h| h.as_str() == **required))
            .map(|s| s.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::MissingHeaders { missing });
        }

        Ok(Self {
            inner,
            headers,
            record: csv::StringRecord::new(),
            path,
            skipped_blank: 0,
        })
    }

    /// Header names as found in the file (trimmed)
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows dropped so far because the employee number was blank
    pub fn skipped_blank(&self) -> usize {
        self.skipped_blank
    }

    fn to_row(&self) -> RawRow {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = self.record.get(idx).unwrap_or("").trim().to_string();
                (header.clone(), value)
            })
            .collect()
    }
}

impl<R: io::Read> Iterator for RowReader<R> {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.read_record(&mut self.record) {
                Ok(false) => return None,
                Ok(true) => {
                    let row = self.to_row();
                    let key_blank = row
                        .get(columns::EMPLOYEE_NO)
                        .map_or(true, |v| v.is_empty());

                    if key_blank {
                        self.skipped_blank += 1;
                        tracing::debug!(
                            line = self.record.position().map(|p| p.line()),
                            "skipping row with empty employee number"
                        );
                        continue;
                    }

                    return Some(Ok(row));
                }
                Err(e) => return Some(Err(attach_path(e.into(), &self.path))),
            }
        }
    }
}

fn attach_path(err: ImportError, path: &Path) -> ImportError {
    match err {
        ImportError::Io { source, .. } => ImportError::io(path, source),
        other => other,
    }
}

/// Read the whole export into memory as employee records.
pub fn read_employees<P: AsRef<Path>>(path: P) -> Result<Vec<EmployeeRecord>, ImportError> {
    let path = path.as_ref();
    let reader = RowReader::open(path)?;
    let records = collect_records(reader)?;

    tracing::info!(
        path = %path.display(),
        rows = records.len(),
        "read employee rows"
    );

    Ok(records)
}

/// Drain a row reader into employee records.
pub fn collect_records<R: io::Read>(
    mut reader: RowReader<R>,
) -> Result<Vec<EmployeeRecord>, ImportError> {
    let mut records = Vec::new();
    for row in reader.by_ref() {
        records.push(EmployeeRecord::from_row(&row?)?);
    }

    if reader.skipped_blank() > 0 {
        tracing::info!(
            skipped = reader.skipped_blank(),
            "ignored rows without an employee number"
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Employee No,Name (Arabic),Name (English),Department,Job Title,Company,Nationality,Passport No,Card No,Card Expiry\n";

    #[test]
    fn test_rows_are_trimmed_and_keyed_by_header() {
        let data = format!("{} 1001 , أحمد ,Ahmed ,المبيعات,محاسب,ركس دبي (ش.ذ.م.م),الهند,P1,C1, \n", HEADER);
        let mut reader = RowReader::from_reader(data.as_bytes()).unwrap();

        let row = reader.next().unwrap().unwrap();
        assert_eq!(row.get("Employee No").map(String::as_str), Some("1001"));
        assert_eq!(row.get("Name (English)").map(String::as_str), Some("Ahmed"));
        assert_eq!(row.get("Card Expiry").map(String::as_str), Some(""));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_blank_employee_numbers_are_skipped() {
        let data = format!(
            "{},a,b,c,d,e,f,g,h,\n   ,a,b,c,d,e,f,g,h,\n2002,a,b,c,d,e,f,g,h,\n",
            HEADER
        );
        let reader = RowReader::from_reader(data.as_bytes()).unwrap();
        let records = collect_records(reader).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employee_no, "2002");
    }

    #[test]
    fn test_missing_headers_is_format_error() {
        let data = "Employee No,Name (English)\n1,Ahmed\n";
        let result = RowReader::from_reader(data.as_bytes());

        match result {
            Err(ImportError::MissingHeaders { missing }) => {
                assert!(missing.contains(&"Company".to_string()));
                assert!(missing.contains(&"Job Title".to_string()));
                assert!(!missing.contains(&"Employee No".to_string()));
            }
            _ => panic!("expected MissingHeaders"),
        }
    }

    #[test]
    fn test_bom_prefixed_header_is_accepted() {
        let data = format!("\u{feff}{}1,a,b,c,d,e,f,g,h,\n", HEADER);
        let reader = RowReader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(reader.headers()[0], "Employee No");
    }

    #[test]
    fn test_short_rows_yield_empty_cells() {
        let data = format!("{}3003,a,b\n", HEADER);
        let records = collect_records(RowReader::from_reader(data.as_bytes()).unwrap()).unwrap();
        assert_eq!(records[0].passport_no, "");
        assert_eq!(records[0].card_expiry, None);
    }

    #[test]
    fn test_open_missing_file() {
        let result = RowReader::open("/definitely/not/here.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound { .. })));
    }
}
