//! Tabular spectral data.
//!
//! A table is a text file with one spectrum per line, each line holding
//! comma-separated values sampled evenly over a wavelength interval that the
//! caller supplies. Blank lines and lines starting with `#` are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::spectrum::{Spectrum, SpectrumError};

#[derive(Error, Debug)]
pub enum SpectralDataError {
    #[error("Failed to read spectral data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}:{column}: invalid value {value:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        value: String,
    },

    #[error("{path}:{line}: row has {found} values, expected {expected}")]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}: expected {expected} rows, found {found}")]
    RowCount {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{path}: no data rows")]
    Empty { path: PathBuf },

    #[error("{path}: {source}")]
    Spectrum {
        path: PathBuf,
        #[source]
        source: SpectrumError,
    },
}

pub type SpectralDataResult<T> = Result<T, SpectralDataError>;

/// Rows of evenly sampled spectral values.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralTable {
    path: PathBuf,
    rows: Vec<Vec<f32>>,
}

impl SpectralTable {
    /// Parse table text. `path` is only used in error messages.
    pub fn parse(text: &str, path: impl Into<PathBuf>) -> SpectralDataResult<Self> {
        let path = path.into();
        let mut rows: Vec<Vec<f32>> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = match line.strip_suffix(',') {
                Some(stripped) => {
                    log::warn!(
                        "{}:{}: ignoring trailing comma",
                        path.display(),
                        line_number
                    );
                    stripped.trim_end()
                }
                None => line,
            };

            let row = line
                .split(',')
                .enumerate()
                .map(|(column, field)| {
                    let field = field.trim();
                    field
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| SpectralDataError::Parse {
                            path: path.clone(),
                            line: line_number,
                            column: column + 1,
                            value: field.to_string(),
                        })
                })
                .collect::<SpectralDataResult<Vec<f32>>>()?;

            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(SpectralDataError::Ragged {
                        path,
                        line: line_number,
                        expected: first.len(),
                        found: row.len(),
                    });
                }
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SpectralDataError::Empty { path });
        }

        Ok(Self { path, rows })
    }

    /// Require exactly `expected` rows.
    pub fn expect_rows(self, expected: usize) -> SpectralDataResult<Self> {
        if self.rows.len() != expected {
            return Err(SpectralDataError::RowCount {
                path: self.path,
                expected,
                found: self.rows.len(),
            });
        }
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Map every row onto `[lambda_min, lambda_max]`.
    pub fn to_spectra(&self, lambda_min: f32, lambda_max: f32) -> SpectralDataResult<Vec<Spectrum>> {
        self.rows
            .iter()
            .map(|row| {
                Spectrum::from_uniform(row, lambda_min, lambda_max).map_err(|source| {
                    SpectralDataError::Spectrum {
                        path: self.path.clone(),
                        source,
                    }
                })
            })
            .collect()
    }
}

/// Read a spectral table holding exactly `expected_rows` rows.
pub fn load_spectral_data(
    path: impl AsRef<Path>,
    expected_rows: usize,
) -> SpectralDataResult<SpectralTable> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SpectralDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = SpectralTable::parse(&text, path)?.expect_rows(expected_rows)?;
    log::debug!(
        "Loaded spectral data: {} ({} rows x {} values)",
        path.display(),
        table.len(),
        table.rows[0].len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let text = "# white, green\n0.7, 0.75,0.8\n\n0.1,0.5,0.1\n";
        let table = SpectralTable::parse(text, "inline.csv").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], vec![0.7, 0.75, 0.8]);
        assert_eq!(table.rows()[1], vec![0.1, 0.5, 0.1]);
    }

    #[test]
    fn test_trailing_comma() {
        let table = SpectralTable::parse("1,2,3,\n4,5,6\n", "inline.csv").unwrap();
        assert_eq!(table.rows()[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_error_location() {
        let err = SpectralTable::parse("0.1,0.2\n0.3,abc\n", "bad.csv").unwrap_err();

        match err {
            SpectralDataError::Parse {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!((line, column), (2, 2));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_rows() {
        let err = SpectralTable::parse("0.1,0.2\n0.3\n", "ragged.csv").unwrap_err();
        assert!(matches!(
            err,
            SpectralDataError::Ragged {
                line: 2,
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_table() {
        let err = SpectralTable::parse("# nothing\n\n", "empty.csv").unwrap_err();
        assert!(matches!(err, SpectralDataError::Empty { .. }));
    }

    #[test]
    fn test_row_count() {
        let table = SpectralTable::parse("1,2\n3,4\n", "two.csv").unwrap();
        let err = table.expect_rows(3).unwrap_err();

        assert!(matches!(
            err,
            SpectralDataError::RowCount {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_to_spectra() {
        let table = SpectralTable::parse("0.0,1.0,0.0\n", "peak.csv").unwrap();
        let spectra = table.to_spectra(400.0, 700.0).unwrap();

        assert_eq!(spectra.len(), 1);
        assert_eq!(spectra[0].evaluate(550.0), 1.0);
        assert!((spectra[0].evaluate(475.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join("prism-spectral-data-test.csv");
        fs::write(&path, "0.5,0.5\n").unwrap();

        let table = load_spectral_data(&path, 1).unwrap();
        assert_eq!(table.rows()[0], vec![0.5, 0.5]);

        assert!(matches!(
            load_spectral_data(&path, 2),
            Err(SpectralDataError::RowCount { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("prism-no-such-table.csv");
        assert!(matches!(
            load_spectral_data(path, 1),
            Err(SpectralDataError::Io { .. })
        ));
    }
}
