use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::predict::PredictionRow;
use crate::utils::errors::{Error, Result};

/// Writes [`PredictionRow`]s and derived views as CSV
///
/// The header is written once, before the first row.
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::predict::Writer;
///
/// let output = Vec::new(); // substitute this with proper IO (io::stdout())
/// let mut writer = Writer::new(output);
/// writer.write_header(&["variant", "delta_psi"]).unwrap();
/// writer.write_record(&["1:150:G>T", "-0.2"]).unwrap();
/// // a second header is ignored
/// writer.write_header(&["variant", "delta_psi"]).unwrap();
///
/// assert_eq!(
///     writer.into_inner().unwrap(),
///     b"variant,delta_psi\n1:150:G>T,-0.2\n"
/// );
/// ```
pub struct Writer<W: Write> {
    inner: csv::Writer<W>,
    header_written: bool,
}

impl Writer<File> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path.as_ref())?))
    }
}

impl<W: Write> Writer<W> {
    /// Creates a new generic Writer for any `std::io::Write` object
    pub fn new(writer: W) -> Self {
        Writer {
            inner: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
            header_written: false,
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))
    }

    pub fn write_header(&mut self, columns: &[&str]) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.inner.write_record(columns)?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Ok(self.inner.write_record(record)?)
    }

    /// Writes predictions, preceded by the header if it was not written yet
    pub fn write_rows(&mut self, rows: &[PredictionRow], with_samples: bool) -> Result<()> {
        self.write_header(&PredictionRow::columns(with_samples))?;
        for row in rows {
            self.inner.write_record(row.record(with_samples))?;
        }
        Ok(())
    }
}
