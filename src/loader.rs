//! CSV ingestion: sample files and uploads become a [`Dataset`].
//!
//! Bytes are decompressed (when the name or options say so), decoded as UTF-8
//! with a Latin-1 fallback, scrubbed of records whose field count does not
//! match the header, and finally parsed by polars with type inference.

use polars::prelude::*;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::{CompressionFormat, SampleFile};
use crate::config::AppConfig;
use crate::dataset::{Dataset, SkippedRow, TextEncoding};

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "gz" => Some(Self::Gzip),
            "zst" | "zstd" => Some(Self::Zstd),
            "bz2" | "bz" => Some(Self::Bzip2),
            "xz" => Some(Self::Xz),
            _ => None,
        }
    }
}

impl SampleFile {
    /// Every sample, in sidebar order
    pub const ALL: [SampleFile; 3] = [SampleFile::Sales, SampleFile::Submission, SampleFile::Test];

    pub fn label(&self) -> &'static str {
        match self {
            SampleFile::Sales => "Sample Sales Data",
            SampleFile::Submission => "Sample Submission Format",
            SampleFile::Test => "Sample Test Data",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SampleFile::Sales => "train_0irEZ2H.csv",
            SampleFile::Submission => "sample_submission_pzljTaX.csv",
            SampleFile::Test => "test_nfaJ3J5.csv",
        }
    }
}

/// A file the user handed to the application, already read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an upload from disk; the file name becomes the display name
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sample(SampleFile),
    Upload(UploadedFile),
}

impl DataSource {
    pub fn name(&self) -> &str {
        match self {
            DataSource::Sample(sample) => sample.label(),
            DataSource::Upload(file) => &file.name,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not decompress {name} as {format:?}: {source}")]
    Decompress {
        name: String,
        format: CompressionFormat,
        source: std::io::Error,
    },
    #[error("{name} is empty: no header row found")]
    Empty { name: String },
    #[error("Could not read CSV records from {name}: {message}")]
    Csv { name: String, message: String },
    #[error("Could not parse {name}: {source}")]
    Parse { name: String, source: PolarsError },
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub infer_schema_length: usize,
    /// Forces the compression of uploads instead of guessing from the name
    pub compression: Option<CompressionFormat>,
    pub samples_dir: PathBuf,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl LoadOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            delimiter: config.loading.delimiter,
            infer_schema_length: config.loading.infer_schema_length,
            compression: None,
            samples_dir: config.samples.directory.clone(),
        }
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_samples_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.samples_dir = dir.into();
        self
    }

    pub fn sample_path(&self, sample: SampleFile) -> PathBuf {
        self.samples_dir.join(sample.file_name())
    }
}

/// Load a dataset from a sample or an upload
pub fn load(source: &DataSource, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let name = source.name();
    let bytes: Cow<[u8]> = match source {
        DataSource::Sample(sample) => {
            let path = options.sample_path(*sample);
            let bytes = std::fs::read(&path).map_err(|source| LoadError::Io { path, source })?;
            Cow::Owned(bytes)
        }
        DataSource::Upload(file) => {
            let format = options
                .compression
                .or_else(|| CompressionFormat::from_extension(Path::new(&file.name)));
            match format {
                Some(format) => Cow::Owned(decompress(name, &file.bytes, format)?),
                None => Cow::Borrowed(file.bytes.as_slice()),
            }
        }
    };

    parse_bytes(name, &bytes, options)
}

/// Decode, scrub and parse CSV bytes
pub fn parse_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> Result<Dataset, LoadError> {
    let (text, encoding) = decode_text(bytes);
    if encoding == TextEncoding::Latin1 {
        tracing::warn!(source = name, "input is not valid UTF-8, decoded as Latin-1");
    }

    let (clean, skipped_rows) = drop_malformed_records(name, &text, options.delimiter)?;
    for row in &skipped_rows {
        tracing::warn!(source = name, "skipped malformed row ({})", row);
    }

    // Full-file inference widens a column whose late values miss the sampled dtype
    let frame = match read_frame(&clean, Some(options.infer_schema_length), options.delimiter) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(source = name, error = %e, "retrying with full schema inference");
            read_frame(&clean, None, options.delimiter).map_err(|source| LoadError::Parse {
                name: name.to_string(),
                source,
            })?
        }
    };

    tracing::info!(
        source = name,
        rows = frame.height(),
        columns = frame.width(),
        encoding = %encoding,
        skipped = skipped_rows.len(),
        "dataset loaded"
    );

    Ok(Dataset::new(frame, name, encoding, skipped_rows))
}

fn read_frame(csv: &[u8], infer_schema_length: Option<usize>, delimiter: u8) -> PolarsResult<DataFrame> {
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .map_parse_options(|opts| opts.with_separator(delimiter));
    CsvReader::new(Cursor::new(csv.to_vec()))
        .with_options(read_options)
        .finish()
}

/// UTF-8 (byte-order mark removed) when the bytes are valid, Latin-1 otherwise.
/// Latin-1 maps every byte to U+0000..U+00FF, so decoding itself cannot fail.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return (text, TextEncoding::Utf8);
    }
    (encoding_rs::mem::decode_latin1(bytes), TextEncoding::Latin1)
}

fn decompress(name: &str, bytes: &[u8], format: CompressionFormat) -> Result<Vec<u8>, LoadError> {
    let mut out = Vec::new();
    let result = match format {
        CompressionFormat::Gzip => flate2::read::MultiGzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map(|_| ()),
        CompressionFormat::Zstd => zstd::stream::decode_all(bytes).map(|decoded| out = decoded),
        CompressionFormat::Bzip2 => bzip2::read::BzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map(|_| ()),
        CompressionFormat::Xz => xz2::read::XzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map(|_| ()),
    };
    result.map_err(|source| LoadError::Decompress {
        name: name.to_string(),
        format,
        source,
    })?;
    Ok(out)
}

/// Re-emit the CSV without records whose field count differs from the header.
/// Blank lines are dropped by the csv reader.
fn drop_malformed_records(
    name: &str,
    text: &str,
    delimiter: u8,
) -> Result<(Vec<u8>, Vec<SkippedRow>), LoadError> {
    let csv_error = |e: csv::Error| LoadError::Csv {
        name: name.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.byte_headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(LoadError::Empty {
            name: name.to_string(),
        });
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::with_capacity(text.len()));
    writer.write_byte_record(&headers).map_err(csv_error)?;

    let mut skipped = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(csv_error)? {
        if record.len() != headers.len() {
            skipped.push(SkippedRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected_fields: headers.len(),
                found_fields: record.len(),
            });
            continue;
        }
        writer.write_byte_record(&record).map_err(csv_error)?;
    }

    let clean = writer.into_inner().map_err(|e| LoadError::Csv {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok((clean, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_detection() {
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.gz")),
            Some(CompressionFormat::Gzip)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.zst")),
            Some(CompressionFormat::Zstd)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.bz2")),
            Some(CompressionFormat::Bzip2)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.xz")),
            Some(CompressionFormat::Xz)
        );
        assert_eq!(CompressionFormat::from_extension(Path::new("file.csv")), None);
        assert_eq!(CompressionFormat::from_extension(Path::new("file")), None);
    }

    #[test]
    fn test_decode_text_strips_bom() {
        let (text, encoding) = decode_text(b"\xEF\xBB\xBFa,b\n1,2\n");
        assert_eq!(encoding, TextEncoding::Utf8);
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[test]
    fn test_decode_text_falls_back_to_latin1() {
        // 0xE9 is "é" in Latin-1 and an invalid lone byte in UTF-8
        let (text, encoding) = decode_text(b"name\ncaf\xE9\n");
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text, "name\ncafé\n");
    }

    #[test]
    fn test_drop_malformed_records() {
        let (clean, skipped) =
            drop_malformed_records("t.csv", "a,b\n1,2\n3,4,5\n\n6,7\n8\n", b',').unwrap();
        assert_eq!(String::from_utf8(clean).unwrap(), "a,b\n1,2\n6,7\n");
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].line, 3);
        assert_eq!(skipped[0].found_fields, 3);
        assert_eq!(skipped[1].found_fields, 1);
    }

    #[test]
    fn test_late_value_outside_inferred_type() {
        let mut csv = String::from("sku_id,units_sold\n");
        for i in 0..1100 {
            csv.push_str(&format!("{},{}\n", 216000 + i, i % 7));
        }
        csv.push_str("abc,5\n");

        let dataset = parse_bytes("late.csv", csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(dataset.height(), 1101);
        assert!(dataset.skipped_rows().is_empty());
        let sku = dataset.frame().column("sku_id").unwrap();
        assert_eq!(sku.dtype(), &DataType::String);
        assert_eq!(sku.get(1100).unwrap().str_value(), "abc");
        assert!(dataset.frame().column("units_sold").unwrap().dtype().is_integer());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = parse_bytes("empty.csv", b"", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn test_sample_paths_resolve_against_directory() {
        let options = LoadOptions::default().with_samples_dir("/data");
        assert_eq!(
            options.sample_path(SampleFile::Sales),
            PathBuf::from("/data/train_0irEZ2H.csv")
        );
    }
}
