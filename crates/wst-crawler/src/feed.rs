//! Feed exports: scraped items written as CSV, JSON or JSON lines.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wst_kit::FileMode;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvWriterConfig {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default = "default_csv_terminator")]
    pub terminator: CsvTerminator,
    /// Separator used to join multi-valued fields
    #[serde(default = "default_join_multivalued")]
    pub join_multivalued: String,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            escape: None,
            terminator: CsvTerminator::Any('\n'),
            join_multivalued: String::from(","),
        }
    }
}

fn default_csv_delimiter() -> char {
    CsvWriterConfig::default().delimiter
}

fn default_csv_terminator() -> CsvTerminator {
    CsvWriterConfig::default().terminator
}

fn default_join_multivalued() -> String {
    CsvWriterConfig::default().join_multivalued
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CsvTerminator {
    CRLF,
    Any(char),
}

impl From<CsvTerminator> for csv::Terminator {
    fn from(source: CsvTerminator) -> Self {
        match source {
            CsvTerminator::CRLF => Self::CRLF,
            CsvTerminator::Any(c) => Self::Any(c as u8),
        }
    }
}

impl From<&CsvWriterConfig> for csv::WriterBuilder {
    fn from(c: &CsvWriterConfig) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(c.delimiter as u8);
        builder.terminator(c.terminator.into());
        builder.has_headers(false);
        if let Some(escape) = c.escape {
            builder.double_quote(false);
            builder.escape(escape as u8);
        } else {
            builder.double_quote(true);
        }
        builder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FeedFormat {
    Csv,
    Json,
    JsonLines,
}

impl FeedFormat {
    /// Guesses the format from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "jl" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Output file, stdout when missing
    pub path: Option<PathBuf>,
    pub format: FeedFormat,
    #[serde(default)]
    pub file_mode: FileMode,
    #[serde(default)]
    pub csv: CsvWriterConfig,
}

impl FeedConfig {
    /// A feed written to `path` in the format given by its extension,
    /// JSON lines when the extension is unknown.
    pub fn for_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let format = FeedFormat::from_path(&path).unwrap_or(FeedFormat::JsonLines);
        Self {
            path: Some(path),
            format,
            file_mode: FileMode::Write,
            csv: CsvWriterConfig::default(),
        }
    }

}

enum Sink {
    File(BufWriter<fs_err::File>),
    Stdout(io::Stdout),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::File(f) => f.write(buf),
            Self::Stdout(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(f) => f.flush(),
            Self::Stdout(s) => s.flush(),
        }
    }
}

enum Output {
    Csv {
        wtr: csv::Writer<Sink>,
        fields: Option<Vec<String>>,
        write_header: bool,
        join_multivalued: String,
    },
    Json(Sink),
    JsonLines(Sink),
}

pub struct FeedWriter {
    output: Output,
    count: usize,
}

impl FeedWriter {
    pub fn new(config: &FeedConfig) -> anyhow::Result<Self> {
        if config.format == FeedFormat::Json && config.file_mode == FileMode::Append {
            anyhow::bail!("JSON feeds can't be appended to, use JSON lines instead");
        }

        let (sink, empty) = match &config.path {
            Some(path) => {
                let opts: fs_err::OpenOptions = config.file_mode.into();
                let file = opts.open(path)?;
                let empty = file.metadata()?.len() == 0;
                (Sink::File(BufWriter::new(file)), empty)
            }
            None => (Sink::Stdout(io::stdout()), true),
        };

        let output = match config.format {
            FeedFormat::Csv => Output::Csv {
                wtr: csv::WriterBuilder::from(&config.csv).from_writer(sink),
                fields: None,
                write_header: empty,
                join_multivalued: config.csv.join_multivalued.clone(),
            },
            FeedFormat::Json => Output::Json(sink),
            FeedFormat::JsonLines => Output::JsonLines(sink),
        };

        Ok(Self { output, count: 0 })
    }

    /// Number of items written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn write<I: Serialize>(&mut self, item: &I) -> anyhow::Result<()> {
        let value = serde_json::to_value(item)?;
        match &mut self.output {
            Output::Csv {
                wtr,
                fields,
                write_header,
                join_multivalued,
            } => {
                let map = match value {
                    Value::Object(map) => map,
                    other => anyhow::bail!("CSV feeds need items with named fields, got: {other}"),
                };
                let fields = fields.get_or_insert_with(|| map.keys().cloned().collect());
                if *write_header {
                    wtr.write_record(fields.iter())?;
                    *write_header = false;
                }
                let row = fields
                    .iter()
                    .map(|field| csv_cell(map.get(field), join_multivalued));
                wtr.write_record(row)?;
            }
            Output::Json(sink) => {
                sink.write_all(if self.count == 0 { b"[\n" } else { b",\n" })?;
                serde_json::to_writer(&mut *sink, &value)?;
            }
            Output::JsonLines(sink) => {
                serde_json::to_writer(&mut *sink, &value)?;
                sink.write_all(b"\n")?;
            }
        }
        self.count += 1;
        Ok(())
    }

    /// Terminates the feed and flushes it, returns the number of items.
    pub fn finish(mut self) -> anyhow::Result<usize> {
        match &mut self.output {
            Output::Csv { wtr, .. } => wtr.flush()?,
            Output::Json(sink) => {
                if self.count == 0 {
                    sink.write_all(b"[")?;
                }
                sink.write_all(b"\n]\n")?;
                sink.flush()?;
            }
            Output::JsonLines(sink) => sink.flush()?,
        }
        Ok(self.count)
    }
}

fn csv_cell(value: Option<&Value>, join_multivalued: &str) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| csv_cell(Some(v), join_multivalued))
            .collect::<Vec<_>>()
            .join(join_multivalued),
        Some(other) => other.to_string(),
    }
}
