//! CSV record sink
//!
//! Column order is fixed. Present text is always wrapped in double quotes
//! with embedded quotes doubled, numbers are written bare and a missing value
//! of either kind is an empty bare token. `""` therefore reads back as
//! present empty text while an empty token reads back as missing.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::product::{EnrichedRecord, ItemDetail, ItemSummary, RecordSet};
use crate::domain::rating::Rating;

/// Output columns in file order
pub const COLUMNS: [&str; 13] = [
    "title",
    "price",
    "availability",
    "rating",
    "identifier_code",
    "product_kind",
    "price_excl_tax",
    "price_incl_tax",
    "tax",
    "availability_detail",
    "review_count",
    "category",
    "description",
];

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record file at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl SinkError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

pub type SinkResult<T> = Result<T, SinkError>;

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn text_cell(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_default()
}

fn number_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(record: &EnrichedRecord) -> [String; 13] {
    let summary = record.summary();
    let detail = record.detail();
    [
        quote(&summary.title),
        summary.price.to_string(),
        quote(&summary.availability_text),
        summary.rating.value().to_string(),
        text_cell(detail.identifier_code.as_deref()),
        text_cell(detail.product_kind.as_deref()),
        number_cell(detail.price_excl_tax),
        number_cell(detail.price_incl_tax),
        number_cell(detail.tax),
        text_cell(detail.availability_detail.as_deref()),
        number_cell(detail.review_count),
        text_cell(detail.category.as_deref()),
        text_cell(detail.description.as_deref()),
    ]
}

/// Serialize records to any writer.
pub fn write_to<W: Write>(writer: W, records: &RecordSet) -> SinkResult<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(COLUMNS.iter().map(|column| quote(column)))?;
    for record in records {
        csv_writer.write_record(&row(record))?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the record set to `path`, creating parent directories as needed.
pub fn write_records(path: &Path, records: &RecordSet) -> SinkResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| SinkError::io(path, e))?;
    write_to(BufWriter::new(file), records)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// One cell as it appeared in the file
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cell {
    Quoted(String),
    Bare(String),
}

/// Split the file into rows of cells, keeping quoted and bare cells apart.
fn split_cells(content: &str) -> SinkResult<Vec<(usize, Vec<Cell>)>> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut chars = content.chars().peekable();
    let mut line = 1;
    let mut row_line = 1;

    while chars.peek().is_some() {
        let cell = if chars.peek() == Some(&'"') {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    Some('"') => break,
                    Some(c) => {
                        if c == '\n' {
                            line += 1;
                        }
                        text.push(c);
                    }
                    None => return Err(SinkError::format(row_line, "unterminated quoted field")),
                }
            }
            Cell::Quoted(text)
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' || c == '\n' || c == '\r' {
                    break;
                }
                text.push(c);
                chars.next();
            }
            Cell::Bare(text)
        };
        cells.push(cell);

        match chars.next() {
            Some(',') => {}
            Some('\r') if chars.peek() == Some(&'\n') => {
                chars.next();
                rows.push((row_line, std::mem::take(&mut cells)));
                line += 1;
                row_line = line;
            }
            Some('\n') | None => {
                rows.push((row_line, std::mem::take(&mut cells)));
                line += 1;
                row_line = line;
            }
            Some(other) => {
                return Err(SinkError::format(
                    row_line,
                    format!("unexpected '{other}' after quoted field"),
                ));
            }
        }
    }
    Ok(rows)
}

struct RowReader {
    line: usize,
    cells: std::vec::IntoIter<Cell>,
    column: usize,
}

impl RowReader {
    fn next_cell(&mut self) -> SinkResult<Cell> {
        let column = COLUMNS[self.column];
        self.column += 1;
        self.cells
            .next()
            .ok_or_else(|| SinkError::format(self.line, format!("missing column '{column}'")))
    }

    fn text(&mut self) -> SinkResult<Option<String>> {
        match self.next_cell()? {
            Cell::Quoted(text) => Ok(Some(text)),
            Cell::Bare(raw) if raw.is_empty() => Ok(None),
            Cell::Bare(raw) => Err(SinkError::format(
                self.line,
                format!("unquoted text '{raw}' in column '{}'", COLUMNS[self.column - 1]),
            )),
        }
    }

    fn number<T: std::str::FromStr>(&mut self) -> SinkResult<Option<T>> {
        match self.next_cell()? {
            Cell::Bare(raw) if raw.is_empty() => Ok(None),
            Cell::Bare(raw) => raw.trim().parse().map(Some).map_err(|_| {
                SinkError::format(
                    self.line,
                    format!("'{raw}' is not a number in column '{}'", COLUMNS[self.column - 1]),
                )
            }),
            Cell::Quoted(text) => Err(SinkError::format(
                self.line,
                format!("quoted value '{text}' in numeric column '{}'", COLUMNS[self.column - 1]),
            )),
        }
    }

    fn required<T>(&self, value: Option<T>) -> SinkResult<T> {
        value.ok_or_else(|| {
            SinkError::format(
                self.line,
                format!("column '{}' may not be empty", COLUMNS[self.column - 1]),
            )
        })
    }
}

fn parse_record(line: usize, cells: Vec<Cell>) -> SinkResult<EnrichedRecord> {
    if cells.len() != COLUMNS.len() {
        return Err(SinkError::format(
            line,
            format!("expected {} columns, found {}", COLUMNS.len(), cells.len()),
        ));
    }
    let mut reader = RowReader {
        line,
        cells: cells.into_iter(),
        column: 0,
    };

    let title = reader.text()?;
    let title = reader.required(title)?;
    let price = reader.number::<f64>()?;
    let price = reader.required(price)?;
    let availability_text = reader.text()?;
    let availability_text = reader.required(availability_text)?;
    let rating = reader.number::<u8>()?;
    let rating = Rating::from_value(reader.required(rating)?);

    let summary = ItemSummary {
        detail_locator: String::new(),
        title,
        price,
        rating,
        availability_text,
    };
    let detail = ItemDetail {
        identifier_code: reader.text()?,
        product_kind: reader.text()?,
        price_excl_tax: reader.number()?,
        price_incl_tax: reader.number()?,
        tax: reader.number()?,
        availability_detail: reader.text()?,
        review_count: reader.number()?,
        category: reader.text()?,
        description: reader.text()?,
    };
    Ok(EnrichedRecord::new(summary, detail))
}

/// Parse sink output back into records.
///
/// The detail locator is not part of the file, so records read back carry
/// an empty one.
pub fn parse_records(content: &str) -> SinkResult<RecordSet> {
    let mut rows = split_cells(content)?.into_iter();

    let (_, header) = rows
        .next()
        .ok_or_else(|| SinkError::format(1, "missing header row"))?;
    let expected: Vec<Cell> = COLUMNS.iter().map(|c| Cell::Quoted((*c).to_string())).collect();
    if header != expected {
        return Err(SinkError::format(1, "header does not match the expected columns"));
    }

    let mut records = RecordSet::new();
    for (line, cells) in rows {
        records.push(parse_record(line, cells)?);
    }
    debug!("Parsed {} records", records.len());
    Ok(records)
}

/// Read a file previously produced by [`write_records`].
pub fn read_records(path: &Path) -> SinkResult<RecordSet> {
    let content = fs::read_to_string(path).map_err(|e| SinkError::io(path, e))?;
    parse_records(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str, detail: ItemDetail) -> EnrichedRecord {
        EnrichedRecord::new(
            ItemSummary {
                title: title.to_string(),
                detail_locator: format!("https://example.com/catalogue/{title}.html"),
                price: 12.5,
                rating: Rating::from_value(3),
                availability_text: "In stock".to_string(),
            },
            detail,
        )
    }

    fn render(records: &RecordSet) -> String {
        let mut out = Vec::new();
        write_to(&mut out, records).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_quoting_discipline() {
        let detail = ItemDetail {
            identifier_code: Some("abc".to_string()),
            review_count: Some(7),
            description: Some(String::new()),
            ..ItemDetail::default()
        };
        let set = RecordSet::from(vec![record("Say \"hi\", world", detail)]);
        let rendered = render(&set);
        let mut lines = rendered.lines();

        assert_eq!(
            lines.next().unwrap(),
            "\"title\",\"price\",\"availability\",\"rating\",\"identifier_code\",\"product_kind\",\
             \"price_excl_tax\",\"price_incl_tax\",\"tax\",\"availability_detail\",\"review_count\",\
             \"category\",\"description\""
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"Say \"\"hi\"\", world\",12.5,\"In stock\",3,\"abc\",,,,,,7,,\"\""
        );
        assert!(lines.next().is_none());
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_round_trip_preserves_presence() {
        let full = ItemDetail {
            identifier_code: Some("a897fe39b1053632".to_string()),
            product_kind: Some("Books".to_string()),
            price_excl_tax: Some(51.77),
            price_incl_tax: Some(51.77),
            tax: Some(0.0),
            availability_detail: Some("In stock (22 available)".to_string()),
            review_count: Some(0),
            category: Some("Poetry".to_string()),
            description: Some("Line one, \"quoted\"\nline two".to_string()),
        };
        let sparse = ItemDetail {
            category: Some(String::new()),
            ..ItemDetail::default()
        };
        let set = RecordSet::from(vec![record("Alpha", full.clone()), record("Beta", sparse.clone())]);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("books.csv");
        write_records(&path, &set).unwrap();
        let read = read_records(&path).unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read.as_slice()[0].detail(), &full);
        assert_eq!(read.as_slice()[1].detail(), &sparse);
        assert_eq!(read.as_slice()[1].detail().category.as_deref(), Some(""));
        assert!(read.as_slice()[1].detail().description.is_none());
        assert_eq!(read.as_slice()[0].title(), "Alpha");
        assert_eq!(read.as_slice()[0].rating().value(), 3);
    }

    #[test]
    fn test_empty_set_writes_header_only() {
        let rendered = render(&RecordSet::new());
        assert_eq!(rendered.lines().count(), 1);
        assert!(parse_records(&rendered).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_wrong_header() {
        assert!(matches!(
            parse_records("\"name\",\"price\"\n"),
            Err(SinkError::Format { line: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_quoted_number() {
        let mut content = render(&RecordSet::new());
        content.push_str("\"T\",\"12\",\"In stock\",1,,,,,,,,,\n");
        let err = parse_records(&content).unwrap_err();
        assert!(matches!(err, SinkError::Format { line: 2, .. }), "{err}");
    }
}
