//! Reading inputs and writing reports as delimited text.
//!
//! The readers are tolerant: a malformed line is logged and skipped (or, for
//! datasets, a malformed value is logged and read as `0`) instead of
//! aborting the whole read.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
    path::Path,
};

use crate::{outliers::OutlierScore, utils::INFINITE_STABILITY_WARNING, Constraint};

/// Reader settings shared by every input: no headers, ragged rows and
/// whitespace around fields are all accepted.
fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(csv::Trim::All);
    builder
}

/// Opens a CSV file for reading.
fn open<P: AsRef<Path>>(path: &P) -> Result<csv::Reader<std::fs::File>, String> {
    reader_builder()
        .from_path(path)
        .map_err(|e| format!("Could not open {}: {e}", path.as_ref().display()))
}

/// The 1-based line on which a record starts.
fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

/// Reads every point from a CSV reader. See [`parse_dataset`](parse_dataset).
fn dataset_from<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Vec<f64>>, String> {
    let mut points = Vec::new();
    let mut dimensionality = None;

    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = line_of(&record);

        let mut point = record
            .iter()
            .map(|v| {
                v.parse::<f64>().unwrap_or_else(|_| {
                    ftlog::warn!("Line {line}: could not parse value {v:?}, using 0.");
                    0.0
                })
            })
            .collect::<Vec<_>>();

        let dim = *dimensionality.get_or_insert(point.len());
        if point.len() != dim {
            ftlog::warn!("Line {line}: expected {dim} attributes but found {}.", point.len());
            point.resize(dim, 0.0);
        }
        points.push(point);
    }

    Ok(points)
}

/// Reads a dataset with one point per line and comma-separated attributes.
///
/// The first non-empty line fixes the number of attributes. Shorter lines are
/// padded with `0`, longer lines truncated and unparsable values read as `0`,
/// each with a warning.
///
/// # Errors
///
/// - If a record cannot be read.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Vec<Vec<f64>>, String> {
    dataset_from(reader_builder().from_reader(reader))
}

/// Reads a dataset from a CSV file. See [`parse_dataset`](parse_dataset).
///
/// # Errors
///
/// - If the file cannot be opened or read.
pub fn read_dataset<P: AsRef<Path>>(path: &P) -> Result<Vec<Vec<f64>>, String> {
    dataset_from(open(path)?)
}

/// Reads every constraint from a CSV reader. See [`parse_constraints`](parse_constraints).
fn constraints_from<R: Read>(mut reader: csv::Reader<R>, num_points: usize) -> Result<Vec<Constraint>, String> {
    let mut constraints = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        match parse_constraint(&record, num_points) {
            Ok(c) => constraints.push(c),
            Err(e) => ftlog::warn!("Skipping constraint on line {}: {e}", line_of(&record)),
        }
    }
    Ok(constraints)
}

/// Reads constraints, one `a,b,kind` per line where `kind` is `ml` or `cl`.
///
/// Malformed lines, and lines naming a point outside `0..num_points`, are
/// logged and skipped.
///
/// # Errors
///
/// - If a record cannot be read.
pub fn parse_constraints<R: Read>(reader: R, num_points: usize) -> Result<Vec<Constraint>, String> {
    constraints_from(reader_builder().from_reader(reader), num_points)
}

/// Parses one constraint record.
fn parse_constraint(record: &csv::StringRecord, num_points: usize) -> Result<Constraint, String> {
    let fields = record.iter().collect::<Vec<_>>();
    let [a, b, kind] = fields.as_slice() else {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    };
    let a = a.parse::<usize>().map_err(|e| format!("{a:?}: {e}"))?;
    let b = b.parse::<usize>().map_err(|e| format!("{b:?}: {e}"))?;
    if a >= num_points || b >= num_points {
        return Err(format!("point out of range 0..{num_points}"));
    }
    Ok(Constraint { a, b, kind: kind.parse()? })
}

/// Reads constraints from a file. See [`parse_constraints`](parse_constraints).
///
/// # Errors
///
/// - If the file cannot be opened or read.
pub fn read_constraints<P: AsRef<Path>>(path: &P, num_points: usize) -> Result<Vec<Constraint>, String> {
    constraints_from(open(path)?, num_points)
}

/// Reads every label from a CSV reader. See [`parse_labels`](parse_labels).
fn labels_from<R: Read>(mut reader: csv::Reader<R>) -> Result<BTreeMap<usize, usize>, String> {
    let mut labels = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let parsed = match (record.get(0), record.get(1), record.len()) {
            (Some(p), Some(c), 2) => p
                .parse::<usize>()
                .and_then(|p| c.parse::<usize>().map(|c| (p, c)))
                .map_err(|e| e.to_string()),
            (.., n) => Err(format!("expected 2 fields, found {n}")),
        };
        match parsed {
            Ok((point, class)) => {
                labels.insert(point, class);
            }
            Err(e) => ftlog::warn!("Skipping label on line {}: {e}", line_of(&record)),
        }
    }
    Ok(labels)
}

/// Reads labeled points, one `point,class` per line.
///
/// Malformed lines are logged and skipped. A point labeled twice keeps its
/// last class.
///
/// # Errors
///
/// - If a record cannot be read.
pub fn parse_labels<R: Read>(reader: R) -> Result<BTreeMap<usize, usize>, String> {
    labels_from(reader_builder().from_reader(reader))
}

/// Reads labeled points from a file. See [`parse_labels`](parse_labels).
///
/// # Errors
///
/// - If the file cannot be opened or read.
pub fn read_labels<P: AsRef<Path>>(path: &P) -> Result<BTreeMap<usize, usize>, String> {
    labels_from(open(path)?)
}

/// Writes the warning text first if stabilities were infinite.
fn write_warning<W: Write>(writer: &mut W, infinite_stability: bool) -> Result<(), String> {
    if infinite_stability {
        writeln!(writer, "{INFINITE_STABILITY_WARNING}").map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Writes each record as one CSV line and flushes the writer.
fn write_records<W, I, R>(writer: W, records: I) -> Result<(), String>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for record in records {
        writer.write_record(record).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

/// Writes a flat partition as a single line of comma-separated labels.
///
/// # Errors
///
/// - If the writer fails.
pub fn write_partition<W: Write>(writer: &mut W, labels: &[usize], infinite_stability: bool) -> Result<(), String> {
    write_warning(writer, infinite_stability)?;
    write_records(writer, [labels.iter().map(ToString::to_string)])
}

/// Writes one `score,core_distance,id` line per point, in the given order.
///
/// # Errors
///
/// - If the writer fails.
pub fn write_outlier_scores<W: Write>(
    writer: &mut W,
    scores: &[OutlierScore],
    infinite_stability: bool,
) -> Result<(), String> {
    write_warning(writer, infinite_stability)?;
    write_records(
        writer,
        scores
            .iter()
            .map(|s| [s.score.to_string(), s.core_distance.to_string(), s.id.to_string()]),
    )
}

/// Writes the visualization descriptor: a format version and whether the
/// hierarchy is compact.
///
/// # Errors
///
/// - If the writer fails.
pub fn write_visualization<W: Write>(writer: &mut W, compact: bool) -> Result<(), String> {
    write_records(writer, [["1".to_string()], [u8::from(compact).to_string()]])
}
