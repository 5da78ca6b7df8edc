// Primitives for reading the CSV tables.

use std::fs::File;
use std::io::Read;

use csv::{Reader, StringRecord};

use crate::refmap::{io_common::simplify_file_name, *};

// (field name, default header)
const REFERENDUM_COLUMNS: [(&str, &str); 9] = [
    ("department_code", "Department code"),
    ("department_name", "Department name"),
    ("town_code", "Town code"),
    ("town_name", "Town name"),
    ("registered", "Registered"),
    ("abstentions", "Abstentions"),
    ("null_votes", "Null"),
    ("choice_a", "Choice A"),
    ("choice_b", "Choice B"),
];

const REGION_COLUMNS: [(&str, &str); 2] = [("region_code", "code"), ("region_name", "name")];

const DEPARTMENT_COLUMNS: [(&str, &str); 3] = [
    ("department_code", "code"),
    ("department_name", "name"),
    ("region_code", "region_code"),
];

pub fn read_referendum(path: &str, src: &TableSource) -> RefmapResult<Vec<ReferendumRecord>> {
    let rdr = open_csv(path, src)?;
    parse_referendum(rdr, path, src)
}

pub fn read_regions(path: &str, src: &TableSource) -> RefmapResult<Vec<Region>> {
    let rdr = open_csv(path, src)?;
    parse_regions(rdr, path, src)
}

pub fn read_departments(path: &str, src: &TableSource) -> RefmapResult<Vec<Department>> {
    let rdr = open_csv(path, src)?;
    parse_departments(rdr, path, src)
}

pub fn parse_referendum<R: Read>(
    mut rdr: Reader<R>,
    path: &str,
    src: &TableSource,
) -> RefmapResult<Vec<ReferendumRecord>> {
    let cols = resolve_columns(&mut rdr, path, src, &REFERENDUM_COLUMNS)?;
    let mut res: Vec<ReferendumRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row = Row {
            line: &line,
            path,
            lineno,
            cols: &cols,
        };
        res.push(ReferendumRecord {
            department_code: row.text(0)?,
            department_name: row.text(1)?,
            town_code: row.text(2)?,
            town_name: row.text(3)?,
            registered: row.count(4)?,
            abstentions: row.count(5)?,
            null_votes: row.count(6)?,
            choice_a: row.count(7)?,
            choice_b: row.count(8)?,
        });
    }
    info!(
        "read {} referendum records from {}",
        res.len(),
        simplify_file_name(path)
    );
    Ok(res)
}

pub fn parse_regions<R: Read>(
    mut rdr: Reader<R>,
    path: &str,
    src: &TableSource,
) -> RefmapResult<Vec<Region>> {
    let cols = resolve_columns(&mut rdr, path, src, &REGION_COLUMNS)?;
    let mut res: Vec<Region> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row = Row {
            line: &line,
            path,
            lineno,
            cols: &cols,
        };
        res.push(Region {
            region_code: row.text(0)?,
            region_name: row.text(1)?,
        });
    }
    info!("read {} regions from {}", res.len(), simplify_file_name(path));
    Ok(res)
}

pub fn parse_departments<R: Read>(
    mut rdr: Reader<R>,
    path: &str,
    src: &TableSource,
) -> RefmapResult<Vec<Department>> {
    let cols = resolve_columns(&mut rdr, path, src, &DEPARTMENT_COLUMNS)?;
    let mut res: Vec<Department> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row = Row {
            line: &line,
            path,
            lineno,
            cols: &cols,
        };
        res.push(Department {
            department_code: row.text(0)?,
            department_name: row.text(1)?,
            region_code: row.text(2)?,
        });
    }
    info!(
        "read {} departments from {}",
        res.len(),
        simplify_file_name(path)
    );
    Ok(res)
}

pub fn csv_reader<R: Read>(input: R, src: &TableSource) -> RefmapResult<Reader<R>> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(src.delimiter_byte()?)
        .from_reader(input))
}

fn open_csv(path: &str, src: &TableSource) -> RefmapResult<Reader<File>> {
    info!("Attempting to read table {:?}", path);
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    csv_reader(f, src)
}

// The header and position of each requested field, in the requested order.
fn resolve_columns<R: Read>(
    rdr: &mut Reader<R>,
    path: &str,
    src: &TableSource,
    fields: &[(&str, &str)],
) -> RefmapResult<Vec<(String, usize)>> {
    let headers: StringRecord = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1_usize })?
        .clone();
    debug!("{}: header: {:?}", path, headers);
    let mut res: Vec<(String, usize)> = Vec::new();
    for (field, default) in fields.iter() {
        let column = src.column(field, default);
        let idx = headers
            .iter()
            .position(|h| h.trim() == column)
            .context(CsvMissingColumnSnafu {
                path,
                column: column.clone(),
            })?;
        res.push((column, idx));
    }
    Ok(res)
}

struct Row<'a> {
    line: &'a StringRecord,
    path: &'a str,
    lineno: usize,
    cols: &'a [(String, usize)],
}

impl<'a> Row<'a> {
    fn cell(&self, i: usize) -> RefmapResult<&'a str> {
        let (column, idx) = &self.cols[i];
        let s = self.line.get(*idx).map(str::trim).unwrap_or("");
        ensure!(
            !s.is_empty(),
            CsvMissingValueSnafu {
                path: self.path,
                lineno: self.lineno,
                column: column.clone(),
            }
        );
        Ok(s)
    }

    fn text(&self, i: usize) -> RefmapResult<String> {
        self.cell(i).map(|s| s.to_string())
    }

    fn count(&self, i: usize) -> RefmapResult<u64> {
        let s = self.cell(i)?;
        s.parse::<u64>().context(CsvNumberSnafu {
            path: self.path,
            lineno: self.lineno,
            column: self.cols[i].0.clone(),
            value: s,
        })
    }
}
