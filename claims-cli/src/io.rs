use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

/// Open a file for reading; `-` reads stdin
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if is_stdio(path) {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open a file for writing, or stdout when no path (or `-`) is given
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if !is_stdio(path) => {
            let file =
                File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Read a single JSON document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut raw = String::new();
    open_input(path)?
        .read_to_string(&mut raw)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a valid document", path.display()))
}

/// Parse newline-delimited JSON
///
/// Blank lines are skipped. Each item carries its 1-based line number and
/// its own parse result, so one bad line does not hide the rest.
pub fn read_json_lines<T: DeserializeOwned>(
    reader: impl BufRead,
) -> Result<Vec<(usize, serde_json::Result<T>)>> {
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        items.push((index + 1, serde_json::from_str(&line)));
    }
    Ok(items)
}

pub fn write_json_line<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}
