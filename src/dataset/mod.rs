//! Tabular dataset: CSV loading and per-column type inference.

use std::fmt;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file '{0}' does not exist")]
    Missing(String),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("'{0}' has no header row")]
    NoHeader(String),
    #[error("'{0}' contains no data rows")]
    Empty(String),
}

/// A single cell value after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", (x * 1e6).round() / 1e6)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Null => write!(f, ""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Str,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Str => "str",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub values: Vec<Value>,
}

impl Column {
    /// Non-null numeric values, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }
}

/// In-memory tabular data: named, typed columns of equal length.
/// Built once by [`load_data`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Case-insensitive lookup, used to resolve column references in prompts.
    pub fn resolve_column(&self, name: &str) -> Option<&Column> {
        self.column(name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.ty.is_numeric()).collect()
    }

    /// Low-cardinality string columns, candidates for grouping and counting.
    pub fn categorical_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| {
                if c.ty != ColumnType::Str {
                    return false;
                }
                let mut distinct: Vec<&str> = Vec::new();
                for v in &c.values {
                    if let Value::Str(s) = v {
                        if !distinct.contains(&s.as_str()) {
                            distinct.push(s);
                        }
                    }
                }
                !distinct.is_empty() && distinct.len() <= c.values.len() / 2 + 1 && distinct.len() <= 20
            })
            .collect()
    }

    /// `name (type)` pairs for role text and error messages.
    pub fn schema_text(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.ty.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Load a CSV file into a [`Dataset`], inferring one type per column.
///
/// Inference order per cell: empty → null, then int, float, bool, else
/// string. A column's type is the narrowest that fits every non-null cell
/// (ints widen to float, anything else falls back to string).
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(LoadError::Missing(shown));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Read { path: shown.clone(), source })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Read { path: shown.clone(), source })?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(LoadError::NoHeader(shown));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Read { path: shown.clone(), source })?;
        for (i, col) in cells.iter_mut().enumerate() {
            col.push(record.get(i).unwrap_or("").to_string());
        }
        rows += 1;
    }
    if rows == 0 {
        return Err(LoadError::Empty(shown));
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    Ok(Dataset { columns, rows })
}

fn infer_column(name: String, raw: Vec<String>) -> Column {
    let mut ty = None::<ColumnType>;
    for cell in raw.iter().filter(|c| !c.is_empty()) {
        let cell_ty = infer_cell_type(cell);
        ty = Some(match (ty, cell_ty) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Int), ColumnType::Float) | (Some(ColumnType::Float), ColumnType::Int) => {
                ColumnType::Float
            }
            _ => ColumnType::Str,
        });
    }
    // All-empty columns read as string.
    let ty = ty.unwrap_or(ColumnType::Str);

    let values = raw
        .into_iter()
        .map(|cell| {
            if cell.is_empty() {
                return Value::Null;
            }
            match ty {
                ColumnType::Int => cell.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
                ColumnType::Float => cell.parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
                ColumnType::Bool => parse_bool(&cell).map(Value::Bool).unwrap_or(Value::Null),
                ColumnType::Str => Value::Str(cell),
            }
        })
        .collect();

    Column { name, ty, values }
}

fn infer_cell_type(cell: &str) -> ColumnType {
    if cell.parse::<i64>().is_ok() {
        ColumnType::Int
    } else if cell.parse::<f64>().is_ok() {
        ColumnType::Float
    } else if parse_bool(cell).is_some() {
        ColumnType::Bool
    } else {
        ColumnType::Str
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
