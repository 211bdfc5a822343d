//! Analysis plan execution against an in-memory dataset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{Column, Dataset, Value};

/// Statistics reported by `describe`, in output row order.
pub const DESCRIBE_STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("dataset has no numeric columns")]
    NoNumericColumns,
    #[error("column '{0}' has no values to aggregate")]
    EmptyColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Count,
    Mean,
    Std,
    Min,
    Max,
    Sum,
}

impl Stat {
    pub fn name(self) -> &'static str {
        match self {
            Stat::Count => "count",
            Stat::Mean => "mean",
            Stat::Std => "std",
            Stat::Min => "min",
            Stat::Max => "max",
            Stat::Sum => "sum",
        }
    }
}

/// One executable analysis operation. This is the code artifact's payload:
/// the model tier is asked to produce exactly this JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnalysisPlan {
    Describe,
    Head { n: usize },
    Shape,
    ValueCounts { column: String },
    Aggregate { column: String, stat: Stat },
    GroupAggregate { by: String, column: String, stat: Stat },
}

/// A tabular execution result: named columns, optional row labels, cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub index: Option<Vec<String>>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataFrame {
    /// (rows, cols); row labels are not counted as a column.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

/// Tagged outcome of running a plan. Matched exhaustively everywhere;
/// the verifier reports the variant name for anything but `DataFrame`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    DataFrame(DataFrame),
    Scalar { label: String, value: Value },
    Text(String),
}

impl ExecutionResult {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionResult::DataFrame(_) => "dataframe",
            ExecutionResult::Scalar { .. } => "scalar",
            ExecutionResult::Text(_) => "text",
        }
    }
}

/// Interpret `plan` against `data`. Deterministic: the same dataset and plan
/// always yield the same result.
pub fn run_plan(data: &Dataset, plan: &AnalysisPlan) -> Result<ExecutionResult, ExecError> {
    match plan {
        AnalysisPlan::Describe => describe(data),
        AnalysisPlan::Head { n } => Ok(ExecutionResult::DataFrame(head(data, *n))),
        AnalysisPlan::Shape => Ok(ExecutionResult::Text(format!(
            "{} rows x {} columns",
            data.rows(),
            data.width()
        ))),
        AnalysisPlan::ValueCounts { column } => value_counts(data, column),
        AnalysisPlan::Aggregate { column, stat } => aggregate(data, column, *stat),
        AnalysisPlan::GroupAggregate { by, column, stat } => group_aggregate(data, by, column, *stat),
    }
}

fn describe(data: &Dataset) -> Result<ExecutionResult, ExecError> {
    let numeric = data.numeric_columns();
    if numeric.is_empty() {
        return Err(ExecError::NoNumericColumns);
    }

    let columns: Vec<String> = numeric.iter().map(|c| c.name.clone()).collect();
    let rows = DESCRIBE_STATS
        .iter()
        .map(|stat| {
            numeric
                .iter()
                .map(|col| {
                    let xs = col.numeric_values();
                    match *stat {
                        "count" => Value::Int(xs.len() as i64),
                        "mean" => float_or_null(mean(&xs)),
                        "std" => float_or_null(sample_std(&xs)),
                        "min" => float_or_null(xs.iter().cloned().reduce(f64::min)),
                        "25%" => float_or_null(quantile(&xs, 0.25)),
                        "50%" => float_or_null(quantile(&xs, 0.50)),
                        "75%" => float_or_null(quantile(&xs, 0.75)),
                        "max" => float_or_null(xs.iter().cloned().reduce(f64::max)),
                        _ => unreachable!(),
                    }
                })
                .collect()
        })
        .collect();

    Ok(ExecutionResult::DataFrame(DataFrame {
        index: Some(DESCRIBE_STATS.iter().map(|s| s.to_string()).collect()),
        columns,
        rows,
    }))
}

fn head(data: &Dataset, n: usize) -> DataFrame {
    let take = n.min(data.rows());
    let columns: Vec<String> = data.columns().iter().map(|c| c.name.clone()).collect();
    let rows = (0..take)
        .map(|r| data.columns().iter().map(|c| c.values[r].clone()).collect())
        .collect();
    DataFrame { index: None, columns, rows }
}

fn value_counts(data: &Dataset, column: &str) -> Result<ExecutionResult, ExecError> {
    let col = data
        .resolve_column(column)
        .ok_or_else(|| ExecError::UnknownColumn(column.to_string()))?;

    // First-appearance order, then stable sort by descending count.
    let mut counts: Vec<(String, i64)> = Vec::new();
    for v in &col.values {
        if v.is_null() {
            continue;
        }
        let key = v.to_string();
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let rows = counts
        .into_iter()
        .map(|(k, n)| vec![Value::Str(k), Value::Int(n)])
        .collect();
    Ok(ExecutionResult::DataFrame(DataFrame {
        index: None,
        columns: vec![col.name.clone(), "count".to_string()],
        rows,
    }))
}

fn aggregate(data: &Dataset, column: &str, stat: Stat) -> Result<ExecutionResult, ExecError> {
    let col = data
        .resolve_column(column)
        .ok_or_else(|| ExecError::UnknownColumn(column.to_string()))?;
    let value = aggregate_column(col, stat)?;
    Ok(ExecutionResult::Scalar {
        label: format!("{}({})", stat.name(), col.name),
        value,
    })
}

fn aggregate_column(col: &Column, stat: Stat) -> Result<Value, ExecError> {
    if stat == Stat::Count {
        return Ok(Value::Int(col.non_null_count() as i64));
    }
    if !col.ty.is_numeric() {
        return Err(ExecError::NotNumeric(col.name.clone()));
    }
    let xs = col.numeric_values();
    if xs.is_empty() {
        return Err(ExecError::EmptyColumn(col.name.clone()));
    }
    let v = match stat {
        Stat::Mean => mean(&xs),
        Stat::Std => sample_std(&xs),
        Stat::Min => xs.iter().cloned().reduce(f64::min),
        Stat::Max => xs.iter().cloned().reduce(f64::max),
        Stat::Sum => Some(xs.iter().sum()),
        Stat::Count => unreachable!(),
    };
    Ok(float_or_null(v))
}

fn group_aggregate(
    data: &Dataset,
    by: &str,
    column: &str,
    stat: Stat,
) -> Result<ExecutionResult, ExecError> {
    let key_col = data
        .resolve_column(by)
        .ok_or_else(|| ExecError::UnknownColumn(by.to_string()))?;
    let val_col = data
        .resolve_column(column)
        .ok_or_else(|| ExecError::UnknownColumn(column.to_string()))?;
    if stat != Stat::Count && !val_col.ty.is_numeric() {
        return Err(ExecError::NotNumeric(val_col.name.clone()));
    }

    // Group keys in first-appearance order.
    let mut groups: Vec<(String, Vec<f64>, i64)> = Vec::new();
    for (key, val) in key_col.values.iter().zip(&val_col.values) {
        if key.is_null() {
            continue;
        }
        let key = key.to_string();
        let entry = match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some(e) => e,
            None => {
                groups.push((key, Vec::new(), 0));
                groups.last_mut().unwrap()
            }
        };
        if !val.is_null() {
            entry.2 += 1;
            if let Some(x) = val.as_f64() {
                entry.1.push(x);
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, xs, count)| {
            let agg = match stat {
                Stat::Count => Value::Int(count),
                Stat::Mean => float_or_null(mean(&xs)),
                Stat::Std => float_or_null(sample_std(&xs)),
                Stat::Min => float_or_null(xs.iter().cloned().reduce(f64::min)),
                Stat::Max => float_or_null(xs.iter().cloned().reduce(f64::max)),
                Stat::Sum => float_or_null(Some(xs.iter().sum())),
            };
            vec![Value::Str(key), agg]
        })
        .collect();

    Ok(ExecutionResult::DataFrame(DataFrame {
        index: None,
        columns: vec![
            key_col.name.clone(),
            format!("{}({})", stat.name(), val_col.name),
        ],
        rows,
    }))
}

fn float_or_null(v: Option<f64>) -> Value {
    match v {
        Some(x) if x.is_finite() => Value::Float(x),
        _ => Value::Null,
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Sample standard deviation (n-1 denominator); None for fewer than 2 values.
fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_data;
    use std::io::Write;

    fn dataset() -> (tempfile::NamedTempFile, Dataset) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "name,age,city,salary").unwrap();
        writeln!(f, "Alice,34,Boston,72000.0").unwrap();
        writeln!(f, "Bob,29,Denver,61000.0").unwrap();
        writeln!(f, "Cara,41,Boston,83500.0").unwrap();
        writeln!(f, "Dan,36,Austin,54000.0").unwrap();
        f.flush().unwrap();
        let ds = load_data(f.path()).unwrap();
        (f, ds)
    }

    #[test]
    fn describe_shape_is_stats_by_numeric_columns() {
        let (_f, ds) = dataset();
        let result = run_plan(&ds, &AnalysisPlan::Describe).unwrap();
        let ExecutionResult::DataFrame(frame) = result else {
            panic!("describe must yield a dataframe");
        };
        assert_eq!(frame.shape(), (DESCRIBE_STATS.len(), 2));
        assert_eq!(frame.columns, vec!["age", "salary"]);
        let index = frame.index.as_deref().unwrap();
        assert_eq!(index.len(), DESCRIBE_STATS.len());
        assert_eq!(index[0], "count");
        assert_eq!(index[7], "max");
    }

    #[test]
    fn describe_statistics_match_hand_computed_values() {
        let (_f, ds) = dataset();
        let ExecutionResult::DataFrame(frame) = run_plan(&ds, &AnalysisPlan::Describe).unwrap()
        else {
            panic!("expected dataframe");
        };
        // ages: 29, 34, 36, 41
        let age = |row: usize| frame.rows[row][0].as_f64().unwrap();
        assert_eq!(frame.rows[0][0], Value::Int(4)); // count
        assert!((age(1) - 35.0).abs() < 1e-9); // mean
        assert!((age(2) - 4.966_554_808_583_78).abs() < 1e-9); // sample std
        assert_eq!(age(3), 29.0); // min
        assert!((age(4) - 32.75).abs() < 1e-9); // 25%
        assert!((age(5) - 35.0).abs() < 1e-9); // 50%
        assert!((age(6) - 37.25).abs() < 1e-9); // 75%
        assert_eq!(age(7), 41.0); // max
    }

    #[test]
    fn describe_without_numeric_columns_fails() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "a,b").unwrap();
        writeln!(f, "x,y").unwrap();
        f.flush().unwrap();
        let ds = load_data(f.path()).unwrap();
        let err = run_plan(&ds, &AnalysisPlan::Describe).unwrap_err();
        assert!(matches!(err, ExecError::NoNumericColumns));
    }

    #[test]
    fn head_clamps_to_row_count() {
        let (_f, ds) = dataset();
        let ExecutionResult::DataFrame(frame) = run_plan(&ds, &AnalysisPlan::Head { n: 100 }).unwrap()
        else {
            panic!("expected dataframe");
        };
        assert_eq!(frame.shape(), (4, 4));
        assert_eq!(frame.rows[0][0], Value::Str("Alice".into()));
    }

    #[test]
    fn value_counts_orders_by_descending_count() {
        let (_f, ds) = dataset();
        let ExecutionResult::DataFrame(frame) =
            run_plan(&ds, &AnalysisPlan::ValueCounts { column: "city".into() }).unwrap()
        else {
            panic!("expected dataframe");
        };
        assert_eq!(frame.rows[0], vec![Value::Str("Boston".into()), Value::Int(2)]);
        assert_eq!(frame.rows.len(), 3);
    }

    #[test]
    fn aggregate_mean_and_unknown_column() {
        let (_f, ds) = dataset();
        let result = run_plan(
            &ds,
            &AnalysisPlan::Aggregate { column: "salary".into(), stat: Stat::Mean },
        )
        .unwrap();
        let ExecutionResult::Scalar { label, value } = result else {
            panic!("expected scalar");
        };
        assert_eq!(label, "mean(salary)");
        assert!((value.as_f64().unwrap() - 67625.0).abs() < 1e-9);

        let err = run_plan(
            &ds,
            &AnalysisPlan::Aggregate { column: "ghost".into(), stat: Stat::Mean },
        )
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn aggregate_mean_of_string_column_fails() {
        let (_f, ds) = dataset();
        let err = run_plan(
            &ds,
            &AnalysisPlan::Aggregate { column: "name".into(), stat: Stat::Mean },
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::NotNumeric(_)));
    }

    #[test]
    fn group_aggregate_keys_in_first_appearance_order() {
        let (_f, ds) = dataset();
        let ExecutionResult::DataFrame(frame) = run_plan(
            &ds,
            &AnalysisPlan::GroupAggregate {
                by: "city".into(),
                column: "salary".into(),
                stat: Stat::Mean,
            },
        )
        .unwrap()
        else {
            panic!("expected dataframe");
        };
        assert_eq!(frame.columns, vec!["city", "mean(salary)"]);
        assert_eq!(frame.rows[0][0], Value::Str("Boston".into()));
        assert!((frame.rows[0][1].as_f64().unwrap() - 77750.0).abs() < 1e-9);
    }

    #[test]
    fn shape_is_a_text_result() {
        let (_f, ds) = dataset();
        let result = run_plan(&ds, &AnalysisPlan::Shape).unwrap();
        assert_eq!(result.kind(), "text");
        assert_eq!(result, ExecutionResult::Text("4 rows x 4 columns".into()));
    }

    #[test]
    fn plans_round_trip_through_json() {
        let plan = AnalysisPlan::GroupAggregate {
            by: "city".into(),
            column: "salary".into(),
            stat: Stat::Max,
        };
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"op\":\"group_aggregate\""));
        let back: AnalysisPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let (_f, ds) = dataset();
        let a = run_plan(&ds, &AnalysisPlan::Describe).unwrap();
        let b = run_plan(&ds, &AnalysisPlan::Describe).unwrap();
        assert_eq!(a, b);
    }
}
