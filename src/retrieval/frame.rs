//! Conversion of service records into polars frames, and the column
//! transformations applied while assembling a retrieval.

use crate::error::UsdmError;
use crate::query::GeoIdentifiers;
use crate::retrieval::error::RetrievalError;
use crate::utils::parse_service_date;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde_json::{Map, Value};

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Parses a response body as a list of JSON objects.
pub(crate) fn parse_records(url: &str, body: &[u8]) -> Result<Vec<Map<String, Value>>, UsdmError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RetrievalError::JsonParse(url.to_string(), e))?;
    let unexpected = |message: &str| RetrievalError::UnexpectedPayload {
        url: url.to_string(),
        message: message.to_string(),
    };

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(unexpected("expected every record to be an object").into()),
            })
            .collect(),
        _ => Err(unexpected("expected a list of records").into()),
    }
}

/// Builds a frame from records. Columns appear in order of first appearance;
/// keys missing from a record become nulls.
pub(crate) fn records_to_frame(records: &[Map<String, Value>]) -> PolarsResult<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<Option<&Value>> = records
                .iter()
                .map(|r| r.get(*name).filter(|v| !v.is_null()))
                .collect();
            infer_series(name, &values).into_column()
        })
        .collect();

    DataFrame::new(columns)
}

fn infer_series(name: &str, values: &[Option<&Value>]) -> Series {
    let present: Vec<&Value> = values.iter().flatten().copied().collect();
    let name: PlSmallStr = name.into();

    if !present.is_empty() && present.iter().all(|v| v.is_i64()) {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        Series::new(name, data)
    } else if !present.is_empty() && present.iter().all(|v| v.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        Series::new(name, data)
    } else if !present.is_empty() && present.iter().all(|v| v.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        Series::new(name, data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| {
                v.map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        Series::new(name, data)
    }
}

/// Renames columns per `(from, to)` rule; rules for absent columns are skipped.
///
/// The frame is rebuilt from the renamed columns so its schema carries the
/// new names when it is joined lazily.
pub(crate) fn relabel(df: DataFrame, rules: &[(String, String)]) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = df
        .take_columns()
        .into_iter()
        .map(|mut column| {
            let target = rules
                .iter()
                .find(|(from, _)| column.name().as_str() == from.as_str())
                .map(|(_, to)| to.as_str());
            if let Some(to) = target {
                column.rename(to.into());
            }
            column
        })
        .collect();
    DataFrame::new(columns)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Brings a shared column to one dtype on both sides.
fn align_dtypes(left: &mut DataFrame, right: &mut DataFrame, name: &str) -> PolarsResult<()> {
    let left_dtype = left.column(name)?.dtype().clone();
    let right_dtype = right.column(name)?.dtype().clone();
    if left_dtype == right_dtype {
        return Ok(());
    }
    let numeric = |dtype: &DataType| dtype.is_integer() || dtype.is_float();
    let target = if numeric(&left_dtype) && numeric(&right_dtype) {
        DataType::Float64
    } else {
        DataType::String
    };
    let casted = left.column(name)?.cast(&target)?;
    left.with_column(casted)?;
    let casted = right.column(name)?.cast(&target)?;
    right.with_column(casted)?;
    Ok(())
}

/// Full outer join on every shared column. Null keys match and key columns
/// are coalesced.
fn full_join(mut left: DataFrame, mut right: DataFrame, url: &str) -> Result<DataFrame, UsdmError> {
    let right_names = column_names(&right);
    let shared: Vec<String> = column_names(&left)
        .into_iter()
        .filter(|name| right_names.contains(name))
        .collect();
    if shared.is_empty() {
        return Err(RetrievalError::UnexpectedPayload {
            url: url.to_string(),
            message: "response shares no columns with the previous responses".to_string(),
        }
        .into());
    }
    for name in &shared {
        align_dtypes(&mut left, &mut right, name)?;
    }

    let keys: Vec<Expr> = shared.iter().map(|name| col(name.as_str())).collect();
    let mut args = JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns);
    args.join_nulls = true;
    Ok(left
        .lazy()
        .join(right.lazy(), keys.clone(), keys, args)
        .collect()?)
}

/// Folds the per-query frames of one geography into one frame, left to
/// right, each paired with its source URL. Empty frames contribute nothing.
pub(crate) fn outer_join_fold(frames: Vec<(String, DataFrame)>) -> Result<DataFrame, UsdmError> {
    let mut merged: Option<DataFrame> = None;
    for (url, frame) in frames {
        if frame.height() == 0 {
            continue;
        }
        merged = Some(match merged {
            None => frame,
            Some(left) => full_join(left, frame, &url)?,
        });
    }
    Ok(merged.unwrap_or_default())
}

/// Sets the identifier columns on every row of `df`.
pub(crate) fn attach_identifiers(df: &mut DataFrame, identifiers: &GeoIdentifiers) -> PolarsResult<()> {
    let height = df.height();
    for (name, value) in &identifiers.columns {
        let series = Series::new((*name).into(), vec![value.as_str(); height]);
        df.with_column(series)?;
    }
    Ok(())
}

/// Concatenates frames row-wise over the union of their columns.
pub(crate) fn concat_diagonal(frames: Vec<DataFrame>) -> PolarsResult<DataFrame> {
    let frames: Vec<DataFrame> = frames.into_iter().filter(|f| f.width() > 0).collect();
    match frames.len() {
        0 => Ok(DataFrame::default()),
        1 => Ok(frames.into_iter().next().unwrap_or_default()),
        _ => {
            let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
            concat_lf_diagonal(lazy, UnionArgs::default())?.collect()
        }
    }
}

/// Converts every column whose name contains `"Date"` to the `Date` dtype,
/// dropping any time of day. Unparseable text becomes null.
pub(crate) fn coerce_date_columns(df: &mut DataFrame) -> PolarsResult<()> {
    for name in column_names(df) {
        if !name.contains("Date") {
            continue;
        }
        let column = df.column(&name)?;
        let converted = match column.dtype() {
            DataType::Date => continue,
            DataType::String => {
                let days: Vec<Option<i32>> = column
                    .str()?
                    .into_iter()
                    .map(|v| v.and_then(parse_service_date).map(days_since_epoch))
                    .collect();
                Series::new(name.as_str().into(), days)
                    .cast(&DataType::Date)?
                    .into_column()
            }
            DataType::Datetime(_, _) => column.cast(&DataType::Date)?,
            _ => continue,
        };
        df.with_column(converted)?;
    }
    Ok(())
}

/// A constant `Date` column of `height` rows.
pub(crate) fn constant_date_column(name: &str, date: NaiveDate, height: usize) -> PolarsResult<Series> {
    Series::new(name.into(), vec![days_since_epoch(date); height]).cast(&DataType::Date)
}

/// Drops every column mentioning a drought level that was not requested.
pub(crate) fn drop_unrequested_levels(df: &DataFrame, requested: &[u8]) -> PolarsResult<DataFrame> {
    let unrequested: Vec<String> = (0..=crate::types::statistic::MAX_DROUGHT_LEVEL)
        .filter(|level| !requested.contains(level))
        .map(|level| format!("D{}", level))
        .collect();
    let keep: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| !unrequested.iter().any(|tag| name.contains(tag.as_str())))
        .collect();
    df.select(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        parse_records("test://", value.to_string().as_bytes()).unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        column_names(df)
    }

    #[test]
    fn test_parse_records_rejects_non_list() {
        let err = parse_records("test://", br#"{"a": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            UsdmError::Retrieval(RetrievalError::UnexpectedPayload { .. })
        ));
        let err = parse_records("test://", b"not json").unwrap_err();
        assert!(matches!(err, UsdmError::Retrieval(RetrievalError::JsonParse(_, _))));
    }

    #[test]
    fn test_records_to_frame_infers_types() -> Result<(), Box<dyn std::error::Error>> {
        let df = records_to_frame(&records(json!([
            {"fips": "01001", "weeks": 3, "share": 1, "flag": true},
            {"fips": "01003", "weeks": 4, "share": 2.5, "extra": null},
            {"fips": "01005", "late": "x"}
        ])))?;

        assert_eq!(names(&df), vec!["fips", "weeks", "share", "flag", "extra", "late"]);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("fips")?.dtype(), &DataType::String);
        assert_eq!(df.column("weeks")?.dtype(), &DataType::Int64);
        assert_eq!(df.column("share")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("flag")?.dtype(), &DataType::Boolean);
        assert_eq!(df.column("extra")?.dtype(), &DataType::String);
        assert_eq!(df.column("weeks")?.null_count(), 1);
        assert_eq!(df.column("late")?.null_count(), 2);
        Ok(())
    }

    #[test]
    fn test_relabel_skips_missing_columns() -> Result<(), Box<dyn std::error::Error>> {
        let df = records_to_frame(&records(json!([{"d0": 1.5, "validStart": "2023-01-03"}])))?;
        let df = relabel(
            df,
            &[
                ("d0".to_string(), "D0_Area".to_string()),
                ("d4".to_string(), "D4_Area".to_string()),
                ("validStart".to_string(), "mapStartDate".to_string()),
            ],
        )?;
        assert_eq!(names(&df), vec!["D0_Area", "mapStartDate"]);
        Ok(())
    }

    fn rules(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    #[test]
    fn test_relabelled_frames_join_on_new_names() -> Result<(), Box<dyn std::error::Error>> {
        let area = relabel(
            records_to_frame(&records(json!([
                {"mapDate": "2023-01-03", "none": 10.0, "d0": 1.0, "validStart": "2023-01-03", "validEnd": "2023-01-09"}
            ])))?,
            &rules(&[
                ("none", "NONE_Area"),
                ("d0", "D0_Area"),
                ("validStart", "mapStartDate"),
                ("validEnd", "mapEndDate"),
            ]),
        )?;
        let percent = relabel(
            records_to_frame(&records(json!([
                {"mapDate": "2023-01-03", "none": 90.0, "d0": 9.0, "validStart": "2023-01-03", "validEnd": "2023-01-09"}
            ])))?,
            &rules(&[
                ("none", "NONE_AreaPercent"),
                ("d0", "D0_AreaPercent"),
                ("validStart", "mapStartDate"),
                ("validEnd", "mapEndDate"),
            ]),
        )?;
        assert_eq!(
            area.schema().iter_names().map(|n| n.to_string()).collect::<Vec<_>>(),
            vec!["mapDate", "NONE_Area", "D0_Area", "mapStartDate", "mapEndDate"]
        );

        let merged = outer_join_fold(vec![("area".to_string(), area), ("percent".to_string(), percent)])?;
        assert_eq!(merged.height(), 1);
        assert_eq!(
            names(&merged),
            vec![
                "mapDate",
                "NONE_Area",
                "D0_Area",
                "mapStartDate",
                "mapEndDate",
                "NONE_AreaPercent",
                "D0_AreaPercent"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_outer_join_fold_merges_on_shared_columns() -> Result<(), Box<dyn std::error::Error>> {
        let area = records_to_frame(&records(json!([
            {"mapDate": "2023-01-03", "fips": null, "D0_Area": 1.0},
            {"mapDate": "2023-01-10", "fips": null, "D0_Area": 2.0}
        ])))?;
        let dsci = records_to_frame(&records(json!([
            {"mapDate": "2023-01-10", "fips": null, "DSCI": 40},
            {"mapDate": "2023-01-17", "fips": null, "DSCI": 50}
        ])))?;
        let empty = DataFrame::default();

        let merged = outer_join_fold(vec![
            ("a".to_string(), area),
            ("b".to_string(), empty),
            ("c".to_string(), dsci),
        ])?;
        assert_eq!(names(&merged), vec!["mapDate", "fips", "D0_Area", "DSCI"]);
        assert_eq!(merged.height(), 3);
        Ok(())
    }

    #[test]
    fn test_outer_join_fold_aligns_numeric_keys() -> Result<(), Box<dyn std::error::Error>> {
        let left = records_to_frame(&records(json!([{"k": 1, "a": "x"}])))?;
        let right = records_to_frame(&records(json!([{"k": 1.5, "b": "y"}])))?;
        let merged = outer_join_fold(vec![("l".to_string(), left), ("r".to_string(), right)])?;
        assert_eq!(merged.column("k")?.dtype(), &DataType::Float64);
        assert_eq!(merged.height(), 2);
        Ok(())
    }

    #[test]
    fn test_outer_join_fold_requires_shared_column() -> Result<(), Box<dyn std::error::Error>> {
        let left = records_to_frame(&records(json!([{"a": 1}])))?;
        let right = records_to_frame(&records(json!([{"b": 2}])))?;
        let err = outer_join_fold(vec![("l".to_string(), left), ("r".to_string(), right)])
            .unwrap_err();
        assert!(matches!(
            err,
            UsdmError::Retrieval(RetrievalError::UnexpectedPayload { ref url, .. }) if url == "r"
        ));
        Ok(())
    }

    #[test]
    fn test_outer_join_fold_all_empty() -> Result<(), Box<dyn std::error::Error>> {
        let merged = outer_join_fold(vec![("a".to_string(), records_to_frame(&[])?)])?;
        assert_eq!(merged.height(), 0);
        Ok(())
    }

    #[test]
    fn test_coerce_date_columns() -> Result<(), Box<dyn std::error::Error>> {
        let mut df = records_to_frame(&records(json!([
            {"mapDate": "2023-12-26T00:00:00", "mapEndDate": "2024-01-01T23:59:59", "note": "2023-01-01"},
            {"mapDate": "12/19/2023", "mapEndDate": "garbage", "note": "2023-01-02"}
        ])))?;
        coerce_date_columns(&mut df)?;

        assert_eq!(df.column("mapDate")?.dtype(), &DataType::Date);
        assert_eq!(df.column("mapEndDate")?.dtype(), &DataType::Date);
        assert_eq!(df.column("note")?.dtype(), &DataType::String);
        assert_eq!(df.column("mapEndDate")?.null_count(), 1);

        let end = df.column("mapEndDate")?.cast(&DataType::Int32)?;
        let expected = days_since_epoch(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end.i32()?.get(0), Some(expected));
        Ok(())
    }

    #[test]
    fn test_drop_unrequested_levels() -> Result<(), Box<dyn std::error::Error>> {
        let df = records_to_frame(&records(json!([
            {"mapDate": "x", "NONE_Area": 1, "D0_Area": 1, "D1_Area": 1, "D3_Area": 1, "D4_Area": 1}
        ])))?;
        let trimmed = drop_unrequested_levels(&df, &[1, 3])?;
        assert_eq!(names(&trimmed), vec!["mapDate", "NONE_Area", "D1_Area", "D3_Area"]);
        Ok(())
    }

    #[test]
    fn test_attach_identifiers_and_concat() -> Result<(), Box<dyn std::error::Error>> {
        let mut first = records_to_frame(&records(json!([{"DSCI": 1}, {"DSCI": 2}])))?;
        let mut second = records_to_frame(&records(json!([{"DSCI": 3, "extra": "e"}])))?;
        attach_identifiers(
            &mut first,
            &GeoIdentifiers {
                columns: vec![("state_code", "01".to_string()), ("state_name", "Alabama".to_string())],
            },
        )?;
        attach_identifiers(
            &mut second,
            &GeoIdentifiers {
                columns: vec![("state_code", "02".to_string()), ("state_name", "Alaska".to_string())],
            },
        )?;

        let combined = concat_diagonal(vec![first, DataFrame::default(), second])?;
        assert_eq!(combined.height(), 3);
        assert_eq!(names(&combined), vec!["DSCI", "state_code", "state_name", "extra"]);
        assert_eq!(combined.column("extra")?.null_count(), 2);
        let codes: Vec<Option<&str>> = combined.column("state_code")?.str()?.into_iter().collect();
        assert_eq!(codes, vec![Some("01"), Some("01"), Some("02")]);
        Ok(())
    }
}
