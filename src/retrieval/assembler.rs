use crate::error::UsdmError;
use crate::query::QueryGroup;
use crate::retrieval::fetcher::{fetch_ok, JsonFetcher};
use crate::retrieval::frame::{
    attach_identifiers, coerce_date_columns, concat_diagonal, outer_join_fold, parse_records,
    records_to_frame, relabel,
};
use crate::retrieval::progress::ProgressReporter;
use log::debug;
use polars::prelude::DataFrame;

/// Executes a query plan and merges the responses into one frame.
pub struct ResultAssembler<'a> {
    fetcher: &'a dyn JsonFetcher,
    progress: &'a dyn ProgressReporter,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(fetcher: &'a dyn JsonFetcher, progress: &'a dyn ProgressReporter) -> Self {
        Self { fetcher, progress }
    }

    /// Fetches every query in planning order. Within a group the responses
    /// are outer-joined; groups are stacked row-wise with their identifiers.
    /// Columns whose name contains `"Date"` are converted to dates.
    ///
    /// The first failing request aborts the whole retrieval.
    pub fn assemble(&self, label: &str, groups: &[QueryGroup]) -> Result<DataFrame, UsdmError> {
        let total: usize = groups.iter().map(|g| g.queries.len()).sum();
        self.progress.start(label, total);

        let mut done = 0;
        let mut blocks = Vec::with_capacity(groups.len());
        for group in groups {
            let mut frames = Vec::with_capacity(group.queries.len());
            for query in &group.queries {
                let body = fetch_ok(self.fetcher, &query.url)?;
                let records = parse_records(&query.url, &body)?;
                let frame = relabel(records_to_frame(&records)?, &query.relabel)?;
                debug!("{} records from {}", records.len(), query.url);
                frames.push((query.url.clone(), frame));

                done += 1;
                self.progress.advance(done, total, &query.url);
            }

            let mut block = outer_join_fold(frames)?;
            if let Some(identifiers) = &group.identifiers {
                if block.height() > 0 {
                    attach_identifiers(&mut block, identifiers)?;
                }
            }
            blocks.push(block);
        }

        let mut result = concat_diagonal(blocks)?;
        coerce_date_columns(&mut result)?;
        self.progress.finish(label, result.height());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{GeoIdentifiers, PlannedQuery};
    use crate::retrieval::error::RetrievalError;
    use crate::retrieval::fetcher::mock::MockFetcher;
    use crate::retrieval::progress::NullProgress;
    use polars::prelude::DataType;
    use reqwest::StatusCode;

    fn query(url: &str, rules: &[(&str, &str)]) -> PlannedQuery {
        PlannedQuery {
            url: url.to_string(),
            relabel: rules
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    fn ids(code: &str) -> Option<GeoIdentifiers> {
        Some(GeoIdentifiers {
            columns: vec![("state_code", code.to_string())],
        })
    }

    #[test]
    fn test_assemble_joins_then_stacks() -> Result<(), Box<dyn std::error::Error>> {
        let fetcher = MockFetcher::new("[]")
            .route("/area", r#"[{"mapDate": "2023-01-03T00:00:00", "d0": 1.5}]"#)
            .route("/dsci", r#"[{"mapDate": "2023-01-03T00:00:00", "DSCI": 12}]"#);
        let groups = vec![
            QueryGroup {
                identifiers: ids("01"),
                queries: vec![
                    query("http://x/area?aoi=01", &[("d0", "D0_Area")]),
                    query("http://x/dsci?aoi=01", &[]),
                ],
            },
            QueryGroup {
                identifiers: ids("02"),
                queries: vec![query("http://x/area?aoi=02", &[("d0", "D0_Area")])],
            },
        ];

        let df = ResultAssembler::new(&fetcher, &NullProgress).assemble("test", &groups)?;
        assert_eq!(df.height(), 2);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["mapDate", "D0_Area", "DSCI", "state_code"]);
        assert_eq!(df.column("mapDate")?.dtype(), &DataType::Date);
        assert_eq!(df.column("DSCI")?.null_count(), 1);
        assert_eq!(
            fetcher.requests(),
            vec!["http://x/area?aoi=01", "http://x/dsci?aoi=01", "http://x/area?aoi=02"]
        );
        Ok(())
    }

    #[test]
    fn test_assemble_aborts_on_http_error() {
        let fetcher = MockFetcher::new("[]").route_status("/dsci", StatusCode::INTERNAL_SERVER_ERROR);
        let groups = vec![QueryGroup {
            identifiers: None,
            queries: vec![query("http://x/dsci", &[]), query("http://x/area", &[])],
        }];
        let err = ResultAssembler::new(&fetcher, &NullProgress)
            .assemble("test", &groups)
            .unwrap_err();
        assert!(matches!(
            err,
            UsdmError::Retrieval(RetrievalError::HttpStatus { ref url, .. }) if url == "http://x/dsci"
        ));
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[test]
    fn test_assemble_empty_responses() -> Result<(), Box<dyn std::error::Error>> {
        let fetcher = MockFetcher::new("[]");
        let groups = vec![QueryGroup {
            identifiers: ids("01"),
            queries: vec![query("http://x/a", &[])],
        }];
        let df = ResultAssembler::new(&fetcher, &NullProgress).assemble("test", &groups)?;
        assert_eq!(df.height(), 0);
        Ok(())
    }
}
