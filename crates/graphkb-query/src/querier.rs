//! Parse, translate, execute and historize a query

use crate::error::QueryError;
use crate::executor::{Cursor, QueryExecutor};
use crate::history::Historizer;
use crate::parser::QueryParser;
use crate::translator::{Projection, QueryTranslator};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time spent in each stage of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub parsing: Duration,
    pub translation: Duration,
    pub execution: Duration,
}

impl Statistics {
    pub fn total(&self) -> Duration {
        self.parsing + self.translation + self.execution
    }
}

/// Run `f` and time it.
pub fn measure_duration<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let started = Instant::now();
    let value = f();
    (value, started.elapsed())
}

pub struct QuerierResult {
    pub cursor: Box<dyn Cursor>,
    pub projections: Vec<Projection>,
    pub statistics: Statistics,
}

impl fmt::Debug for QuerierResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerierResult")
            .field("projections", &self.projections)
            .field("statistics", &self.statistics)
            .finish_non_exhaustive()
    }
}

struct FailedAttempt {
    error: QueryError,
    sql: String,
}

pub struct Querier {
    parser: Arc<dyn QueryParser>,
    translator: Arc<dyn QueryTranslator>,
    executor: Arc<dyn QueryExecutor>,
    historizer: Arc<dyn Historizer>,
    timeout: Option<Duration>,
}

impl Querier {
    pub fn new(
        parser: Arc<dyn QueryParser>,
        translator: Arc<dyn QueryTranslator>,
        executor: Arc<dyn QueryExecutor>,
        historizer: Arc<dyn Historizer>,
    ) -> Self {
        Querier {
            parser,
            translator,
            executor,
            historizer,
            timeout: None,
        }
    }

    /// Abort executions running longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run a query and record the attempt. A failure to record supersedes
    /// the outcome of the query.
    pub async fn query(&self, query: &str) -> Result<QuerierResult, QueryError> {
        match self.run(query).await {
            Ok((result, sql)) => {
                let duration_ms = u64::try_from(result.statistics.execution.as_millis()).unwrap_or(u64::MAX);
                self.historizer
                    .save_successful_query(query, &sql, duration_ms)
                    .await
                    .map_err(QueryError::History)?;
                tracing::debug!("Query executed in {}ms", duration_ms);
                Ok(result)
            }
            Err(FailedAttempt { error, sql }) => {
                tracing::warn!("Query failed: {}", error);
                self.historizer
                    .save_failed_query(query, &sql, &error)
                    .await
                    .map_err(QueryError::History)?;
                Err(error)
            }
        }
    }

    async fn run(&self, query: &str) -> Result<(QuerierResult, String), FailedAttempt> {
        let mut statistics = Statistics::default();

        let (parsed, parsing) = measure_duration(|| self.parser.parse(query));
        statistics.parsing = parsing;
        let parsed = parsed.map_err(|error| FailedAttempt {
            error,
            sql: String::new(),
        })?;

        let (translation, translating) = measure_duration(|| self.translator.translate(&parsed));
        statistics.translation = translating;
        let translation = translation.map_err(|error| FailedAttempt {
            error,
            sql: String::new(),
        })?;

        let started = Instant::now();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.executor.query(&translation))
                .await
                .unwrap_or_else(|_| Err(QueryError::Timeout(limit))),
            None => self.executor.query(&translation).await,
        };
        statistics.execution = started.elapsed();

        match outcome {
            Ok(result) => Ok((
                QuerierResult {
                    cursor: result.cursor,
                    projections: result.projections,
                    statistics,
                },
                translation.query,
            )),
            Err(error) => Err(FailedAttempt {
                error,
                sql: translation.query,
            }),
        }
    }
}
