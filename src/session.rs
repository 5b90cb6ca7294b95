//! One user's working state: the loaded dataset, the agent, and the history of
//! answered questions.

use polars::prelude::PolarsError;

use crate::agent::{AgentError, QueryAgent};
use crate::chart_data::{self, ChartError, LineChart};
use crate::config::{AppConfig, FastPathConfig};
use crate::dataset::Dataset;
use crate::fast_path::{self, TopSkus};
use crate::history::{HistoryEntry, SessionHistory};
use crate::loader::{self, DataSource, LoadError, LoadOptions};
use crate::router::{self, Route};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Type a question first")]
    EmptyQuery,
    #[error("Load a CSV file before asking a question")]
    NoDataset,
    #[error("Column '{column}' not found. Available columns: {}", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("Column '{column}' is not numeric ({dtype})")]
    NonNumericColumn { column: String, dtype: String },
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    TopSkus(TopSkus),
    Text(String),
}

impl Answer {
    /// Text recorded in history
    pub fn to_text(&self) -> String {
        match self {
            Answer::TopSkus(top) => top.to_markdown(),
            Answer::Text(text) => text.clone(),
        }
    }
}

/// Everything produced by one submitted question
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: String,
    pub route: Route,
    pub result: Result<Answer, QueryError>,
    /// Present only when the question asked for a chart and the agent answered
    pub chart: Option<Result<LineChart, ChartError>>,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub fast_path: FastPathConfig,
    pub chart_row_limit: usize,
    pub load: LoadOptions,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fast_path: config.fast_path.clone(),
            chart_row_limit: config.display.chart_row_limit,
            load: LoadOptions::from_config(config),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct Session {
    agent: Box<dyn QueryAgent>,
    settings: SessionSettings,
    dataset: Option<Dataset>,
    history: SessionHistory,
}

impl Session {
    pub fn new(agent: Box<dyn QueryAgent>, settings: SessionSettings) -> Self {
        Self {
            agent,
            settings,
            dataset: None,
            history: SessionHistory::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Questions are only taken while a dataset is loaded
    pub fn accepts_queries(&self) -> bool {
        self.dataset.is_some()
    }

    /// Replace the dataset with `source`. A failed load leaves no dataset.
    pub fn load(&mut self, source: &DataSource) -> Result<&Dataset, LoadError> {
        self.dataset = None;
        let dataset = loader::load(source, &self.settings.load)?;
        Ok(self.dataset.insert(dataset))
    }

    pub fn clear_dataset(&mut self) {
        self.dataset = None;
    }

    /// Answer `query`, recording it in history when it succeeds
    pub fn submit(&mut self, query: &str) -> QueryOutcome {
        let query = query.trim().to_string();
        let route = router::route(&query);

        let Some(dataset) = self.dataset.as_ref().filter(|_| !query.is_empty()) else {
            let error = if query.is_empty() {
                QueryError::EmptyQuery
            } else {
                QueryError::NoDataset
            };
            return QueryOutcome {
                query,
                route,
                result: Err(error),
                chart: None,
            };
        };

        tracing::info!(%route, query = %query, "answering question");
        let result = match route {
            Route::FastPath => {
                fast_path::top_by_sum(dataset, &self.settings.fast_path).map(Answer::TopSkus)
            }
            Route::Agent => self
                .agent
                .answer(dataset, &query)
                .map(Answer::Text)
                .map_err(QueryError::from),
        };

        let chart = match (&result, route) {
            (Ok(_), Route::Agent) if router::wants_chart(&query) => {
                let chart = chart_data::line_chart(dataset, self.settings.chart_row_limit);
                if let Err(e) = &chart {
                    tracing::warn!(error = %e, "chart failed");
                }
                Some(chart)
            }
            _ => None,
        };

        match &result {
            Ok(answer) => self
                .history
                .push(HistoryEntry::new(query.clone(), answer.to_text(), route)),
            Err(e) => tracing::warn!(%route, error = %e, "question failed"),
        }

        QueryOutcome {
            query,
            route,
            result,
            chart,
        }
    }
}
