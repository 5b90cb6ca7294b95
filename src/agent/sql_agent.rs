//! Tool-using agent loop: the model either asks for a SQL query over the table
//! `df` or returns its final answer, one JSON object per turn.

use polars::prelude::*;
use polars_sql::SQLContext;
use serde::Deserialize;

use super::client::{ChatClient, ChatMessage};
use super::{AgentError, QueryAgent};
use crate::config::AgentConfig;
use crate::dataset::{idx_limit, Dataset, TablePreview};

/// Name the dataset is registered under for SQL
pub const TABLE_NAME: &str = "df";

const PROMPT_PREVIEW_ROWS: usize = 5;

/// One parsed model turn
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AgentReply {
    Sql { sql: String },
    Answer { answer: String },
}

impl AgentReply {
    /// Parse a model reply. Anything that is not one of the two JSON shapes is
    /// taken as the final answer verbatim.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let candidates = [
            Some(trimmed),
            strip_code_fence(trimmed),
            trimmed
                .find('{')
                .zip(trimmed.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &trimmed[start..=end]),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|candidate| serde_json::from_str(candidate).ok())
            .unwrap_or_else(|| AgentReply::Answer {
                answer: trimmed.to_string(),
            })
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?;
    let body = body.split_once('\n').map(|(_, rest)| rest)?;
    Some(body.trim_end().strip_suffix("```")?.trim())
}

pub struct SqlAgent<C> {
    client: C,
    max_steps: usize,
    result_row_limit: usize,
}

impl<C: ChatClient> SqlAgent<C> {
    pub fn new(client: C, config: &AgentConfig) -> Self {
        Self {
            client,
            max_steps: config.max_steps,
            result_row_limit: config.result_row_limit,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn system_prompt(&self, dataset: &Dataset) -> String {
        let mut prompt = String::from(
            "You answer questions about a table of supply chain data.\n\
             The table is available to SQL as `df`.\n\n\
             Reply with exactly one JSON object and nothing else:\n\
             {\"sql\": \"<query>\"} to run a SQL query and see its result, or\n\
             {\"answer\": \"<text>\"} once you can answer the question.\n\n\
             Columns:\n",
        );
        for (name, dtype) in dataset.schema_summary() {
            prompt.push_str(&format!("- {name} ({dtype})\n"));
        }
        prompt.push_str(&format!("\nThe table has {} rows.", dataset.height()));
        if let Ok(preview) = dataset.preview(PROMPT_PREVIEW_ROWS) {
            prompt.push_str(&format!(
                " First {} rows:\n\n{}",
                preview.rows.len(),
                preview.to_markdown()
            ));
        }
        prompt
    }

    /// Run `sql` and describe the outcome for the model; errors are reported
    /// back rather than ending the conversation.
    fn observe(&self, dataset: &Dataset, sql: &str) -> String {
        match self.run_sql(dataset, sql) {
            Ok(observation) => observation,
            Err(e) => {
                tracing::debug!(error = %e, "agent query failed");
                format!("The query failed: {e}")
            }
        }
    }

    fn run_sql(&self, dataset: &Dataset, sql: &str) -> PolarsResult<String> {
        let mut ctx = SQLContext::new();
        ctx.register(TABLE_NAME, dataset.frame().clone().lazy());
        let result = ctx
            .execute(sql)?
            .limit(idx_limit(self.result_row_limit.saturating_add(1)))
            .collect()?;

        let preview = TablePreview::from_frame(&result, self.result_row_limit)?;
        let mut text = preview.to_markdown();
        if result.height() > self.result_row_limit {
            text.push_str(&format!(
                "(only the first {} rows are shown)\n",
                self.result_row_limit
            ));
        }
        Ok(text)
    }
}

impl<C: ChatClient> QueryAgent for SqlAgent<C> {
    fn answer(&self, dataset: &Dataset, query: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt(dataset)),
            ChatMessage::user(query),
        ];

        for step in 1..=self.max_steps {
            let reply = self.client.complete(&messages)?;
            match AgentReply::parse(&reply) {
                AgentReply::Answer { answer } => {
                    tracing::info!(steps = step, "agent answered");
                    return Ok(answer);
                }
                AgentReply::Sql { sql } => {
                    tracing::debug!(step, %sql, "agent requested query");
                    let observation = self.observe(dataset, &sql);
                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::user(format!(
                        "Result:\n{observation}\nReply with the next JSON object."
                    )));
                }
            }
        }

        tracing::warn!(max_steps = self.max_steps, "agent ran out of steps");
        Err(AgentError::StepLimit(self.max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies and records every conversation it was sent
    struct ScriptedClient {
        replies: RefCell<VecDeque<String>>,
        seen: RefCell<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatClient for ScriptedClient {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
            self.seen.borrow_mut().push(messages.to_vec());
            self.replies
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| AgentError::Transport("script exhausted".to_string()))
        }
    }

    fn dataset() -> Dataset {
        let df = df!(
            "sku_id" => [1i64, 2, 3],
            "base_price" => [10.0f64, 20.0, 30.0]
        )
        .unwrap();
        Dataset::from_frame(df, "prices.csv")
    }

    fn agent(replies: &[&str]) -> SqlAgent<ScriptedClient> {
        SqlAgent::new(ScriptedClient::new(replies), &AgentConfig::default())
    }

    #[test]
    fn test_parse_reply_shapes() {
        assert_eq!(
            AgentReply::parse(r#"{"sql": "SELECT 1"}"#),
            AgentReply::Sql {
                sql: "SELECT 1".to_string()
            }
        );
        assert_eq!(
            AgentReply::parse("```json\n{\"answer\": \"20\"}\n```"),
            AgentReply::Answer {
                answer: "20".to_string()
            }
        );
        assert_eq!(
            AgentReply::parse("Sure: {\"sql\": \"SELECT 2\"} ok"),
            AgentReply::Sql {
                sql: "SELECT 2".to_string()
            }
        );
        assert_eq!(
            AgentReply::parse("  The average is 20.  "),
            AgentReply::Answer {
                answer: "The average is 20.".to_string()
            }
        );
    }

    #[test]
    fn test_query_result_is_fed_back() {
        let agent = agent(&[
            r#"{"sql": "SELECT AVG(base_price) AS avg_price FROM df"}"#,
            r#"{"answer": "The average price is 20."}"#,
        ]);
        let answer = agent.answer(&dataset(), "What is the average price?").unwrap();
        assert_eq!(answer, "The average price is 20.");

        let seen = agent.client().seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0][0].content.contains("- base_price (f64)"));
        assert_eq!(seen[0][1].content, "What is the average price?");
        let observation = &seen[1].last().unwrap();
        assert_eq!(observation.role, Role::User);
        assert!(observation.content.contains("| avg_price |"));
        assert!(observation.content.contains("| 20"));
    }

    #[test]
    fn test_sql_errors_are_reported_to_model() {
        let agent = agent(&[
            r#"{"sql": "SELECT nope FROM df"}"#,
            r#"{"answer": "done"}"#,
        ]);
        assert_eq!(agent.answer(&dataset(), "q").unwrap(), "done");
        let seen = agent.client().seen.borrow();
        assert!(seen[1].last().unwrap().content.contains("The query failed"));
    }

    #[test]
    fn test_step_limit() {
        let sql = r#"{"sql": "SELECT * FROM df"}"#;
        let agent = agent(&[sql, sql, sql, sql, sql, sql]);
        assert!(matches!(
            agent.answer(&dataset(), "loop forever"),
            Err(AgentError::StepLimit(5))
        ));
        assert_eq!(agent.client().seen.borrow().len(), 5);
    }

    #[test]
    fn test_client_errors_propagate() {
        let agent = agent(&[]);
        assert!(matches!(
            agent.answer(&dataset(), "q"),
            Err(AgentError::Transport(_))
        ));
    }
}
