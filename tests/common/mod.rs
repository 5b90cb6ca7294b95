#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use supplychat::agent::AgentError;
use supplychat::{Dataset, LoadOptions, QueryAgent, Session, SessionSettings};
use tempfile::TempDir;

pub const SALES_CSV: &str = "record_ID,week,store_id,sku_id,units_sold\n\
1,17/01/11,8091,216418,20\n\
2,17/01/11,8091,216419,28\n\
3,17/01/11,8091,216425,19\n\
4,24/01/11,8095,216418,44\n\
5,24/01/11,8095,216233,52\n\
6,24/01/11,8095,217390,10\n\
7,31/01/11,8094,219009,5\n\
8,31/01/11,8094,216419,3\n";

/// Write `contents` to `name` inside a fresh temp dir
pub fn write_fixture(name: &str, contents: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    (dir, path)
}

/// Settings whose sample directory is `samples_dir`
pub fn settings_with_samples(samples_dir: &Path) -> SessionSettings {
    SessionSettings {
        load: LoadOptions::default().with_samples_dir(samples_dir),
        ..SessionSettings::default()
    }
}

/// Agent that answers with a fixed string and counts its calls
#[derive(Clone, Default)]
pub struct StubAgent {
    pub reply: String,
    pub calls: Rc<Cell<usize>>,
}

impl StubAgent {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl QueryAgent for StubAgent {
    fn answer(&self, _dataset: &Dataset, _query: &str) -> Result<String, AgentError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.reply.clone())
    }
}

/// Agent whose answer names the question it was asked
pub struct EchoAgent;

impl QueryAgent for EchoAgent {
    fn answer(&self, _dataset: &Dataset, query: &str) -> Result<String, AgentError> {
        Ok(format!("answer to: {query}"))
    }
}

/// Agent that always fails the way an unreachable endpoint does
pub struct FailingAgent;

impl QueryAgent for FailingAgent {
    fn answer(&self, _dataset: &Dataset, _query: &str) -> Result<String, AgentError> {
        Err(AgentError::Transport("connection refused".to_string()))
    }
}

pub fn session_with(agent: impl QueryAgent + 'static, settings: SessionSettings) -> Session {
    Session::new(Box::new(agent), settings)
}
