//! Messages shown to the user for load, query and chart failures.
//!
//! Errors are matched by type (LoadError and QueryError variants, PolarsError
//! variants, io::ErrorKind) so the UI never shows a raw debug chain.

use polars::prelude::PolarsError;
use std::io;

use crate::agent::AgentError;
use crate::chart_data::ChartError;
use crate::loader::LoadError;
use crate::session::QueryError;

pub fn user_message_from_load(err: &LoadError) -> String {
    match err {
        LoadError::Io { path, source } => format!(
            "Failed to load {}: {}",
            path.display(),
            user_message_from_io(source)
        ),
        LoadError::Decompress { name, format, .. } => format!(
            "Failed to load {}: the file is not valid {:?} data. Try --compression or rename the file.",
            name, format
        ),
        LoadError::Parse { name, source } => {
            format!("Failed to load {}: {}", name, user_message_from_polars(source))
        }
        LoadError::Empty { .. } | LoadError::Csv { .. } => err.to_string(),
    }
}

pub fn user_message_from_query(err: &QueryError) -> String {
    match err {
        QueryError::Agent(agent) => user_message_from_agent(agent),
        QueryError::Polars(source) => user_message_from_polars(source),
        other => other.to_string(),
    }
}

pub fn user_message_from_agent(err: &AgentError) -> String {
    match err {
        AgentError::Api { status: 401, .. } => {
            "The language model rejected the API key (401). Check your key.".to_string()
        }
        AgentError::Api { status: 429, body } => {
            format!("The language model is rate limiting requests (429): {}", body)
        }
        AgentError::StepLimit(steps) => format!(
            "No answer after {} steps. Try a more specific question.",
            steps
        ),
        other => other.to_string(),
    }
}

pub fn user_message_from_chart(err: &ChartError) -> String {
    match err {
        ChartError::NoNumericData => format!("Chart error: {}", err),
        ChartError::Polars(source) => format!("Chart error: {}", user_message_from_polars(source)),
    }
}

pub fn user_message_from_polars(err: &PolarsError) -> String {
    match err {
        PolarsError::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PolarsError::IO { error, .. } => user_message_from_io(error.as_ref()),
        PolarsError::NoData(msg) => format!("No data: {}", msg),
        PolarsError::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PolarsError::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PolarsError::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PolarsError::ComputeError(msg) => first_line(msg),
        PolarsError::SQLInterface(msg) | PolarsError::SQLSyntax(msg) => msg.to_string(),
        PolarsError::Context { error, msg } => {
            format!("{}: {}", msg, user_message_from_polars(error))
        }
        #[allow(unreachable_patterns)]
        _ => first_line(&err.to_string()),
    }
}

pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::IsADirectory => "Path is a directory, not a file.".to_string(),
        _ => err.to_string(),
    }
}

fn first_line(msg: &str) -> String {
    msg.lines()
        .next()
        .map(str::trim)
        .unwrap_or("An error occurred")
        .to_string()
}
