use supplychat::chart_data::ChartError;
use supplychat::config::FastPathConfig;
use supplychat::session::{Answer, QueryError};
use supplychat::{DataSource, LoadError, Route, SampleFile, SessionSettings, UploadedFile};

mod common;

fn sales_upload() -> DataSource {
    DataSource::Upload(UploadedFile::new(
        "sales.csv",
        common::SALES_CSV.as_bytes().to_vec(),
    ))
}

#[test]
fn test_top_sku_question_uses_fast_path() {
    let agent = common::StubAgent::new("unused");
    let calls = agent.calls.clone();
    let mut session = common::session_with(agent, SessionSettings::default());
    session.load(&sales_upload()).unwrap();

    let outcome = session.submit("What are the top 5 SKUs by units sold?");
    assert_eq!(outcome.route, Route::FastPath);
    assert!(outcome.chart.is_none());
    assert_eq!(calls.get(), 0);

    match outcome.result {
        Ok(Answer::TopSkus(top)) => {
            assert_eq!(top.len(), 5);
            assert_eq!(top.rows[0], ("216418".to_string(), 64.0));
            assert_eq!(top.rows[1], ("216233".to_string(), 52.0));
            assert_eq!(top.rows[2], ("216419".to_string(), 31.0));
            assert_eq!(top.rows[3], ("216425".to_string(), 19.0));
            assert_eq!(top.rows[4], ("217390".to_string(), 10.0));
        }
        other => panic!("expected TopSkus, got {:?}", other),
    }
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().get(0).unwrap().route, Route::FastPath);
}

#[test]
fn test_other_questions_go_to_agent() {
    let agent = common::StubAgent::new("The average is 22.6");
    let calls = agent.calls.clone();
    let mut session = common::session_with(agent, SessionSettings::default());
    session.load(&sales_upload()).unwrap();

    let outcome = session.submit("What is the average units sold?");
    assert_eq!(outcome.route, Route::Agent);
    assert_eq!(calls.get(), 1);
    assert!(matches!(outcome.result, Ok(Answer::Text(ref t)) if t == "The average is 22.6"));
    assert!(outcome.chart.is_none());
}

#[test]
fn test_chart_keyword_adds_line_chart() {
    let mut session =
        common::session_with(common::StubAgent::new("Rising"), SessionSettings::default());
    session.load(&sales_upload()).unwrap();

    let outcome = session.submit("Plot units sold over time");
    match outcome.chart {
        Some(Ok(chart)) => {
            let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
            assert!(names.contains(&"units_sold"));
            assert!(!names.contains(&"week"));
        }
        other => panic!("expected a chart, got {:?}", other.map(|c| c.map(|c| c.series.len()))),
    }
}

#[test]
fn test_chart_failure_keeps_answer_and_history() {
    let mut session =
        common::session_with(common::StubAgent::new("No numbers"), SessionSettings::default());
    let text_only = UploadedFile::new("names.csv", b"supplier,region\nAcme,North\n".to_vec());
    session.load(&DataSource::Upload(text_only)).unwrap();

    let outcome = session.submit("show me a chart of suppliers");
    assert!(outcome.is_success());
    assert!(matches!(outcome.chart, Some(Err(ChartError::NoNumericData))));
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_failures_leave_history_unchanged() {
    let mut session = common::session_with(common::FailingAgent, SessionSettings::default());
    session.load(&sales_upload()).unwrap();

    let outcome = session.submit("What is the average price trend?");
    assert!(matches!(outcome.result, Err(QueryError::Agent(_))));
    assert!(outcome.chart.is_none());
    assert!(session.history().is_empty());

    let outcome = session.submit("top sku");
    assert!(outcome.is_success());
    assert_eq!(session.history().len(), 1);

    session.submit("why?");
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_history_newest_first() {
    let mut session = common::session_with(common::EchoAgent, SessionSettings::default());
    session.load(&sales_upload()).unwrap();

    session.submit("first question");
    session.submit("second question");
    session.submit("top 5 sku by units");

    let entries: Vec<(&str, &str, Route)> = session
        .history()
        .newest_first()
        .map(|entry| (entry.question.as_str(), entry.answer.as_str(), entry.route))
        .collect();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, "top 5 sku by units");
    assert!(entries[0].1.starts_with("| sku_id | units_sold |"));
    assert_eq!(entries[0].2, Route::FastPath);
    assert_eq!(
        entries[1],
        ("second question", "answer to: second question", Route::Agent)
    );
    assert_eq!(
        entries[2],
        ("first question", "answer to: first question", Route::Agent)
    );
}

#[test]
fn test_missing_sku_column_on_fast_path() {
    let mut session = common::session_with(common::StubAgent::new("ok"), SessionSettings::default());
    let upload = UploadedFile::new("submission.csv", b"record_ID,units_sold\n1,3\n".to_vec());
    session.load(&DataSource::Upload(upload)).unwrap();

    let outcome = session.submit("top 5 sku");
    match outcome.result {
        Err(QueryError::MissingColumn { column, available }) => {
            assert_eq!(column, "sku_id");
            assert_eq!(available, vec!["record_ID", "units_sold"]);
        }
        other => panic!("expected MissingColumn, got {:?}", other),
    }
    assert!(session.history().is_empty());
}

#[test]
fn test_configured_fast_path_columns() {
    let settings = SessionSettings {
        fast_path: FastPathConfig {
            key_column: "product".to_string(),
            quantity_column: "qty".to_string(),
            limit: 2,
        },
        ..SessionSettings::default()
    };
    let mut session = common::session_with(common::StubAgent::new("ok"), settings);
    let upload = UploadedFile::new("p.csv", b"product,qty\na,1\nb,5\nc,3\na,1\n".to_vec());
    session.load(&DataSource::Upload(upload)).unwrap();

    match session.submit("top sku").result {
        Ok(Answer::TopSkus(top)) => {
            assert_eq!(top.rows, vec![("b".to_string(), 5.0), ("c".to_string(), 3.0)]);
        }
        other => panic!("expected TopSkus, got {:?}", other),
    }
}

#[test]
fn test_failed_load_clears_dataset_but_not_history() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = common::session_with(
        common::StubAgent::new("ok"),
        common::settings_with_samples(dir.path()),
    );
    session.load(&sales_upload()).unwrap();
    session.submit("anything");
    assert_eq!(session.history().len(), 1);

    let result = session.load(&DataSource::Sample(SampleFile::Sales));
    assert!(matches!(result, Err(LoadError::Io { .. })));
    assert!(session.dataset().is_none());
    assert!(!session.accepts_queries());
    assert_eq!(session.history().len(), 1);

    let outcome = session.submit("anything else");
    assert!(matches!(outcome.result, Err(QueryError::NoDataset)));
}
