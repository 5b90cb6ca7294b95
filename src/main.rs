use clap::Parser;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;
use supplychat::agent::{ApiKey, OpenAiClient};
use supplychat::{
    logging, App, AppConfig, AppEvent, Args, ConfigManager, LoadRequest, SqlAgent, Theme,
    APP_NAME,
};

/// Apply launch flags that override config values
fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(model) = &args.model {
        config.agent.model = model.clone();
    }
    if let Some(delimiter) = args.delimiter {
        config.loading.delimiter = delimiter;
    }
    if args.debug {
        config.debug.enabled = true;
    }
}

/// Loads requested on the command line, in the order they should run
fn initial_loads(args: &Args) -> Vec<LoadRequest> {
    let mut loads = Vec::new();
    if let Some(path) = &args.path {
        loads.push(LoadRequest::Path(path.clone()));
    }
    if args.use_sample {
        loads.push(LoadRequest::Sample(args.sample.unwrap_or_default()));
    }
    loads
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    mut app: App,
    (tx, rx): (Sender<AppEvent>, Receiver<AppEvent>),
    args: &Args,
    poll_ms: u64,
) -> Result<()> {
    render(&mut terminal, &mut app)?;
    for load in initial_loads(args) {
        tx.send(AppEvent::Load(load))?;
    }

    loop {
        if crossterm::event::poll(Duration::from_millis(poll_ms))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        match config_manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(APP_NAME)?;
    apply_args(&mut config, &args);
    logging::init(args.log_file.as_deref(), config.debug.enabled)?;

    let api_key = match ApiKey::from_env(&config.agent.api_key_env) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "missing API key");
            eprintln!(
                "Error: {}. Set it using `export {}=your-key`",
                e, config.agent.api_key_env
            );
            std::process::exit(1);
        }
    };

    let theme = Theme::from_config(&config.theme)?;
    let mut settings = supplychat::SessionSettings::from_config(&config);
    if let Some(compression) = args.compression {
        settings.load = settings.load.with_compression(compression);
    }
    let client = OpenAiClient::new(&config.agent, api_key);
    tracing::info!(model = %client.model(), "agent ready");
    let agent = SqlAgent::new(client, &config.agent);
    let session = supplychat::Session::new(Box::new(agent), settings);

    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::with_session(&config, theme, session);
    if let Some(sample) = args.sample {
        app.select_sample(sample);
    }
    app.set_use_sample(args.use_sample);

    let terminal = ratatui::init();
    let result = run(
        terminal,
        app,
        (tx, rx),
        &args,
        config.performance.event_poll_interval_ms,
    );
    ratatui::restore();
    if let Err(e) = result {
        tracing::error!(error = %e, "exiting with error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use supplychat::SampleFile;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from(["supplychat", "--model", "gpt-4o", "--delimiter", "59", "--debug"]);
        let mut config = AppConfig::default();
        apply_args(&mut config, &args);
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.loading.delimiter, b';');
        assert!(config.debug.enabled);
    }

    #[test]
    fn test_initial_loads() {
        let args = Args::parse_from(["supplychat", "data.csv", "--use-sample", "--sample", "test"]);
        assert_eq!(
            initial_loads(&args),
            vec![
                LoadRequest::Path(PathBuf::from("data.csv")),
                LoadRequest::Sample(SampleFile::Test),
            ]
        );

        let args = Args::parse_from(["supplychat", "--sample", "submission"]);
        assert!(initial_loads(&args).is_empty());
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["supplychat", "--force"]).is_err());
    }
}
