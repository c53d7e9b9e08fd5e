//! idcast: presence exchange over a shared MQTT broker.
//!
//! Pick an identity, connect, announce a random number, and watch the
//! numbers other identities announce on the same topic.

mod cli;
mod terminal;

use idcast_config::IdcastConfig;
use idcast_presence::{
    BrokerConfig, BrokerConnector, BrokerEvent, ExchangerConfig, PresenceExchanger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::terminal::{Command, Screen};

const DEFAULT_LOG_DIRECTIVE: &str = "idcast=info";

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Config is loaded before logging exists; its error is reported below.
    let loaded = idcast_config::load_config(args.config.as_deref());

    let log_directive = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| DEFAULT_LOG_DIRECTIVE.parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("idcast v{} starting", env!("CARGO_PKG_VERSION"));

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        IdcastConfig::default()
    });

    if let Err(e) = run(args, config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args, mut config: IdcastConfig) -> idcast_common::Result<()> {
    if let Some(url) = args.broker {
        config.broker.url = url;
    }
    if let Some(topic) = args.topic {
        config.broker.topic = topic;
    }
    idcast_config::validation::validate(&config)?;

    if args.print_config {
        println!("{}", idcast_config::config_to_json(&config));
        return Ok(());
    }

    let broker = BrokerConfig {
        url: config.broker.url.clone(),
        keep_alive_secs: u16::try_from(config.broker.keep_alive_secs).unwrap_or(u16::MAX),
        connect_timeout_secs: u64::from(config.broker.connect_timeout_secs),
    };
    let exchanger_config = ExchangerConfig {
        topic: config.broker.topic.clone(),
        client_id_prefix: config.broker.client_id_prefix.clone(),
    };
    tracing::info!(url = %broker.url, topic = %exchanger_config.topic, "Broker configured");

    let mut exchanger = PresenceExchanger::new(BrokerConnector::new(broker), exchanger_config);
    let mut view = exchanger.subscribe_display();
    let mut screen = Screen::default();
    let choices = config.identity.choices;
    let mut events: Option<mpsc::Receiver<BrokerEvent>> = None;

    println!("{}", terminal::help_text(&choices));

    if let Some(id) = args.identity {
        select(&mut exchanger, &mut events, &choices, id).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match terminal::parse_command(&line) {
                    Command::Select(id) => {
                        select(&mut exchanger, &mut events, &choices, id).await;
                    }
                    Command::Send => {
                        if let Err(e) = exchanger.publish().await {
                            println!("cannot send: {e}");
                        }
                    }
                    Command::Help => println!("{}", terminal::help_text(&choices)),
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Unknown(input) => println!("unknown command: {input}"),
                }
            }
            event = next_event(&mut events) => match event {
                Some(event) => exchanger.handle_event(event).await,
                None => events = None,
            },
            Ok(()) = view.changed() => {
                let state = view.borrow_and_update().clone();
                for line in screen.render(&state) {
                    println!("{line}");
                }
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Handle an identity choice from the user.
async fn select(
    exchanger: &mut PresenceExchanger<BrokerConnector>,
    events: &mut Option<mpsc::Receiver<BrokerEvent>>,
    choices: &[u32],
    id: u32,
) {
    if !choices.contains(&id) {
        println!("identity {id} is not one of the choices");
        return;
    }
    match exchanger.select_identity(id).await {
        Ok(rx) => *events = Some(rx),
        Err(e) => println!("{e}"),
    }
}

/// Next broker event, or never if no connection exists yet.
async fn next_event(events: &mut Option<mpsc::Receiver<BrokerEvent>>) -> Option<BrokerEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
