use anyhow::Result;
use deriv_ticks::{
    config::AppConfig,
    session::TickSession,
    transport::{Transport, TransportEvent, WsTransport, endpoint_url},
    utils,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

const HELP: &str = "commands: subscribe (s) | unsubscribe (u) | history (h) | status | list | quit (q)";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        app_id = config.app_id,
        symbol = %config.symbol,
        count = config.count,
        "[INIT] deriv-ticks starting"
    );

    let url = endpoint_url(&config.ws_endpoint, config.app_id)?;
    let (transport, mut events) = WsTransport::connect(url).await?;
    let mut session = TickSession::new(transport, config.tick_query(), config.history_timeout);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    tracing::info!("{HELP}");

    loop {
        let deadline = session.history_deadline();
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => session.handle_event(event),
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !run_command(&mut session, line.trim()) {
                        break;
                    }
                }
                None => stdin_open = false,
            },
            _ = history_expiry(deadline) => {
                session.expire_history(Instant::now());
            }
        }
        if session.is_closed() {
            return Ok(());
        }
    }

    // Let the writer flush the close frame before the runtime shuts down.
    session.close();
    let _ = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(event) = events.recv().await {
            let done = event == TransportEvent::Closed;
            session.handle_event(event);
            if done {
                break;
            }
        }
    })
    .await;
    Ok(())
}

/// Returns `false` when the operator asked to quit.
fn run_command<T: Transport>(session: &mut TickSession<T>, command: &str) -> bool {
    let result = match command {
        "subscribe" | "s" => session.subscribe(),
        "unsubscribe" | "u" => session.unsubscribe(),
        "history" | "h" => session.fetch_history(),
        "status" => {
            let status = session.status().current();
            tracing::info!(message = %status.message, is_error = status.is_error, "[STATUS]");
            Ok(())
        }
        "list" => {
            for record in session.display().entries() {
                tracing::info!("{}", record.render());
            }
            Ok(())
        }
        "quit" | "q" => return false,
        "" => Ok(()),
        other => {
            tracing::warn!(command = other, "unknown command; {HELP}");
            Ok(())
        }
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, command, "[CMD] command failed");
    }
    true
}

async fn history_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
