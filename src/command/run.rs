use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::host::{Host, HostExit, UserAction};
use crate::render::TerminalRenderer;

/// Forward stdin lines and Ctrl-C as user actions.
///
/// The channel closes when stdin reaches EOF.
fn spawn_input(tx: mpsc::Sender<UserAction>) {
    let ctrl_c = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c.send(UserAction::Quit).await;
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match UserAction::parse(&line) {
                Some(action) => {
                    if tx.send(action).await.is_err() {
                        break;
                    }
                }
                None => debug!("Ignoring input: {:?}", line),
            }
        }
    });
}

pub async fn run_app(mut host: Host) -> Result<()> {
    let (tx, mut actions) = mpsc::channel(16);
    spawn_input(tx);

    let mut renderer = TerminalRenderer::new();
    match host.run(&mut actions, &mut renderer).await? {
        HostExit::Native => info!("Running native app"),
        HostExit::Quit => info!("Goodbye"),
    }

    if host.session().is_remote_abandoned() {
        debug!("Remote mode was abandoned this session");
    }
    Ok(())
}
