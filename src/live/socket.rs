use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::{decode_frame, ClientCommand, PushEvent};
use crate::api::retry::{retry_async, RetryConfig};
use crate::logging::{agg_increment, log, obj, v_str, Domain, Level};

/// Sending half of an established push connection.
#[derive(Clone)]
pub struct LiveHandle {
    commands: mpsc::Sender<ClientCommand>,
}

impl LiveHandle {
    pub async fn send(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("push channel closed"))
    }
}

/// Open the push connection. The returned receiver yields `Connect` first
/// and `Disconnect` last; no reconnect is attempted after the stream ends.
pub async fn connect(
    url: &str,
    retry: &RetryConfig,
    capacity: usize,
) -> Result<(LiveHandle, mpsc::Receiver<PushEvent>)> {
    let (ws, _) = retry_async(retry, "push_connect", |_| true, || {
        tokio_tungstenite::connect_async(url)
    })
    .await?;
    let (mut write, mut read) = ws.split();

    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<ClientCommand>(16);

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            let text = match serde_json::to_string(&cmd) {
                Ok(t) => t,
                Err(_) => continue,
            };
            if let Err(err) = write.send(Message::Text(text)).await {
                log(
                    Level::Warn,
                    Domain::Live,
                    "command_failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                );
                break;
            }
        }
    });

    let reader_tx = event_tx.clone();
    tokio::spawn(async move {
        let _ = reader_tx.send(PushEvent::Connect).await;
        while let Some(msg) = read.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(err) => {
                    log(
                        Level::Warn,
                        Domain::Live,
                        "stream_error",
                        obj(&[("error", v_str(&err.to_string()))]),
                    );
                    break;
                }
            };
            if msg.is_close() {
                break;
            }
            let Ok(text) = msg.into_text() else { continue };
            match decode_frame(&text) {
                Some(event) => {
                    agg_increment("push");
                    if reader_tx.send(event).await.is_err() {
                        return;
                    }
                }
                None => log(
                    Level::Debug,
                    Domain::Live,
                    "frame_ignored",
                    obj(&[("bytes", serde_json::json!(text.len()))]),
                ),
            }
        }
        let _ = reader_tx.send(PushEvent::Disconnect).await;
    });

    Ok((LiveHandle { commands: cmd_tx }, event_rx))
}
