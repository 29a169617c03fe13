use crate::domain::AreaSnapshot;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{
    AreaSnapshotDto, ClientMessage, CommandEnvelope, CommandResultDto, ServerMessage,
    parse_command,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::{guest_player_id, next_id};
use crate::use_cases::{AreaError, AreaHandle};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    AreaClosed,
    SnapshotsClosed,
    JoinRequired,
    JoinTimeout,
    AlreadyJoined,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct AreaQuery {
    // The area the client wants to enter.
    #[serde(default)]
    area_id: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_PLAYER_ID_LEN: usize = 64;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn snapshot_serializer(
    area: AreaHandle,
    mut snapshot_rx: broadcast::Receiver<AreaSnapshot>,
) {
    // Serialize each snapshot once and broadcast the shared bytes.
    loop {
        let snapshot = tokio::select! {
            _ = area.closed() => {
                debug!(area_id = %area.area_id, "area removed; serializer exiting");
                break;
            }
            snapshot = snapshot_rx.recv() => snapshot,
        };

        match snapshot {
            Ok(snapshot) => {
                let msg = ServerMessage::AreaUpdate(AreaSnapshotDto::from(&snapshot));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize area snapshot");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Keep the latest bytes for late joiners and lag recovery.
                let _ = area.snapshot_latest_tx.send(bytes.clone());
                let _ = area.snapshot_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "snapshot serializer lagged; skipping to latest");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("snapshot channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_area_serializer(area: &AreaHandle) {
    tokio::spawn(snapshot_serializer(area.clone(), area.subscribe()));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AreaQuery>,
) -> impl IntoResponse {
    let area_id = query
        .area_id
        .unwrap_or_else(|| state.default_area_id.to_string());

    let Some(area) = state.area_registry.get_area(&area_id).await else {
        return error_response(StatusCode::NOT_FOUND, AreaError::NotFound);
    };

    ws.on_upgrade(move |socket| {
        // Separate connection id for correlating logs before/after a player_id exists.
        let conn_id = next_id();
        let span = info_span!(
            "conn",
            conn_id,
            area_id = %area.area_id,
            player_id = tracing::field::Empty
        );
        handle_socket(socket, area).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, area: AreaHandle) {
    let mut ctx = match bootstrap_connection(&mut socket, &area).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = socket.close().await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id.as_str());
    info!(player_id = %ctx.player_id, "client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

#[derive(Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    rejected_commands: u64,
    lag_recovery_count: u64,
}

struct ConnCtx {
    player_id: String,
    area: AreaHandle,
    snapshot_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    snapshot_latest_rx: watch::Receiver<Utf8Bytes>,
    stats: ConnStats,
    last_invalid_log: Instant,
    last_lag_log: Instant,
    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    area: &AreaHandle,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let snapshot_bytes_rx = area.snapshot_bytes_tx.subscribe();
    let snapshot_latest_rx = area.snapshot_latest_tx.subscribe();

    let player_id = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // Entering the area triggers a presence broadcast from the area task.
    match area.join(player_id.clone()).await {
        Ok(true) => {}
        Ok(false) => {
            let _ =
                send_close_with_reason(socket, close_code::POLICY, "player already connected")
                    .await;
            return Err(NetError::AlreadyJoined);
        }
        Err(_) => return Err(NetError::AreaClosed),
    }

    let mut stats = ConnStats::default();
    let identity_msg = ServerMessage::Identity {
        player_id: player_id.clone(),
    };
    let sent = send_message(socket, &identity_msg).await;
    let sent = match sent {
        Ok(bytes) => bytes,
        Err(e) => {
            // Compensate the join so the occupant list does not keep a ghost.
            let _ = area.leave(&player_id).await;
            return Err(e);
        }
    };
    stats.msgs_out += 1;
    stats.bytes_out += sent as u64;

    // Late joiners get the last known state right away instead of waiting for a heartbeat.
    let latest = snapshot_latest_rx.borrow().clone();
    if !latest.is_empty() {
        let bytes = latest.len();
        if let Err(e) = socket.send(Message::Text(latest)).await {
            let _ = area.leave(&player_id).await;
            return Err(NetError::Ws(e));
        }
        stats.msgs_out += 1;
        stats.bytes_out += bytes as u64;
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        area: area.clone(),
        snapshot_bytes_rx,
        snapshot_latest_rx,
        stats,
        last_invalid_log: now,
        last_lag_log: now,
        close_frame: None,
    })
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<String, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(ClientMessage::Command(_)) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let requested = payload
                    .player_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty());
                return match requested {
                    Some(id) if id.len() > MAX_PLAYER_ID_LEN => {
                        let _ =
                            send_close_with_reason(socket, close_code::POLICY, "invalid player id")
                                .await;
                        Err(NetError::JoinRequired)
                    }
                    Some(id) => Ok(id.to_string()),
                    None => Ok(guest_player_id()),
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        player_id,
        area,
        snapshot_bytes_rx,
        snapshot_latest_rx,
        stats,
        last_invalid_log,
        last_lag_log,
        close_frame,
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    socket,
                    incoming,
                    player_id,
                    area,
                    stats,
                    last_invalid_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            _ = area.closed() => {
                info!(player_id = %player_id, "area removed; closing connection");
                *close_frame = Some(CloseFrame {
                    code: close_code::AWAY,
                    reason: "area removed".into(),
                });
                true
            }

            snapshot = snapshot_bytes_rx.recv() => {
                match snapshot {
                    Ok(bytes) => match forward_snapshot(bytes, socket, stats).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_lag_log) {
                            warn!(missed = n, "snapshots lagged; sending latest");
                        }

                        // Every snapshot is complete, so the newest one fully resyncs the client.
                        let latest = snapshot_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            stats.lag_recovery_count += 1;
                            match forward_snapshot(latest, socket, stats).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::SnapshotsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(player_id, area, stats).await;

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    player_id: &str,
    area: &AreaHandle,
    stats: &mut ConnStats,
    last_invalid_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                stats.msgs_in += 1;
                stats.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(_)) => {
                        // Ignore repeated Join packets after bootstrap to keep the session stable.
                        if should_log(last_invalid_log) {
                            warn!(player_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Command(envelope)) => {
                        process_command(socket, envelope, player_id, area, stats).await
                    }
                    Err(parse_err) => {
                        stats.invalid_json += 1;
                        if should_log(last_invalid_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if stats.invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

// Runs one command through the area task and reports the verdict to the sender.
async fn process_command(
    socket: &mut WebSocket,
    envelope: CommandEnvelope,
    player_id: &str,
    area: &AreaHandle,
    stats: &mut ConnStats,
) -> Result<LoopControl, NetError> {
    let CommandEnvelope {
        command_id,
        command,
    } = envelope;

    let outcome = match parse_command(command, Some(player_id)) {
        Ok(command) => area.submit(command).await,
        Err(e) => Err(AreaError::Rejected(e)),
    };

    let result = match outcome {
        Ok(()) => CommandResultDto::ok(command_id),
        Err(AreaError::Rejected(e)) => {
            stats.rejected_commands += 1;
            debug!(player_id, error = %e, "command rejected");
            CommandResultDto::failed(command_id, e)
        }
        Err(_) => return Err(NetError::AreaClosed),
    };

    match send_message(socket, &ServerMessage::CommandResult(result)).await {
        Ok(bytes) => {
            stats.msgs_out += 1;
            stats.bytes_out += bytes as u64;
            Ok(LoopControl::Continue)
        }
        Err(err) => {
            warn!(error = ?err, "failed to send command result");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_snapshot(
    snapshot: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = snapshot.len();
    match socket
        .send(Message::Text(snapshot))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            stats.msgs_out += 1;
            stats.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send area snapshot");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(player_id: &str, area: &AreaHandle, stats: &ConnStats) {
    if let Err(e) = area.leave(player_id).await {
        // The area was torn down first; there is nobody left to notify.
        debug!(player_id, error = %e, "leave after area closed");
    }

    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        rejected_commands = stats.rejected_commands,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
}
