//! WebSocket handler.
//!
//! Responsibilities:
//! - Authenticate the upgrade request (401 before any upgrade)
//! - Lifecycle: ping timer + idle timeout
//! - Per frame: cheap policy first, then decode once, dispatch, reply

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use tally_core::error::{ClientCode, Result, TallyError};
use tally_core::protocol::text::Reply;

use crate::app_state::AppState;
use crate::dispatch::RequestCtx;
use crate::policy::{ConnectionPolicy, PolicyDecision};
use crate::transport::codec::{decode, frame_len, Inbound};
use crate::transport::http::ApiError;

const TRANSPORT: &str = "ws";

const ENCODE_FAILED: &str =
    r#"{"v":1,"svc":"sys","type":"error","data":{"code":"INTERNAL","msg":"encode failed"}}"#;

/// What the session loop should do with one inbound frame.
#[derive(Debug)]
pub enum FrameAction {
    Send(Message),
    Ignore,
    /// Close the session, optionally after one last frame.
    Close(Option<Message>),
}

fn text_frame(reply: &Reply) -> Message {
    Message::Text(reply.to_text().unwrap_or_else(|_| ENCODE_FAILED.to_string()))
}

fn idle_timeout_frame() -> Message {
    text_frame(&Reply::error(None, ClientCode::Timeout, "idle timeout"))
}

fn error_frame(seq: Option<u64>, err: &TallyError) -> Message {
    text_frame(&Reply::from_error(seq, err))
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let user = match app.authenticate(&headers, TRANSPORT) {
        Ok(user) => user,
        Err(e) => return ApiError(e).into_response(),
    };

    ws.on_upgrade(move |socket| {
        let span = tracing::info_span!("ws_session", user = %user);
        async move {
            if let Err(e) = run_session(app, user, socket).await {
                tracing::debug!(error = %e, "session ended with error");
            }
        }
        .instrument(span)
    })
}

/// Apply policy to one frame, decode it, and produce the reply.
pub async fn handle_message(
    app: &AppState,
    ctx: &RequestCtx,
    policy: &mut ConnectionPolicy,
    msg: Message,
) -> FrameAction {
    if matches!(msg, Message::Text(_) | Message::Binary(_)) {
        match policy.check_frame(frame_len(&msg)) {
            PolicyDecision::Pass => {}
            PolicyDecision::Reject { code, msg } => {
                app.metrics().frame_rejections.inc(&[("reason", code.as_str())]);
                return FrameAction::Send(text_frame(&Reply::error(None, code, msg)));
            }
            PolicyDecision::Close { code, msg } => {
                app.metrics().frame_rejections.inc(&[("reason", code.as_str())]);
                return FrameAction::Close(Some(text_frame(&Reply::error(None, code, msg))));
            }
        }
    }

    match decode(msg) {
        Err(e) => FrameAction::Send(error_frame(None, &e)),
        Ok(Inbound::Text { env, .. }) => {
            let reply = match app.dispatcher().dispatch_text(ctx, &env).await {
                Ok(reply) => reply,
                Err(e) => Reply::from_error(env.seq, &e),
            };
            FrameAction::Send(text_frame(&reply))
        }
        Ok(Inbound::Binary { bytes_len }) => {
            tracing::debug!(bytes_len, "binary frame refused");
            FrameAction::Send(text_frame(&Reply::error(
                None,
                ClientCode::BadRequest,
                "binary frames are not supported",
            )))
        }
        Ok(Inbound::Ping(payload)) => FrameAction::Send(Message::Pong(payload)),
        Ok(Inbound::Pong) => FrameAction::Ignore,
        Ok(Inbound::Close) => FrameAction::Close(None),
    }
}

async fn run_session(app: AppState, user: String, socket: WebSocket) -> Result<()> {
    let ctx = RequestCtx::new(user, TRANSPORT);
    let mut policy = ConnectionPolicy::new(&app.cfg().limits);

    let (mut ws_tx, mut ws_rx) = socket.split();

    ws_tx
        .send(text_frame(&Reply::authed(&ctx.user)))
        .await
        .map_err(|e| TallyError::Internal(format!("send authed failed: {e}")))?;

    app.metrics().ws_active_sessions.inc(&[]);
    tracing::info!("session opened");

    let srv = &app.cfg().server;
    let idle_timeout = Duration::from_millis(srv.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(Duration::from_millis(srv.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match handle_message(&app, &ctx, &mut policy, msg).await {
                    FrameAction::Send(out) => {
                        if ws_tx.send(out).await.is_err() {
                            break;
                        }
                    }
                    FrameAction::Ignore => {}
                    FrameAction::Close(last) => {
                        if let Some(out) = last {
                            let _ = ws_tx.send(out).await;
                        }
                        break;
                    }
                }
            }

            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    let _ = ws_tx.send(idle_timeout_frame()).await;
                    break;
                }
            }
        }
    }

    app.metrics().ws_active_sessions.dec(&[]);
    tracing::info!("session closed");
    Ok(())
}
