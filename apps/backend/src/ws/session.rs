//! One socket connection: envelope validation, per-connection rate
//! limiting, auth binding, and delivery of room broadcasts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::verify_access_token;
use crate::domain::player::Seat;
use crate::domain::view::client_state;
use crate::error::AppError;
use crate::services::{ActionContext, GameService};
use crate::state::app_state::AppState;
use crate::ws::hub::Outbound;
use crate::ws::protocol::{parse_game_action, ClientMsg, ServerMsg, WireError};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Game-mutating actions allowed per sliding window.
const RATE_LIMIT_MAX_ACTIONS: usize = 8;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(1);

/// Per-connection sliding window. In-process and therefore always
/// available; a full window drops the action (fail closed).
struct SlidingWindow {
    hits: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new() -> Self {
        SlidingWindow {
            hits: VecDeque::with_capacity(RATE_LIMIT_MAX_ACTIONS),
        }
    }

    fn allow(&mut self, now: Instant) -> bool {
        while let Some(front) = self.hits.front() {
            if now.duration_since(*front) > RATE_LIMIT_WINDOW {
                self.hits.pop_front();
            } else {
                break;
            }
        }
        if self.hits.len() >= RATE_LIMIT_MAX_ACTIONS {
            return false;
        }
        self.hits.push_back(now);
        true
    }
}

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), app_state.into_inner());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    app_state: Arc<AppState>,
    /// Set after a successful join: (room, seat).
    joined: Option<(String, Seat)>,
    last_heartbeat: Instant,
    limiter: SlidingWindow,
}

impl WsSession {
    fn new(conn_id: Uuid, app_state: Arc<AppState>) -> Self {
        WsSession {
            conn_id,
            app_state,
            joined: None,
            last_heartbeat: Instant::now(),
            limiter: SlidingWindow::new(),
        }
    }

    fn service(&self) -> Arc<GameService> {
        self.app_state.service.clone()
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "failed to serialize outbound message"),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    /// Resolve the identity a join must bind to. With auth required the
    /// token is mandatory and its subject wins; offline mode falls back
    /// to the display name.
    fn resolve_identity(
        &self,
        token: Option<&str>,
        player_name: &str,
    ) -> Result<String, AppError> {
        let config = &self.app_state.config;
        match (config.auth_required(), token) {
            (true, Some(token)) => {
                let secret = config
                    .jwt_secret
                    .as_deref()
                    .ok_or(AppError::AuthRequired)?;
                let claims = verify_access_token(secret.as_bytes(), token)?;
                Ok(claims.sub)
            }
            (true, None) => Err(AppError::AuthRequired),
            (false, Some(token)) => {
                // Tokens are honoured in offline mode when present.
                match config.jwt_secret.as_deref() {
                    Some(secret) => Ok(verify_access_token(secret.as_bytes(), token)
                        .map(|c| c.sub)
                        .unwrap_or_else(|_| player_name.to_string())),
                    None => Ok(player_name.to_string()),
                }
            }
            (false, None) => Ok(player_name.to_string()),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "socket session started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some((room_id, seat)) = self.joined.take() {
            let service = self.service();
            service.hub().unregister(&room_id, self.conn_id);
            actix::spawn(async move {
                service.handle_disconnect(&room_id, seat).await;
            });
        }
        info!(conn_id = %self.conn_id, "socket session stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => self.handle_client_msg(msg, ctx),
                    Err(err) => {
                        Self::send_json(
                            ctx,
                            &ServerMsg::Error {
                                code: crate::errors::ErrorCode::InvalidPayload,
                                message: format!("malformed frame: {err}"),
                            },
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                Self::send_json(
                    ctx,
                    &ServerMsg::Error {
                        code: crate::errors::ErrorCode::InvalidPayload,
                        message: "binary frames are not supported".to_string(),
                    },
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "socket protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl WsSession {
    fn handle_client_msg(&mut self, msg: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMsg::CreateRoom {} => {
                let service = self.service();
                ctx.spawn(
                    async move { service.create_room().await }
                        .into_actor(self)
                        .map(|res, _actor, ctx| match res {
                            Ok(room_id) => Self::send_json(
                                ctx,
                                &ServerMsg::CreateRoomResult {
                                    success: true,
                                    room_id: Some(room_id),
                                    error: None,
                                },
                            ),
                            Err(err) => Self::send_json(
                                ctx,
                                &ServerMsg::CreateRoomResult {
                                    success: false,
                                    room_id: None,
                                    error: Some(WireError::from(&err)),
                                },
                            ),
                        }),
                );
            }

            ClientMsg::JoinRoom {
                room_id,
                player_name,
                bot_difficulty,
                token,
            } => {
                if player_name.trim().is_empty() || player_name.len() > 64 {
                    Self::send_json(
                        ctx,
                        &ServerMsg::JoinRoomResult {
                            success: false,
                            player_index: None,
                            game_state: None,
                            error: Some(WireError::from(&AppError::invalid_payload(
                                "playerName must be 1..=64 characters",
                            ))),
                        },
                    );
                    return;
                }
                let identity = match self.resolve_identity(token.as_deref(), &player_name) {
                    Ok(identity) => identity,
                    Err(err) => {
                        Self::send_json(
                            ctx,
                            &ServerMsg::JoinRoomResult {
                                success: false,
                                player_index: None,
                                game_state: None,
                                error: Some(WireError::from(&err)),
                            },
                        );
                        return;
                    }
                };

                let service = self.service();
                let conn_id = self.conn_id;
                ctx.spawn(
                    async move {
                        service
                            .join_room(&room_id, &player_name, Some(&identity), bot_difficulty)
                            .await
                            .map(|(seat, game)| (room_id, seat, game))
                    }
                    .into_actor(self)
                    .map(move |res, actor, ctx| match res {
                        Ok((room_id, seat, game)) => {
                            let service = actor.service();
                            service
                                .hub()
                                .register(&room_id, conn_id, ctx.address().recipient());
                            service.hub().bind_seat(&room_id, conn_id, seat);
                            actor.joined = Some((room_id, seat));
                            Self::send_json(
                                ctx,
                                &ServerMsg::JoinRoomResult {
                                    success: true,
                                    player_index: Some(seat),
                                    game_state: Some(client_state(&game, seat)),
                                    error: None,
                                },
                            );
                        }
                        Err(err) => Self::send_json(
                            ctx,
                            &ServerMsg::JoinRoomResult {
                                success: false,
                                player_index: None,
                                game_state: None,
                                error: Some(WireError::from(&err)),
                            },
                        ),
                    }),
                );
            }

            ClientMsg::AddBot { room_id } => {
                let service = self.service();
                ctx.spawn(
                    async move { service.add_bot(&room_id).await }
                        .into_actor(self)
                        .map(|res, _actor, ctx| {
                            let msg = match res {
                                Ok(_) => ServerMsg::ActionResult {
                                    success: true,
                                    error: None,
                                    intervention: None,
                                },
                                Err(err) => ServerMsg::ActionResult {
                                    success: false,
                                    error: Some(WireError::from(&err)),
                                    intervention: None,
                                },
                            };
                            Self::send_json(ctx, &msg);
                        }),
                );
            }

            ClientMsg::GameAction {
                room_id,
                action,
                payload,
            } => {
                // Rate limit before any work; excess actions are dropped.
                if !self.limiter.allow(Instant::now()) {
                    Self::send_json(
                        ctx,
                        &ServerMsg::ActionResult {
                            success: false,
                            error: Some(WireError::from(&AppError::RateLimited)),
                            intervention: None,
                        },
                    );
                    return;
                }
                let Some((joined_room, seat)) = self.joined.clone() else {
                    Self::send_json(
                        ctx,
                        &ServerMsg::ActionResult {
                            success: false,
                            error: Some(WireError::from(&AppError::invalid_payload(
                                "join a room before acting",
                            ))),
                            intervention: None,
                        },
                    );
                    return;
                };
                if joined_room != room_id {
                    Self::send_json(
                        ctx,
                        &ServerMsg::ActionResult {
                            success: false,
                            error: Some(WireError::from(&AppError::invalid_payload(
                                "roomId does not match this connection",
                            ))),
                            intervention: None,
                        },
                    );
                    return;
                }

                let parsed = parse_game_action(&action, &payload);
                let (game_action, skip_professor) = match parsed {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        Self::send_json(
                            ctx,
                            &ServerMsg::ActionResult {
                                success: false,
                                error: Some(WireError::from(&err)),
                                intervention: None,
                            },
                        );
                        return;
                    }
                };

                let service = self.service();
                let action_ctx = ActionContext::human(room_id, seat, skip_professor);
                ctx.spawn(
                    async move { service.handle_action(action_ctx, game_action).await }
                        .into_actor(self)
                        .map(|res, _actor, ctx| {
                            let msg = match res {
                                Ok(()) => ServerMsg::ActionResult {
                                    success: true,
                                    error: None,
                                    intervention: None,
                                },
                                Err(AppError::ProfessorIntervention { advice }) => {
                                    let err =
                                        AppError::ProfessorIntervention { advice: advice.clone() };
                                    ServerMsg::ActionResult {
                                        success: false,
                                        error: Some(WireError::from(&err)),
                                        intervention: Some(advice),
                                    }
                                }
                                Err(err) => ServerMsg::ActionResult {
                                    success: false,
                                    error: Some(WireError::from(&err)),
                                    intervention: None,
                                },
                            };
                            Self::send_json(ctx, &msg);
                        }),
                );
            }

            ClientMsg::DebugAction {
                room_id,
                action,
                payload,
            } => {
                let service = self.service();
                ctx.spawn(
                    async move { service.debug_action(&room_id, &action, &payload).await }
                        .into_actor(self)
                        .map(|res, _actor, ctx| {
                            let msg = match res {
                                Ok(()) => ServerMsg::ActionResult {
                                    success: true,
                                    error: None,
                                    intervention: None,
                                },
                                Err(err) => ServerMsg::ActionResult {
                                    success: false,
                                    error: Some(WireError::from(&err)),
                                    intervention: None,
                                },
                            };
                            Self::send_json(ctx, &msg);
                        }),
                );
            }
        }
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(ctx, &msg.0);
    }
}
