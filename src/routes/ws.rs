//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the socket's run. Countdown ticks, question changes and the
//! completion payload are pushed from the run's event stream.
//!
//! A socket owns at most one run; it is torn down when the socket goes away.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, instrument, warn};

use crate::assessment::{Navigation, RunError, RunEvent, RunHandle};
use crate::logic::parse_run_request;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "modlrn_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "modlrn_backend", "WebSocket connected");
  let mut session = WsSession::new(state);

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "modlrn_backend", "WS received: {:?}", &incoming);
                if let ClientWsMessage::StartRun { topic, .. } = &incoming {
                  let loading = ServerWsMessage::Loading { topic: topic.clone() };
                  if send_json(&mut socket, &loading).await.is_err() { break; }
                }
                session.handle_client_ws(incoming).await
              }
              Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
            };
            if let Some(reply) = reply {
              if send_json(&mut socket, &reply).await.is_err() { break; }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      event = next_event(&mut session.events) => match event {
        Some(event) => {
          let out = session.on_event(event);
          if send_json(&mut socket, &out).await.is_err() { break; }
        }
        None => session.events = None,
      }
    }
  }

  session.end_run().await;
  info!(target: "modlrn_backend", "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "modlrn_backend", error = %e, "WS send error");
    e
  })
}

/// Next event of the socket's run; pending forever while there is none.
async fn next_event(events: &mut Option<broadcast::Receiver<RunEvent>>) -> Option<RunEvent> {
  let Some(rx) = events else { return std::future::pending().await };
  loop {
    match rx.recv().await {
      Ok(event) => return Some(event),
      Err(RecvError::Lagged(skipped)) => {
        warn!(target: "modlrn_backend", skipped, "WS subscriber lagged behind run events");
      }
      Err(RecvError::Closed) => return None,
    }
  }
}

struct WsSession {
  state: Arc<AppState>,
  run: Option<RunHandle>,
  events: Option<broadcast::Receiver<RunEvent>>,
}

impl WsSession {
  fn new(state: Arc<AppState>) -> Self {
    Self { state, run: None, events: None }
  }

  fn on_event(&self, event: RunEvent) -> ServerWsMessage {
    match event {
      RunEvent::Tick { question_index, remaining } => ServerWsMessage::Tick { question_index, remaining },
      RunEvent::Moved(run) => ServerWsMessage::Run { origin: None, run },
      RunEvent::Completed(result) => ServerWsMessage::Completed { result },
    }
  }

  async fn end_run(&mut self) {
    self.events = None;
    if let Some(handle) = self.run.take() {
      self.state.remove_run(handle.id()).await;
      debug!(target: "assessment", run_id = %handle.id(), "WS run torn down");
    }
  }

  /// Answers, skips and moves are reported through the event stream; only
  /// errors and no-op navigation are replied to directly.
  #[instrument(level = "info", skip(self))]
  async fn handle_client_ws(&mut self, msg: ClientWsMessage) -> Option<ServerWsMessage> {
    match msg {
      ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

      ClientWsMessage::StartRun { topic, count, difficulty } => {
        let request = match parse_run_request(&topic, count, difficulty.as_deref(), &self.state.limits) {
          Ok(r) => r,
          Err(e) => return Some(ServerWsMessage::Error { message: e.to_string() }),
        };
        self.end_run().await;
        let handle = match self.state.start_run(request).await {
          Ok(h) => h,
          Err(e) => return Some(ServerWsMessage::Error { message: e.to_string() }),
        };
        self.events = Some(handle.subscribe());
        let reply = match handle.snapshot().await {
          Ok(run) => {
            info!(target: "assessment", run_id = %run.id, total = run.total, origin = ?handle.origin(), "WS run started");
            ServerWsMessage::Run { origin: Some(handle.origin()), run }
          }
          Err(e) => ServerWsMessage::Error { message: e.to_string() },
        };
        self.run = Some(handle);
        Some(reply)
      }

      ClientWsMessage::Answer { selection } => {
        let Some(handle) = self.run.as_ref() else { return no_run_error() };
        handle.answer(selection).await.err().map(error_msg)
      }

      ClientWsMessage::Skip => {
        let Some(handle) = self.run.as_ref() else { return no_run_error() };
        handle.skip().await.err().map(error_msg)
      }

      ClientWsMessage::Next => {
        let Some(handle) = self.run.as_ref() else { return no_run_error() };
        navigated(handle.go_next().await)
      }

      ClientWsMessage::Previous => {
        let Some(handle) = self.run.as_ref() else { return no_run_error() };
        navigated(handle.go_previous().await)
      }

      ClientWsMessage::EndRun => {
        self.end_run().await;
        None
      }
    }
  }

}

/// A real move arrives as a `Moved` event; a no-op gets the snapshot back.
fn navigated(moved: Result<Navigation, RunError>) -> Option<ServerWsMessage> {
  match moved {
    Ok(Navigation { changed: false, run }) => Some(ServerWsMessage::Run { origin: None, run }),
    Ok(_) => None,
    Err(e) => Some(error_msg(e)),
  }
}

fn error_msg(e: impl std::fmt::Display) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string() }
}

fn no_run_error() -> Option<ServerWsMessage> {
  Some(ServerWsMessage::Error { message: "No active run; send start_run first.".into() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assessment::run::RunStatus;
  use crate::assessment::RunSnapshot;

  fn snapshot(current_index: usize) -> RunSnapshot {
    RunSnapshot {
      id: uuid::Uuid::nil(),
      topic: "Electrical Engineering".into(),
      status: RunStatus::InProgress,
      current_index,
      total: 3,
      answered: 0,
      time_remaining: 30,
      question: None,
    }
  }

  #[test]
  fn only_noop_navigation_is_replied_to() {
    let moved = navigated(Ok(Navigation { changed: true, run: snapshot(1) }));
    assert!(moved.is_none());

    let stayed = navigated(Ok(Navigation { changed: false, run: snapshot(2) }));
    assert!(matches!(stayed, Some(ServerWsMessage::Run { origin: None, run }) if run.current_index == 2));

    let failed = navigated(Err(RunError::Closed));
    assert!(matches!(failed, Some(ServerWsMessage::Error { .. })));
  }
}
