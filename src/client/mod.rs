pub mod transport;
pub mod view;

use log::{ debug, warn };
use thiserror::Error;
use tokio::sync::watch;

use crate::models::chat::{ recent_history, Turn };
use crate::models::relay::{ RelayRequest, ARCHIVE_FAILED };
use self::transport::RelayTransport;

pub const DEFAULT_HISTORY_WINDOW: usize = 12;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("message is empty")]
    EmptyInput,
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Server(String),
}

impl ClientError {
    /// Text for the error banner.
    pub fn banner(&self) -> String {
        match self {
            ClientError::Server(message) => message.clone(),
            ClientError::EmptyInput | ClientError::Network(_) => ARCHIVE_FAILED.to_string(),
        }
    }
}

pub fn clean_input(raw: &str) -> Result<&str, ClientError> {
    let clean = raw.trim();
    if clean.is_empty() { Err(ClientError::EmptyInput) } else { Ok(clean) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Edit(String),
    Submit(String),
    Replied(String),
    Failed(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Send(RelayRequest),
}

/// Everything the chat view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    turns: Vec<Turn>,
    input: String,
    loading: bool,
    error: Option<String>,
    history_window: usize,
    cleared: u64,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ChatState {
    pub fn new(history_window: usize) -> Self {
        Self {
            turns: Vec::new(),
            input: String::new(),
            loading: false,
            error: None,
            history_window,
            cleared: 0,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bumped on every clear, so views can tell a fresh conversation from a same-length one.
    pub fn clear_epoch(&self) -> u64 {
        self.cleared
    }

    pub fn can_send(&self) -> bool {
        !self.loading && clean_input(&self.input).is_ok()
    }

    pub fn reduce(&mut self, action: Action) -> Effect {
        match action {
            Action::Edit(text) => {
                self.input = text;
                Effect::None
            }
            Action::Submit(raw) => {
                if self.loading {
                    debug!("send ignored: a request is already in flight");
                    return Effect::None;
                }
                let message = match clean_input(&raw) {
                    Ok(clean) => clean.to_string(),
                    Err(_) => return Effect::None,
                };
                // The window is taken before the new turn: the message travels on its own.
                let history = recent_history(&self.turns, self.history_window);
                self.turns.push(Turn::user(message.clone()));
                self.input.clear();
                self.loading = true;
                self.error = None;
                Effect::Send(RelayRequest { message, history })
            }
            Action::Replied(text) => {
                self.turns.push(Turn::model(text));
                self.loading = false;
                Effect::None
            }
            Action::Failed(message) => {
                self.error = Some(message);
                self.loading = false;
                Effect::None
            }
            Action::Clear => {
                self.turns.clear();
                self.cleared += 1;
                Effect::None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Skipped,
    Replied,
    Failed(String),
}

/// Drives one conversation against a relay. Every state change is published to subscribers.
pub struct ChatSession<T: RelayTransport> {
    state: watch::Sender<ChatState>,
    transport: T,
}

impl<T: RelayTransport> ChatSession<T> {
    pub fn new(transport: T, history_window: usize) -> Self {
        let (state, _) = watch::channel(ChatState::new(history_window));
        Self { state, transport }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    fn dispatch(&self, action: Action) -> Effect {
        let mut effect = Effect::None;
        self.state.send_modify(|state| {
            effect = state.reduce(action);
        });
        effect
    }

    pub fn edit(&self, text: impl Into<String>) {
        self.dispatch(Action::Edit(text.into()));
    }

    pub fn clear(&self) {
        self.dispatch(Action::Clear);
    }

    /// Sends whatever is in the input field, unless the send action is disabled.
    pub async fn submit(&self) -> SendOutcome {
        let input = {
            let state = self.state.borrow();
            if !state.can_send() {
                return SendOutcome::Skipped;
            }
            state.input().to_string()
        };
        self.send(&input).await
    }

    pub async fn send(&self, raw: &str) -> SendOutcome {
        let request = match self.dispatch(Action::Submit(raw.to_string())) {
            Effect::Send(request) => request,
            Effect::None => return SendOutcome::Skipped,
        };

        match self.transport.post_message(&request).await {
            Ok(text) => {
                self.dispatch(Action::Replied(text));
                SendOutcome::Replied
            }
            Err(e) => {
                warn!("Relay call failed: {}", e);
                let banner = e.banner();
                self.dispatch(Action::Failed(banner.clone()));
                SendOutcome::Failed(banner)
            }
        }
    }
}
