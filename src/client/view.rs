use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, AsyncWriteExt, BufReader };

use super::{ ChatSession, ChatState };
use super::transport::RelayTransport;
use crate::models::chat::Turn;

pub const EMPTY_PROMPT: &str = "Enter a title, a character, or a feeling.";
pub const EMPTY_EXAMPLE: &str = "Example: \u{201c}Why do morally grey characters feel comforting?\u{201d}";
pub const LOADING_LINE: &str = "Consulting the Archive\u{2026}";
pub const FEATURED_STARTER: &str = "lets talk about \"To All The Boys I've Loved Before\"";
pub const HINT: &str =
    "Try: \u{201c}Analyse this character\u{2019}s arc\u{201d}, \u{201c}Explain symbolism\u{201d}, \u{201c}What if\u{2026}\u{201d}  (/start, /clear, /quit)";

pub fn render_turn(turn: &Turn) -> String {
    let speaker = if turn.is_user() { "you" } else { "libris" };
    format!("[{} \u{b7} {}]\n{}\n", speaker, turn.format_time(), turn.text)
}

/// Turns state snapshots into the lines not yet on screen, so the newest content is always last.
#[derive(Debug, Default)]
pub struct Renderer {
    shown_epoch: u64,
    shown_turns: usize,
    shown_empty: bool,
    was_loading: bool,
    shown_error: Option<String>,
}

impl Renderer {
    pub fn update(&mut self, state: &ChatState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.clear_epoch() != self.shown_epoch {
            self.shown_epoch = state.clear_epoch();
            self.shown_turns = 0;
            self.shown_empty = false;
        }
        if state.turns().is_empty() {
            if !self.shown_empty {
                lines.push(EMPTY_PROMPT.to_string());
                lines.push(EMPTY_EXAMPLE.to_string());
                self.shown_empty = true;
            }
        } else {
            self.shown_empty = false;
        }

        for turn in &state.turns()[self.shown_turns..] {
            lines.push(render_turn(turn));
        }
        self.shown_turns = state.turns().len();

        if state.is_loading() && !self.was_loading {
            lines.push(LOADING_LINE.to_string());
        }
        self.was_loading = state.is_loading();

        let error = state.error().map(str::to_string);
        if let Some(message) = error.as_deref().filter(|_| error != self.shown_error) {
            lines.push(format!("! {}", message));
        }
        self.shown_error = error;

        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Quit,
    Clear,
    /// Puts the featured discussion starter in the input without sending it.
    FillStarter,
    /// A bare Enter: send whatever the input holds.
    SubmitInput,
    Send(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    match line.trim() {
        "/quit" | "/exit" => ReplCommand::Quit,
        "/clear" => ReplCommand::Clear,
        "/start" => ReplCommand::FillStarter,
        "" => ReplCommand::SubmitInput,
        _ => ReplCommand::Send(line.to_string()),
    }
}

/// Interactive loop: one line in, one relay round-trip, until `/quit` or end of input.
pub async fn run_repl<T>(session: Arc<ChatSession<T>>) -> Result<(), Box<dyn Error + Send + Sync>>
    where T: RelayTransport + 'static
{
    let mut updates = session.subscribe();
    let painter = tokio::spawn(async move {
        let mut renderer = Renderer::default();
        let mut stdout = tokio::io::stdout();
        loop {
            let snapshot = updates.borrow_and_update().clone();
            for line in renderer.update(&snapshot) {
                if stdout.write_all(format!("{}\n", line).as_bytes()).await.is_err() {
                    return;
                }
            }
            let _ = stdout.flush().await;
            if updates.changed().await.is_err() {
                return;
            }
        }
    });

    println!("{}", HINT);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Clear => session.clear(),
            ReplCommand::FillStarter => {
                session.edit(FEATURED_STARTER);
                println!("> {}  (press Enter to send)", FEATURED_STARTER);
            }
            ReplCommand::SubmitInput => {
                session.submit().await;
            }
            ReplCommand::Send(text) => {
                session.edit(text);
                session.submit().await;
            }
        }
    }

    info!("Leaving chat");
    painter.abort();
    Ok(())
}
