use clap::{ Parser, Subcommand };

use crate::client::DEFAULT_HISTORY_WINDOW;
use crate::llm::{ DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Libris: a literary chat relay and terminal client", long_about = None)]
pub struct Args {
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP relay (default)
    Serve(ServeArgs),
    /// Chat with a running relay from the terminal
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the relay to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    // --- Chat LLM Provider Args ---
    /// API Key for the generation service. Falls back to GEMINI_API_KEY, then GOOGLE_API_KEY.
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for generation (e.g., gemini-2.0-flash)
    #[arg(long, env = "CHAT_MODEL", default_value_t = DEFAULT_CHAT_MODEL.to_string())]
    pub chat_model: String,

    /// Base URL for the generation API
    #[arg(long, env = "CHAT_BASE_URL", default_value_t = DEFAULT_BASE_URL.to_string())]
    pub chat_base_url: String,

    /// Sampling temperature sent with every generation call.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Upper bound on tokens generated per reply.
    #[arg(long, env = "CHAT_MAX_OUTPUT_TOKENS", default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    pub max_output_tokens: u32,

    /// Optional JSON file with a `system_instruction` overriding the built-in persona.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl ServeArgs {
    pub fn resolve_api_key(&self) -> Option<String> {
        let from_env = |name: &str| std::env::var(name).ok();
        Some(self.chat_api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .or_else(|| from_env("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()))
            .or_else(|| from_env("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of the relay to talk to.
    #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000")]
    pub relay_url: String,

    /// Number of most recent turns sent along with each message.
    #[arg(long, env = "HISTORY_WINDOW", default_value_t = DEFAULT_HISTORY_WINDOW)]
    pub history_window: usize,
}

#[derive(Parser)]
struct ServeDefaults {
    #[command(flatten)]
    serve: ServeArgs,
}

impl Args {
    /// The chosen subcommand, or `serve` with its flags read from the environment.
    pub fn resolved_command(&self) -> Command {
        match &self.command {
            Some(command) => command.clone(),
            None => Command::Serve(ServeDefaults::parse_from(["libris"]).serve),
        }
    }
}
