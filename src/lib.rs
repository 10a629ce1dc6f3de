pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod client;

#[cfg(test)]
mod test_support;

use cli::{ Args, ChatArgs, Command, ServeArgs };
use client::ChatSession;
use client::transport::HttpRelayClient;
use config::prompt::resolve_prompts;
use llm::{ GenerationSettings, LlmConfig };
use llm::chat::new_client;
use log::info;
use server::Server;
use server::relay::Relay;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.resolved_command() {
        Command::Serve(serve) => serve_relay(serve).await,
        Command::Chat(chat) => chat_with_relay(chat).await,
    }
}

async fn serve_relay(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Temperature: {}", args.temperature);
    info!("Max Output Tokens: {}", args.max_output_tokens);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let llm_config = LlmConfig {
        api_key: args.resolve_api_key(),
        completion_model: Some(args.chat_model.clone()),
        base_url: Some(args.chat_base_url.clone()),
    };
    let chat_client = new_client(&llm_config)?;
    info!(
        "Chat client configured: Model={}, BaseURL={:?}",
        chat_client.get_model(),
        chat_client.get_base_url()
    );

    let prompts = Arc::new(resolve_prompts(args.prompts_path.as_deref())?);
    let settings = GenerationSettings {
        temperature: args.temperature,
        max_output_tokens: args.max_output_tokens,
    };
    let relay = Arc::new(Relay::new(chat_client, prompts, settings));

    let server = Server::new(args.server_addr.clone(), relay, args);
    server.run().await?;

    Ok(())
}

async fn chat_with_relay(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let transport = HttpRelayClient::new(&args.relay_url)
        .map_err(|e| format!("Invalid relay URL '{}': {}", args.relay_url, e))?;
    info!("Chatting with relay at {}", transport.endpoint());

    let session = Arc::new(ChatSession::new(transport, args.history_window));
    client::view::run_repl(session).await
}
