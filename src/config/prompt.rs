use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const LIBRIS_SYSTEM_INSTRUCTION: &str = "You are Libris, an insightful literary companion AI. \
You discuss novels, themes, and characters with depth, offering thoughtful interpretations, \
emotional insights, and reflective questions. Never quote books directly; focus on analysis, \
opinions, and engaging conversation. Adapt your tone to be cozy, dark, or philosophical \
depending on the user's mood. You should also answer the different scenarios which could \
have been if the character has a different choice.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Prompt file '{0}' has an empty system_instruction")]
    EmptyInstruction(String),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    pub system_instruction: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { system_instruction: LIBRIS_SYSTEM_INSTRUCTION.to_string() }
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let display = path.as_ref().display().to_string();
    let file_content = fs
        ::read_to_string(&path)
        .map_err(|source| PromptError::Io { path: display.clone(), source })?;
    let mut config: PromptConfig = serde_json
        ::from_str(&file_content)
        .map_err(|source| PromptError::Json { path: display.clone(), source })?;

    config.system_instruction = config.system_instruction.trim().to_string();
    if config.system_instruction.is_empty() {
        return Err(PromptError::EmptyInstruction(display));
    }
    Ok(config)
}

/// Built-in persona unless a prompts file is configured.
pub fn resolve_prompts(path: Option<&str>) -> Result<PromptConfig, PromptError> {
    match path.filter(|p| !p.trim().is_empty()) {
        Some(p) => {
            info!("Loading system instruction from {}", p);
            load_prompts(p)
        }
        None => Ok(PromptConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn prompts_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_persona_forbids_direct_quotes() {
        let config = resolve_prompts(None).unwrap();
        assert!(config.system_instruction.starts_with("You are Libris"));
        assert!(config.system_instruction.contains("Never quote books directly"));
    }

    #[test]
    fn loads_instruction_from_file() {
        let file = prompts_file(r#"{ "system_instruction": "  Be brief.  " }"#);
        let config = resolve_prompts(file.path().to_str()).unwrap();
        assert_eq!(config.system_instruction, "Be brief.");
    }

    #[test]
    fn rejects_blank_instruction_and_bad_json() {
        let blank = prompts_file(r#"{ "system_instruction": "   " }"#);
        assert!(matches!(load_prompts(blank.path()), Err(PromptError::EmptyInstruction(_))));

        let broken = prompts_file("{ not json");
        assert!(matches!(load_prompts(broken.path()), Err(PromptError::Json { .. })));

        assert!(matches!(load_prompts("/nonexistent/prompts.json"), Err(PromptError::Io { .. })));
    }
}
