//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the convo-memory CLI.

use crate::types::{ConvoMeta, Interaction};
use owo_colors::OwoColorize;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print the continuation hint for a full page
    pub fn next_token(&self, token: Option<usize>) {
        let Some(token) = token else { return };
        let hint = format!("more results: --from {}", token);
        if self.colored {
            println!("\n  {}", hint.dimmed().italic());
        } else {
            println!("\n  [NEXT] {}", hint);
        }
    }

    /// Print one conversation in detail
    pub fn conversation(&self, meta: &ConvoMeta) {
        self.header(if meta.name.is_empty() {
            "(unnamed)"
        } else {
            &meta.name
        });
        self.kv("id", &meta.id);
        self.kv("owner", meta.owner.as_deref().unwrap_or("-"));
        self.kv("created", &meta.created_at.format(TIME_FORMAT).to_string());
        self.kv("last interaction", &meta.last_hit_at.format(TIME_FORMAT).to_string());
        self.kv("interactions", &meta.interaction_count.to_string());
    }

    /// Print a conversation as one list line
    pub fn conversation_line(&self, meta: &ConvoMeta) {
        let when = meta.last_hit_at.format(TIME_FORMAT).to_string();
        if self.colored {
            self.list_item(&format!(
                "{} {} {}",
                meta.id.bright_white(),
                meta.name.cyan(),
                format!("({} interactions, {})", meta.interaction_count, when).dimmed()
            ));
        } else {
            self.list_item(&format!(
                "{} {} ({} interactions, {})",
                meta.id, meta.name, meta.interaction_count, when
            ));
        }
    }

    /// Print one interaction
    pub fn interaction(&self, interaction: &Interaction) {
        let when = interaction.timestamp.format(TIME_FORMAT).to_string();
        if self.colored {
            println!("\n  {} {}", interaction.id.bright_white().bold(), when.dimmed());
        } else {
            println!("\n  {} {}", interaction.id, when);
        }
        self.kv("input", &interaction.input);
        self.kv("response", &interaction.response);
        if !interaction.agent.is_empty() {
            self.kv("agent", &interaction.agent);
        }
        if !interaction.prompt_template.is_empty() {
            self.kv("prompt", &interaction.prompt_template);
        }
        if !interaction.metadata.is_empty() {
            self.kv("metadata", &interaction.metadata);
        }
    }
}
