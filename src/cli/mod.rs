//! CLI module for convo-memory
//!
//! Provides command-line parsing for the convo-memory binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// convo-memory - conversational memory over a document store
///
/// Stores conversations and their interactions, lists them most recent
/// first, and deletes a conversation together with all of its turns.
#[derive(Parser, Debug)]
#[command(
    name = "convo-memory",
    version,
    about = "Conversational memory over an embedded document store",
    after_help = "EXAMPLES:\n    \
                  convo-memory create --name support          # Start a conversation\n    \
                  convo-memory put <ID> --input hi --response hello\n    \
                  convo-memory interactions <ID> --max-results 5\n    \
                  convo-memory --user alice list              # Alice's conversations\n    \
                  convo-memory delete <ID>                    # Delete with its interactions"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Act on behalf of this user (ownership checks apply)
    #[arg(short, long, env = "CONVO_USER", global = true)]
    pub user: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create a new conversation and print its id
    Create {
        /// Display name of the conversation
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Add an interaction to a conversation
    Put {
        /// Conversation id
        conversation_id: String,

        /// What the user said
        #[arg(short, long)]
        input: String,

        /// Prompt template used to build the model request
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// What the model answered
        #[arg(short, long, default_value = "")]
        response: String,

        /// Name of the agent that produced the response
        #[arg(short, long, default_value = "")]
        agent: String,

        /// Free-form metadata, usually JSON
        #[arg(short, long, default_value = "")]
        metadata: String,
    },

    /// List conversations, most recently active first
    List {
        /// Offset of the first conversation (continuation token)
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Page size
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// List the interactions of a conversation, most recent first
    Interactions {
        /// Conversation id
        conversation_id: String,

        /// Offset of the first interaction (continuation token)
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Page size
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Walk every page instead of printing one
        #[arg(long, conflicts_with_all = ["from", "max_results"])]
        all: bool,
    },

    /// Show one conversation
    Show {
        /// Conversation id
        conversation_id: String,
    },

    /// Delete a conversation and all of its interactions
    Delete {
        /// Conversation id
        conversation_id: String,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },
}

impl Commands {
    /// Whether the command writes to the store.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Create { .. } | Commands::Put { .. } | Commands::Delete { .. }
        )
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
