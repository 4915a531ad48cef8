use crate::db::Fields;
use crate::memory::schema::{interaction_fields, meta_fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============= Conversation Types =============

/// Aggregate metadata of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest interaction, or `created_at` if there is none.
    pub last_hit_at: DateTime<Utc>,
    pub interaction_count: u64,
    pub name: String,
    /// Owning user. `None` when access control is disabled.
    pub owner: Option<String>,
}

impl ConvoMeta {
    /// A fresh conversation with no interactions.
    pub fn new(name: impl Into<String>, owner: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            created_at: now,
            last_hit_at: now,
            interaction_count: 0,
            name: name.into(),
            owner,
        }
    }

    pub fn from_document(id: &str, fields: &Fields) -> Result<Self> {
        Ok(Self {
            id: id.to_string(),
            created_at: date_field(fields, meta_fields::CREATE_TIME)?,
            last_hit_at: date_field(fields, meta_fields::LAST_INTERACTION_TIME)?,
            interaction_count: fields
                .get(meta_fields::NUM_INTERACTIONS)
                .and_then(Value::as_u64)
                .ok_or_else(|| malformed(meta_fields::NUM_INTERACTIONS))?,
            name: string_field(fields, meta_fields::NAME)?,
            owner: match fields.get(meta_fields::USER) {
                None | Some(Value::Null) => None,
                Some(Value::String(user)) => Some(user.clone()),
                Some(_) => return Err(malformed(meta_fields::USER)),
            },
        })
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            meta_fields::CREATE_TIME.into(),
            Value::String(self.created_at.to_rfc3339()),
        );
        fields.insert(
            meta_fields::LAST_INTERACTION_TIME.into(),
            Value::String(self.last_hit_at.to_rfc3339()),
        );
        fields.insert(
            meta_fields::NUM_INTERACTIONS.into(),
            Value::from(self.interaction_count),
        );
        fields.insert(meta_fields::NAME.into(), Value::String(self.name.clone()));
        fields.insert(
            meta_fields::USER.into(),
            self.owner.clone().map(Value::String).unwrap_or(Value::Null),
        );
        fields
    }
}

impl fmt::Display for ConvoMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConvoMeta{{id={}, name={}, interactions={}, created={}, lastHit={}, user={}}}",
            self.id,
            self.name,
            self.interaction_count,
            self.created_at.to_rfc3339(),
            self.last_hit_at.to_rfc3339(),
            self.owner.as_deref().unwrap_or("-"),
        )
    }
}

// ============= Interaction Types =============

/// One turn of a conversation. Payload fields are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
    pub input: String,
    pub prompt_template: String,
    pub response: String,
    pub agent: String,
    pub metadata: String,
}

impl Interaction {
    pub fn from_document(id: &str, fields: &Fields) -> Result<Self> {
        Ok(Self {
            id: id.to_string(),
            timestamp: date_field(fields, interaction_fields::TIMESTAMP)?,
            conversation_id: string_field(fields, interaction_fields::CONVERSATION_ID)?,
            input: string_field(fields, interaction_fields::INPUT)?,
            prompt_template: string_field(fields, interaction_fields::PROMPT)?,
            response: string_field(fields, interaction_fields::RESPONSE)?,
            agent: string_field(fields, interaction_fields::AGENT)?,
            metadata: string_field(fields, interaction_fields::METADATA)?,
        })
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            interaction_fields::CONVERSATION_ID.into(),
            Value::String(self.conversation_id.clone()),
        );
        fields.insert(
            interaction_fields::TIMESTAMP.into(),
            Value::String(self.timestamp.to_rfc3339()),
        );
        fields.insert(interaction_fields::INPUT.into(), Value::String(self.input.clone()));
        fields.insert(
            interaction_fields::PROMPT.into(),
            Value::String(self.prompt_template.clone()),
        );
        fields.insert(
            interaction_fields::RESPONSE.into(),
            Value::String(self.response.clone()),
        );
        fields.insert(interaction_fields::AGENT.into(), Value::String(self.agent.clone()));
        fields.insert(
            interaction_fields::METADATA.into(),
            Value::String(self.metadata.clone()),
        );
        fields
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interaction{{id={}, cid={}, timestamp={}, agent={}, input={}}}",
            self.id,
            self.conversation_id,
            self.timestamp.to_rfc3339(),
            self.agent,
            self.input,
        )
    }
}

/// Payload of a new interaction, everything except id and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionInput {
    pub input: String,
    pub prompt_template: String,
    pub response: String,
    pub agent: String,
    pub metadata: String,
}

impl InteractionInput {
    pub fn new(
        input: impl Into<String>,
        prompt_template: impl Into<String>,
        response: impl Into<String>,
        agent: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            prompt_template: prompt_template.into(),
            response: response.into(),
            agent: agent.into(),
            metadata: metadata.into(),
        }
    }

    pub(crate) fn into_interaction(
        self,
        conversation_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Interaction {
        Interaction {
            id: String::new(),
            timestamp,
            conversation_id: conversation_id.to_string(),
            input: self.input,
            prompt_template: self.prompt_template,
            response: self.response,
            agent: self.agent,
            metadata: self.metadata,
        }
    }
}

// ============= Request Context =============

/// Identity of whoever issued the current call.
///
/// An absent requester disables ownership filtering and access checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub requester: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            requester: Some(user.into()),
        }
    }

    pub fn requester(&self) -> Option<&str> {
        self.requester.as_deref()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Collection not initialized: {0}")]
    NotInitialized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User [{user}] does not have access to conversation {conversation_id}")]
    AccessDenied {
        user: String,
        conversation_id: String,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MemoryError {
    pub fn access_denied(ctx: &RequestContext, conversation_id: &str) -> Self {
        MemoryError::AccessDenied {
            user: ctx.requester().unwrap_or("<anonymous>").to_string(),
            conversation_id: conversation_id.to_string(),
        }
    }

    /// The caller sent something it should not have.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MemoryError::AccessDenied { .. } | MemoryError::InvalidArgument(_)
        )
    }

    /// Trying again later may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, MemoryError::Store(_) | MemoryError::NotInitialized(_))
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;

fn malformed(field: &str) -> MemoryError {
    MemoryError::Store(format!("malformed document: field '{}' missing or invalid", field))
}

fn string_field(fields: &Fields, name: &str) -> Result<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(name))
}

fn date_field(fields: &Fields, name: &str) -> Result<DateTime<Utc>> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| malformed(name))
}
