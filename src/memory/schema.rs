//! Collection names, stored field names and field typing.

use convo_docstore::{CollectionSchema, FieldType};

/// Collection holding one `ConvoMeta` document per conversation.
pub const META_COLLECTION: &str = ".conversational-meta";

/// Collection holding every `Interaction`.
pub const INTERACTIONS_COLLECTION: &str = ".conversational-interactions";

/// Page size used when draining a conversation's interactions for deletion.
pub const DEFAULT_DRAIN_PAGE_SIZE: usize = 30;

/// Page size when a caller does not ask for one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

pub mod meta_fields {
    pub const CREATE_TIME: &str = "createTime";
    pub const LAST_INTERACTION_TIME: &str = "lastInteractionTime";
    pub const NUM_INTERACTIONS: &str = "numInteractions";
    pub const NAME: &str = "name";
    pub const USER: &str = "user";
}

pub mod interaction_fields {
    pub const CONVERSATION_ID: &str = "conversation_id";
    pub const TIMESTAMP: &str = "timestamp";
    pub const INPUT: &str = "input";
    pub const PROMPT: &str = "prompt";
    pub const RESPONSE: &str = "response";
    pub const AGENT: &str = "agent";
    pub const METADATA: &str = "metadata";
}

pub fn meta_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field(meta_fields::CREATE_TIME, FieldType::Date)
        .field(meta_fields::LAST_INTERACTION_TIME, FieldType::Date)
        .field(meta_fields::NUM_INTERACTIONS, FieldType::Integer)
        .field(meta_fields::NAME, FieldType::Keyword)
        .field(meta_fields::USER, FieldType::Keyword)
}

pub fn interactions_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field(interaction_fields::CONVERSATION_ID, FieldType::Keyword)
        .field(interaction_fields::TIMESTAMP, FieldType::Date)
        .field(interaction_fields::INPUT, FieldType::Text)
        .field(interaction_fields::PROMPT, FieldType::Text)
        .field(interaction_fields::RESPONSE, FieldType::Text)
        .field(interaction_fields::AGENT, FieldType::Keyword)
        .field(interaction_fields::METADATA, FieldType::Text)
}
