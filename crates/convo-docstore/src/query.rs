//! Search requests: filters, sorting and paging.

use crate::types::{CollectionSchema, FieldType, Fields, StoredDocument};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Default page size of a search request.
pub const DEFAULT_SEARCH_SIZE: usize = 10;

/// Which documents a search matches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Every document.
    #[default]
    MatchAll,
    /// Documents whose `field` equals `value` exactly.
    Term {
        /// Field to compare.
        field: String,
        /// Value it must equal.
        value: Value,
    },
}

impl Filter {
    /// Exact-match filter on one field.
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub(crate) fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::Term { field, value } => fields.get(field) == Some(value),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Sort on a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    /// Field to sort by.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// A paged search over one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Which documents match.
    pub filter: Filter,
    /// Optional sort; unsorted results come back in insertion order.
    pub sort: Option<Sort>,
    /// Number of matches to skip.
    pub from: usize,
    /// Maximum number of matches to return.
    pub size: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            filter: Filter::MatchAll,
            sort: None,
            from: 0,
            size: DEFAULT_SEARCH_SIZE,
        }
    }
}

impl SearchRequest {
    /// Create a request with the given filter and default paging.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Sort by a field.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            order,
        });
        self
    }

    /// Set the offset.
    pub fn from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    /// Set the page size.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// Order two documents according to `sort`.
///
/// Documents without a value for the sort field go last in either direction.
/// Equal keys fall back to insertion sequence, in the sort direction.
pub(crate) fn compare_documents(
    schema: &CollectionSchema,
    sort: &Sort,
    a: &StoredDocument,
    b: &StoredDocument,
) -> Ordering {
    let desc = sort.order == SortOrder::Desc;
    let field_type = schema.field_type(&sort.field);

    let key_a = a.fields.get(&sort.field).filter(|v| !v.is_null());
    let key_b = b.fields.get(&sort.field).filter(|v| !v.is_null());

    let primary = match (key_a, key_b) {
        (Some(x), Some(y)) => {
            let ord = compare_values(field_type, x, y);
            if desc {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    primary.then_with(|| {
        if desc {
            b.seq.cmp(&a.seq)
        } else {
            a.seq.cmp(&b.seq)
        }
    })
}

fn compare_values(field_type: Option<FieldType>, a: &Value, b: &Value) -> Ordering {
    match field_type {
        Some(FieldType::Date) => match (parse_date(a), parse_date(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => compare_lexical(a, b),
        },
        Some(FieldType::Integer) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => compare_lexical(a, b),
        },
        _ => compare_lexical(a, b),
    }
}

fn parse_date(value: &Value) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value.as_str()?).ok()
}

fn compare_lexical(a: &Value, b: &Value) -> Ordering {
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(seq: u64, fields: Value) -> StoredDocument {
        StoredDocument {
            id: format!("doc{}", seq),
            seq,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_term_filter() {
        let filter = Filter::term("conversation_id", "c1");
        let hit = doc(0, json!({"conversation_id": "c1"}));
        let miss = doc(1, json!({"conversation_id": "c2"}));
        let absent = doc(2, json!({}));

        assert!(filter.matches(&hit.fields));
        assert!(!filter.matches(&miss.fields));
        assert!(!filter.matches(&absent.fields));
        assert!(Filter::MatchAll.matches(&absent.fields));
    }

    #[test]
    fn test_date_sort_is_chronological() {
        // Lexically "…00.5Z" > "…00.25Z" > "…00Z", chronologically the same here,
        // but "…01Z" < "…00.5Z" lexically while being later in time.
        let schema = CollectionSchema::new().field("ts", FieldType::Date);
        let sort = Sort {
            field: "ts".into(),
            order: SortOrder::Asc,
        };
        let earlier = doc(0, json!({"ts": "2024-01-01T00:00:00.5Z"}));
        let later = doc(1, json!({"ts": "2024-01-01T00:00:01Z"}));

        assert_eq!(
            compare_documents(&schema, &sort, &earlier, &later),
            Ordering::Less
        );
    }

    #[test]
    fn test_integer_sort_is_numeric() {
        let schema = CollectionSchema::new().field("n", FieldType::Integer);
        let sort = Sort {
            field: "n".into(),
            order: SortOrder::Desc,
        };
        let nine = doc(0, json!({"n": 9}));
        let ten = doc(1, json!({"n": 10}));

        assert_eq!(compare_documents(&schema, &sort, &ten, &nine), Ordering::Less);
    }

    #[test]
    fn test_missing_values_sort_last() {
        let schema = CollectionSchema::new().field("n", FieldType::Integer);
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let sort = Sort {
                field: "n".into(),
                order,
            };
            let present = doc(0, json!({"n": 1}));
            let missing = doc(1, json!({"n": null}));
            assert_eq!(
                compare_documents(&schema, &sort, &present, &missing),
                Ordering::Less
            );
        }
    }

    #[test]
    fn test_ties_break_by_sequence_in_sort_direction() {
        let schema = CollectionSchema::new().field("n", FieldType::Integer);
        let first = doc(0, json!({"n": 1}));
        let second = doc(1, json!({"n": 1}));

        let desc = Sort {
            field: "n".into(),
            order: SortOrder::Desc,
        };
        assert_eq!(
            compare_documents(&schema, &desc, &second, &first),
            Ordering::Less
        );

        let asc = Sort {
            field: "n".into(),
            order: SortOrder::Asc,
        };
        assert_eq!(
            compare_documents(&schema, &asc, &first, &second),
            Ordering::Less
        );
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new(Filter::term("user", "alice"))
            .sort_by("lastInteractionTime", SortOrder::Desc)
            .from(20)
            .size(5);

        assert_eq!(request.from, 20);
        assert_eq!(request.size, 5);
        assert_eq!(request.sort.as_ref().map(|s| s.order), Some(SortOrder::Desc));
        assert_eq!(SearchRequest::default().size, DEFAULT_SEARCH_SIZE);
    }
}
