//! Two-step review/publish workflow: `draft -> reviewed -> published`.

use crate::error::AppError;
use serde_json::Value;
use std::fmt;

pub const STATUS_ATTRIBUTE: &str = "status";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Draft,
    Reviewed,
    Published,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Reviewed => "reviewed",
            Status::Published => "published",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(Status::Draft),
            "reviewed" => Some(Status::Reviewed),
            "published" => Some(Status::Published),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two workflow steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Review,
    Publish,
}

impl Transition {
    pub fn requires(self) -> Status {
        match self {
            Transition::Review => Status::Draft,
            Transition::Publish => Status::Reviewed,
        }
    }

    pub fn target(self) -> Status {
        match self {
            Transition::Review => Status::Reviewed,
            Transition::Publish => Status::Published,
        }
    }

    /// Attribute stamped with the acting user's id.
    pub fn actor_attribute(self) -> &'static str {
        match self {
            Transition::Review => "reviewedById",
            Transition::Publish => "publishedById",
        }
    }

    /// Key the resolved actor is attached under in the response.
    pub fn actor_key(self) -> &'static str {
        match self {
            Transition::Review => "reviewedBy",
            Transition::Publish => "publishedBy",
        }
    }

    fn precondition(self) -> &'static str {
        match self {
            Transition::Review => "Can only review an entity in draft state",
            Transition::Publish => "Can only publish a reviewed entity",
        }
    }

    /// Check the row's current status. A missing or null status means the entity takes no part.
    pub fn check(self, current: Option<&Value>) -> Result<Status, AppError> {
        let current = match current {
            None | Some(Value::Null) => {
                return Err(AppError::NoStatus("this entity does not have a status flag".into()))
            }
            Some(v) => v.as_str().and_then(Status::parse),
        };
        if current != Some(self.requires()) {
            return Err(AppError::InvalidTransition(self.precondition().into()));
        }
        Ok(self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_requires_draft() {
        assert_eq!(Transition::Review.check(Some(&json!("draft"))).unwrap(), Status::Reviewed);
        let err = Transition::Review.check(Some(&json!("reviewed"))).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(ref m) if m == "Can only review an entity in draft state"));
    }

    #[test]
    fn publish_requires_reviewed() {
        assert_eq!(Transition::Publish.check(Some(&json!("reviewed"))).unwrap(), Status::Published);
        assert!(matches!(
            Transition::Publish.check(Some(&json!("draft"))),
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            Transition::Publish.check(Some(&json!("archived"))),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn missing_status_is_not_a_participant() {
        assert!(matches!(Transition::Review.check(None), Err(AppError::NoStatus(_))));
        assert!(matches!(Transition::Publish.check(Some(&Value::Null)), Err(AppError::NoStatus(_))));
    }
}
