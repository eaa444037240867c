use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn or_unauthorized(self) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(KnownErrors::Unauthorized),
        }
    }
}

/// Allows only the owner of a resource.
pub fn require_self(identity: Option<&str>, owner: &str) -> Decision {
    match identity {
        Some(username) if username == owner => Decision::Allow,
        _ => Decision::Deny,
    }
}

/// Allows anyone with a session identity.
pub fn require_logged_in(identity: Option<&str>) -> Decision {
    match identity {
        Some(_) => Decision::Allow,
        None => Decision::Deny,
    }
}
