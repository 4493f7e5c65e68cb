use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity recorded on commits and tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    /// Signature stamped with the current wall-clock time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Utc::now())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
