use serde::{Deserialize, Serialize};

/// Addressing information for a single recipient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email_address: Option<String>,
}

impl Recipient {
    pub fn new(user_id: Option<i64>, email_address: Option<String>) -> Self {
        Self {
            user_id,
            email_address: email_address.filter(|address| !address.trim().is_empty()),
        }
    }

    pub fn user(user_id: i64) -> Self {
        Self::new(Some(user_id), None)
    }

    pub fn email(email_address: impl Into<String>) -> Self {
        Self::new(None, Some(email_address.into()))
    }
}
