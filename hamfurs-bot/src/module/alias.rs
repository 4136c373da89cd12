//! Participant to callsign aliases.
//!
//! Keyed by the participant's numeric id so renames keep the alias. A handle
//! (case-insensitive) maps to at most one participant: registering under a
//! handle evicts any other participant's alias that still claims it.

use crate::store::{Collection, StoreError};
use crate::telegram::User;
use hamfurs_common::Callsign;
use hamfurs_common::markdown::escape_markdown;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub callsign: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_name_lower: Option<String>,
    pub user_first: String,
    pub user_last: Option<String>,
    /// Seconds since the epoch
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Updated,
}

impl Registration {
    pub fn verb(&self) -> &'static str {
        match self {
            Registration::Created => "Created",
            Registration::Updated => "Updated",
        }
    }
}

impl Alias {
    /// Markdown-escaped text shown on the "Alias" line.
    pub fn display_text(&self) -> String {
        let full_name = match &self.user_last {
            Some(last) if !last.is_empty() => format!("{} {}", self.user_first, last),
            _ => self.user_first.clone(),
        };
        match &self.user_name {
            Some(handle) => escape_markdown(&format!("@{} ({})", handle, full_name)),
            None => escape_markdown(&full_name),
        }
    }
}

pub struct AliasStore {
    aliases: Collection<Alias>,
}

impl AliasStore {
    pub fn new(aliases: Collection<Alias>) -> Self {
        Self { aliases }
    }

    /// Alias registered under a chat handle, with or without the leading '@'.
    pub async fn by_handle(&self, handle: &str) -> Option<Alias> {
        let handle = handle.trim().trim_start_matches('@').to_lowercase();
        if handle.is_empty() {
            return None;
        }
        self.aliases
            .find(|alias| alias.user_name_lower.as_deref() == Some(handle.as_str()))
            .await
    }

    /// Most recently registered alias claiming `callsign`.
    pub async fn by_callsign(&self, callsign: &Callsign) -> Option<Alias> {
        self.aliases
            .values()
            .await
            .into_iter()
            .filter(|alias| alias.callsign == callsign.as_str())
            .max_by_key(|alias| (alias.updated, alias.user_id))
    }

    /// Register (or re-register) `user` as the holder of `callsign`.
    pub async fn register(
        &self,
        user: &User,
        callsign: &Callsign,
        now: i64,
    ) -> Result<Registration, StoreError> {
        let alias = Alias {
            callsign: callsign.to_string(),
            user_id: user.id,
            user_name: user.username.clone(),
            user_name_lower: user.username.as_ref().map(|u| u.to_lowercase()),
            user_first: user.first_name.clone(),
            user_last: user.last_name.clone(),
            updated: now,
        };

        let replaced = self
            .aliases
            .update(|docs| {
                if let Some(handle) = &alias.user_name_lower {
                    docs.retain(|_, other| {
                        other.user_id == alias.user_id
                            || other.user_name_lower.as_ref() != Some(handle)
                    });
                }
                docs.insert(alias.user_id.to_string(), alias.clone()).is_some()
            })
            .await?;

        tracing::info!("Registered alias {} for user {}", callsign, user.id);
        Ok(if replaced {
            Registration::Updated
        } else {
            Registration::Created
        })
    }
}
