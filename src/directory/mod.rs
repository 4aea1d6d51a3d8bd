//! Phone-directory reconciliation: matching operator-supplied phone/name lines
//! against the stored directory, plus the single-record mutations around it.
//!
//! Expected conditions (duplicate phone, unknown phone, nothing to update,
//! malformed line) come back as outcome values. Only unexpected store failures
//! surface as `Err(StoreError)`.

pub mod parse;

use std::sync::Arc;

use serde::Serialize;

use crate::db::{DirectoryStore, StoreError, UserRecord, UserUpdate};

pub use parse::{normalize, parse_line, InputLine, UNKNOWN_NAME};

const MSG_ADDED: &str = "User added successfully";
const MSG_DUPLICATE: &str = "A user with this phone number already exists";
const MSG_NOT_FOUND: &str = "No user with this phone number was found";
const MSG_NOTHING_TO_UPDATE: &str = "Nothing to update";
const MSG_UPDATED: &str = "User details updated successfully";
const MSG_PHONE_TAKEN: &str = "Another user already has this phone number";
const MSG_DELETED: &str = "User deleted successfully";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub found: bool,
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredName {
    pub first_name: String,
    pub last_name: String,
}

/// Result for one line of a batch check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub phone: String,
    pub input_name: String,
    pub found: bool,
    pub db_user: Option<StoredName>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchCheck {
    pub results: Vec<CheckResult>,
    pub summary: CheckSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOutcome {
    pub success: bool,
    pub message: String,
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchInsertOutcome {
    pub added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Outcome of an edit or delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationOutcome {
    pub success: bool,
    pub message: String,
}

impl MutationOutcome {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListOutcome {
    pub users: Vec<UserRecord>,
    pub total: i64,
}

/// Runs directory operations against a shared [`DirectoryStore`].
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn DirectoryStore>,
    default_limit: i64,
}

impl Reconciler {
    pub fn new(store: Arc<dyn DirectoryStore>, default_limit: i64) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Looks a phone up by its digits only; stored formatting is irrelevant.
    pub async fn check_single(&self, phone: &str) -> Result<CheckOutcome, StoreError> {
        tracing::info!("Checking phone {}", phone);
        let user = self.store.find_by_phone(&normalize(phone)).await?;
        match &user {
            Some(u) => tracing::info!("Phone {} belongs to user {}", phone, u.id),
            None => tracing::info!("Phone {} is not in the directory", phone),
        }
        Ok(CheckOutcome {
            found: user.is_some(),
            user,
        })
    }

    /// Checks every non-blank line in order, one lookup per line.
    ///
    /// Fails as a whole on the first store error; no partial result is returned.
    pub async fn check_batch<I, S>(&self, lines: I) -> Result<BatchCheck, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        let mut summary = CheckSummary::default();

        for line in lines {
            let Some(InputLine { raw_phone, name }) = parse_line(line.as_ref()) else {
                continue;
            };
            let input_name = if name.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                name
            };

            let user = self.store.find_by_phone(&normalize(&raw_phone)).await?;

            summary.total += 1;
            if user.is_some() {
                summary.found += 1;
            } else {
                summary.not_found += 1;
            }
            results.push(CheckResult {
                phone: raw_phone,
                input_name,
                found: user.is_some(),
                db_user: user.map(|u| StoredName {
                    first_name: u.first_name,
                    last_name: u.last_name,
                }),
            });
        }

        tracing::info!(
            "Batch check done: total={} found={} not_found={}",
            summary.total,
            summary.found,
            summary.not_found
        );
        Ok(BatchCheck { results, summary })
    }

    /// Inserts one user. A duplicate phone is a normal outcome, not an error.
    pub async fn insert_single(
        &self,
        phone: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<InsertOutcome, StoreError> {
        tracing::info!("Adding user {} {} ({})", first_name, last_name, phone);
        match self.store.insert(phone, first_name, last_name).await {
            Ok(user) => {
                tracing::info!("User {} added with id {}", phone, user.id);
                Ok(InsertOutcome {
                    success: true,
                    message: MSG_ADDED.to_string(),
                    user: Some(user),
                })
            }
            Err(StoreError::Conflict) => {
                tracing::warn!("User {} already exists", phone);
                Ok(InsertOutcome {
                    success: false,
                    message: MSG_DUPLICATE.to_string(),
                    user: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Inserts `phone first_name last_name...` lines, tolerating per-line failures.
    pub async fn insert_batch<I, S>(&self, lines: I) -> BatchInsertOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = BatchInsertOutcome::default();

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                outcome.errors.push(format!("Invalid format: {}", line));
                continue;
            }
            let (phone, first_name) = (tokens[0], tokens[1]);
            let last_name = tokens[2..].join(" ");

            match self.insert_single(phone, first_name, &last_name).await {
                Ok(InsertOutcome { success: true, .. }) => outcome.added += 1,
                Ok(_) => outcome.skipped += 1,
                Err(e) => {
                    tracing::error!("Failed to add {}: {}", phone, e);
                    outcome.errors.push(format!("Error for {}: {}", phone, e));
                }
            }
        }

        tracing::info!(
            "Batch insert done: added={} skipped={} errors={}",
            outcome.added,
            outcome.skipped,
            outcome.errors.len()
        );
        outcome
    }

    /// Applies the present fields of `update` to the user with this phone.
    pub async fn edit_single(
        &self,
        phone: &str,
        update: UserUpdate,
    ) -> Result<MutationOutcome, StoreError> {
        if update.is_empty() {
            return Ok(MutationOutcome::failed(MSG_NOTHING_TO_UPDATE));
        }

        tracing::info!("Editing user {}: {:?}", phone, update);
        match self.store.update(&normalize(phone), &update).await {
            Ok(0) => {
                tracing::warn!("No user to edit for {}", phone);
                Ok(MutationOutcome::failed(MSG_NOT_FOUND))
            }
            Ok(_) => Ok(MutationOutcome::ok(MSG_UPDATED)),
            Err(StoreError::Conflict) => {
                tracing::warn!("New phone for {} is already taken", phone);
                Ok(MutationOutcome::failed(MSG_PHONE_TAKEN))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete_single(&self, phone: &str) -> Result<MutationOutcome, StoreError> {
        tracing::info!("Deleting user {}", phone);
        if self.store.delete(&normalize(phone)).await? == 0 {
            tracing::warn!("No user to delete for {}", phone);
            return Ok(MutationOutcome::failed(MSG_NOT_FOUND));
        }
        Ok(MutationOutcome::ok(MSG_DELETED))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        tracing::info!("Counting users");
        let count = self.store.count().await?;
        tracing::info!("Directory holds {} users", count);
        Ok(count)
    }

    /// Newest users first, capped at `limit` (or the configured default), with the full row count.
    pub async fn list(&self, limit: Option<i64>) -> Result<ListOutcome, StoreError> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(self.default_limit);
        let users = self.store.list(limit).await?;
        let total = self.store.count().await?;
        tracing::info!("Listed {} of {} users", users.len(), total);
        Ok(ListOutcome { users, total })
    }
}
