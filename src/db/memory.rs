//! In-process [`DirectoryStore`] used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{DirectoryStore, StoreError, UserRecord, UserUpdate};
use crate::directory::normalize;

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<UserRecord>>,
    next_id: AtomicUsize,
    /// Every call that would issue an INSERT, UPDATE or DELETE.
    pub mutations: AtomicUsize,
    /// Normalized phone whose lookups and inserts fail with a database error.
    pub failing_phone: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(phone: &str) -> Self {
        Self {
            failing_phone: Some(normalize(phone)),
            ..Self::default()
        }
    }

    pub fn seeded(rows: &[(&str, &str, &str)]) -> Self {
        let store = Self::new();
        for (phone, first, last) in rows {
            store.push(phone, first, last);
        }
        store
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn push(&self, phone: &str, first_name: &str, last_name: &str) -> UserRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
        let record = UserRecord {
            id,
            phone: phone.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        record
    }

    fn check_failure(&self, normalized: &str) -> Result<(), StoreError> {
        match &self.failing_phone {
            Some(p) if p == normalized => Err(StoreError::Database(sqlx::Error::Protocol(
                "connection reset".to_string(),
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_by_phone(&self, normalized: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check_failure(normalized)?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| normalize(&r.phone) == normalized).cloned())
    }

    async fn insert(
        &self,
        phone: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserRecord, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_failure(&normalize(phone))?;
        if self.rows.lock().unwrap().iter().any(|r| r.phone == phone) {
            return Err(StoreError::Conflict);
        }
        Ok(self.push(phone, first_name, last_name))
    }

    async fn update(&self, normalized: &str, update: &UserUpdate) -> Result<u64, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if let Some(phone) = &update.phone {
            if rows
                .iter()
                .any(|r| r.phone == *phone && normalize(&r.phone) != normalized)
            {
                return Err(StoreError::Conflict);
            }
        }
        let mut affected = 0;
        for row in rows.iter_mut().filter(|r| normalize(&r.phone) == normalized) {
            if let Some(v) = &update.first_name {
                row.first_name = v.clone();
            }
            if let Some(v) = &update.last_name {
                row.last_name = v.clone();
            }
            if let Some(v) = &update.phone {
                row.phone = v.clone();
            }
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(&self, normalized: &str) -> Result<u64, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| normalize(&r.phone) != normalized);
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn list(&self, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut users: Vec<UserRecord> = rows.clone();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }
}
