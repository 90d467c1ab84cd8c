//! In-memory stores for tests.
//!
//! The token store keeps expired rows on purpose: it models a database that
//! has not purged them yet.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{
        repo::{TokenRecord, TokenStore},
        tokens::{NewToken, Scope, TokenHash},
    },
    users::{
        repo::{CreateUserError, UserStore},
        repo_types::{NewUser, User},
    },
    workouts::{
        repo::WorkoutStore,
        repo_types::{Workout, WorkoutInput},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn remove(&self, id: i64) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User, CreateUserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(CreateUserError::UsernameTaken);
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(CreateUserError::EmailTaken);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: user.bio,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

struct StoredToken {
    record: TokenRecord,
    scope: Scope,
}

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<TokenHash, StoredToken>>,
    fail_writes: AtomicBool,
}

impl MemoryTokenStore {
    pub fn get(&self, hash: &TokenHash) -> Option<TokenRecord> {
        self.tokens.lock().unwrap().get(hash).map(|t| t.record)
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &NewToken) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("token store unavailable");
        }
        self.tokens.lock().unwrap().insert(
            token.hash,
            StoredToken {
                record: TokenRecord {
                    user_id: token.user_id,
                    expiry: token.expiry,
                },
                scope: token.scope,
            },
        );
        Ok(())
    }

    async fn find_valid(
        &self,
        hash: &TokenHash,
        scope: Scope,
    ) -> anyhow::Result<Option<TokenRecord>> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens
            .get(hash)
            .filter(|t| t.scope == scope)
            .map(|t| t.record))
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: Scope) -> anyhow::Result<u64> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| !(t.record.user_id == user_id && t.scope == scope));
        Ok((before - tokens.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryWorkoutStore {
    workouts: Mutex<Vec<Workout>>,
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
    async fn create_workout(&self, owner_id: i64, input: &WorkoutInput) -> anyhow::Result<Workout> {
        let mut workouts = self.workouts.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let mut entries = input.entries.clone();
        for (i, e) in entries.iter_mut().enumerate() {
            e.id = i as i64 + 1;
        }
        let workout = Workout {
            id: workouts.iter().map(|w| w.id).max().unwrap_or(0) + 1,
            user_id: owner_id,
            title: input.title.clone(),
            description: input.description.clone(),
            duration_minutes: input.duration_minutes,
            calories_burned: input.calories_burned,
            entries,
            created_at: now,
            updated_at: now,
        };
        workouts.push(workout.clone());
        Ok(workout)
    }

    async fn get_workout_by_id(&self, id: i64) -> anyhow::Result<Option<Workout>> {
        let workouts = self.workouts.lock().unwrap();
        Ok(workouts.iter().find(|w| w.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Workout>> {
        let workouts = self.workouts.lock().unwrap();
        Ok(workouts
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_workout(&self, workout: &Workout) -> anyhow::Result<Option<Workout>> {
        let mut workouts = self.workouts.lock().unwrap();
        let Some(stored) = workouts.iter_mut().find(|w| w.id == workout.id) else {
            return Ok(None);
        };
        stored.title = workout.title.clone();
        stored.description = workout.description.clone();
        stored.duration_minutes = workout.duration_minutes;
        stored.calories_burned = workout.calories_burned;
        stored.entries = workout.entries.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool> {
        let mut workouts = self.workouts.lock().unwrap();
        let before = workouts.len();
        workouts.retain(|w| w.id != id);
        Ok(workouts.len() != before)
    }

    async fn get_owner_id(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let workouts = self.workouts.lock().unwrap();
        Ok(workouts.iter().find(|w| w.id == id).map(|w| w.user_id))
    }
}
