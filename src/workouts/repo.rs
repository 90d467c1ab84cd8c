use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::workouts::repo_types::{Workout, WorkoutEntry, WorkoutInput, WorkoutRow};

#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn create_workout(&self, owner_id: i64, input: &WorkoutInput) -> anyhow::Result<Workout>;
    async fn get_workout_by_id(&self, id: i64) -> anyhow::Result<Option<Workout>>;
    async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64)
        -> anyhow::Result<Vec<Workout>>;
    /// Replace the workout's fields and entries. The owner is never touched.
    /// `None` when the workout no longer exists.
    async fn update_workout(&self, workout: &Workout) -> anyhow::Result<Option<Workout>>;
    /// `false` when nothing was deleted.
    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool>;
    async fn get_owner_id(&self, id: i64) -> anyhow::Result<Option<i64>>;
}

#[derive(Clone)]
pub struct PgWorkoutStore {
    db: PgPool,
}

impl PgWorkoutStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const WORKOUT_COLUMNS: &str =
    "id, user_id, title, description, duration_minutes, calories_burned, created_at, updated_at";

#[async_trait]
impl WorkoutStore for PgWorkoutStore {
    async fn create_workout(&self, owner_id: i64, input: &WorkoutInput) -> anyhow::Result<Workout> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            INSERT INTO workouts (user_id, title, description, duration_minutes, calories_burned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.calories_burned)
        .fetch_one(&mut *tx)
        .await
        .context("insert workout")?;

        let entries = insert_entries_tx(&mut tx, row.id, &input.entries).await?;
        tx.commit().await.context("commit tx")?;

        Ok(Workout::from_parts(row, entries))
    }

    async fn get_workout_by_id(&self, id: i64) -> anyhow::Result<Option<Workout>> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get workout")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let entries = list_entries(&self.db, row.id).await?;
        Ok(Some(Workout::from_parts(row, entries)))
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Workout>> {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
              FROM workouts
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list workouts by user")?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let entries = list_entries(&self.db, row.id).await?;
            out.push(Workout::from_parts(row, entries));
        }
        Ok(out)
    }

    async fn update_workout(&self, workout: &Workout) -> anyhow::Result<Option<Workout>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            UPDATE workouts
               SET title = $1, description = $2, duration_minutes = $3,
                   calories_burned = $4, updated_at = now()
             WHERE id = $5
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.duration_minutes)
        .bind(workout.calories_burned)
        .bind(workout.id)
        .fetch_optional(&mut *tx)
        .await
        .context("update workout")?;
        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM workout_entries WHERE workout_id = $1")
            .bind(workout.id)
            .execute(&mut *tx)
            .await
            .context("clear workout entries")?;
        let entries = insert_entries_tx(&mut tx, workout.id, &workout.entries).await?;

        tx.commit().await.context("commit tx")?;
        Ok(Some(Workout::from_parts(row, entries)))
    }

    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete workout")?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_owner_id(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM workouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get workout owner")?;
        Ok(owner)
    }
}

/// Insert entries within a transaction, returning them with their new ids.
async fn insert_entries_tx(
    tx: &mut Transaction<'_, Postgres>,
    workout_id: i64,
    entries: &[WorkoutEntry],
) -> anyhow::Result<Vec<WorkoutEntry>> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let saved = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            INSERT INTO workout_entries
                (workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            "#,
        )
        .bind(workout_id)
        .bind(&entry.exercise_name)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.duration_seconds)
        .bind(entry.weight)
        .bind(&entry.notes)
        .bind(entry.order_index)
        .fetch_one(&mut **tx)
        .await
        .context("insert workout entry")?;
        out.push(saved);
    }
    Ok(out)
}

async fn list_entries(db: &PgPool, workout_id: i64) -> anyhow::Result<Vec<WorkoutEntry>> {
    let rows = sqlx::query_as::<_, WorkoutEntry>(
        r#"
        SELECT id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
          FROM workout_entries
         WHERE workout_id = $1
         ORDER BY order_index ASC, id ASC
        "#,
    )
    .bind(workout_id)
    .fetch_all(db)
    .await
    .context("list workout entries")?;
    Ok(rows)
}
