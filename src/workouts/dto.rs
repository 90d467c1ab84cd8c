use serde::{Deserialize, Serialize};

use super::repo_types::{Workout, WorkoutEntry, WorkoutInput};

/// `POST /workouts`. Any `user_id` the client sends is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub calories_burned: i32,
    #[serde(default)]
    pub entries: Vec<WorkoutEntry>,
}

impl From<CreateWorkoutRequest> for WorkoutInput {
    fn from(r: CreateWorkoutRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            duration_minutes: r.duration_minutes,
            calories_burned: r.calories_burned,
            entries: r.entries,
        }
    }
}

/// `PUT /workouts/:id`. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub entries: Option<Vec<WorkoutEntry>>,
}

impl UpdateWorkoutRequest {
    pub fn apply(self, workout: &mut Workout) {
        if let Some(title) = self.title {
            workout.title = title;
        }
        if let Some(description) = self.description {
            workout.description = description;
        }
        if let Some(minutes) = self.duration_minutes {
            workout.duration_minutes = minutes;
        }
        if let Some(calories) = self.calories_burned {
            workout.calories_burned = calories;
        }
        if let Some(entries) = self.entries {
            workout.entries = entries;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub workout: Workout,
}

#[derive(Debug, Serialize)]
pub struct WorkoutListResponse {
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}
