use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{AppError, InvalidValue};
use crate::models::{Course, CourseType};

/// CRUD over one kind of entity `T` identified by `I`.
#[async_trait]
pub trait BaseRepository<T: Send + Sync, I: Send>: Send + Sync {
    /// Stores `entity` and returns it as persisted, with its assigned id.
    async fn insert(&self, entity: &T) -> Result<Option<T>, AppError>;
    async fn get_by_id(&self, id: I) -> Result<Option<T>, AppError>;
    async fn get_all(&self) -> Result<Vec<T>, AppError>;
    /// Replaces the stored record with `entity`. `None` when no such record exists.
    async fn update(&self, entity: &T) -> Result<Option<T>, AppError>;
    /// `true` when a record was removed.
    async fn delete_by_id(&self, id: I) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CourseRepository: BaseRepository<Course, i64> {
    async fn find_all_courses_by_name(&self, name: &str) -> Result<Vec<Course>, AppError>;
    async fn find_all_courses_by_description(
        &self,
        description: &str,
    ) -> Result<Vec<Course>, AppError>;
    async fn find_all_courses_by_name_or_description(
        &self,
        text: &str,
    ) -> Result<Vec<Course>, AppError>;
    async fn find_all_courses_by_course_type(
        &self,
        course_type: CourseType,
    ) -> Result<Vec<Course>, AppError>;
    async fn find_all_courses_by_start_date(
        &self,
        start_date: NaiveDate,
    ) -> Result<Vec<Course>, AppError>;
    /// Courses whose end date lies after `today`, whether or not they have begun.
    async fn find_all_running_courses_at(&self, today: NaiveDate) -> Result<Vec<Course>, AppError>;

    async fn find_all_running_courses(&self) -> Result<Vec<Course>, AppError> {
        self.find_all_running_courses_at(Local::now().date_naive())
            .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: i64,
    name: String,
    description: String,
    hours: i32,
    begindate: NaiveDate,
    enddate: NaiveDate,
    coursetype: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = InvalidValue;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let course_type = row.coursetype.parse::<CourseType>()?;
        Course::with_id(
            row.id,
            row.name,
            row.description,
            row.hours,
            row.begindate,
            row.enddate,
            course_type,
        )
    }
}

fn into_courses(rows: Vec<CourseRow>) -> Result<Vec<Course>, AppError> {
    rows.into_iter()
        .map(|row| Course::try_from(row).map_err(AppError::from))
        .collect()
}

// SQLite's LOWER() only folds ASCII, so text search folds case on this side.
fn folded_contains(field: &str, lowered_needle: &str) -> bool {
    field.to_lowercase().contains(lowered_needle)
}

pub struct SqliteCourseRepository {
    db: SqlitePool,
}

impl SqliteCourseRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn find_matching(
        &self,
        text: &str,
        matches: impl Fn(&Course, &str) -> bool + Send,
    ) -> Result<Vec<Course>, AppError> {
        debug!("searching courses for '{}'", text);
        let needle = text.to_lowercase();
        let courses = self.get_all().await?;
        Ok(courses
            .into_iter()
            .filter(|course| matches(course, &needle))
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Course, i64> for SqliteCourseRepository {
    async fn insert(&self, course: &Course) -> Result<Option<Course>, AppError> {
        if let Some(id) = course.id() {
            debug!("ignoring preset id {} on insert", id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO courses (name, description, hours, begindate, enddate, coursetype)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(course.name())
        .bind(course.description())
        .bind(course.hours())
        .bind(course.begin_date())
        .bind(course.end_date())
        .bind(course.course_type().as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            warn!("insert of course '{}' affected no rows", course.name());
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        info!("inserted course {} ({})", id, course.name());
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        debug!("fetching course {}", id);
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, description, hours, begindate, enddate, coursetype
            FROM courses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Course::try_from)
            .transpose()
            .map_err(AppError::from)
    }

    async fn get_all(&self) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, description, hours, begindate, enddate, coursetype
            FROM courses
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        into_courses(rows)
    }

    async fn update(&self, course: &Course) -> Result<Option<Course>, AppError> {
        let id = course
            .id()
            .ok_or_else(|| AppError::InvalidArgument("course to update has no id".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE courses
            SET name = ?1,
                description = ?2,
                hours = ?3,
                begindate = ?4,
                enddate = ?5,
                coursetype = ?6
            WHERE id = ?7
            "#,
        )
        .bind(course.name())
        .bind(course.description())
        .bind(course.hours())
        .bind(course.begin_date())
        .bind(course.end_date())
        .bind(course.course_type().as_str())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            debug!("no course {} to update", id);
            return Ok(None);
        }

        info!("updated course {}", id);
        self.get_by_id(id).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if deleted > 0 {
            info!("deleted course {}", id);
        }
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn find_all_courses_by_name(&self, name: &str) -> Result<Vec<Course>, AppError> {
        self.find_matching(name, |course: &Course, needle: &str| {
            folded_contains(course.name(), needle)
        })
        .await
    }

    async fn find_all_courses_by_description(
        &self,
        description: &str,
    ) -> Result<Vec<Course>, AppError> {
        self.find_matching(description, |course: &Course, needle: &str| {
            folded_contains(course.description(), needle)
        })
        .await
    }

    async fn find_all_courses_by_name_or_description(
        &self,
        text: &str,
    ) -> Result<Vec<Course>, AppError> {
        self.find_matching(text, |course: &Course, needle: &str| {
            folded_contains(course.name(), needle) || folded_contains(course.description(), needle)
        })
        .await
    }

    async fn find_all_courses_by_course_type(
        &self,
        course_type: CourseType,
    ) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, description, hours, begindate, enddate, coursetype
            FROM courses
            WHERE coursetype = ?
            ORDER BY id
            "#,
        )
        .bind(course_type.as_str())
        .fetch_all(&self.db)
        .await?;
        into_courses(rows)
    }

    async fn find_all_courses_by_start_date(
        &self,
        start_date: NaiveDate,
    ) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, description, hours, begindate, enddate, coursetype
            FROM courses
            WHERE begindate = ?
            ORDER BY id
            "#,
        )
        .bind(start_date)
        .fetch_all(&self.db)
        .await?;
        into_courses(rows)
    }

    async fn find_all_running_courses_at(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Course>, AppError> {
        debug!("fetching courses ending after {}", today);
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, description, hours, begindate, enddate, coursetype
            FROM courses
            WHERE enddate > ?
            ORDER BY id
            "#,
        )
        .bind(today)
        .fetch_all(&self.db)
        .await?;
        into_courses(rows)
    }
}
