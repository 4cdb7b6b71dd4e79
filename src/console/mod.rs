//! Line-based menu front-end over a [`CourseRepository`].
//!
//! Generic over its input and output streams: the binary wires it to stdin/stdout,
//! tests drive it with in-memory buffers.

use std::io;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, warn};

use crate::db::{BaseRepository, CourseRepository};
use crate::error::AppError;
use crate::models::{Course, CourseType};

const MENU: &str = "\
------------- COURSE MANAGEMENT -------------
(1) Add course                  CREATE
(2) Show all courses            READ
(3) Show course details         READ
(4) Update course               UPDATE
(5) Delete course               DELETE
(6) Search courses              READ
(7) Running courses             READ
---------------------------------------------
(x) Exit";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Console<I, O> {
    input: Lines<I>,
    output: O,
    courses: Arc<dyn CourseRepository>,
}

impl<I, O> Console<I, O>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(input: I, output: O, courses: Arc<dyn CourseRepository>) -> Self {
        Self {
            input: input.lines(),
            output,
            courses,
        }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Runs the menu until `x` or end of input. Action failures are reported and the
    /// loop continues; only errors on the console streams end it early.
    pub async fn run(&mut self) -> Result<(), AppError> {
        loop {
            self.say(MENU).await?;
            let Some(choice) = self.read_line().await? else {
                break;
            };

            let (action, outcome) = match choice.as_str() {
                "1" => ("Adding a course", self.add_course().await),
                "2" => ("Listing courses", self.show_all_courses().await),
                "3" => ("Showing course details", self.show_course_details().await),
                "4" => ("Updating a course", self.update_course().await),
                "5" => ("Deleting a course", self.delete_course().await),
                "6" => ("Searching courses", self.search_courses().await),
                "7" => ("Listing running courses", self.show_running_courses().await),
                "x" => break,
                other => {
                    debug!("unknown menu choice '{}'", other);
                    self.say("Invalid input, please try again.").await?;
                    continue;
                }
            };

            match outcome {
                Ok(()) => {}
                Err(AppError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(err) => {
                    warn!("{} failed: {}", action, err);
                    self.say(&format!("{} failed. {}", action, err)).await?;
                }
            }
        }

        self.say("Goodbye!").await
    }

    async fn add_course(&mut self) -> Result<(), AppError> {
        self.say("Please enter all course data.").await?;
        let name = self.prompt("Name:").await?;
        if name.is_empty() {
            return Err(AppError::InvalidArgument("name must not be empty".to_string()));
        }
        let description = self.prompt("Description:").await?;
        if description.is_empty() {
            return Err(AppError::InvalidArgument("description must not be empty".to_string()));
        }
        let hours = parse_hours(&self.prompt("Hours:").await?)?;
        let begin_date = parse_date(&self.prompt("Begin date (YYYY-MM-DD):").await?)?;
        let end_date = parse_date(&self.prompt("End date (YYYY-MM-DD):").await?)?;
        let course_type = self
            .prompt("Course type (OE/BF/ZA/FF/FS):")
            .await?
            .parse::<CourseType>()?;

        let course = Course::new(name, description, hours, begin_date, end_date, course_type)?;
        match self.courses.insert(&course).await? {
            Some(created) => self.say(&format!("Course created: {}", created)).await,
            None => self.say("Course could not be created.").await,
        }
    }

    async fn show_all_courses(&mut self) -> Result<(), AppError> {
        let courses = self.courses.get_all().await?;
        if courses.is_empty() {
            return self.say("Course list is empty.").await;
        }
        self.print_courses(&courses).await
    }

    async fn show_course_details(&mut self) -> Result<(), AppError> {
        let id = parse_id(&self.prompt("Course id:").await?)?;
        match self.courses.get_by_id(id).await? {
            Some(course) => self.say(&course.to_string()).await,
            None => self.say(&format!("Course with id {} not found.", id)).await,
        }
    }

    async fn update_course(&mut self) -> Result<(), AppError> {
        let id = parse_id(&self.prompt("Id of the course to change:").await?)?;
        let Some(current) = self.courses.get_by_id(id).await? else {
            return self.say(&format!("Course with id {} not found.", id)).await;
        };

        self.say(&format!("Changing course: {}", current)).await?;
        self.say("Enter new values (leave blank to keep the current one).").await?;

        let name = self.prompt("Name:").await?;
        let description = self.prompt("Description:").await?;
        let hours = self.prompt("Hours:").await?;
        let begin_date = self.prompt("Begin date (YYYY-MM-DD):").await?;
        let end_date = self.prompt("End date (YYYY-MM-DD):").await?;
        let course_type = self.prompt("Course type (OE/BF/ZA/FF/FS):").await?;

        let changed = Course::with_id(
            id,
            or_keep(name, current.name()),
            or_keep(description, current.description()),
            keep_or_parse(&hours, current.hours(), parse_hours)?,
            keep_or_parse(&begin_date, current.begin_date(), parse_date)?,
            keep_or_parse(&end_date, current.end_date(), parse_date)?,
            keep_or_parse(&course_type, current.course_type(), |s| {
                Ok(s.parse::<CourseType>()?)
            })?,
        )?;

        match self.courses.update(&changed).await? {
            Some(updated) => self.say(&format!("Course updated: {}", updated)).await,
            None => self.say("Course could not be updated.").await,
        }
    }

    async fn delete_course(&mut self) -> Result<(), AppError> {
        let id = parse_id(&self.prompt("Id of the course to delete:").await?)?;
        if self.courses.delete_by_id(id).await? {
            self.say(&format!("Course with id {} deleted.", id)).await
        } else {
            self.say(&format!("No course with id {} found.", id)).await
        }
    }

    async fn search_courses(&mut self) -> Result<(), AppError> {
        let text = self.prompt("Search term:").await?;
        let courses = self.courses.find_all_courses_by_name_or_description(&text).await?;
        if courses.is_empty() {
            return self.say("No matching courses.").await;
        }
        self.print_courses(&courses).await
    }

    async fn show_running_courses(&mut self) -> Result<(), AppError> {
        let courses = self.courses.find_all_running_courses().await?;
        self.say("Currently running courses:").await?;
        if courses.is_empty() {
            return self.say("None.").await;
        }
        self.print_courses(&courses).await
    }

    async fn print_courses(&mut self, courses: &[Course]) -> Result<(), AppError> {
        for course in courses {
            self.say(&course.to_string()).await?;
        }
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> Result<String, AppError> {
        self.say(label).await?;
        self.read_line().await?.ok_or_else(|| {
            AppError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "input ended"))
        })
    }

    async fn read_line(&mut self) -> Result<Option<String>, AppError> {
        let line = self.input.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    async fn say(&mut self, text: &str) -> Result<(), AppError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

fn or_keep(input: String, current: &str) -> String {
    if input.is_empty() {
        current.to_string()
    } else {
        input
    }
}

fn keep_or_parse<T>(
    input: &str,
    current: T,
    parse: impl Fn(&str) -> Result<T, AppError>,
) -> Result<T, AppError> {
    if input.is_empty() {
        Ok(current)
    } else {
        parse(input)
    }
}

fn parse_id(input: &str) -> Result<i64, AppError> {
    input
        .parse::<i64>()
        .map_err(|_| AppError::InvalidArgument(format!("'{}' is not a valid course id", input)))
}

fn parse_hours(input: &str) -> Result<i32, AppError> {
    input
        .parse::<i32>()
        .map_err(|_| AppError::InvalidArgument(format!("'{}' is not a number of hours", input)))
}

fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| {
        AppError::InvalidArgument(format!("'{}' is not a date in YYYY-MM-DD form", input))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_hours("4h"), Err(AppError::InvalidArgument(_))));
        assert_eq!(
            parse_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(matches!(parse_date("01.06.2024"), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_blank_keeps_current_value() {
        assert_eq!(or_keep(String::new(), "Intro"), "Intro");
        assert_eq!(or_keep("Other".to_string(), "Intro"), "Other");
        assert_eq!(keep_or_parse("", 4, parse_hours).unwrap(), 4);
        assert_eq!(keep_or_parse("7", 4, parse_hours).unwrap(), 7);
    }
}
