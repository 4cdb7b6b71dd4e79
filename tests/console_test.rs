use std::sync::Arc;

use chrono::NaiveDate;
use course_manager::console::Console;
use course_manager::db::{self, BaseRepository, SqliteCourseRepository};
use course_manager::models::{Course, CourseType};
use tokio::io::BufReader;

async fn setup_repo() -> Arc<SqliteCourseRepository> {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    Arc::new(SqliteCourseRepository::new(pool))
}

async fn run_script(repo: &Arc<SqliteCourseRepository>, script: &str) -> String {
    let mut console = Console::new(BufReader::new(script.as_bytes()), Vec::new(), repo.clone());
    console.run().await.expect("Console run failed");
    String::from_utf8(console.into_output()).expect("Console output is not UTF-8")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn seed(
    repo: &SqliteCourseRepository,
    name: &str,
    begin: NaiveDate,
    end: NaiveDate,
) -> Course {
    let course =
        Course::new(name, "Seeded course", 3, begin, end, CourseType::BF).expect("valid course");
    repo.insert(&course)
        .await
        .expect("Failed to insert course")
        .expect("Inserted course missing")
}

#[tokio::test]
async fn test_add_course_through_menu() {
    let repo = setup_repo().await;

    let script = "1\nIntro\nBasics of X\n4\n2024-01-01\n2024-06-01\nOE\nx\n";
    let output = run_script(&repo, script).await;

    assert!(output.contains(
        "Course created: #1 Intro | Basics of X | 4h | 2024-01-01 .. 2024-06-01 | OE"
    ));
    assert!(output.trim_end().ends_with("Goodbye!"));
    let courses = repo.get_all().await.expect("Failed to fetch courses");
    assert_eq!(courses.len(), 1);
    assert!(courses[0].id().unwrap() > 0);
}

#[tokio::test]
async fn test_add_course_with_ten_hours_is_rejected() {
    let repo = setup_repo().await;

    let script = "1\nIntro\nBasics of X\n10\n2024-01-01\n2024-06-01\nOE\nx\n";
    let output = run_script(&repo, script).await;

    assert!(output.contains("Adding a course failed. Invalid value: hours"));
    assert!(repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_course_with_unknown_type_is_rejected() {
    let repo = setup_repo().await;

    let script = "1\nIntro\nBasics of X\n4\n2024-01-01\n2024-06-01\nQQ\nx\n";
    let output = run_script(&repo, script).await;

    assert!(output.contains("Invalid value: course_type"));
    assert!(repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_errors_do_not_end_the_session() {
    let repo = setup_repo().await;

    let output = run_script(&repo, "3\nabc\n9\n2\nx\n").await;

    assert!(output.contains(
        "Showing course details failed. Invalid argument: 'abc' is not a valid course id"
    ));
    assert!(output.contains("Invalid input, please try again."));
    assert!(output.contains("Course list is empty."));
}

#[tokio::test]
async fn test_database_errors_are_reported_and_session_continues() {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    let repo = Arc::new(SqliteCourseRepository::new(pool.clone()));
    pool.close().await;

    let output = run_script(&repo, "2\n2\nx\n").await;

    assert_eq!(output.matches("Listing courses failed. Database error:").count(), 2);
    assert!(output.trim_end().ends_with("Goodbye!"));
}

#[tokio::test]
async fn test_update_keeps_blank_fields() {
    let repo = setup_repo().await;
    let stored = seed(&repo, "Welding", date(2024, 1, 1), date(2024, 6, 1)).await;
    let id = stored.id().unwrap();

    let script = format!("4\n{}\n\nNew description\n\n\n2024-07-01\nFS\nx\n", id);
    let output = run_script(&repo, &script).await;

    assert!(output.contains("Course updated:"));
    let updated = repo.get_by_id(id).await.unwrap().expect("Course not found");
    assert_eq!(updated.name(), "Welding");
    assert_eq!(updated.description(), "New description");
    assert_eq!(updated.hours(), 3);
    assert_eq!(updated.begin_date(), date(2024, 1, 1));
    assert_eq!(updated.end_date(), date(2024, 7, 1));
    assert_eq!(updated.course_type(), CourseType::FS);
}

#[tokio::test]
async fn test_update_unknown_course() {
    let repo = setup_repo().await;

    let output = run_script(&repo, "4\n5\nx\n").await;

    assert!(output.contains("Course with id 5 not found."));
    assert!(repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_course() {
    let repo = setup_repo().await;
    let stored = seed(&repo, "Welding", date(2024, 1, 1), date(2024, 6, 1)).await;
    let id = stored.id().unwrap();

    let script = format!("5\n{id}\n5\n{id}\nx\n");
    let output = run_script(&repo, &script).await;

    assert!(output.contains(&format!("Course with id {} deleted.", id)));
    assert!(output.contains(&format!("No course with id {} found.", id)));
    assert!(repo.get_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_and_running_courses() {
    let repo = setup_repo().await;
    seed(&repo, "Ancient history", date(2000, 1, 1), date(2000, 6, 1)).await;
    seed(&repo, "Future studies", date(2000, 1, 1), date(2999, 12, 31)).await;

    let output = run_script(&repo, "6\nHISTORY\n7\nx\n").await;

    let search_part = &output[..output.find("Currently running courses:").expect("running header")];
    assert!(search_part.contains("Ancient history"));
    assert!(!search_part.contains("Future studies"));

    let running_part = &output[output.find("Currently running courses:").unwrap()..];
    assert!(running_part.contains("Future studies"));
    assert!(!running_part.contains("Ancient history"));
}

#[tokio::test]
async fn test_end_of_input_exits() {
    let repo = setup_repo().await;

    let output = run_script(&repo, "2\n1\nIntro\n").await;

    assert!(output.contains("Course list is empty."));
    assert!(output.trim_end().ends_with("Goodbye!"));
    assert!(repo.get_all().await.unwrap().is_empty());
}
