use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::InvalidValue;

const MIN_TEXT_LEN: usize = 2;
const MAX_HOURS_EXCLUSIVE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseType {
    OE,
    BF,
    ZA,
    FF,
    FS,
}

impl CourseType {
    pub const ALL: [CourseType; 5] = [
        CourseType::OE,
        CourseType::BF,
        CourseType::ZA,
        CourseType::FF,
        CourseType::FS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::OE => "OE",
            CourseType::BF => "BF",
            CourseType::ZA => "ZA",
            CourseType::FF => "FF",
            CourseType::FS => "FS",
        }
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseType {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Err(InvalidValue::new("course_type", "course type must not be empty"));
        }
        CourseType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| {
                InvalidValue::new(
                    "course_type",
                    format!("unknown course type '{}' (expected one of OE, BF, ZA, FF, FS)", code),
                )
            })
    }
}

/// A course offering. Every constructor and setter validates, so a `Course`
/// value is always consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: Option<i64>,
    name: String,
    description: String,
    hours: i32,
    begin_date: NaiveDate,
    end_date: NaiveDate,
    course_type: CourseType,
}

impl Course {
    /// A course that has not been stored yet.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        hours: i32,
        begin_date: NaiveDate,
        end_date: NaiveDate,
        course_type: CourseType,
    ) -> Result<Self, InvalidValue> {
        Self::build(None, name.into(), description.into(), hours, begin_date, end_date, course_type)
    }

    /// A course as it exists in the store.
    pub fn with_id(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        hours: i32,
        begin_date: NaiveDate,
        end_date: NaiveDate,
        course_type: CourseType,
    ) -> Result<Self, InvalidValue> {
        Self::build(
            Some(id),
            name.into(),
            description.into(),
            hours,
            begin_date,
            end_date,
            course_type,
        )
    }

    fn build(
        id: Option<i64>,
        name: String,
        description: String,
        hours: i32,
        begin_date: NaiveDate,
        end_date: NaiveDate,
        course_type: CourseType,
    ) -> Result<Self, InvalidValue> {
        if let Some(id) = id {
            check_id(id)?;
        }
        check_name(&name)?;
        check_description(&description)?;
        check_hours(hours)?;
        check_begin_before_end(begin_date, end_date)?;

        Ok(Self {
            id,
            name,
            description,
            hours,
            begin_date,
            end_date,
            course_type,
        })
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hours(&self) -> i32 {
        self.hours
    }

    pub fn begin_date(&self) -> NaiveDate {
        self.begin_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn course_type(&self) -> CourseType {
        self.course_type
    }

    /// Assigns the store's id. Once set, the id can only be "set" to the same value again.
    pub fn set_id(&mut self, id: i64) -> Result<(), InvalidValue> {
        check_id(id)?;
        match self.id {
            Some(current) if current != id => Err(InvalidValue::new(
                "id",
                format!("course already has id {} and cannot be given id {}", current, id),
            )),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), InvalidValue> {
        let name = name.into();
        check_name(&name)?;
        self.name = name;
        Ok(())
    }

    // The documented rule says 10 characters, but only the name rule (> 1) is enforced.
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), InvalidValue> {
        let description = description.into();
        check_description(&description)?;
        self.description = description;
        Ok(())
    }

    pub fn set_hours(&mut self, hours: i32) -> Result<(), InvalidValue> {
        check_hours(hours)?;
        self.hours = hours;
        Ok(())
    }

    pub fn set_begin_date(&mut self, begin_date: NaiveDate) -> Result<(), InvalidValue> {
        check_begin_before_end(begin_date, self.end_date)?;
        self.begin_date = begin_date;
        Ok(())
    }

    pub fn set_end_date(&mut self, end_date: NaiveDate) -> Result<(), InvalidValue> {
        if end_date <= self.begin_date {
            return Err(InvalidValue::new(
                "end_date",
                format!("course end {} must be after course begin {}", end_date, self.begin_date),
            ));
        }
        self.end_date = end_date;
        Ok(())
    }

    pub fn set_course_type(&mut self, course_type: CourseType) {
        self.course_type = course_type;
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{}", id)?,
            None => f.write_str("#-")?,
        }
        write!(
            f,
            " {} | {} | {}h | {} .. {} | {}",
            self.name,
            self.description,
            self.hours,
            self.begin_date,
            self.end_date,
            self.course_type
        )
    }
}

fn check_id(id: i64) -> Result<(), InvalidValue> {
    if id < 0 {
        return Err(InvalidValue::new("id", format!("course id must be >= 0, got {}", id)));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), InvalidValue> {
    if name.chars().count() < MIN_TEXT_LEN {
        return Err(InvalidValue::new(
            "name",
            format!("course name must be at least {} characters long", MIN_TEXT_LEN),
        ));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), InvalidValue> {
    if description.chars().count() < MIN_TEXT_LEN {
        return Err(InvalidValue::new(
            "description",
            format!("course description must be at least {} characters long", MIN_TEXT_LEN),
        ));
    }
    Ok(())
}

fn check_hours(hours: i32) -> Result<(), InvalidValue> {
    if hours <= 0 || hours >= MAX_HOURS_EXCLUSIVE {
        return Err(InvalidValue::new(
            "hours",
            format!("course hours must be between 1 and 9, got {}", hours),
        ));
    }
    Ok(())
}

fn check_begin_before_end(begin_date: NaiveDate, end_date: NaiveDate) -> Result<(), InvalidValue> {
    if begin_date >= end_date {
        return Err(InvalidValue::new(
            "begin_date",
            format!("course begin {} must be before course end {}", begin_date, end_date),
        ));
    }
    Ok(())
}
