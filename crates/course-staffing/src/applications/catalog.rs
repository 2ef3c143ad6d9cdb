use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::CourseId;

/// Course details shown next to an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub id: CourseId,
    pub name: String,
    pub description: Option<String>,
}

/// Read-only view of the courses applicants can apply to.
pub trait CourseCatalog: Send + Sync {
    fn find(&self, id: &CourseId) -> Result<Option<CourseSummary>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read course catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid course catalog data: {0}")]
    Csv(#[from] csv::Error),
    #[error("course {0} is listed more than once")]
    DuplicateCourse(String),
    #[error("course catalog unavailable: {0}")]
    Unavailable(String),
}

/// Catalog loaded once from a `course_id,coursename,description` CSV export.
#[derive(Debug, Clone, Default)]
pub struct StaticCourseCatalog {
    courses: HashMap<CourseId, CourseSummary>,
}

impl StaticCourseCatalog {
    pub fn new(courses: impl IntoIterator<Item = CourseSummary>) -> Self {
        Self {
            courses: courses
                .into_iter()
                .map(|course| (course.id.clone(), course))
                .collect(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut courses = HashMap::new();

        for row in csv_reader.deserialize::<CourseRow>() {
            let row = row?;
            let id = CourseId(row.course_id);
            if courses.contains_key(&id) {
                return Err(CatalogError::DuplicateCourse(id.0));
            }
            courses.insert(
                id.clone(),
                CourseSummary {
                    id,
                    name: row.coursename,
                    description: row.description,
                },
            );
        }

        Ok(Self { courses })
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl CourseCatalog for StaticCourseCatalog {
    fn find(&self, id: &CourseId) -> Result<Option<CourseSummary>, CatalogError> {
        Ok(self.courses.get(id).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct CourseRow {
    course_id: String,
    coursename: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
