//! JSON shapes returned by the application routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::catalog::CourseSummary;
use super::domain::{ApplicationRecord, ApplicationStatus, OfferStatus, ResumeSummary};
use super::service::ApplicationListing;

/// Acknowledgement returned after a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedApplicationView {
    pub id: String,
    pub fname: String,
    pub lname: String,
    pub email: String,
    pub znumber: String,
    #[serde(rename = "submittedBy")]
    pub submitted_by: String,
}

impl From<&ApplicationRecord> for SubmittedApplicationView {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            id: record.id.0.clone(),
            fname: record.applicant.first_name.clone(),
            lname: record.applicant.last_name.clone(),
            email: record.applicant.email.clone(),
            znumber: record.applicant.student_number.clone(),
            submitted_by: record.submitted_by.0.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeView {
    pub id: String,
    pub fname: String,
    pub lname: String,
    pub znumber: String,
    pub status: ApplicationStatus,
}

impl From<&ApplicationRecord> for StatusChangeView {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            id: record.id.0.clone(),
            fname: record.applicant.first_name.clone(),
            lname: record.applicant.last_name.clone(),
            znumber: record.applicant.student_number.clone(),
            status: record.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferChangeView {
    pub id: String,
    pub fname: String,
    pub lname: String,
    pub znumber: String,
    pub offer: OfferStatus,
}

impl From<&ApplicationRecord> for OfferChangeView {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            id: record.id.0.clone(),
            fname: record.applicant.first_name.clone(),
            lname: record.applicant.last_name.clone(),
            znumber: record.applicant.student_number.clone(),
            offer: record.offer,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: String,
    pub coursename: String,
    pub description: Option<String>,
}

impl From<CourseSummary> for CourseView {
    fn from(course: CourseSummary) -> Self {
        Self {
            id: course.id.0,
            coursename: course.name,
            description: course.description,
        }
    }
}

/// One entry of `GET /applications`. Resume bytes are served by the download route.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationListingView {
    pub id: String,
    pub fname: String,
    pub lname: String,
    pub znumber: String,
    pub email: String,
    pub experience: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub relevant_courses: Option<String>,
    pub resume: ResumeSummary,
    pub status: ApplicationStatus,
    pub offer: OfferStatus,
    #[serde(rename = "submittedBy")]
    pub submitted_by: String,
    pub course: Option<CourseView>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationListing> for ApplicationListingView {
    fn from(listing: ApplicationListing) -> Self {
        let ApplicationListing { record, course } = listing;
        let experience = record.experience.as_ref();

        Self {
            id: record.id.0.clone(),
            fname: record.applicant.first_name.clone(),
            lname: record.applicant.last_name.clone(),
            znumber: record.applicant.student_number.clone(),
            email: record.applicant.email.clone(),
            experience: experience.is_some(),
            from: experience.map(|exp| exp.from),
            to: experience.map(|exp| exp.to),
            relevant_courses: experience.map(|exp| exp.relevant_courses.clone()),
            resume: record.resume.summary(),
            status: record.status,
            offer: record.offer,
            submitted_by: record.submitted_by.0.clone(),
            course: course.map(CourseView::from),
            submitted_at: record.submitted_at,
            updated_at: record.updated_at,
        }
    }
}
