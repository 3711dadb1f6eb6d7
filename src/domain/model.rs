use serde::{Deserialize, Serialize};

pub type TrainingId = i64;
pub type LuId = i64;
pub type CourseId = i64;
pub type CohortId = i64;

/// Number of LU nesting levels above courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// LU > course
    OneLevel,
    /// Block > LU > course
    TwoLevel,
}

impl Granularity {
    /// Anything other than `1` is read as two levels.
    pub fn from_level(level: i64) -> Self {
        match level {
            1 => Self::OneLevel,
            2 => Self::TwoLevel,
            other => {
                tracing::warn!(
                    "Unsupported granularity level {}, treating it as two levels",
                    other
                );
                Self::TwoLevel
            }
        }
    }

    pub fn levels(self) -> u8 {
        match self {
            Self::OneLevel => 1,
            Self::TwoLevel => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: TrainingId,
    pub fullname: String,
    pub shortname: String,
    pub description: Option<String>,
    pub granularity: Granularity,
    pub is_semester: bool,
}

impl Training {
    pub fn display_name(&self, context: DisplayContext) -> &str {
        match context {
            DisplayContext::Course => &self.shortname,
            DisplayContext::Dashboard => &self.fullname,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningUnit {
    pub id: LuId,
    pub fullname: String,
    pub shortname: String,
    pub description: Option<String>,
}

impl LearningUnit {
    pub fn display_name(&self, context: DisplayContext) -> &str {
        match context {
            DisplayContext::Course => &self.shortname,
            DisplayContext::Dashboard => &self.fullname,
        }
    }
}

/// Directed edge of a training's hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub training_id: TrainingId,
    pub parent_lu_id: LuId,
    pub child_id: i64,
    pub child_is_course: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub training_id: TrainingId,
    pub lu_id: LuId,
    pub sort_order: i64,
}

/// Semester assignment of a course within a training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingLink {
    pub training_id: TrainingId,
    pub course_id: CourseId,
    pub semester: Option<u32>,
}

impl TrainingLink {
    /// Semester `0` counts as unassigned.
    pub fn assigned_semester(&self) -> Option<u32> {
        self.semester.filter(|s| *s > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub shortname: String,
    pub summary: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortTraining {
    pub cohort_id: CohortId,
    pub training_id: TrainingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutsideCourse {
    pub training_id: TrainingId,
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayContext {
    Dashboard,
    Course,
}

/// Kind of page the block is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    System,
    User,
    Category,
    FrontPage,
    Course,
    Module,
    /// System page reached while restoring a backup.
    Restore,
}

impl DisplayContext {
    pub fn for_page(page: PageKind) -> Self {
        match page {
            PageKind::System | PageKind::User | PageKind::Category | PageKind::FrontPage => {
                Self::Dashboard
            }
            PageKind::Course | PageKind::Module | PageKind::Restore => Self::Course,
        }
    }

    pub fn is_course(self) -> bool {
        self == Self::Course
    }
}

/// Fixed strings shown around the resolved structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub semester: String,
    pub training: String,
    pub no_courses: String,
    pub no_training_courses: String,
    pub outside_architecture: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            semester: "Semester ".to_string(),
            training: "Training: ".to_string(),
            no_courses: "You are not enrolled in any course".to_string(),
            no_training_courses: "No course in this training yet".to_string(),
            outside_architecture: "Courses outside the architecture".to_string(),
        }
    }
}

/// Request-scoped values threaded through every resolver call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub display: DisplayContext,
    pub current_course_id: Option<CourseId>,
    pub wwwroot: String,
    pub default_course_image: String,
    pub labels: Labels,
}

impl RenderContext {
    pub fn new(display: DisplayContext, wwwroot: impl Into<String>) -> Self {
        let wwwroot = wwwroot.into().trim_end_matches('/').to_string();
        Self {
            display,
            current_course_id: None,
            default_course_image: format!(
                "{}/blocks/training_architecture/images/no_image.jpg",
                wwwroot
            ),
            wwwroot,
            labels: Labels::default(),
        }
    }

    pub fn with_current_course(mut self, course_id: Option<CourseId>) -> Self {
        self.current_course_id = course_id;
        self
    }

    pub fn course_url(&self, course_id: CourseId) -> String {
        format!("{}/course/view.php?id={}", self.wwwroot, course_id)
    }

    pub fn course_index_url(&self) -> String {
        format!("{}/course/index.php", self.wwwroot)
    }

    /// Current course in course context only.
    pub fn is_current_course(&self, course_id: CourseId) -> bool {
        self.display.is_course() && self.current_course_id == Some(course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_from_level() {
        assert_eq!(Granularity::from_level(1), Granularity::OneLevel);
        assert_eq!(Granularity::from_level(2), Granularity::TwoLevel);
        assert_eq!(Granularity::from_level(0), Granularity::TwoLevel);
        assert_eq!(Granularity::from_level(5), Granularity::TwoLevel);
    }

    #[test]
    fn test_semester_zero_is_unassigned() {
        let link = |semester| TrainingLink {
            training_id: 1,
            course_id: 100,
            semester,
        };
        assert_eq!(link(Some(0)).assigned_semester(), None);
        assert_eq!(link(None).assigned_semester(), None);
        assert_eq!(link(Some(3)).assigned_semester(), Some(3));
    }

    #[test]
    fn test_display_context_for_page() {
        assert_eq!(DisplayContext::for_page(PageKind::User), DisplayContext::Dashboard);
        assert_eq!(DisplayContext::for_page(PageKind::FrontPage), DisplayContext::Dashboard);
        assert_eq!(DisplayContext::for_page(PageKind::Module), DisplayContext::Course);
        assert_eq!(DisplayContext::for_page(PageKind::Restore), DisplayContext::Course);
    }

    #[test]
    fn test_render_context_urls() {
        let ctx = RenderContext::new(DisplayContext::Course, "https://lms.example.com/")
            .with_current_course(Some(12));
        assert_eq!(ctx.course_url(12), "https://lms.example.com/course/view.php?id=12");
        assert_eq!(ctx.course_index_url(), "https://lms.example.com/course/index.php");
        assert!(ctx.default_course_image.ends_with("/images/no_image.jpg"));
        assert!(ctx.is_current_course(12));
        assert!(!ctx.is_current_course(13));
    }
}
