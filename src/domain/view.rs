// Structures handed to the presenter. Markup strings inside them come from
// `Presenter::course_list`, never from the resolvers.

use crate::domain::model::{CourseId, DisplayContext, LuId, TrainingId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEntry {
    pub id: CourseId,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub summary: String,
    pub is_current: bool,
}

/// One resolved LU of a training tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub lu_id: LuId,
    pub name: String,
    pub description: Option<String>,
    pub depth: usize,
    pub margin_left: u32,
    pub margin_left_courses: u32,
    pub courses: Vec<CourseEntry>,
    #[serde(skip)]
    pub courses_markup: String,
    pub children: Vec<TreeNode>,
    /// Summary leaf: courses only, rendered collapsed.
    pub no_header: bool,
    pub open: bool,
    pub is_course_context: bool,
}

impl TreeNode {
    pub fn course_ids(&self) -> Vec<CourseId> {
        self.courses.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub css_class: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathVariant {
    pub id: String,
    pub steps: Vec<PathStep>,
}

impl PathVariant {
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LuCourses {
    pub lu_id: LuId,
    pub courses: Vec<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockLus {
    pub block_id: LuId,
    pub lus: Vec<LuCourses>,
}

/// Semester bucket content before naming and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "granularity", content = "levels", rename_all = "snake_case")]
pub enum LevelMap {
    OneLevel(Vec<LuCourses>),
    TwoLevel(Vec<BlockLus>),
}

impl LevelMap {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::OneLevel(lus) => lus.is_empty(),
            Self::TwoLevel(blocks) => blocks.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterLevel {
    pub lu_id: LuId,
    pub name: String,
    pub description: Option<String>,
    pub margin_left: u32,
    pub is_first_level: bool,
    pub courses: Vec<CourseEntry>,
    #[serde(skip)]
    pub courses_markup: String,
    pub children: Vec<SemesterLevel>,
    pub open: bool,
    pub is_course_context: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterSection {
    pub semester: u32,
    pub levels: Vec<SemesterLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSection {
    pub training_id: TrainingId,
    pub cohort_name: String,
    pub title: String,
    pub description: Option<String>,
    pub is_semester: bool,
    pub has_architecture: bool,
    pub paths: Vec<PathVariant>,
    pub semesters: Vec<SemesterSection>,
    pub trees: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingOutcome {
    Rendered(TrainingSection),
    Failed {
        training_id: TrainingId,
        cohort_name: String,
        message: String,
    },
}

impl TrainingOutcome {
    pub fn training_id(&self) -> TrainingId {
        match self {
            Self::Rendered(section) => section.training_id,
            Self::Failed { training_id, .. } => *training_id,
        }
    }

    pub fn section(&self) -> Option<&TrainingSection> {
        match self {
            Self::Rendered(section) => Some(section),
            Self::Failed { .. } => None,
        }
    }
}

/// Everything the block shows for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitecturePage {
    pub title: String,
    pub display: DisplayContext,
    pub notice: Option<String>,
    pub outside_courses: Vec<CourseEntry>,
    #[serde(skip)]
    pub outside_courses_markup: String,
    pub outside_course_path: Option<String>,
    pub trainings: Vec<TrainingOutcome>,
    pub footer_url: Option<String>,
}
