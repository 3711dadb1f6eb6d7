use crate::domain::model::{
    Cohort, CohortId, CohortTraining, Course, CourseId, Granularity, LearningUnit, Link, LuId,
    RenderContext, Training, TrainingId, TrainingLink,
};
use crate::domain::view::{ArchitecturePage, CourseEntry};
use crate::utils::error::Result;
use std::collections::HashMap;

/// Read-only relational source of trainings and their links.
///
/// Calls are blocking. Lookups by id set are expected to be served in one
/// round-trip.
pub trait LinkStore {
    fn trainings(&self, ids: &[TrainingId]) -> Result<Vec<Training>>;

    fn training(&self, id: TrainingId) -> Result<Option<Training>> {
        Ok(self.trainings(&[id])?.into_iter().next())
    }

    /// Top-level LUs of a training, in store order.
    fn root_lus(&self, training_id: TrainingId, granularity: Granularity) -> Result<Vec<LuId>>;

    fn child_links(&self, training_id: TrainingId, parent_lu_id: LuId) -> Result<Vec<Link>>;

    fn has_child_links(&self, training_id: TrainingId, lu_id: LuId) -> Result<bool> {
        Ok(!self.child_links(training_id, lu_id)?.is_empty())
    }

    /// Links of `training_id` whose child is `child_id` with the given kind.
    fn parent_links(
        &self,
        training_id: TrainingId,
        child_id: i64,
        child_is_course: bool,
    ) -> Result<Vec<Link>>;

    fn sort_order(&self, training_id: TrainingId, lu_id: LuId) -> Result<Option<i64>>;

    fn all_links(&self, training_id: TrainingId) -> Result<Vec<Link>>;

    fn training_links(&self, training_id: TrainingId) -> Result<Vec<TrainingLink>>;

    fn lu_metadata(&self, ids: &[LuId]) -> Result<HashMap<LuId, LearningUnit>>;

    fn course_metadata(&self, ids: &[CourseId]) -> Result<HashMap<CourseId, Course>>;

    fn cohorts(&self, ids: &[CohortId]) -> Result<Vec<Cohort>>;

    fn cohort_trainings(&self, cohort_ids: &[CohortId]) -> Result<Vec<CohortTraining>>;

    fn courses_not_in_architecture(&self, training_ids: &[TrainingId]) -> Result<Vec<CourseId>>;
}

/// Markup sink. Owns every byte of output formatting.
pub trait Presenter {
    fn course_list(&self, courses: &[CourseEntry], ctx: &RenderContext) -> String;

    fn render_page(&self, page: &ArchitecturePage) -> Result<String>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}
