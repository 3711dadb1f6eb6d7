use crate::core::courses::course_entries;
use crate::core::hierarchy::HierarchyResolver;
use crate::core::membership::AdjacencyCache;
use crate::core::path::build_path;
use crate::core::semester::SemesterResolver;
use crate::domain::model::{Cohort, CohortId, CourseId, RenderContext, Training, TrainingId};
use crate::domain::ports::{LinkStore, Presenter};
use crate::domain::view::{ArchitecturePage, TrainingOutcome, TrainingSection};
use crate::utils::error::{ArchitectureError, Result};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_TITLE: &str = "Training architecture";

/// Who the block is rendered for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRequest {
    pub cohort_ids: Vec<CohortId>,
    pub enrolled_course_ids: Vec<CourseId>,
    /// Editing mode or site administrator.
    pub is_editing: bool,
}

/// Per-training state computed before sections are built.
struct TrainingState {
    has_architecture: bool,
    failure: Option<String>,
}

fn unique<T: Copy + Eq + std::hash::Hash>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

/// Assembles the whole block for one request.
pub struct ArchitectureBuilder<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    presenter: &'a P,
    ctx: &'a RenderContext,
    title: String,
}

impl<'a, S, P> ArchitectureBuilder<'a, S, P>
where
    S: LinkStore + ?Sized,
    P: Presenter + ?Sized,
{
    pub fn new(store: &'a S, presenter: &'a P, ctx: &'a RenderContext) -> Self {
        Self {
            store,
            presenter,
            ctx,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: Option<&str>) -> Self {
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            self.title = title.to_string();
        }
        self
    }

    /// Store failures outside a training abort the page; failures inside one
    /// training only mark that training as failed.
    pub fn build_page(&self, request: &UserRequest) -> Result<ArchitecturePage> {
        let mut page = ArchitecturePage {
            title: self.title.clone(),
            display: self.ctx.display,
            notice: None,
            outside_courses: Vec::new(),
            outside_courses_markup: String::new(),
            outside_course_path: None,
            trainings: Vec::new(),
            footer_url: None,
        };

        if request.is_editing && request.enrolled_course_ids.is_empty() {
            page.notice = Some(self.ctx.labels.no_courses.clone());
            return Ok(page);
        }

        let cohort_ids = unique(request.cohort_ids.iter().copied());
        let cohorts: HashMap<CohortId, Cohort> = self
            .store
            .cohorts(&cohort_ids)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let assignments = self.store.cohort_trainings(&cohort_ids)?;
        let training_ids = unique(assignments.iter().map(|a| a.training_id));
        let trainings: HashMap<TrainingId, Training> = self
            .store
            .trainings(&training_ids)?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        tracing::debug!(
            "{} cohorts, {} trainings for this request",
            cohorts.len(),
            trainings.len()
        );

        let outside = unique(self.store.courses_not_in_architecture(&training_ids)?);

        let mut cache = AdjacencyCache::new();
        let mut in_architecture: HashSet<CourseId> = HashSet::new();
        let mut states: HashMap<TrainingId, TrainingState> = HashMap::new();
        for id in &training_ids {
            let Some(training) = trainings.get(id) else {
                continue;
            };
            let state = match self.collect_membership(&mut cache, training) {
                Ok((has_architecture, courses)) => {
                    in_architecture.extend(courses);
                    TrainingState {
                        has_architecture,
                        failure: None,
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Training {} membership failed: {}", training.id, e);
                    TrainingState {
                        has_architecture: false,
                        failure: Some(e.user_friendly_message()),
                    }
                }
            };
            states.insert(training.id, state);
        }

        if !request.enrolled_course_ids.is_empty() && !outside.is_empty() {
            page.outside_courses = course_entries(self.store, self.ctx, &outside)?;
            page.outside_courses_markup =
                self.presenter.course_list(&page.outside_courses, self.ctx);
        }

        if let Some(current) = self.current_course() {
            if outside.contains(&current) {
                page.outside_course_path = Some(
                    self.store
                        .course_metadata(&[current])?
                        .remove(&current)
                        .map(|c| c.shortname)
                        .unwrap_or_default(),
                );
            }
        }

        for cohort_id in &cohort_ids {
            let Some(cohort) = cohorts.get(cohort_id) else {
                continue;
            };
            for assignment in assignments.iter().filter(|a| a.cohort_id == *cohort_id) {
                let Some(training) = trainings.get(&assignment.training_id) else {
                    let e = ArchitectureError::UnknownTraining {
                        training_id: assignment.training_id,
                    };
                    tracing::warn!("Cohort {}: {}", cohort.id, e);
                    page.trainings.push(TrainingOutcome::Failed {
                        training_id: assignment.training_id,
                        cohort_name: cohort.name.clone(),
                        message: e.user_friendly_message(),
                    });
                    continue;
                };
                let Some(state) = states.get(&training.id) else {
                    continue;
                };
                page.trainings
                    .push(self.training_outcome(training, cohort, state, &in_architecture));
            }
        }

        page.footer_url = Some(self.ctx.course_index_url());
        Ok(page)
    }

    fn current_course(&self) -> Option<CourseId> {
        self.ctx
            .current_course_id
            .filter(|_| self.ctx.display.is_course())
    }

    fn collect_membership(
        &self,
        cache: &mut AdjacencyCache,
        training: &Training,
    ) -> Result<(bool, Vec<CourseId>)> {
        let has_architecture = cache.has_course_links(self.store, training.id)?;
        let mut courses = Vec::new();
        for root in self.store.root_lus(training.id, training.granularity)? {
            courses.extend(cache.courses_reachable_from(self.store, training.id, root)?);
        }
        Ok((has_architecture, courses))
    }

    fn training_outcome(
        &self,
        training: &Training,
        cohort: &Cohort,
        state: &TrainingState,
        in_architecture: &HashSet<CourseId>,
    ) -> TrainingOutcome {
        let result = match &state.failure {
            Some(message) => Err(message.clone()),
            None => self
                .training_section(training, cohort, state, in_architecture)
                .map_err(|e| {
                    tracing::error!(
                        "❌ Training {} failed to render: {} (Category: {:?}, Severity: {:?})",
                        training.id,
                        e,
                        e.category(),
                        e.severity()
                    );
                    e.user_friendly_message()
                }),
        };

        match result {
            Ok(section) => TrainingOutcome::Rendered(section),
            Err(message) => TrainingOutcome::Failed {
                training_id: training.id,
                cohort_name: cohort.name.clone(),
                message,
            },
        }
    }

    fn training_section(
        &self,
        training: &Training,
        cohort: &Cohort,
        state: &TrainingState,
        in_architecture: &HashSet<CourseId>,
    ) -> Result<TrainingSection> {
        let mut paths = Vec::new();
        if let Some(current) = self.current_course() {
            if in_architecture.contains(&current)
                && !self.store.parent_links(training.id, current, true)?.is_empty()
            {
                paths = build_path(self.store, self.ctx, training, current)?;
            }
        }

        let mut semesters = Vec::new();
        let mut trees = Vec::new();
        if state.has_architecture {
            if training.is_semester {
                semesters = SemesterResolver::new(self.store, self.presenter, self.ctx)
                    .resolve_training(training)?;
            }
            trees = HierarchyResolver::new(self.store, self.presenter, self.ctx)
                .resolve_training(training)?;
        }

        Ok(TrainingSection {
            training_id: training.id,
            cohort_name: cohort.name.clone(),
            title: training.display_name(self.ctx.display).to_string(),
            description: training
                .description
                .clone()
                .filter(|_| !self.ctx.display.is_course()),
            is_semester: training.is_semester,
            has_architecture: state.has_architecture,
            paths,
            semesters,
            trees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::presenter::TextPresenter;
    use crate::adapters::snapshot::{Snapshot, SnapshotStore};
    use crate::domain::model::DisplayContext;

    fn store() -> SnapshotStore {
        SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 1, false)
                .training(2, "Empty", 1, false)
                .lu(10, "L1")
                .course(100, "C1")
                .course(500, "FREE")
                .course_link(1, 10, 100)
                .cohort(7, "Promo 2024", &[1, 2])
                .outside_course(1, 500)
                .outside_course(2, 500),
        )
    }

    fn request() -> UserRequest {
        UserRequest {
            cohort_ids: vec![7],
            enrolled_course_ids: vec![100],
            is_editing: false,
        }
    }

    #[test]
    fn test_editing_without_courses_only_shows_notice() {
        let store = store();
        let presenter = TextPresenter::default();
        let ctx = RenderContext::new(DisplayContext::Dashboard, "https://lms.example.com");

        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .build_page(&UserRequest {
                cohort_ids: vec![7],
                enrolled_course_ids: vec![],
                is_editing: true,
            })
            .unwrap();

        assert_eq!(page.notice.as_deref(), Some(ctx.labels.no_courses.as_str()));
        assert!(page.trainings.is_empty());
        assert!(page.footer_url.is_none());
    }

    #[test]
    fn test_sections_per_cohort_training() {
        let store = store();
        let presenter = TextPresenter::default();
        let ctx = RenderContext::new(DisplayContext::Dashboard, "https://lms.example.com");

        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .with_title(Some("My trainings"))
            .build_page(&request())
            .unwrap();

        assert_eq!(page.title, "My trainings");
        assert_eq!(page.trainings.len(), 2);
        let first = page.trainings[0].section().unwrap();
        assert!(first.has_architecture);
        assert_eq!(first.trees.len(), 1);
        assert_eq!(first.cohort_name, "Promo 2024");
        let second = page.trainings[1].section().unwrap();
        assert!(!second.has_architecture);
        assert!(second.trees.is_empty());
        // deduplicated across trainings
        assert_eq!(page.outside_courses.len(), 1);
        assert_eq!(
            page.footer_url.as_deref(),
            Some("https://lms.example.com/course/index.php")
        );
    }

    #[test]
    fn test_course_context_path_and_outside_notice() {
        let store = store();
        let presenter = TextPresenter::default();

        let ctx = RenderContext::new(DisplayContext::Course, "https://lms.example.com")
            .with_current_course(Some(100));
        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .build_page(&request())
            .unwrap();
        let section = page.trainings[0].section().unwrap();
        assert_eq!(section.paths.len(), 1);
        assert_eq!(section.paths[0].names(), vec!["L1", "C1"]);
        assert!(page.outside_course_path.is_none());

        let ctx = RenderContext::new(DisplayContext::Course, "https://lms.example.com")
            .with_current_course(Some(500));
        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .build_page(&request())
            .unwrap();
        assert_eq!(page.outside_course_path.as_deref(), Some("FREE"));
        assert!(page.trainings[0].section().unwrap().paths.is_empty());
    }

    #[test]
    fn test_missing_training_is_reported_in_place() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 1, false)
                .lu(10, "L1")
                .course(100, "C1")
                .course_link(1, 10, 100)
                .cohort(7, "Promo 2024", &[9, 1]),
        );
        let presenter = TextPresenter::default();
        let ctx = RenderContext::new(DisplayContext::Dashboard, "https://lms.example.com");

        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .build_page(&request())
            .unwrap();

        assert_eq!(page.trainings.len(), 2);
        assert!(matches!(
            page.trainings[0],
            TrainingOutcome::Failed { training_id: 9, .. }
        ));
        assert!(page.trainings[1].section().is_some());
        let ids: Vec<TrainingId> = page.trainings.iter().map(|o| o.training_id()).collect();
        assert_eq!(ids, vec![9, 1]);
    }

    #[test]
    fn test_dashboard_ignores_current_course() {
        let store = store();
        let presenter = TextPresenter::default();
        let ctx = RenderContext::new(DisplayContext::Dashboard, "https://lms.example.com")
            .with_current_course(Some(100));

        let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
            .build_page(&request())
            .unwrap();
        assert!(page.trainings[0].section().unwrap().paths.is_empty());
    }
}
