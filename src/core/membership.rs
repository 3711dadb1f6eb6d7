use crate::domain::model::{CourseId, Link, LuId, TrainingId};
use crate::domain::ports::LinkStore;
use crate::utils::error::{ArchitectureError, Result};
use std::collections::{HashMap, HashSet};

type Adjacency = HashMap<LuId, Vec<Link>>;

/// Parent to links adjacency, loaded once per training and reused by every
/// traversal of the same request. Create one per request.
#[derive(Debug, Default)]
pub struct AdjacencyCache {
    by_training: HashMap<TrainingId, Adjacency>,
}

impl AdjacencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn adjacency<S: LinkStore + ?Sized>(
        &mut self,
        store: &S,
        training_id: TrainingId,
    ) -> Result<&Adjacency> {
        if !self.by_training.contains_key(&training_id) {
            let links = store.all_links(training_id)?;
            tracing::debug!(
                "Caching {} links of training {}",
                links.len(),
                training_id
            );

            let mut adjacency: Adjacency = HashMap::new();
            for link in links {
                adjacency.entry(link.parent_lu_id).or_default().push(link);
            }
            self.by_training.insert(training_id, adjacency);
        }

        self.by_training
            .get(&training_id)
            .ok_or_else(|| ArchitectureError::store("adjacency cache lost a training"))
    }

    pub fn is_loaded(&self, training_id: TrainingId) -> bool {
        self.by_training.contains_key(&training_id)
    }

    /// Whether any LU of the training links a course.
    pub fn has_course_links<S: LinkStore + ?Sized>(
        &mut self,
        store: &S,
        training_id: TrainingId,
    ) -> Result<bool> {
        Ok(self
            .adjacency(store, training_id)?
            .values()
            .flatten()
            .any(|link| link.child_is_course))
    }

    /// Every course reachable from `root_lu_id`, depth first.
    ///
    /// LU children without links of their own are reported as leaves. The
    /// result keeps duplicates when several branches reach the same course.
    pub fn courses_reachable_from<S: LinkStore + ?Sized>(
        &mut self,
        store: &S,
        training_id: TrainingId,
        root_lu_id: LuId,
    ) -> Result<Vec<CourseId>> {
        let adjacency = self.adjacency(store, training_id)?;
        let mut courses = Vec::new();
        let mut ancestors = HashSet::new();
        collect(adjacency, training_id, root_lu_id, &mut ancestors, &mut courses)?;
        Ok(courses)
    }
}

fn collect(
    adjacency: &Adjacency,
    training_id: TrainingId,
    lu_id: LuId,
    ancestors: &mut HashSet<LuId>,
    courses: &mut Vec<CourseId>,
) -> Result<()> {
    if !ancestors.insert(lu_id) {
        return Err(ArchitectureError::CyclicHierarchy { training_id, lu_id });
    }

    for child in adjacency.get(&lu_id).into_iter().flatten() {
        let has_children = adjacency
            .get(&child.child_id)
            .is_some_and(|links| !links.is_empty());

        if has_children && !child.child_is_course {
            collect(adjacency, training_id, child.child_id, ancestors, courses)?;
        } else {
            courses.push(child.child_id);
        }
    }

    ancestors.remove(&lu_id);
    Ok(())
}
