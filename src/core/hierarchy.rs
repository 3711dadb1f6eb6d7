use crate::core::courses::entries_from_metadata;
use crate::core::ordering::sort_by_order;
use crate::domain::model::{
    Course, CourseId, Granularity, LearningUnit, Link, LuId, RenderContext, Training, TrainingId,
};
use crate::domain::ports::{LinkStore, Presenter};
use crate::domain::view::TreeNode;
use crate::utils::error::{ArchitectureError, Result};
use std::collections::{HashMap, HashSet};

/// Indentation per nesting level, in pixels.
pub const INDENT_STEP: u32 = 20;

/// Top-level LUs: parents never linked below another LU. With two levels only
/// parents of LU links count. First appearance order, no duplicates.
pub fn root_lus_from_links(links: &[Link], granularity: Granularity) -> Vec<LuId> {
    let nested: HashSet<LuId> = links
        .iter()
        .filter(|l| !l.child_is_course)
        .map(|l| l.child_id)
        .collect();

    let mut seen = HashSet::new();
    links
        .iter()
        .filter(|l| granularity == Granularity::OneLevel || !l.child_is_course)
        .map(|l| l.parent_lu_id)
        .filter(|lu| !nested.contains(lu) && seen.insert(*lu))
        .collect()
}

/// Indentation of a node `depth` levels deep. Saturates instead of overflowing.
pub fn indentation(depth: usize) -> u32 {
    u32::try_from(depth)
        .unwrap_or(u32::MAX)
        .saturating_mul(INDENT_STEP)
}

/// Pruned shape of a subtree, before names and course entries are attached.
struct Branch {
    lu_id: LuId,
    depth: usize,
    course_ids: Vec<CourseId>,
    children: Vec<Branch>,
}

impl Branch {
    fn collect_ids(&self, lu_ids: &mut Vec<LuId>, course_ids: &mut Vec<CourseId>) {
        lu_ids.push(self.lu_id);
        course_ids.extend(&self.course_ids);
        for child in &self.children {
            child.collect_ids(lu_ids, course_ids);
        }
    }
}

/// LU and course metadata of a set of branches, fetched in one lookup each.
struct Metadata {
    lus: HashMap<LuId, LearningUnit>,
    courses: HashMap<CourseId, Course>,
}

/// Rebuilds the LU tree of a training from its flat links.
pub struct HierarchyResolver<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    presenter: &'a P,
    ctx: &'a RenderContext,
}

impl<'a, S, P> HierarchyResolver<'a, S, P>
where
    S: LinkStore + ?Sized,
    P: Presenter + ?Sized,
{
    pub fn new(store: &'a S, presenter: &'a P, ctx: &'a RenderContext) -> Self {
        Self {
            store,
            presenter,
            ctx,
        }
    }

    /// Trees of every root LU of `training`, empty ones pruned.
    pub fn resolve_training(&self, training: &Training) -> Result<Vec<TreeNode>> {
        let roots = self.store.root_lus(training.id, training.granularity)?;
        tracing::debug!(
            "Training {} ({} levels) has {} root LUs",
            training.id,
            training.granularity.levels(),
            roots.len()
        );

        let mut branches = Vec::with_capacity(roots.len());
        for root in roots {
            let mut ancestors = HashSet::new();
            if let Some(branch) = self.branch(training.id, root, 0, &mut ancestors)? {
                branches.push(branch);
            }
        }

        let metadata = self.metadata(&branches)?;
        Ok(branches
            .into_iter()
            .map(|branch| self.node(branch, &metadata))
            .collect())
    }

    pub fn resolve(&self, training_id: TrainingId, root_lu_id: LuId) -> Result<Option<TreeNode>> {
        self.resolve_from(training_id, root_lu_id, 0)
    }

    /// Resolves `lu_id` as if it sat `depth` levels deep. `None` when the LU has
    /// neither courses nor a populated branch below it.
    pub fn resolve_from(
        &self,
        training_id: TrainingId,
        lu_id: LuId,
        depth: usize,
    ) -> Result<Option<TreeNode>> {
        let mut ancestors = HashSet::new();
        let Some(branch) = self.branch(training_id, lu_id, depth, &mut ancestors)? else {
            return Ok(None);
        };

        let metadata = self.metadata(std::slice::from_ref(&branch))?;
        Ok(Some(self.node(branch, &metadata)))
    }

    fn branch(
        &self,
        training_id: TrainingId,
        lu_id: LuId,
        depth: usize,
        ancestors: &mut HashSet<LuId>,
    ) -> Result<Option<Branch>> {
        if !ancestors.insert(lu_id) {
            tracing::error!("LU {} is linked below itself in training {}", lu_id, training_id);
            return Err(ArchitectureError::CyclicHierarchy { training_id, lu_id });
        }

        let branch = self.build_branch(training_id, lu_id, depth, ancestors);
        ancestors.remove(&lu_id);
        branch
    }

    fn build_branch(
        &self,
        training_id: TrainingId,
        lu_id: LuId,
        depth: usize,
        ancestors: &mut HashSet<LuId>,
    ) -> Result<Option<Branch>> {
        let mut links = self.store.child_links(training_id, lu_id)?;

        // 只有全部子節點都是 LU 時才依排序表排序，混合時保留原順序
        if links.iter().all(|l| !l.child_is_course) {
            links = sort_by_order(self.store, training_id, links, |l: &Link| l.child_id)?;
        }

        let mut course_ids = Vec::new();
        let mut children = Vec::new();
        for link in links {
            if link.child_is_course {
                course_ids.push(link.child_id);
            } else if self.store.has_child_links(training_id, link.child_id)? {
                if let Some(child) =
                    self.branch(training_id, link.child_id, depth.saturating_add(1), ancestors)?
                {
                    children.push(child);
                }
            } else {
                tracing::trace!("LU {} has no links yet, skipped", link.child_id);
            }
        }

        if course_ids.is_empty() && children.is_empty() {
            tracing::debug!("LU {} is empty in training {}, pruned", lu_id, training_id);
            return Ok(None);
        }

        Ok(Some(Branch {
            lu_id,
            depth,
            course_ids,
            children,
        }))
    }

    fn metadata(&self, branches: &[Branch]) -> Result<Metadata> {
        let mut lu_ids = Vec::new();
        let mut course_ids = Vec::new();
        for branch in branches {
            branch.collect_ids(&mut lu_ids, &mut course_ids);
        }
        lu_ids.sort_unstable();
        lu_ids.dedup();
        course_ids.sort_unstable();
        course_ids.dedup();

        let lus = if lu_ids.is_empty() {
            HashMap::new()
        } else {
            self.store.lu_metadata(&lu_ids)?
        };
        let courses = if course_ids.is_empty() {
            HashMap::new()
        } else {
            self.store.course_metadata(&course_ids)?
        };
        Ok(Metadata { lus, courses })
    }

    fn node(&self, branch: Branch, metadata: &Metadata) -> TreeNode {
        let lu = metadata.lus.get(&branch.lu_id);
        if lu.is_none() {
            tracing::warn!(
                "LU {} has no metadata, rendering it without a name",
                branch.lu_id
            );
        }
        let name = lu
            .map(|lu| lu.display_name(self.ctx.display).to_string())
            .unwrap_or_default();

        let courses = entries_from_metadata(self.ctx, &branch.course_ids, &metadata.courses);
        let courses_markup = if courses.is_empty() {
            String::new()
        } else {
            self.presenter.course_list(&courses, self.ctx)
        };

        let no_header = branch.children.is_empty();
        // 摘要葉節點在課程頁也顯示說明
        let description = lu
            .and_then(|lu| lu.description.clone())
            .filter(|_| no_header || !self.ctx.display.is_course());
        let open = no_header
            && self.ctx.current_course_id.is_some_and(|current| {
                self.ctx.display.is_course() && branch.course_ids.contains(&current)
            });

        let children = branch
            .children
            .into_iter()
            .map(|child| self.node(child, metadata))
            .collect();

        let margin_left = indentation(branch.depth);
        TreeNode {
            lu_id: branch.lu_id,
            name,
            description,
            depth: branch.depth,
            margin_left,
            margin_left_courses: margin_left.saturating_add(INDENT_STEP),
            courses,
            courses_markup,
            children,
            no_header,
            open,
            is_course_context: self.ctx.display.is_course(),
        }
    }
}
