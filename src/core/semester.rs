use crate::core::courses::course_entries;
use crate::core::hierarchy::INDENT_STEP;
use crate::core::ordering::order_siblings;
use crate::domain::model::{CourseId, Granularity, LearningUnit, LuId, RenderContext, Training, TrainingId};
use crate::domain::ports::{LinkStore, Presenter};
use crate::domain::view::{BlockLus, LevelMap, LuCourses, SemesterLevel, SemesterSection};
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};

/// Courses of each semester, ascending by semester. Only courses linked below
/// an LU of the training are kept.
pub fn courses_by_semester<S: LinkStore + ?Sized>(
    store: &S,
    training_id: TrainingId,
) -> Result<BTreeMap<u32, Vec<CourseId>>> {
    let mut buckets: BTreeMap<u32, Vec<CourseId>> = BTreeMap::new();
    for link in store.training_links(training_id)? {
        let Some(semester) = link.assigned_semester() else {
            continue;
        };
        if store.parent_links(training_id, link.course_id, true)?.is_empty() {
            tracing::debug!(
                "Course {} has semester {} but no LU in training {}",
                link.course_id,
                semester,
                training_id
            );
            continue;
        }
        buckets.entry(semester).or_default().push(link.course_id);
    }
    Ok(buckets)
}

fn push_unique(courses: &mut Vec<CourseId>, course_id: CourseId) {
    if !courses.contains(&course_id) {
        courses.push(course_id);
    }
}

fn lu_entry(lus: &mut Vec<LuCourses>, lu_id: LuId) -> &mut LuCourses {
    let index = match lus.iter().position(|l| l.lu_id == lu_id) {
        Some(index) => index,
        None => {
            lus.push(LuCourses {
                lu_id,
                courses: Vec::new(),
            });
            lus.len() - 1
        }
    };
    &mut lus[index]
}

/// Groups the courses of one semester under their LUs, and under the LUs'
/// blocks for two-level trainings. Unordered; see `order_siblings`.
pub fn level_map<S: LinkStore + ?Sized>(
    store: &S,
    training: &Training,
    courses: &[CourseId],
) -> Result<LevelMap> {
    match training.granularity {
        Granularity::OneLevel => {
            let mut lus = Vec::new();
            for &course_id in courses {
                for link in store.parent_links(training.id, course_id, true)? {
                    push_unique(&mut lu_entry(&mut lus, link.parent_lu_id).courses, course_id);
                }
            }
            Ok(LevelMap::OneLevel(lus))
        }
        Granularity::TwoLevel => {
            let mut blocks: Vec<BlockLus> = Vec::new();
            for &course_id in courses {
                for link in store.parent_links(training.id, course_id, true)? {
                    let parents = store.parent_links(training.id, link.parent_lu_id, false)?;
                    if parents.is_empty() {
                        tracing::warn!(
                            "LU {} of training {} has no block, course {} left out of the semester view",
                            link.parent_lu_id,
                            training.id,
                            course_id
                        );
                    }

                    for parent in parents {
                        let block = match blocks.iter().position(|b| b.block_id == parent.parent_lu_id) {
                            Some(index) => &mut blocks[index],
                            None => {
                                blocks.push(BlockLus {
                                    block_id: parent.parent_lu_id,
                                    lus: Vec::new(),
                                });
                                let last = blocks.len() - 1;
                                &mut blocks[last]
                            }
                        };
                        push_unique(&mut lu_entry(&mut block.lus, link.parent_lu_id).courses, course_id);
                    }
                }
            }
            Ok(LevelMap::TwoLevel(blocks))
        }
    }
}

/// Builds the per-semester views of a semester based training.
pub struct SemesterResolver<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    presenter: &'a P,
    ctx: &'a RenderContext,
}

impl<'a, S, P> SemesterResolver<'a, S, P>
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

    pub fn resolve_training(&self, training: &Training) -> Result<Vec<SemesterSection>> {
        let mut sections = Vec::new();
        for (semester, courses) in courses_by_semester(self.store, training.id)? {
            let levels = level_map(self.store, training, &courses)?;
            let levels = order_siblings(self.store, training.id, levels)?;
            sections.push(SemesterSection {
                semester,
                levels: self.to_levels(&levels)?,
            });
        }
        Ok(sections)
    }

    /// Names and renders an ordered level map.
    pub fn to_levels(&self, levels: &LevelMap) -> Result<Vec<SemesterLevel>> {
        let ids: Vec<LuId> = match levels {
            LevelMap::OneLevel(lus) => lus.iter().map(|l| l.lu_id).collect(),
            LevelMap::TwoLevel(blocks) => blocks
                .iter()
                .flat_map(|b| std::iter::once(b.block_id).chain(b.lus.iter().map(|l| l.lu_id)))
                .collect(),
        };
        let metadata = self.store.lu_metadata(&ids)?;

        match levels {
            LevelMap::OneLevel(lus) => lus
                .iter()
                .map(|lu| self.lu_level(&metadata, lu, 0))
                .collect(),
            LevelMap::TwoLevel(blocks) => blocks
                .iter()
                .map(|block| {
                    let children = block
                        .lus
                        .iter()
                        .map(|lu| self.lu_level(&metadata, lu, 1))
                        .collect::<Result<Vec<_>>>()?;
                    self.level(&metadata, block.block_id, 0, true, &[], children)
                })
                .collect(),
        }
    }

    fn lu_level(
        &self,
        metadata: &HashMap<LuId, LearningUnit>,
        lu: &LuCourses,
        depth: u32,
    ) -> Result<SemesterLevel> {
        self.level(metadata, lu.lu_id, depth, false, &lu.courses, Vec::new())
    }

    fn level(
        &self,
        metadata: &HashMap<LuId, LearningUnit>,
        lu_id: LuId,
        depth: u32,
        is_first_level: bool,
        course_ids: &[CourseId],
        children: Vec<SemesterLevel>,
    ) -> Result<SemesterLevel> {
        let lu = metadata.get(&lu_id);
        let courses = course_entries(self.store, self.ctx, course_ids)?;
        let courses_markup = if courses.is_empty() {
            String::new()
        } else {
            self.presenter.course_list(&courses, self.ctx)
        };

        Ok(SemesterLevel {
            lu_id,
            name: lu
                .map(|lu| lu.display_name(self.ctx.display).to_string())
                .unwrap_or_default(),
            description: lu
                .and_then(|lu| lu.description.clone())
                .filter(|_| !self.ctx.display.is_course()),
            margin_left: (depth + 1) * INDENT_STEP,
            is_first_level,
            open: courses.iter().any(|c| c.is_current),
            courses,
            courses_markup,
            children,
            is_course_context: self.ctx.display.is_course(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::presenter::TextPresenter;
    use crate::adapters::snapshot::{Snapshot, SnapshotStore};
    use crate::domain::model::DisplayContext;

    fn two_level_store() -> SnapshotStore {
        SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 2, true)
                .lu(1, "B1")
                .lu(2, "B2")
                .lu(10, "L1")
                .lu(11, "L2")
                .lu(20, "L3")
                .course(100, "C1")
                .course(101, "C2")
                .course(102, "C3")
                .lu_link(1, 1, 10)
                .lu_link(1, 1, 11)
                .lu_link(1, 2, 20)
                .course_link(1, 10, 100)
                .course_link(1, 11, 101)
                .course_link(1, 20, 102)
                .sort_order(1, 1, 2)
                .sort_order(1, 2, 1)
                .sort_order(1, 10, 2)
                .sort_order(1, 11, 1)
                .semester(1, 100, 2)
                .semester(1, 101, 2)
                .semester(1, 102, 2)
                .semester(1, 999, 1),
        )
    }

    #[test]
    fn test_courses_by_semester_skips_unlinked() {
        let store = two_level_store();
        let buckets = courses_by_semester(&store, 1).unwrap();

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&2], vec![100, 101, 102]);
    }

    #[test]
    fn test_semester_zero_makes_no_bucket() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 1, true)
                .course_link(1, 10, 100)
                .course_link(1, 10, 101)
                .semester(1, 100, 0)
                .semester(1, 101, 1),
        );

        let buckets = courses_by_semester(&store, 1).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&1], vec![101]);
    }

    #[test]
    fn test_level_map_one_level() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 1, true)
                .course_link(1, 10, 100)
                .course_link(1, 11, 101)
                .course_link(1, 10, 102),
        );
        let training = store.training(1).unwrap().unwrap();

        let map = level_map(&store, &training, &[100, 101, 102]).unwrap();
        assert_eq!(
            map,
            LevelMap::OneLevel(vec![
                LuCourses {
                    lu_id: 10,
                    courses: vec![100, 102]
                },
                LuCourses {
                    lu_id: 11,
                    courses: vec![101]
                },
            ])
        );
    }

    #[test]
    fn test_level_map_two_level_groups_by_block() {
        let store = two_level_store();
        let training = store.training(1).unwrap().unwrap();

        let map = level_map(&store, &training, &[100, 101, 102]).unwrap();
        match map {
            LevelMap::TwoLevel(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert_eq!(blocks[0].block_id, 1);
                assert_eq!(blocks[0].lus.len(), 2);
                assert_eq!(blocks[1].lus[0].courses, vec![102]);
            }
            LevelMap::OneLevel(_) => panic!("expected two levels"),
        }
    }

    #[test]
    fn test_sections_are_ordered_and_named() {
        let store = two_level_store();
        let training = store.training(1).unwrap().unwrap();
        let presenter = TextPresenter::default();
        let ctx = RenderContext::new(DisplayContext::Dashboard, "https://lms.example.com");

        let sections = SemesterResolver::new(&store, &presenter, &ctx)
            .resolve_training(&training)
            .unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].semester, 2);
        let levels = &sections[0].levels;
        assert_eq!(levels[0].name, "B2");
        assert!(levels[0].is_first_level);
        assert_eq!(levels[0].margin_left, 20);
        assert!(levels[0].courses.is_empty());
        let inner: Vec<&str> = levels[1].children.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(inner, vec!["L2", "L1"]);
        assert_eq!(levels[1].children[0].margin_left, 40);
        assert_eq!(levels[1].children[0].courses[0].name, "C2");
    }

    #[test]
    fn test_orphan_lu_left_out_with_two_levels() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .training(1, "Nursing", 2, true)
                .course_link(1, 10, 100),
        );
        let training = store.training(1).unwrap().unwrap();

        let map = level_map(&store, &training, &[100]).unwrap();
        assert!(map.is_empty());
    }
}
