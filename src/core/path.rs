use crate::domain::model::{CourseId, Granularity, LuId, RenderContext, Training};
use crate::domain::ports::LinkStore;
use crate::domain::view::{PathStep, PathVariant};
use crate::utils::error::Result;
use std::collections::HashMap;

struct PathMatch {
    lu_id: LuId,
    block_id: Option<LuId>,
}

fn steps(names: Vec<String>) -> Vec<PathStep> {
    names
        .into_iter()
        .enumerate()
        .map(|(position, name)| PathStep {
            css_class: if position == 0 {
                String::new()
            } else {
                format!("path-{}", position)
            },
            name,
        })
        .collect()
}

/// Root-to-course breadcrumbs of `course_id` in `training`.
///
/// One plain variant per LU linking the course, each followed by a semester
/// variant when the training is semester based and the course has a semester.
/// Paths reached through several LUs are all returned.
pub fn build_path<S: LinkStore + ?Sized>(
    store: &S,
    ctx: &RenderContext,
    training: &Training,
    course_id: CourseId,
) -> Result<Vec<PathVariant>> {
    let semester = store
        .training_links(training.id)?
        .into_iter()
        .find(|link| link.course_id == course_id)
        .and_then(|link| link.assigned_semester());

    let mut matches = Vec::new();
    for link in store.parent_links(training.id, course_id, true)? {
        // 兩層架構只往上找一次區塊
        let block_id = match training.granularity {
            Granularity::OneLevel => None,
            Granularity::TwoLevel => store
                .parent_links(training.id, link.parent_lu_id, false)?
                .first()
                .map(|parent| parent.parent_lu_id),
        };
        matches.push(PathMatch {
            lu_id: link.parent_lu_id,
            block_id,
        });
    }

    if matches.is_empty() {
        tracing::debug!(
            "Course {} is not linked in training {}, no path",
            course_id,
            training.id
        );
        return Ok(Vec::new());
    }

    let mut lu_ids: Vec<LuId> = matches
        .iter()
        .flat_map(|m| std::iter::once(m.lu_id).chain(m.block_id))
        .collect();
    lu_ids.sort_unstable();
    lu_ids.dedup();
    let lu_names: HashMap<LuId, String> = store
        .lu_metadata(&lu_ids)?
        .into_iter()
        .map(|(id, lu)| (id, lu.shortname))
        .collect();
    let course_name = store
        .course_metadata(&[course_id])?
        .remove(&course_id)
        .map(|c| c.shortname)
        .unwrap_or_default();

    let name_of = |id: Option<LuId>| {
        id.and_then(|id| lu_names.get(&id).cloned())
            .unwrap_or_default()
    };
    let semester = semester.filter(|_| training.is_semester);

    let mut variants = Vec::new();
    for m in &matches {
        let mut names = Vec::with_capacity(4);
        if training.granularity == Granularity::TwoLevel {
            names.push(name_of(m.block_id));
        }
        names.push(name_of(Some(m.lu_id)));
        names.push(course_name.clone());

        match semester {
            Some(semester) => {
                variants.push(PathVariant {
                    id: format!("path-training-{}", training.id),
                    steps: steps(names.clone()),
                });

                let mut semester_names = vec![format!("{}{}", ctx.labels.semester, semester)];
                semester_names.extend(names);
                variants.push(PathVariant {
                    id: format!("path-training-semester-{}", training.id),
                    steps: steps(semester_names),
                });
            }
            None => variants.push(PathVariant {
                id: String::new(),
                steps: steps(names),
            }),
        }
    }

    Ok(variants)
}
