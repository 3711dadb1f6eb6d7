use crate::domain::model::{Course, CourseId, RenderContext};
use crate::domain::ports::LinkStore;
use crate::domain::view::CourseEntry;
use crate::utils::error::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static HTML tag pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Course summary as plain text.
pub fn plain_summary(summary: &str) -> String {
    let text = HTML_TAG.replace_all(summary, " ");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Resolves course ids into display entries with one metadata lookup.
///
/// Ids unknown to the store are skipped; order and duplicates of `ids` are kept.
pub fn course_entries<S: LinkStore + ?Sized>(
    store: &S,
    ctx: &RenderContext,
    ids: &[CourseId],
) -> Result<Vec<CourseEntry>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let metadata = store.course_metadata(ids)?;
    Ok(entries_from_metadata(ctx, ids, &metadata))
}

/// Same as `course_entries` over metadata fetched beforehand.
pub fn entries_from_metadata(
    ctx: &RenderContext,
    ids: &[CourseId],
    metadata: &HashMap<CourseId, Course>,
) -> Vec<CourseEntry> {
    let mut entries = Vec::with_capacity(ids.len());
    for &id in ids {
        let Some(course) = metadata.get(&id) else {
            tracing::debug!("Course {} not found, skipped", id);
            continue;
        };

        entries.push(CourseEntry {
            id,
            name: course.shortname.clone(),
            url: ctx.course_url(id),
            image_url: course
                .image_url
                .clone()
                .unwrap_or_else(|| ctx.default_course_image.clone()),
            summary: plain_summary(&course.summary),
            is_current: ctx.is_current_course(id),
        });
    }
    entries
}
