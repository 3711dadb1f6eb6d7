use crate::domain::model::{DisplayContext, Labels, RenderContext};
use crate::domain::ports::Presenter;
use crate::domain::view::{
    ArchitecturePage, CourseEntry, PathVariant, SemesterLevel, TrainingOutcome, TrainingSection,
    TreeNode,
};
use crate::utils::error::Result;
use std::fmt::Write;

const SEPARATOR: &str = "────────────────────────────────";

fn indent(margin: u32) -> String {
    " ".repeat((margin / 10) as usize)
}

fn push_indented(out: &mut String, prefix: &str, block: &str) {
    for line in block.lines() {
        out.push_str(prefix);
        out.push_str(line);
        out.push('\n');
    }
}

/// Plain-text outline for terminals.
#[derive(Debug, Clone, Default)]
pub struct TextPresenter {
    labels: Labels,
}

impl TextPresenter {
    pub fn new(labels: Labels) -> Self {
        Self { labels }
    }

    fn write_paths(&self, out: &mut String, paths: &[PathVariant]) {
        for path in paths {
            let marker = if path.id.contains("semester") { "⤷" } else { "→" };
            let _ = writeln!(out, "  {} {}", marker, path.names().join(" > "));
        }
    }

    fn write_tree(&self, out: &mut String, node: &TreeNode) {
        let pad = format!("  {}", indent(node.margin_left));
        if node.no_header {
            let marker = if node.open { "▾" } else { "▸" };
            let _ = writeln!(out, "{}{} {}", pad, marker, node.name);
        } else {
            let _ = writeln!(out, "{}{}", pad, node.name);
        }
        if let Some(description) = &node.description {
            let _ = writeln!(out, "{}  ({})", pad, description);
        }
        push_indented(
            out,
            &format!("  {}", indent(node.margin_left_courses)),
            &node.courses_markup,
        );
        for child in &node.children {
            self.write_tree(out, child);
        }
    }

    fn write_level(&self, out: &mut String, level: &SemesterLevel) {
        let pad = format!("  {}", indent(level.margin_left));
        let marker = if level.is_first_level { "■" } else if level.open { "▾" } else { "▸" };
        let _ = writeln!(out, "{}{} {}", pad, marker, level.name);
        if let Some(description) = &level.description {
            let _ = writeln!(out, "{}  ({})", pad, description);
        }
        push_indented(
            out,
            &format!("  {}", indent(level.margin_left + 20)),
            &level.courses_markup,
        );
        for child in &level.children {
            self.write_level(out, child);
        }
    }

    fn write_section(&self, out: &mut String, section: &TrainingSection) {
        self.write_paths(out, &section.paths);
        let _ = writeln!(
            out,
            "{}{} ({})",
            self.labels.training, section.title, section.cohort_name
        );
        if let Some(description) = &section.description {
            let _ = writeln!(out, "  {}", description);
        }

        if !section.has_architecture {
            let _ = writeln!(out, "  {}", self.labels.no_training_courses);
            return;
        }

        for semester in &section.semesters {
            let _ = writeln!(out, "  [{}{}]", self.labels.semester, semester.semester);
            for level in &semester.levels {
                self.write_level(out, level);
            }
        }
        for tree in &section.trees {
            self.write_tree(out, tree);
        }
    }
}

impl Presenter for TextPresenter {
    fn course_list(&self, courses: &[CourseEntry], ctx: &RenderContext) -> String {
        let mut out = String::new();
        for course in courses {
            match ctx.display {
                DisplayContext::Course => {
                    let current = if course.is_current { " ●" } else { "" };
                    let _ = writeln!(out, "- {}{}", course.name, current);
                }
                DisplayContext::Dashboard => {
                    let _ = writeln!(out, "- {} <{}>", course.name, course.url);
                    if !course.summary.is_empty() {
                        let _ = writeln!(out, "    {}", course.summary);
                    }
                }
            }
        }
        out
    }

    fn render_page(&self, page: &ArchitecturePage) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "{}", page.title);

        if let Some(notice) = &page.notice {
            let _ = writeln!(out, "{}", notice);
            return Ok(out);
        }

        if !page.outside_courses.is_empty() {
            if page.display == DisplayContext::Dashboard {
                let _ = writeln!(out, "{}", self.labels.outside_architecture);
            }
            push_indented(&mut out, "  ", &page.outside_courses_markup);
        }
        if let Some(course) = &page.outside_course_path {
            let _ = writeln!(out, "{}", SEPARATOR);
            let _ = writeln!(out, "  → {}", course);
        }

        for outcome in &page.trainings {
            let _ = writeln!(out, "{}", SEPARATOR);
            match outcome {
                TrainingOutcome::Rendered(section) => self.write_section(&mut out, section),
                TrainingOutcome::Failed {
                    cohort_name,
                    message,
                    ..
                } => {
                    let _ = writeln!(out, "⚠ {} ({})", message, cohort_name);
                }
            }
        }

        if let Some(url) = &page.footer_url {
            let _ = writeln!(out, "{}", SEPARATOR);
            let _ = writeln!(out, "{}", url);
        }
        Ok(out)
    }
}

/// JSON document of the page, for templates living outside this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter {
    pub pretty: bool,
}

impl Presenter for JsonPresenter {
    fn course_list(&self, courses: &[CourseEntry], _ctx: &RenderContext) -> String {
        serde_json::to_string(courses).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize {} course entries: {}", courses.len(), e);
            String::new()
        })
    }

    fn render_page(&self, page: &ArchitecturePage) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(page)?
        } else {
            serde_json::to_string(page)?
        };
        Ok(json)
    }
}
