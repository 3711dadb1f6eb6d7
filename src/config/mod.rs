pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{CohortId, CourseId, DisplayContext, PageKind};
#[cfg(feature = "cli")]
use clap::Parser;

pub use toml_config::{OutputFormat, TomlConfig};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "training-architecture")]
#[command(about = "Renders the training architecture block of a user")]
pub struct CliConfig {
    /// Path to the TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the CSV exports, overrides store.data_dir
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Cohorts of the user
    #[arg(long, value_delimiter = ',')]
    pub cohorts: Vec<CohortId>,

    /// Courses the user is enrolled in
    #[arg(long, value_delimiter = ',')]
    pub courses: Vec<CourseId>,

    /// Page the block is shown on
    #[arg(long, value_enum, default_value = "user")]
    pub page: PageKind,

    /// Course being viewed, for course pages
    #[arg(long)]
    pub course_id: Option<CourseId>,

    /// Editing mode or site administrator
    #[arg(long)]
    pub editing: bool,

    /// Output format, overrides output.format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn display_context(&self) -> DisplayContext {
        DisplayContext::for_page(self.page)
    }
}
