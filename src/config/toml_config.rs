use crate::domain::model::{CourseId, DisplayContext, Labels, RenderContext};
use crate::utils::error::{ArchitectureError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub block: BlockConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockConfig {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub wwwroot: String,
    pub default_course_image: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            wwwroot: "http://localhost".to_string(),
            default_course_image: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelsConfig {
    pub semester: Option<String>,
    pub training: Option<String>,
    pub no_courses: Option<String>,
    pub no_training_courses: Option<String>,
    pub outside_architecture: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub pretty: Option<bool>,
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ArchitectureError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOODLE_WWWROOT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ArchitectureError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("site.wwwroot", &self.site.wwwroot)?;

        if let Some(image) = &self.site.default_course_image {
            validation::validate_url("site.default_course_image", image)?;
        }

        if let Some(title) = &self.block.title {
            validation::validate_non_empty_string("block.title", title)?;
        }

        if let Some(data_dir) = &self.store.data_dir {
            validation::validate_path("store.data_dir", data_dir)?;
        }

        if let Some(log_format) = &self.output.log_format {
            validation::validate_one_of("output.log_format", log_format, &["compact", "json"])?;
        }

        Ok(())
    }

    pub fn title(&self) -> Option<&str> {
        self.block.title.as_deref()
    }

    pub fn data_dir(&self) -> Result<&str> {
        validation::validate_required_field("store.data_dir", &self.store.data_dir).map(String::as_str)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output.format.unwrap_or_default()
    }

    pub fn pretty_json(&self) -> bool {
        self.output.pretty.unwrap_or(true)
    }

    pub fn json_logs(&self) -> bool {
        self.output.log_format.as_deref() == Some("json")
    }

    /// 未設定的標籤使用預設值
    pub fn labels(&self) -> Labels {
        let defaults = Labels::default();
        let labels = &self.labels;
        Labels {
            semester: labels.semester.clone().unwrap_or(defaults.semester),
            training: labels.training.clone().unwrap_or(defaults.training),
            no_courses: labels.no_courses.clone().unwrap_or(defaults.no_courses),
            no_training_courses: labels
                .no_training_courses
                .clone()
                .unwrap_or(defaults.no_training_courses),
            outside_architecture: labels
                .outside_architecture
                .clone()
                .unwrap_or(defaults.outside_architecture),
        }
    }

    pub fn render_context(
        &self,
        display: DisplayContext,
        current_course_id: Option<CourseId>,
    ) -> RenderContext {
        let mut ctx = RenderContext::new(display, &self.site.wwwroot)
            .with_current_course(current_course_id);
        if let Some(image) = &self.site.default_course_image {
            ctx.default_course_image = image.clone();
        }
        ctx.labels = self.labels();
        ctx
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
