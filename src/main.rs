use clap::Parser;
use training_architecture::domain::ports::Presenter;
use training_architecture::utils::error::{ArchitectureError, ErrorSeverity};
use training_architecture::utils::{logger, validation::Validate};
use training_architecture::{
    ArchitectureBuilder, CliConfig, JsonPresenter, LocalStorage, OutputFormat, SnapshotStore,
    TextPresenter, TomlConfig, UserRequest,
};

fn report(e: &ArchitectureError) -> i32 {
    tracing::error!(
        "❌ Rendering failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入 TOML 配置，未指定時使用預設值
    let mut config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                logger::init_cli_logger(cli.verbose);
                std::process::exit(report(&e));
            }
        },
        None => TomlConfig::default(),
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting training-architecture CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Some(data_dir) = &cli.data_dir {
        config.store.data_dir = Some(data_dir.clone());
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let data_dir = match config.data_dir() {
        Ok(dir) => dir.to_string(),
        Err(e) => std::process::exit(report(&e)),
    };

    let storage = LocalStorage::new(&data_dir);
    let store = match SnapshotStore::load(&storage).await {
        Ok(store) => store,
        Err(e) => std::process::exit(report(&e)),
    };
    tracing::info!("📁 Snapshot loaded from: {}", data_dir);

    let ctx = config.render_context(cli.display_context(), cli.course_id);
    let request = UserRequest {
        cohort_ids: cli.cohorts.clone(),
        enrolled_course_ids: cli.courses.clone(),
        is_editing: cli.editing,
    };

    let presenter: Box<dyn Presenter> = match cli.format.unwrap_or(config.output_format()) {
        OutputFormat::Text => Box::new(TextPresenter::new(ctx.labels.clone())),
        OutputFormat::Json => Box::new(JsonPresenter {
            pretty: config.pretty_json(),
        }),
    };

    let rendered = ArchitectureBuilder::new(&store, presenter.as_ref(), &ctx)
        .with_title(config.title())
        .build_page(&request)
        .and_then(|page| {
            for outcome in page.trainings.iter().filter(|o| o.section().is_none()) {
                tracing::warn!("⚠️ Training {} could not be rendered", outcome.training_id());
            }
            tracing::info!("✅ {} training sections rendered", page.trainings.len());
            presenter.render_page(&page)
        });

    match rendered {
        Ok(output) => print!("{}", output),
        Err(e) => {
            // 區塊內容留空，只回報錯誤
            let exit_code = report(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
