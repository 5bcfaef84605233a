use simple_ci_runner::cleanup::run_teardown;
use simple_ci_runner::context::RunContext;
use simple_ci_runner::lock::RunLock;
use simple_ci_runner::notify::{self, WebhookNotifier};
use simple_ci_runner::pipeline::{ChildEnv, RunRecord, RunStatus, run_pipeline};
use simple_ci_runner::utils::humanize_duration;
use simple_ci_runner::{PIPELINE_ID, RunnerConfig, logging};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "runner.toml";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path =
        std::env::var("CI_RUNNER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match RunnerConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Guard must outlive the run or buffered file logs are dropped
    let _log_guard = match logging::init(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Using config at {:?}", config_path);

    let code = run(&config).await;
    std::process::exit(code);
}

/// Executes one pipeline run end to end and returns the process exit code.
/// The run lock is released when this function returns, before the process
/// exits.
async fn run(config: &RunnerConfig) -> i32 {
    let stages = match config.stages() {
        Ok(stages) => stages,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    // At most one run of this pipeline definition at a time
    let _lock = match RunLock::acquire(&config.lock_dir, PIPELINE_ID) {
        Ok(lock) => lock,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let ctx = RunContext::from_env();
    info!(
        "Starting build {} for '{}' branch '{}'",
        ctx.build_id, ctx.repo_name, ctx.git_branch
    );

    let child_env = ChildEnv::from_config(config);
    let mut record = RunRecord::new(ctx.build_id.clone());
    run_pipeline(&stages, &child_env, &mut record).await;

    match record.status {
        RunStatus::Success => info!("Build {} completed successfully", ctx.build_id),
        _ => error!("Build {} failed", ctx.build_id),
    }

    // Post block: notification first, success-only teardown second
    let duration = humanize_duration(record.elapsed());
    let notification = notify::compose(&ctx, &record.status, &duration);

    match config.resolve_webhook_url() {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(notifier) => {
                if let Err(e) = notifier.send(&notification).await {
                    error!("{}", e);
                }
            }
            Err(e) => error!("{}", e),
        },
        None => info!(
            "No webhook URL configured; notification:\n{}",
            notification.text
        ),
    }

    if record.status == RunStatus::Success {
        if let Err(e) = run_teardown(&config.compose_file, &ctx.build_id, &child_env).await {
            error!("{}", e);
        }
        0
    } else {
        1
    }
}
