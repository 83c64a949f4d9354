mod application;
mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use application::runner::{RunCoordinator, RunPolicy};
use application::services::CheckInExecutor;
use cli::Cli;
use rollcall_domain::notification::NotificationSender;
use rollcall_infrastructure::config::AppConfig;
use rollcall_infrastructure::http::TurnstileSolver;
use rollcall_infrastructure::logging;
use rollcall_infrastructure::notification::FeishuWebhookSender;
use rollcall_infrastructure::state::FingerprintStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_dir = cli.log_to_file.then(logging::default_log_dir);
    if let Err(e) = logging::init_logger(&cli.log_level, log_dir) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = AppConfig::load(&cli.config)?;

    // CLI switches force the behavior on; config/env defaults otherwise
    if cli.skip_notify {
        config.skip_notify = true;
    }
    if cli.debug_screenshots {
        config.debug_screenshots = true;
    }
    if cli.always_exit_zero {
        config.always_exit_zero = true;
    }
    if cli.headful {
        config.headless = false;
    }

    if config.accounts.is_empty() {
        anyhow::bail!("No accounts configured (config file or ROLLCALL_ACCOUNTS)");
    }

    info!(
        "Loaded {} account(s), {} provider(s)",
        config.accounts.len(),
        config.providers.len()
    );

    // The solving strategy is a single startup decision, injected into the
    // bypass orchestrator
    let solver = Arc::new(
        TurnstileSolver::select(config.yescaptcha_key.as_deref(), &config.solver_url).await,
    );
    info!("Turnstile solver method: {}", solver.method().as_str());

    let screenshot_dir = config
        .debug_screenshots
        .then(|| std::path::PathBuf::from("debug_screenshots"));
    let executor = CheckInExecutor::new(solver, config.headless, screenshot_dir)?;

    let sender: Option<Arc<dyn NotificationSender>> = config
        .feishu_webhook_key
        .clone()
        .map(|key| Arc::new(FeishuWebhookSender::new(key)) as Arc<dyn NotificationSender>);

    let coordinator = RunCoordinator::new(
        executor,
        FingerprintStore::new(&cli.state_file),
        sender,
        RunPolicy {
            skip_notify: config.skip_notify,
            always_exit_zero: config.always_exit_zero,
        },
    );

    let summary = coordinator.run(&config.accounts, &config.providers).await;
    Ok(coordinator.exit_code(&summary))
}
