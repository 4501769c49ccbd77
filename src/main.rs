use anyhow::Context;
use clap::Parser;
use offboard::domain::model::OneTimeCredential;
use offboard::utils::{logger, validation::Validate};
use offboard::{
    CliConfig, OffboardRequest, OffboardingReport, OffboardingWorkflow, OverallStatus,
    RestDirectory, RestMailbox,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting offboard CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證輸入
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Could not resolve service configuration: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    // 一次性憑證由外部產生，只從環境變數讀入，不走命令列參數
    let credential = match std::env::var(&cli.credential_env) {
        Ok(value) if !value.trim().is_empty() => OneTimeCredential::new(value),
        _ => {
            tracing::error!("❌ Missing one-time credential in ${}", cli.credential_env);
            eprintln!(
                "❌ Set {} to a securely generated one-time credential value",
                cli.credential_env
            );
            std::process::exit(2);
        }
    };

    // 建立兩個子系統的連線並執行流程
    let directory = RestDirectory::from_config(&config);
    let mailbox = RestMailbox::from_config(&config);
    let workflow = OffboardingWorkflow::new(directory, mailbox);

    let request = OffboardRequest {
        user: cli.user.clone(),
        forwarding_target: cli.forward_to.clone(),
        auto_reply: config.auto_reply.clone(),
        credential,
    };

    let report = workflow.run(&request).await;

    // 連線收尾在每條結束路徑上都恰好執行一次；收尾失敗只記錄，不影響結果
    let (directory, mailbox) = workflow.into_ports();
    if let Err(e) = directory.close().await {
        tracing::debug!("Directory session close failed: {}", e);
    }
    if let Err(e) = mailbox.close().await {
        tracing::debug!("Mailbox session close failed: {}", e);
    }

    println!("{}", report.render());

    if let Some(path) = &cli.report_path {
        match write_report(&report, path) {
            Ok(()) => tracing::info!("📁 Report saved to {}", path),
            Err(e) => tracing::error!("❌ {:#}", e),
        }
    }

    match report.overall {
        OverallStatus::Success => tracing::info!("✅ Offboarding completed successfully"),
        OverallStatus::Partial => {
            tracing::warn!("⚠️ Offboarding completed with skipped or degraded steps")
        }
        OverallStatus::Failed => {
            tracing::error!("❌ Offboarding aborted; see the report for the failing step")
        }
    }

    std::process::exit(report.overall.exit_code());
}

fn write_report(report: &OffboardingReport, path: &str) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    std::fs::write(path, json).with_context(|| format!("writing report to {}", path))?;
    Ok(())
}
