use clap::Parser;
use staff_finder::utils::error::ErrorSeverity;
use staff_finder::utils::{logger, validation::Validate};
use staff_finder::{CliConfig, EtlEngine, LocalStorage, RowProcessor, StaffDirectoryPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 只補上尚未設定的環境變數
    dotenvy::dotenv().ok();

    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting staff-finder");

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let processor = RowProcessor::new(settings.searcher(), settings.llm_client());
    let pipeline = StaffDirectoryPipeline::new(LocalStorage::default(), settings, processor);
    let engine = EtlEngine::new_with_monitoring(pipeline, cli.monitor);

    match engine.run().await {
        Ok(output_path) => {
            println!(
                "Completed processing and saved the results in {}.",
                output_path
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Run aborted: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
