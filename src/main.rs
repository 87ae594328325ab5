use clap::Parser;
use spendenbeleg::utils::logger;
use spendenbeleg::{
    resolve_converter, CliConfig, EtlEngine, LocalStorage, ReceiptError, ReceiptPipeline,
    RunSummary,
};

fn run(config: &CliConfig) -> Result<RunSummary, ReceiptError> {
    let settings = config.resolve()?;
    if config.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    let words = resolve_converter(settings.words_enabled, &settings.words_language);
    let storage = LocalStorage::new(settings.output_dir.clone());
    let monitor_enabled = settings.monitor;
    if monitor_enabled {
        tracing::info!("🔍 Phase timing and peak memory enabled");
    }

    let pipeline = ReceiptPipeline::new(storage, settings, words);
    EtlEngine::new_with_monitoring(pipeline, monitor_enabled).run()
}

fn print_summary(summary: &RunSummary) {
    if summary.written {
        println!("--- ERFOLG ---");
        println!("Datei erstellt: {}", summary.display_path());
    } else {
        println!("--- PROBELAUF ---");
        println!("Datei (nicht geschrieben): {}", summary.display_path());
    }
    println!("Empfänger:      {}", summary.recipient);
    println!("Gesamtsumme:    {}", summary.total);
}

fn main() {
    // Missing positionals make clap print the usage and exit with code 2.
    let config = CliConfig::parse();

    if config.json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting spendenbeleg");

    let exit_code = match run(&config) {
        Ok(summary) => {
            tracing::info!("✅ Receipt generated for {} rows", summary.rows);
            if config.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("❌ {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_summary(&summary);
            }
            0
        }
        Err(e) => {
            tracing::error!(
                "❌ Receipt generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            if config.json {
                let report = serde_json::json!({
                    "error": e.category(),
                    "message": e.to_string(),
                    "exit_code": e.exit_code(),
                });
                println!("{}", report);
            } else {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 Hinweis: {}", e.recovery_suggestion());
            }
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}
