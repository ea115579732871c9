use clap::Parser;
use frete::config::{load_product, load_variation};
use frete::utils::{logger, validation::Validate};
use frete::{responses_to_legacy_json, CliConfig, ShippingCalculator, ShippingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting frete CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證參數與設定檔
    let setup = cli.validate().and_then(|_| {
        let config = ShippingConfig::from_file(&cli.config)?;
        config.validate()?;
        let product = load_product(&cli.product)?;
        let variation = cli.variation.as_ref().map(load_variation).transpose()?;
        Ok((config, product, variation))
    });

    let (config, product, variation) = match setup {
        Ok(setup) => setup,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let context = config.quote_context()?;
    tracing::info!(
        "📦 Loaded {} zones and {} methods from {}",
        context.zones.zones().len(),
        config.methods.len(),
        cli.config
    );

    let result = match ShippingCalculator::new(context, product, &cli.postcode, cli.quantity.as_str(), variation) {
        Ok(calculator) => calculator.process_request().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(responses) => {
            println!("{}", serde_json::to_string_pretty(&responses_to_legacy_json(&responses))?);
        }
        Err(e) => {
            tracing::error!("❌ Quote failed: {} (reason: {})", e, e.reason.as_str());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
