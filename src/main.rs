use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orapost::config::Config;
use orapost::generator::{ArticleGenerator, GeminiGenerator, MockGenerator};
use orapost::http_client::ReqwestHttpClient;
use orapost::pipeline::PostPipeline;
use orapost::providers::LocalDateProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("orapost")
        .about("Generates a blog post about an unused Oracle database error code")
        .long_about(
            "orapost asks a generative-language API for an article about a real ORA-NNNNN \
             error that has not been covered yet, writes it to a dated post file and records \
             the code in a JSON ledger",
        )
        .arg(Arg::new("config-file")
            .long("config-file")
            .help("TOML configuration file")
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("ledger")
            .long("ledger")
            .help("Path of the used-code ledger")
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("output-dir")
            .long("output-dir")
            .help("Directory posts are written to")
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("max-attempts")
            .long("max-attempts")
            .help("Maximum number of generation attempts")
            .value_name("N")
            .value_parser(value_parser!(u32)))
        .arg(Arg::new("html")
            .long("html")
            .help("Convert headings and code blocks to HTML before writing")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("show-config")
            .long("show-config")
            .help("Show the effective configuration and exit")
            .action(ArgAction::SetTrue))
        .get_matches();

    let config_file = matches.get_one::<PathBuf>("config-file").cloned();
    let mut config = Config::load(config_file.as_deref())?;

    // Command-line flags override file and environment
    if let Some(path) = matches.get_one::<PathBuf>("ledger") {
        config.ledger_path = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("output-dir") {
        config.output_dir = path.clone();
    }
    if let Some(n) = matches.get_one::<u32>("max-attempts") {
        config.max_attempts = *n;
    }
    if matches.get_flag("html") {
        config.convert_html = true;
    }

    if matches.get_flag("show-config") {
        config.show_config_info(config_file.as_deref());
        return Ok(());
    }

    config.validate()?;

    println!("🚀 Oracle error post generator starting");

    let generator: Box<dyn ArticleGenerator> = if config.is_mock_mode() {
        info!("Using mock generator (ORAPOST_USE_MOCK set)");
        Box::new(MockGenerator::new())
    } else {
        let api_key = config.require_api_key()?;
        let client = ReqwestHttpClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Box::new(GeminiGenerator::new(
            client,
            &config.api_url,
            api_key,
            &config.language,
        ))
    };

    let pipeline = PostPipeline::new(&config, generator, Box::new(LocalDateProvider))?;
    let article = pipeline.run().await?;

    println!(
        "✅ Generated post for {} after {} attempt(s): {}",
        article.code,
        article.attempts,
        article.path.display()
    );
    Ok(())
}
