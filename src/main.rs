use anyhow::Result;
use clap::Parser;
use papercut_reports::cli::{Cli, Commands, ProgressReporter};
use papercut_reports::config::Config;
use papercut_reports::error::ReportError;
use papercut_reports::models::SubjectPatterns;
use papercut_reports::pipeline::{self, RunOptions};
use papercut_reports::writer::AttachmentWriter;
use papercut_reports::{auth, client::ProductionGmailClient};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        eprintln!("\nFor help, run: papercut-reports --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls; multiple dependencies pull
    // in different providers, so pick one explicitly per platform
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("papercut_reports=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("papercut_reports=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");

            if let Some(parent) = cli.token_cache.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if force && cli.token_cache.exists() {
                tokio::fs::remove_file(&cli.token_cache).await?;
                tracing::info!("Removed existing token cache");
            }

            let config = Config::load_or_init(&cli.config).await?;

            // Triggers the browser consent flow when no valid token is cached
            let hub =
                auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache, &config.scopes)
                    .await?;
            auth::secure_token_file(&cli.token_cache).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);

            // Connection check - pin a scope the token already carries to
            // avoid a second consent prompt
            let mut check = hub.users().get_profile("me");
            if let Some(scope) = config.scopes.first() {
                check = check.add_scope(scope);
            }
            let (_, profile) = check.doit().await.map_err(ReportError::from)?;
            println!(
                "Connected to account: {}",
                profile.email_address.unwrap_or_default()
            );

            Ok(())
        }

        Commands::Run {
            dry_run,
            no_archive,
        } => {
            let reporter = ProgressReporter::new();

            if dry_run {
                println!("Running in DRY RUN mode - no files will be written");
            }

            let config_spinner = reporter.add_spinner("Loading configuration...");
            let config = Config::load_or_init(&cli.config).await?;
            config.validate()?;
            let patterns = SubjectPatterns::compile(&config.patterns)?;
            reporter.finish_spinner(&config_spinner, "Configuration loaded");

            let auth_spinner = reporter.add_spinner("Connecting to Gmail API...");
            let hub =
                auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache, &config.scopes)
                    .await?;
            // The interactive flow may have just minted the token file
            auth::secure_token_file(&cli.token_cache).await?;
            reporter.finish_spinner(&auth_spinner, "Gmail API connected");

            let client = ProductionGmailClient::new(hub);

            let output_root = cli
                .output
                .clone()
                .unwrap_or_else(|| config.resolve_output_root());
            let writer = AttachmentWriter::new(output_root);

            let options = RunOptions {
                archive: config.archive && !no_archive,
                dry_run,
            };

            let report =
                pipeline::run(&client, &config, &patterns, &writer, &reporter, options).await?;

            println!("\n========================================");
            println!("Run Summary");
            println!("========================================");
            println!("Run ID: {}", report.run_id);
            println!("Duration: {} seconds", report.duration_seconds());
            println!("Messages found: {}", report.messages_found);
            println!("Messages processed: {}", report.messages_processed);
            println!("Files written: {}", report.files_written);
            println!("Messages archived: {}", report.messages_archived);
            if !report.failures.is_empty() {
                println!("Skipped messages: {}", report.failures.len());
                for failure in &report.failures {
                    println!("  - {}: {}", failure.message_id, failure.error);
                }
            }
            println!("========================================");

            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating default configuration file");

            if output.exists() && !force {
                return Err(ReportError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(&output).await?;

            println!("Created configuration file at: {:?}", output);
            println!("\nUpdate it before the first run. Key settings to review:");
            println!("  - query: the sender address must match your PaperCut installation");
            println!("  - archive: whether processed messages are marked read and archived");
            println!("  - output_root: where dated report folders are created");
            println!(
                "\nThe credentials.json file from the Google Cloud Console must be \
                 placed next to the config before authenticating."
            );

            Ok(())
        }
    }
}
