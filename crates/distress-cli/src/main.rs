use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use distress_bedrock::BedrockClient;
use distress_cli::cli::{Cli, Command, ConfigAction};
use distress_cli::config::{self, AnalyzerConfig, Settings};
use distress_cli::repl::{self, Repl};
use distress_cli::report::{self, ExportFormat};
use distress_core::service::StructuredGenerator;
use distress_core::validate::ValidatingGenerator;
use distress_export::render::render_report;
use distress_session::{ConversationRecord, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let file = config::load_optional(&config_path)?;
    let settings = Settings::resolve(file.as_ref(), &cli.model.overrides(), |key| {
        std::env::var(key).ok()
    })?;

    match cli.command {
        Command::Chat { transcript, resume } => chat(&settings, transcript, resume).await,
        Command::Analyze {
            input,
            json,
            pdf,
            docx,
            markdown,
        } => {
            let exports = [
                (ExportFormat::Pdf, pdf),
                (ExportFormat::Docx, docx),
                (ExportFormat::Markdown, markdown),
            ];
            analyze(&settings, &input, json, exports).await
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let info = config::config_info(&config_path, file.as_ref(), &settings);
                println!("{}", serde_json::to_string_pretty(&info)?);
                Ok(())
            }
            ConfigAction::Init { force } => {
                if file.is_some() && !force {
                    return Err(eyre::eyre!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    ));
                }
                let config = AnalyzerConfig {
                    region: settings.region.clone(),
                    model_id: settings.model_id.clone(),
                    profile: settings.profile.clone(),
                    validation: settings.validation,
                    ..AnalyzerConfig::default()
                };
                config::save_config(&config_path, &config)?;
                println!("Wrote {}", config_path.display());
                Ok(())
            }
        },
    }
}

/// Logs go to stderr so they never interleave with the conversation.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(settings: &Settings) -> Arc<BedrockClient> {
    tracing::info!(
        region = %settings.region,
        model = %settings.model_id,
        "using bedrock"
    );
    Arc::new(
        BedrockClient::load(
            &settings.region,
            settings.profile.as_deref(),
            settings.model_id.clone(),
        )
        .await,
    )
}

fn validating(
    client: &Arc<BedrockClient>,
    settings: &Settings,
) -> ValidatingGenerator<Arc<BedrockClient>> {
    let generator = ValidatingGenerator::new(Arc::clone(client), settings.validation);
    tracing::debug!(validation = %generator.policy(), "analysis validation policy");
    generator
}

async fn chat(
    settings: &Settings,
    transcript: Option<PathBuf>,
    resume: Option<PathBuf>,
) -> Result<()> {
    let client = connect(settings).await;
    let generator = validating(&client, settings);

    let orchestrator = match resume {
        Some(path) => {
            let record = ConversationRecord::load(&path)?;
            Orchestrator::resume(generator, Arc::clone(&client), record)?
        }
        None => Orchestrator::new(generator, Arc::clone(&client)),
    };

    let mut repl = Repl::new(orchestrator, Arc::clone(&client));
    if let Some(path) = transcript {
        let text = repl::read_transcript(client.as_ref(), &path).await?;
        repl.composer_mut().push_line(&text);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl.run(stdin, &mut stdout).await
}

async fn analyze(
    settings: &Settings,
    input: &std::path::Path,
    json: bool,
    exports: [(ExportFormat, Option<PathBuf>); 3],
) -> Result<()> {
    let client = connect(settings).await;
    let transcript = repl::read_transcript(client.as_ref(), input).await?;
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(eyre::eyre!("the transcript is empty"));
    }

    let generator = validating(&client, settings);
    let analysis = generator.analyze(transcript).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_report(&analysis, &report::today())?);
    }

    for (format, path) in exports {
        if let Some(path) = path {
            report::write(&analysis, format, &path)?;
        }
    }
    Ok(())
}
