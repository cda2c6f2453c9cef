//! SurveyForge CLI
//!
//! # Usage
//! ```bash
//! surveyforge check "We want to understand how customers perceive our loyalty program"
//! surveyforge generate "<objective>" --length 15 --industry Retail --out survey.json
//! surveyforge edit --file survey.json --question-id q_... --instruction "Make it neutral"
//! surveyforge validate --file survey.json
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use surveyforge_agent::{AgentConfig, SurveyPipeline};
use surveyforge_core::{
    InputGate, Questionnaire, QuestionnaireStore, ScopingParams, SurveyError, SurveyLength,
};

/// SurveyForge - market-research questionnaires from a research objective
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an objective through the input gate only
    Check {
        objective: String,
    },

    /// Print the generation prompt without calling the model
    Prompt {
        objective: String,
        #[command(flatten)]
        scoping: ScopingArgs,
    },

    /// Generate a questionnaire
    Generate {
        objective: String,
        #[command(flatten)]
        scoping: ScopingArgs,
        /// Write the questionnaire here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Rewrite one question of a saved questionnaire in place
    Edit {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        question_id: String,
        #[arg(short, long)]
        instruction: String,
    },

    /// Ask the model to critique a saved questionnaire
    Validate {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Show whether the model service is configured
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ScopingArgs {
    /// Survey length in minutes, or short / medium / long
    #[arg(long)]
    length: Option<String>,
    #[arg(long)]
    respondents: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    /// Brands to include
    #[arg(long)]
    brands: Option<String>,
    /// Topics to avoid
    #[arg(long)]
    avoid: Option<String>,
    /// Special instructions for the questionnaire
    #[arg(long)]
    instructions: Option<String>,
}

impl From<ScopingArgs> for ScopingParams {
    fn from(args: ScopingArgs) -> Self {
        Self {
            survey_length: args
                .length
                .map(|raw| raw.parse::<SurveyLength>().unwrap_or_default())
                .unwrap_or_default(),
            target_respondents: args.respondents,
            industry: args.industry,
            brands: args.brands,
            avoid_topics: args.avoid,
            special_instructions: args.instructions,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli.command).await;
    if let Err(err) = &result {
        if let Some(SurveyError::ServiceNotConfigured(_)) =
            err.downcast_ref::<SurveyError>().map(SurveyError::root)
        {
            eprintln!("The AI service is not configured.");
            eprintln!("Set OPENAI_API_KEY (or add api_key to surveyforge.toml) and try again.");
        }
    }
    result
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Check { objective } => {
            let verdict = InputGate::check(&objective);
            match verdict.reason {
                None => println!("OK: objective accepted"),
                Some(reason) => anyhow::bail!("Rejected: {}", reason),
            }
        }
        Commands::Prompt { objective, scoping } => {
            let scoping = ScopingParams::from(scoping);
            scoping.validate()?;
            println!("{}", surveyforge_core::prompt::compose(&objective, &scoping));
        }
        Commands::Generate {
            objective,
            scoping,
            out,
        } => {
            let pipeline = pipeline()?;
            let questionnaire = pipeline.generate(&objective, &scoping.into()).await?;
            let json = pipeline.export_json(&questionnaire.id)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Wrote {} questions in {} sections to {}",
                        questionnaire.metadata.total_questions,
                        questionnaire.sections.len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        Commands::Edit {
            file,
            question_id,
            instruction,
        } => {
            let pipeline = pipeline()?;
            let questionnaire = pipeline.store().save(read_questionnaire(&file)?)?;
            let question = questionnaire
                .question(&question_id)
                .cloned()
                .ok_or_else(|| {
                    SurveyError::NotFound(format!(
                        "Question {} not found in {}",
                        question_id,
                        file.display()
                    ))
                })?;

            let edited = pipeline
                .edit_question(&question, &instruction, Some(&questionnaire.id))
                .await?;
            std::fs::write(&file, pipeline.export_json(&questionnaire.id)?)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&edited)?);
        }
        Commands::Validate { file } => {
            let pipeline = pipeline()?;
            let report = pipeline
                .validate_questionnaire(&read_questionnaire(&file)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Status { json } => {
            let status = pipeline()?.status();
            if json {
                println!("{}", serde_json::to_string(&status)?);
            } else {
                println!("SurveyForge {}", surveyforge_core::VERSION);
                println!("Model:      {}", status.model);
                println!(
                    "Configured: {}",
                    if status.configured { "yes" } else { "no (set OPENAI_API_KEY)" }
                );
            }
        }
    }

    Ok(())
}

fn pipeline() -> Result<SurveyPipeline> {
    let config = AgentConfig::load()?;
    tracing::debug!(?config, "agent config resolved");
    Ok(SurveyPipeline::from_config(config)?)
}

fn read_questionnaire(path: &Path) -> Result<Questionnaire> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a questionnaire", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoping_flags_map_to_params() {
        let cli = Cli::try_parse_from([
            "surveyforge",
            "prompt",
            "We want to measure brand awareness among runners",
            "--length",
            "long",
            "--industry",
            "Sportswear",
            "--avoid",
            "politics",
        ])
        .unwrap();

        let Commands::Prompt { scoping, .. } = cli.command else {
            panic!("expected prompt subcommand");
        };
        let params = ScopingParams::from(scoping);
        assert_eq!(params.survey_length, SurveyLength::Label("long".into()));
        assert_eq!(params.industry.as_deref(), Some("Sportswear"));
        assert_eq!(params.avoid_topics.as_deref(), Some("politics"));
        assert!(params.brands.is_none());
    }

    #[test]
    fn test_numeric_length_and_default() {
        let params = ScopingParams::from(ScopingArgs {
            length: Some("15".into()),
            ..ScopingArgs::default()
        });
        assert_eq!(params.survey_length, SurveyLength::Minutes(15.0));
        assert_eq!(
            ScopingParams::from(ScopingArgs::default()).survey_length,
            SurveyLength::default()
        );
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["surveyforge", "status", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
