//! Stride CLI - milestone analysis and recommendations.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stride_cohort::{all_mastery_ages, build_transition_graph, load_cohort, observation_frequencies};
use stride_core::{ChildProfile, MilestoneId};
use stride_engine::recommend;
use stride_store::{read_manifest, ReferenceArtifacts, ReferenceStore};

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Developmental milestone recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a cohort CSV and write the reference artifacts
    Analyze {
        /// Cohort CSV file
        #[arg(long)]
        csv: PathBuf,
        /// Output directory for the artifacts
        #[arg(long, default_value = "models")]
        out: PathBuf,
    },
    /// Recommend next milestones for a child
    Recommend {
        /// Models directory produced by analyze
        #[arg(long, default_value = "models")]
        models: PathBuf,
        /// Child age in months
        #[arg(long)]
        age: f64,
        /// Completed milestone IDs (repeatable or comma-separated)
        #[arg(long = "completed", value_delimiter = ',')]
        completed: Vec<String>,
        /// Recommend from the full universe instead of the activity catalog
        #[arg(long)]
        ignore_activities: bool,
        /// Emit JSON instead of the human-readable listing
        #[arg(long)]
        json: bool,
    },
    /// Show a summary of the reference artifacts
    Summary {
        /// Models directory produced by analyze
        #[arg(long, default_value = "models")]
        models: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { csv, out } => {
            let cohort = load_cohort(&csv)
                .with_context(|| format!("failed to load cohort from {}", csv.display()))?;

            let artifacts = ReferenceArtifacts {
                mastery_ages: all_mastery_ages(&cohort),
                transitions: build_transition_graph(&cohort),
                frequencies: observation_frequencies(&cohort),
                subjects: cohort.subject_count(),
            };
            artifacts.save(&out).await?;

            info!(
                subjects = cohort.subject_count(),
                milestones = cohort.milestones().len(),
                out = %out.display(),
                "analysis complete"
            );
            println!(
                "Analyzed {} subjects across {} milestones -> {}",
                cohort.subject_count(),
                cohort.milestones().len(),
                out.display(),
            );
        }
        Commands::Recommend {
            models,
            age,
            completed,
            ignore_activities,
            json,
        } => {
            let store = ReferenceStore::load(&models).await?;
            let profile = ChildProfile::new(age, completed);
            let available: Option<BTreeSet<MilestoneId>> = if ignore_activities {
                None
            } else {
                store.activities().cloned()
            };

            let recommendations = recommend(&store, &profile, available.as_ref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&recommendations)?);
                return Ok(());
            }
            if recommendations.is_empty() {
                println!("No recommendations for age {age} months");
                return Ok(());
            }
            println!("Recommendations for age {age} months:");
            for rec in &recommendations {
                let mastery = rec
                    .mastery_age
                    .map(|m| format!("{m:.1}mo typical"))
                    .unwrap_or_else(|| "no cohort age".to_string());
                println!(
                    "  {} | {} | {} | p={:.2} | {}",
                    rec.milestone_id, rec.category, rec.milestone_name, rec.probability, mastery,
                );
            }
        }
        Commands::Summary { models } => {
            let store = ReferenceStore::load(&models).await?;

            println!("Reference store at {}", models.display());
            println!("  Milestones: {}", store.milestone_count());
            println!("  Transition sources: {}", store.transition_source_count());
            match store.activities() {
                Some(activities) => println!("  Activities: {}", activities.len()),
                None => println!("  Activities: none (full universe)"),
            }
            if let Some(manifest) = read_manifest(&models).await? {
                println!(
                    "  Built: {} ({} subjects, {} milestones)",
                    manifest.generated_at, manifest.subjects, manifest.milestones,
                );
            }
        }
    }

    Ok(())
}
