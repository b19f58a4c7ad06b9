use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use bmadscope_core::config::{load_config, BmadscopeConfig, RepoConfig};
use bmadscope_core::project::get_bmad_project;
use bmadscope_github::GithubClient;

#[derive(Parser)]
#[command(name = "bmadscope", version, about = "Read BMAD project state from a repository")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "bmadscope.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List configured repositories
    Repos,
    /// Assemble a project snapshot and print it as JSON
    Status {
        /// Repository as owner/name; must be configured or fully given
        repo: String,
        /// Branch override
        #[arg(long)]
        branch: Option<String>,
        /// Print only the global counters
        #[arg(long)]
        summary: bool,
    },
    /// Print the parse-health report for a repository
    Health {
        /// Repository as owner/name
        repo: String,
    },
    /// Print version information
    Version,
}

fn resolve_repo(config: &BmadscopeConfig, slug: &str, branch: Option<String>) -> Result<RepoConfig> {
    let mut repo = match config.find_repo(slug) {
        Some(repo) => repo.clone(),
        None => {
            let (owner, name) = slug
                .split_once('/')
                .ok_or_else(|| anyhow!("repository must be given as owner/name: {slug}"))?;
            RepoConfig {
                owner: owner.to_string(),
                name: name.to_string(),
                branch: "main".to_string(),
                display_name: None,
            }
        }
    };
    if let Some(branch) = branch {
        repo.branch = branch;
    }
    Ok(repo)
}

fn client(config: &BmadscopeConfig) -> Result<GithubClient> {
    let Some(token) = config.resolve_token() else {
        bail!(
            "no access token available; set {} to read repository contents",
            config.token_env()
        );
    };
    Ok(GithubClient::new(Some(token)))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Some(Command::Repos) => {
            println!("{}", serde_json::to_string_pretty(&config.repos)?);
        }
        Some(Command::Status {
            repo,
            branch,
            summary,
        }) => {
            let repo = resolve_repo(&config, &repo, branch)?;
            let source = client(&config)?;
            let project = get_bmad_project(&source, &repo).await?;
            if summary {
                let summary = serde_json::json!({
                    "repo": repo.slug(),
                    "branch": repo.branch,
                    "epics": project.epics.len(),
                    "total_stories": project.total_stories,
                    "completed_stories": project.completed_stories,
                    "in_progress_stories": project.in_progress_stories,
                    "progress_percent": project.progress_percent,
                    "parse_errors": project.parse_health.errors.len(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&project)?);
            }
        }
        Some(Command::Health { repo }) => {
            let repo = resolve_repo(&config, &repo, None)?;
            let source = client(&config)?;
            let project = get_bmad_project(&source, &repo).await?;
            println!("{}", serde_json::to_string_pretty(&project.parse_health)?);
        }
        Some(Command::Version) => {
            println!("bmadscope {}", bmadscope_core::version());
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }
    Ok(())
}
