use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use govfeed::api::{ApiClient, FeedQuery, SourceId, UserProfile};
use govfeed::app::{App, AppEvent};
use govfeed::card::{CardView, SummaryLine, KEYWORD_FALLBACK_NOTICE};
use govfeed::config::Config;
use govfeed::feed::{sorted_view, SortMode};
use govfeed::util::{single_line, strip_control_chars};

#[derive(Parser, Debug)]
#[command(
    name = "govfeed",
    about = "Terminal dashboard for government contract, award and grant opportunities"
)]
struct Args {
    /// Config file (default: ~/.config/govfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides GOVFEED_API_URL and the config file)
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// User id sent to the backend
    #[arg(long, value_name = "ID", global = true)]
    user_id: Option<String>,

    /// Comma-separated sources: sam, usaspending, grants
    #[arg(long, value_name = "LIST", global = true)]
    sources: Option<String>,

    /// Sort order: relevance, date or amount
    #[arg(long, value_name = "MODE", global = true)]
    sort: Option<SortMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page of the feed and print it
    Feed {
        /// Number of items to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show or update the stored interest profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Print the profile stored on the backend
    Show,
    /// Replace keywords and focus
    Set {
        #[arg(long)]
        keywords: String,
        #[arg(long, default_value = "")]
        focus: String,
    },
    /// Derive a profile from a free-text description
    FromText {
        /// What your organization works on
        text: String,
    },
}

/// Load the config file and fold the command-line overrides into it.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_base_config(args.config.as_deref(), Config::default_path())?;

    if let Some(user_id) = &args.user_id {
        if user_id.trim().is_empty() {
            anyhow::bail!("--user-id must not be empty");
        }
        config.user_id = user_id.clone();
    }
    if let Some(sources) = &args.sources {
        let parsed = SourceId::parse_list(sources).context("Invalid --sources")?;
        if parsed.is_empty() {
            anyhow::bail!("--sources needs at least one source");
        }
        config.default_sources = SourceId::join(&parsed);
    }
    if let Some(sort) = args.sort {
        config.default_sort = sort.as_str().to_string();
    }
    Ok(config)
}

/// The explicit `--config` file, else the default location. With neither
/// (no `HOME`), built-in defaults apply since the file is optional.
fn load_base_config(explicit: Option<&Path>, default_path: Option<PathBuf>) -> Result<Config> {
    let path = match (explicit, default_path) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => path,
        (None, None) => {
            tracing::debug!("HOME not set and no --config given, using default configuration");
            return Ok(Config::default());
        }
    };
    Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with printed output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let api_url = match &args.api_url {
        Some(url) => url.clone(),
        None => config.api_url(),
    };
    let client = ApiClient::new(&api_url)
        .with_context(|| format!("Invalid backend URL '{}'", api_url))?;
    tracing::debug!(api_url = %client.base_url(), ?config, "Starting");

    match args.command {
        None => run_dashboard(client, &config).await,
        Some(Command::Feed { offset }) => print_feed(&client, &config, offset).await,
        Some(Command::Profile { action }) => run_profile(&client, &config, action).await,
    }
}

async fn run_dashboard(client: ApiClient, config: &Config) -> Result<()> {
    let mut app = App::new(Arc::new(client), config).context("Failed to create application")?;
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    govfeed::ui::run(&mut app, event_tx, event_rx).await
}

async fn print_feed(client: &ApiClient, config: &Config, offset: usize) -> Result<()> {
    let sources = config.sources()?;
    let sort = config.sort()?;
    let api_key = config.openai_key();

    let response = client
        .fetch_feed(&FeedQuery {
            user_id: &config.user_id,
            sources: &sources,
            limit: config.page_size,
            offset,
            api_key: api_key.as_ref(),
        })
        .await
        .context("Failed to fetch feed")?;

    let now = Utc::now();
    for item in sorted_view(&response.items, sort) {
        print_card(&CardView::new(item, false, now));
    }

    let counts: Vec<String> = SourceId::ALL
        .iter()
        .filter_map(|id| {
            response
                .source_counts
                .get(id.as_str())
                .map(|n| format!("{} {}", id.label(), n))
        })
        .collect();
    println!(
        "{} items (offset {}, total {}){}{}",
        response.items.len(),
        offset,
        response.total,
        if response.has_more { ", more available" } else { "" },
        if counts.is_empty() {
            String::new()
        } else {
            format!(" | {}", counts.join(", "))
        }
    );
    Ok(())
}

fn print_card(card: &CardView<'_>) {
    let item = card.item;
    let mut header = format!("{} {}", card.meta.icon, card.meta.label);
    if card.shows_score() {
        header.push_str(&format!("  MATCH {}", card.score_label()));
    }
    if item.is_mock {
        header.push_str("  [DEMO DATA]");
    }
    println!("{}", header);
    println!("{}", single_line(&strip_control_chars(&item.title)));

    match card.summary {
        SummaryLine::Ai(text) => println!("  {}", single_line(&strip_control_chars(text))),
        SummaryLine::KeywordFallback => println!("  {}", KEYWORD_FALLBACK_NOTICE),
        SummaryLine::Hidden => {}
    }
    if !card.chips.is_empty() {
        println!("  {}", card.chips.join(" · "));
    }

    let mut dates = Vec::new();
    if let Some(posted) = &card.posted {
        dates.push(format!("POSTED {}", posted));
    }
    if let Some(due) = card.due_label() {
        dates.push(format!("DUE {}", due));
    }
    if !dates.is_empty() {
        println!("  {}", dates.join("   "));
    }
    if !item.url.is_empty() {
        println!("  {}", item.url);
    }
    println!();
}

async fn run_profile(client: &ApiClient, config: &Config, action: ProfileCommand) -> Result<()> {
    let api_key = config.openai_key();
    let profile = match action {
        ProfileCommand::Show => client
            .fetch_profile(&config.user_id)
            .await
            .context("Failed to fetch profile")?,
        ProfileCommand::Set { keywords, focus } => client
            .update_profile_direct(&keywords, &focus, api_key.as_ref(), &config.user_id)
            .await
            .context("Failed to update profile")?,
        ProfileCommand::FromText { text } => client
            .update_profile_from_text(&text, api_key.as_ref(), &config.user_id)
            .await
            .context("Failed to update profile from text")?,
    };
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("keywords: {}", profile.keywords);
    println!("focus:    {}", profile.focus);
    if !profile.org_type.is_empty() {
        println!("org type: {}", profile.org_type);
    }
    if let Some(agencies) = profile.agencies.as_ref().filter(|a| !a.is_empty()) {
        println!("agencies: {}", agencies.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_home_and_no_flag_uses_defaults() {
        let config = load_base_config(None, None).unwrap();
        assert_eq!(config.user_id, "default");
        assert_eq!(config.page_size, 15);
    }

    #[test]
    fn test_explicit_config_wins_over_default_path() {
        let dir = std::env::temp_dir().join("govfeed_main_test_explicit");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "page_size = 5\n").unwrap();

        let config = load_base_config(Some(&path), None).unwrap();
        assert_eq!(config.page_size, 5);

        let config = load_base_config(None, Some(path.clone())).unwrap();
        assert_eq!(config.page_size, 5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cli_overrides_fold_into_config() {
        let missing = std::env::temp_dir().join("govfeed_main_test_missing.toml");
        let args = Args::try_parse_from([
            "govfeed",
            "--config",
            missing.to_str().unwrap(),
            "--user-id",
            "team-7",
            "--sources",
            "grants,sam",
            "--sort",
            "amount",
            "feed",
        ])
        .unwrap();

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.user_id, "team-7");
        assert_eq!(config.sources().unwrap(), vec![SourceId::Grants, SourceId::Sam]);
        assert_eq!(config.sort().unwrap(), SortMode::Amount);
    }
}
