mod config;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use uuid::Uuid;

use healspace_db::Database;
use healspace_stories::seed::demo_reels;
use healspace_stories::{SessionConfig, StoryRepository, TracingLogger, ViewingSession};
use healspace_types::api::NewStoryItem;
use healspace_types::events::{SessionCommand, StoryEvent};
use healspace_types::models::StoryContent;

use crate::config::Config;

const USAGE: &str = "usage:
  healspace list [--json]
  healspace post <author> text <text> [duration_secs]
  healspace post <author> image|video <url> [duration_secs]
  healspace view <reel_index>
  healspace react <author> <item_id> [emoji]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "healspace=info,healspace_stories=info,healspace_db=warn".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let mut repo = StoryRepository::new(db);
    if config.seed {
        repo = repo.with_seed(demo_reels);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rest = args.get(1..).unwrap_or_default();
    match args.first().map(String::as_str) {
        None | Some("list") => list(&mut repo, rest),
        Some("post") => post(&mut repo, rest),
        Some("view") => view(repo, &config, rest).await,
        Some("react") => react(&mut repo, &config, rest),
        Some(other) => bail!("unknown command {}\n{}", other, USAGE),
    }
}

fn list(repo: &mut StoryRepository<Database>, args: &[String]) -> Result<()> {
    let now = repo.now_ms();
    repo.load()?;
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&repo.summaries())?);
        return Ok(());
    }

    let reels = repo.reels();
    if reels.is_empty() {
        println!("No stories in the last 24 hours.");
        return Ok(());
    }

    for (index, reel) in reels.iter().enumerate() {
        let name = reel.author_name.as_deref().unwrap_or(&reel.author_id);
        let marker = if reel.all_viewed { " " } else { "*" };
        println!(
            "{}[{}] {} ({} stories, updated {})",
            marker,
            index,
            name,
            reel.items.len(),
            format_ms(reel.last_updated_ms)
        );
        for item in &reel.items {
            let age_min = item.age_ms(now) / 60_000;
            let preview = match &item.content {
                StoryContent::Text { text, .. } => text.clone(),
                StoryContent::Image { media_url } | StoryContent::Video { media_url } => {
                    media_url.clone()
                }
            };
            println!(
                "    {} {:<5} {:>4}m ago {:>2}s {}{}",
                item.id,
                item.content.kind(),
                age_min,
                item.duration_secs,
                if item.viewed { "seen " } else { "" },
                preview
            );
        }
    }
    Ok(())
}

fn post(repo: &mut StoryRepository<Database>, args: &[String]) -> Result<()> {
    let [author, kind, body, tail @ ..] = args else {
        bail!("{}", USAGE);
    };
    let duration_secs = match tail.first() {
        Some(raw) => Some(raw.parse::<u32>().context("duration must be whole seconds")?),
        None => None,
    };

    let content = match kind.as_str() {
        "text" => StoryContent::Text {
            text: body.clone(),
            background: None,
            font: None,
        },
        "image" => StoryContent::Image {
            media_url: body.clone(),
        },
        "video" => StoryContent::Video {
            media_url: body.clone(),
        },
        other => bail!("unknown story type {}, expected text, image or video", other),
    };

    let item = repo.add_item(
        author,
        NewStoryItem {
            content,
            duration_secs,
        },
    )?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

fn react(repo: &mut StoryRepository<Database>, config: &Config, args: &[String]) -> Result<()> {
    let [author, item_id, tail @ ..] = args else {
        bail!("{}", USAGE);
    };
    let item_id: Uuid = item_id.parse().context("item id must be a UUID")?;
    let emoji = tail.first().cloned();

    let added = repo.react(author, item_id, &config.viewer_id, emoji)?;
    println!("{}", if added { "reaction added" } else { "reaction removed" });
    Ok(())
}

/// Play stories from a reel with auto-advance. Reads n/p/pause/resume/q from
/// stdin; Ctrl+C closes the viewer.
async fn view(repo: StoryRepository<Database>, config: &Config, args: &[String]) -> Result<()> {
    let author_index: usize = args
        .first()
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("reel index must be a number")?
        .unwrap_or(0);

    let session_config = SessionConfig {
        viewer_id: config.viewer_id.clone(),
        tick: config.tick,
    };
    let mut handle = ViewingSession::spawn(repo, session_config, Arc::new(TracingLogger));
    handle.send(SessionCommand::Open { author_index });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(StoryEvent::Closed) | None => break,
                Some(event) => print_event(&event),
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if let Some(command) = parse_command(line.trim()) {
                        handle.send(command);
                    }
                }
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, closing viewer...");
                handle.send(SessionCommand::Close);
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

fn parse_command(input: &str) -> Option<SessionCommand> {
    match input {
        "n" | "next" | "" => Some(SessionCommand::Next),
        "p" | "prev" | "previous" => Some(SessionCommand::Previous),
        "pause" | "hold" => Some(SessionCommand::Pause),
        "r" | "resume" => Some(SessionCommand::Resume),
        "end" => Some(SessionCommand::MediaEnded),
        "q" | "quit" | "close" => Some(SessionCommand::Close),
        _ => None,
    }
}

fn print_event(event: &StoryEvent) {
    match event {
        StoryEvent::ItemShown {
            author_id,
            author_index,
            item_index,
            duration_secs,
            ..
        } => println!(
            "▶ {} [{}:{}] ({}s)",
            author_id, author_index, item_index, duration_secs
        ),
        StoryEvent::Progress { percent, .. } if percent % 20 == 0 => println!("  {}%", percent),
        StoryEvent::Progress { .. } => {}
        other => println!("  {}", other),
    }
}

fn format_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_viewer_commands() {
        assert_eq!(parse_command("n"), Some(SessionCommand::Next));
        assert_eq!(parse_command(""), Some(SessionCommand::Next));
        assert_eq!(parse_command("prev"), Some(SessionCommand::Previous));
        assert_eq!(parse_command("hold"), Some(SessionCommand::Pause));
        assert_eq!(parse_command("q"), Some(SessionCommand::Close));
        assert_eq!(parse_command("jump"), None);
    }

    #[test]
    fn formats_epoch_millis() {
        assert_eq!(format_ms(0), "1970-01-01 00:00 UTC");
    }
}
