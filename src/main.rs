//! Streamer Hub CLI
//!
//! Command-line front end for the streamer profile API:
//! - Show the public profile, schedule and polls
//! - Vote in polls
//! - Log in and manage polls, schedule and profile settings

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use streamer_hub::config::{generate_default_config, Config, PollScope};
use streamer_hub::polls::{PollCard, PollDraft, PollEngine, PollManager, PollPhase, VoteGuard};
use streamer_hub::profile::{PendingPhoto, ProfileFetcher, SettingsEditor, SocialLink};
use streamer_hub::schedule::{ScheduleAccessor, ScheduleDraft};
use streamer_hub::session::{HttpTransport, Session, SessionGateway};
use streamer_hub::store::LocalStore;
use streamer_hub::{overview, Auth, RecordId, SessionStatus};

#[derive(Parser)]
#[command(name = "streamer-hub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Streamer profile, polls and schedule from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the public profile
    Profile,

    /// Stream schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommand,
    },

    /// Polls
    Polls {
        #[command(subcommand)]
        action: PollCommand,
    },

    /// Log in as the channel owner
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "STREAMER_HUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored login
    Logout,

    /// Check whether the stored login is still valid
    Status,

    /// Dashboard overview: active polls and upcoming streams
    Overview,

    /// Profile settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// List scheduled streams
    List,
    /// Add a stream
    Add {
        /// Date (YYYY-MM-DD)
        day: String,
        /// Stream title
        title: String,
        /// Start time, e.g. "8:00 PM EST"
        start_time: String,
    },
    /// Change a scheduled stream
    Update {
        id: String,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start_time: Option<String>,
    },
    /// Remove a scheduled stream
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum PollCommand {
    /// Show polls with their tallies
    List {
        /// Which listing to read (all, active); defaults to config
        #[arg(long)]
        scope: Option<PollScope>,
    },
    /// Vote for an option
    Vote {
        poll_id: String,
        /// Option id or label
        option: String,
    },
    /// Create a poll
    Create {
        #[arg(short, long)]
        title: String,
        /// Option label (repeat for each option)
        #[arg(short, long = "option", required = true)]
        options: Vec<String>,
        /// Start (RFC 3339 or YYYY-MM-DDTHH:MM local), default now
        #[arg(long)]
        start: Option<String>,
        /// End (RFC 3339 or YYYY-MM-DDTHH:MM local), default start + 24h
        #[arg(long)]
        end: Option<String>,
    },
    /// Edit a poll
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Relabel an option: OPTION=NEW_LABEL (option id or current label)
        #[arg(long)]
        rename: Vec<String>,
    },
    /// End a poll early
    Archive { id: String },
    /// Reopen an archived poll
    Unarchive { id: String },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the editable profile
    Show,
    /// Change profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        /// Bio text
        #[arg(long)]
        bio: Option<String>,
        /// New password (omitted from the update when not given)
        #[arg(long, env = "STREAMER_HUB_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Photo URL
        #[arg(long, conflicts_with = "photo_file")]
        photo_url: Option<String>,
        /// Image file to upload as the photo
        #[arg(long)]
        photo_file: Option<PathBuf>,
        /// Add a social link: PLATFORM=URL
        #[arg(long)]
        add_link: Vec<String>,
        /// Remove the social link at this position (0-based)
        #[arg(long)]
        remove_link: Vec<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    streamer_hub::logging::init(&config.logging);

    if let Commands::Config { output } = &cli.command {
        return write_config(output.as_deref());
    }

    let store = LocalStore::open(&config.storage.state_file)
        .with_context(|| format!("opening {}", config.storage.state_file))?;
    let session = Session::with_teardown(
        store.clone(),
        Arc::new(|| eprintln!("Session expired. Run `streamer-hub login` to sign in again.")),
    );
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let gateway = SessionGateway::new(transport, session);
    let json = cli.format == "json";

    match cli.command {
        Commands::Profile => {
            let profile = ProfileFetcher::new(gateway).fetch().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("{}", profile.name);
                println!();
                if profile.info.is_empty() {
                    println!("The coziest corner of the web");
                } else {
                    println!("{}", profile.info);
                }
                if !profile.photo_url.is_empty() {
                    println!();
                    println!("Photo: {}", profile.photo_url);
                }
                if !profile.social_links.is_empty() {
                    println!();
                    for link in &profile.social_links {
                        println!("  {:<12} {}", link.platform, link.url);
                    }
                }
            }
        }

        Commands::Schedule { action } => {
            run_schedule(ScheduleAccessor::new(gateway), action, json).await?;
        }

        Commands::Polls { action } => {
            let guard = VoteGuard::new(store);
            run_polls(gateway, guard, config.polls.clone(), action, json).await?;
        }

        Commands::Login { email, password } => {
            Auth::new(gateway).login(&email, &password).await?;
            println!("Logged in as {}", email);
        }

        Commands::Logout => {
            if Auth::new(gateway).logout()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Status => match Auth::new(gateway).restore().await? {
            SessionStatus::Authenticated => println!("Logged in"),
            SessionStatus::Anonymous => println!("Not logged in"),
            SessionStatus::Cleared => println!("Stored login was no longer valid and has been removed"),
        },

        Commands::Overview => {
            let view = overview::load(&gateway).await;

            println!("Active polls");
            println!("{}", "-".repeat(40));
            if view.active_polls.is_empty() {
                println!("  none");
            }
            for summary in &view.active_polls {
                println!("  {} ({} votes)", summary.poll.title, summary.total_votes);
                for row in &summary.rows {
                    println!("    {:<24} {:>4} {:>3}%", row.label, row.count, row.percentage);
                }
            }

            println!();
            println!("Upcoming streams");
            println!("{}", "-".repeat(40));
            if view.upcoming.is_empty() {
                println!("  none");
            }
            for entry in &view.upcoming {
                println!(
                    "  {:<10} {:<14} {}",
                    entry.weekday_label().unwrap_or("-"),
                    entry.start_time,
                    entry.stream_title
                );
            }

            for e in &view.errors {
                eprintln!("warning: {}", e);
            }
        }

        Commands::Settings { action } => {
            run_settings(SettingsEditor::new(gateway), action, json).await?;
        }

        // Written before the store is opened
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn write_config(output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", config),
    }
    Ok(())
}

async fn run_schedule(
    accessor: ScheduleAccessor,
    action: ScheduleCommand,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        ScheduleCommand::List => {
            let entries = accessor.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No streams scheduled.");
                return Ok(());
            }

            println!(
                "{:<26} {:<10} {:<12} {:<14} {}",
                "ID", "Day", "Date", "Start", "Title"
            );
            println!("{}", "-".repeat(80));
            for entry in entries {
                println!(
                    "{:<26} {:<10} {:<12} {:<14} {}",
                    entry.id,
                    entry.weekday_label().unwrap_or("-"),
                    entry
                        .date()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| entry.day.clone()),
                    entry.start_time,
                    entry.stream_title
                );
            }
        }

        ScheduleCommand::Add {
            day,
            title,
            start_time,
        } => {
            accessor
                .create(&ScheduleDraft::new(day, title, start_time))
                .await?;
            println!("Added to schedule");
        }

        ScheduleCommand::Update {
            id,
            day,
            title,
            start_time,
        } => {
            let id = RecordId::new(id);
            let entry = accessor
                .list()
                .await?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow!("No schedule entry with id {}", id))?;

            let mut draft = ScheduleDraft::from_entry(&entry);
            if let Some(day) = day {
                draft.day = day;
            }
            if let Some(title) = title {
                draft.stream_title = title;
            }
            if let Some(start_time) = start_time {
                draft.start_time = start_time;
            }

            accessor.update(&id, &draft).await?;
            println!("Updated {}", id);
        }

        ScheduleCommand::Delete { id } => {
            let id = RecordId::new(id);
            accessor.delete(&id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

async fn run_polls(
    gateway: SessionGateway,
    guard: VoteGuard,
    poll_config: streamer_hub::PollConfig,
    action: PollCommand,
    json: bool,
) -> anyhow::Result<()> {
    let engine = PollEngine::new(gateway.clone(), guard, poll_config);
    let manager = PollManager::new(gateway);

    match action {
        PollCommand::List { scope } => {
            let polls = match scope {
                Some(scope) => engine.fetch_scope(scope).await?,
                None => engine.fetch_polls().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&polls)?);
                return Ok(());
            }
            let cards = engine.cards(polls, Utc::now());
            if cards.is_empty() {
                println!("No active polls right now.");
            }
            for card in &cards {
                print_card(card);
            }
        }

        PollCommand::Vote { poll_id, option } => {
            let id = RecordId::new(poll_id);
            let poll = engine
                .fetch_polls()
                .await?
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| anyhow!("No poll with id {}", id))?;

            let key = poll
                .elements
                .iter()
                .find(|o| o.key() == option || o.label.eq_ignore_ascii_case(&option))
                .map(|o| o.key().to_string())
                .ok_or_else(|| anyhow!("Poll has no option {:?}", option))?;

            let mut card = engine.cards(vec![poll], Utc::now()).remove(0);
            card.select(&key, Utc::now())?;

            if let Err(e) = engine.cast(&mut card).await {
                if let Some(message) = card.error() {
                    eprintln!("{}", message);
                }
                return Err(e.into());
            }

            if let Some(toast) = card.toast(Utc::now()) {
                println!("{}", toast.message);
            }
            print_card(&card);
        }

        PollCommand::Create {
            title,
            options,
            start,
            end,
        } => {
            let mut draft = PollDraft::new(Utc::now());
            draft.title = title;
            if let Some(start) = start {
                draft.start_date = parse_datetime(&start)?;
                draft.end_date = draft.start_date + chrono::Duration::hours(24);
            }
            if let Some(end) = end {
                draft.end_date = parse_datetime(&end)?;
            }
            draft.options = options
                .into_iter()
                .map(streamer_hub::polls::OptionDraft::new)
                .collect();

            manager.create(&draft).await?;
            println!("Poll created successfully!");
        }

        PollCommand::Edit {
            id,
            title,
            start,
            end,
            rename,
        } => {
            let id = RecordId::new(id);
            let poll = manager
                .list()
                .await?
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| anyhow!("No poll with id {}", id))?;

            let mut draft = PollDraft::from_poll(&poll);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(start) = start {
                draft.start_date = parse_datetime(&start)?;
            }
            if let Some(end) = end {
                draft.end_date = parse_datetime(&end)?;
            }
            for spec in rename {
                let (from, to) = spec
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected OPTION=NEW_LABEL, got {:?}", spec))?;
                let target = draft
                    .options
                    .iter_mut()
                    .find(|o| {
                        o.id.as_ref().map(RecordId::as_str) == Some(from)
                            || o.label.eq_ignore_ascii_case(from)
                    })
                    .ok_or_else(|| anyhow!("Poll has no option {:?}", from))?;
                target.label = to.to_string();
            }

            manager.update(&id, &draft).await?;
            println!("Poll updated successfully!");
        }

        PollCommand::Archive { id } => {
            manager.archive(&RecordId::new(id)).await?;
            println!("Poll archived");
        }

        PollCommand::Unarchive { id } => {
            manager.unarchive(&RecordId::new(id)).await?;
            println!("Poll reactivated");
        }
    }
    Ok(())
}

fn print_card(card: &PollCard) {
    let Some(poll) = card.poll() else {
        return;
    };

    let status = match card.phase() {
        PollPhase::Ended(_) => "Ended",
        PollPhase::Voted => "Voted",
        _ => "Open",
    };

    println!();
    println!("{} [{}]  id={}", poll.title.to_uppercase(), status, poll.id);
    for row in card.tally() {
        let bar = "#".repeat((row.percentage / 5) as usize);
        println!(
            "  {:<24} {:>4} votes {:>3}%  {}",
            row.label, row.count, row.percentage, bar
        );
    }
}

async fn run_settings(
    editor: SettingsEditor,
    action: SettingsCommand,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        SettingsCommand::Show => {
            let draft = editor.load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&draft.payload())?);
                return Ok(());
            }
            println!("Name:  {}", draft.name);
            println!("Bio:   {}", draft.info);
            println!("Photo: {}", draft.photo_url);
            for (i, link) in draft.social_links.iter().enumerate() {
                println!("  [{}] {:<12} {}", i, link.platform, link.url);
            }
        }

        SettingsCommand::Set {
            name,
            bio,
            password,
            photo_url,
            photo_file,
            add_link,
            mut remove_link,
        } => {
            let mut draft = editor.load().await?;

            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(bio) = bio {
                draft.info = bio;
            }
            if let Some(password) = password {
                draft.password = password;
            }
            if let Some(url) = photo_url {
                draft.set_photo_url(url);
            }
            if let Some(path) = photo_file {
                draft.select_photo(PendingPhoto::from_path(&path)?);
            }

            // Highest index first so earlier removals don't shift later ones
            remove_link.sort_unstable_by(|a, b| b.cmp(a));
            remove_link.dedup();
            for index in remove_link {
                if draft.remove_social_link(index).is_none() {
                    bail!("No social link at position {}", index);
                }
            }
            for spec in add_link {
                let (platform, url) = spec
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected PLATFORM=URL, got {:?}", spec))?;
                draft.social_links.push(SocialLink::new(platform, url));
            }

            editor.save(&mut draft).await?;
            println!("Profile updated successfully!");
        }
    }
    Ok(())
}

/// RFC 3339, or a `YYYY-MM-DDTHH:MM` local time as typed into a date picker
fn parse_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("Invalid date/time: {}", s))?;

    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Ambiguous local time: {}", s))
}
