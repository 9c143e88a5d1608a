use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;

use pulseboard::AppState;
use pulseboard::adapters::TokioTimeProvider;
use pulseboard::config::AppConfig;
use pulseboard::dashboard::{self, Timeframe};
use pulseboard::preferences::ThemeColor;
use pulseboard::session::{Credentials, SessionError, SessionState};
use pulseboard::storage::ProfileStore;

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

type CliState = AppState<TokioTimeProvider, ProfileStore>;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Execute {
        config: AppConfig,
        command: Command,
        verbose: u8,
    },
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();

    if let Command::Watch { interval_secs, .. } = &cli.command
        && *interval_secs == 0
    {
        eprintln!("error: --interval-secs must be greater than 0");
        return RunOutcome::Exit(2);
    }

    let profile_dir = match resolve_profile_dir(&cli.profile) {
        Ok(profile_dir) => profile_dir,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    RunOutcome::Execute {
        config: AppConfig {
            profile_dir,
            app_name: cli.app_name,
        },
        command: cli.command,
        verbose: cli.verbose,
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pulseboard",
    version,
    about = "Store analytics dashboard with a local profile"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, env = "PULSEBOARD_PROFILE")]
    profile: PathBuf,
    #[arg(long, default_value = "Pulseboard")]
    app_name: String,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show session, theme, and notification settings
    Status,
    /// Overview totals from the analytics snapshot
    Dashboard,
    /// Active-user series for a timeframe
    Analytics {
        #[arg(long, default_value = "daily")]
        timeframe: String,
    },
    /// Per-section wait times and staffing
    DataTable,
    /// Read or change profile preferences
    Settings {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        notifications: Option<String>,
    },
    /// Print synthesized notifications as they arrive
    Watch {
        #[arg(long, default_value_t = 3)]
        count: usize,
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

pub(crate) async fn execute(config: AppConfig, command: Command) -> i32 {
    let storage = match ProfileStore::open(&config.profile_dir) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("failed to open profile storage: {err}");
            return 1;
        }
    };
    let state = match AppState::new(config, TokioTimeProvider, storage) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let state = match &command {
        Command::Watch { interval_secs, .. } => {
            state.with_feed_interval(Duration::from_secs(*interval_secs))
        }
        _ => state,
    };

    state.start().await;
    let code = dispatch(&state, command).await;
    state.shutdown();
    code
}

async fn dispatch(state: &CliState, command: Command) -> i32 {
    match command {
        Command::Login { email, password } => run_login(state, email, password).await,
        Command::Logout => run_logout(state),
        Command::Status => run_status(state),
        Command::Dashboard => run_dashboard(state).await,
        Command::Analytics { timeframe } => run_analytics(state, &timeframe).await,
        Command::DataTable => run_data_table(state).await,
        Command::Settings {
            theme,
            notifications,
        } => run_settings(state, theme, notifications),
        Command::Watch { count, .. } => run_watch(state, count).await,
    }
}

async fn run_login(state: &CliState, email: String, password: String) -> i32 {
    match state.session.login(Credentials { email, password }).await {
        Ok(user) => {
            println!("Signed in as {} <{}>.", user.name, user.email);
            0
        }
        Err(SessionError::InvalidCredentials) => {
            eprintln!(
                "Invalid credentials: email is required and the password needs at least 6 characters."
            );
            1
        }
        Err(err) => {
            eprintln!("sign-in failed: {err}");
            1
        }
    }
}

fn run_logout(state: &CliState) -> i32 {
    state.session.logout();
    println!("Signed out.");
    0
}

fn run_status(state: &CliState) -> i32 {
    println!("App: {}", state.config.app_name);
    println!("Profile: {}", state.config.profile_dir.display());
    match state.session.snapshot().state {
        SessionState::Authenticated { user, .. } => {
            println!("Session: signed in as {} <{}>", user.name, user.email);
        }
        _ => println!("Session: signed out"),
    }
    let theme = state.preferences.theme_color();
    let palette = theme.palette();
    println!(
        "Theme: {theme} (primary {}, secondary {})",
        palette.primary, palette.secondary
    );
    println!(
        "Notifications: {}",
        if state.preferences.notifications_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );
    0
}

async fn run_dashboard(state: &CliState) -> i32 {
    if !require_session(state) {
        return 1;
    }
    let data = state.provider.fetch_dashboard_data().await;
    let summary = dashboard::summarize(&data);
    println!("Dashboard Overview");
    println!("  Total Active Users: {}", summary.total_active_users);
    println!("  Avg. Wait Time: {}s", summary.avg_wait_time_seconds);
    println!("  Avg. Utilization: {}%", summary.avg_utilization);
    println!(
        "  Sections: {}  Days tracked: {}",
        data.section_data.len(),
        data.active_users.len()
    );
    0
}

async fn run_analytics(state: &CliState, timeframe: &str) -> i32 {
    let timeframe: Timeframe = match timeframe.parse() {
        Ok(timeframe) => timeframe,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    if !require_session(state) {
        return 1;
    }
    let points = state.provider.fetch_active_users(timeframe).await;
    println!("Active Users ({timeframe})");
    for point in &points {
        println!("  {:<12} {:>8}", point.time_bucket, point.value);
    }
    0
}

async fn run_data_table(state: &CliState) -> i32 {
    if !require_session(state) {
        return 1;
    }
    let data = state.provider.fetch_dashboard_data().await;
    println!(
        "{:<18} {:>9} {:>12} {:>6}",
        "Location", "Wait (s)", "Utilization", "Staff"
    );
    for section in &data.section_data {
        let workforce = &section.metrics.work_force_utilization;
        println!(
            "{:<18} {:>9} {:>11}% {:>6}",
            section.location_name,
            section.metrics.wait_time_seconds,
            workforce.total,
            workforce.persons.len()
        );
        for person in &workforce.persons {
            println!("{:<18} {} {}", "", person.first_name, person.last_name);
        }
    }
    0
}

fn run_settings(
    state: &CliState,
    theme: Option<String>,
    notifications: Option<String>,
) -> i32 {
    let theme = match theme.as_deref().map(str::parse::<ThemeColor>).transpose() {
        Ok(theme) => theme,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    let notifications = match notifications.as_deref().map(parse_toggle).transpose() {
        Ok(notifications) => notifications,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    if !require_session(state) {
        return 1;
    }

    if theme.is_none() && notifications.is_none() {
        let current = state.preferences.theme_color();
        let palette = current.palette();
        println!(
            "Theme: {current} (primary {}, secondary {})",
            palette.primary, palette.secondary
        );
        println!(
            "Notifications: {}",
            if state.preferences.notifications_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );
        return 0;
    }

    if let Some(color) = theme {
        if let Err(err) = state.preferences.set_theme_color(color) {
            eprintln!("failed to persist theme: {err}");
            return 1;
        }
        println!("Theme set to {color}.");
    }

    if let Some(enabled) = notifications {
        if let Err(err) = state.set_notifications_enabled(enabled) {
            eprintln!("failed to persist notification preference: {err}");
            return 1;
        }
        println!(
            "Notifications {}.",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    0
}

async fn run_watch(state: &CliState, count: usize) -> i32 {
    if !require_session(state) {
        return 1;
    }
    if !state.preferences.notifications_enabled() {
        eprintln!("Notifications are disabled. Run `pulseboard settings --notifications on` first.");
        return 1;
    }

    println!("Watching for notifications, stopping after {count}. Press Ctrl-C to quit early.");
    let mut printed: HashSet<String> = HashSet::new();
    while printed.len() < count {
        tokio::time::sleep(WATCH_POLL_INTERVAL).await;
        for entry in state.feed.entries().into_iter().rev() {
            if printed.len() >= count {
                break;
            }
            if printed.insert(entry.id.clone()) {
                let stamp = entry
                    .created_at
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| entry.created_at.to_string());
                println!("[{stamp}] {}: {}", entry.title, entry.message);
            }
        }
    }
    // Displayed entries count as viewed.
    for id in &printed {
        state.feed.mark_read(id);
    }
    println!(
        "Collected {} notifications, {} left unread in the feed.",
        printed.len(),
        state.feed.unread_count()
    );
    0
}

fn require_session(state: &CliState) -> bool {
    if state.session.is_authenticated() {
        return true;
    }
    eprintln!("You are signed out. Run `pulseboard login --email <EMAIL> --password <PASSWORD>` first.");
    false
}

fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        _ => Err(format!("invalid toggle '{raw}', expected on or off")),
    }
}

fn resolve_profile_dir(raw: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(raw)
        .map_err(|err| format!("failed to create profile directory {}: {err}", raw.display()))?;
    let resolved = std::fs::canonicalize(raw)
        .map_err(|err| format!("failed to resolve profile directory {}: {err}", raw.display()))?;
    if !resolved.is_dir() {
        return Err(format!(
            "profile path is not a directory: {}",
            resolved.display()
        ));
    }
    Ok(resolved)
}
