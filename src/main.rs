use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chess_insight::aggregate::PlayerClient;
use chess_insight::config::Config;
use chess_insight::export::write_export;
use chess_insight::format::{extract_opening, format_date, format_time_control};
use chess_insight::game_view::{GameFilter, SortOrder};
use chess_insight::metrics::{StreakKind, Traversal, compute_metrics};
use chess_insight::model::{Outcome, TimeClass};
use chess_insight::rating_history::fetch_rating_history;
use chess_insight::state::{LoadOutcome, PlayerSnapshot, Session};

const LIST_LIMIT: usize = 20;

#[derive(Debug, Parser)]
#[command(name = "chess_insight")]
#[command(about = "Profile, games and streaks for a chess.com player", long_about = None)]
struct Cli {
    username: String,
    /// Second player for a head-to-head rating comparison.
    #[arg(long)]
    compare: Option<String>,
    /// Keep games whose time control contains this text (e.g. blitz).
    #[arg(long)]
    time_control: Option<String>,
    /// win, loss or draw.
    #[arg(long)]
    result: Option<Outcome>,
    /// date-desc, date-asc, rating-desc or rating-asc.
    #[arg(long, default_value = "date-desc")]
    sort: SortOrder,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Fetch the last months of archives and print rating series.
    #[arg(long)]
    history: bool,
    /// Compute streaks newest game first instead of oldest first.
    #[arg(long)]
    reverse_streaks: bool,
    /// Directory to write a JSON export into.
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let client = PlayerClient::from_config(&config).context("unable to set up api client")?;
    let mut session = Session::new();

    let update = session
        .load_player(&client, &cli.username, |pct| debug!("progress {pct:.0}%"))?;
    if let Some(notice) = update.notice.as_deref() {
        eprintln!("[WARN] {notice}");
    }
    let player = session
        .current()
        .cloned()
        .context("player was not loaded")?;

    print_player(&player, &cli);

    if cli.history {
        let history = fetch_rating_history(&client, &player.username, &player.data.archive_urls());
        println!();
        println!("Rating history (last {} months)", client.history_months());
        for time_class in TimeClass::ALL {
            let series = history.series(time_class);
            let (Some(first), Some(last)) = (series.first(), series.last()) else {
                continue;
            };
            println!(
                "  {:<7} {} points, {} -> {}",
                time_class.label(),
                series.len(),
                first.rating,
                last.rating
            );
        }
    }

    if let Some(dir) = cli.export.as_deref() {
        let path = write_export(&player, dir, Utc::now())?;
        println!();
        println!("Exported to {}", path.display());
    }

    if let Some(other) = cli.compare.as_deref() {
        session.enter_comparison();
        let update = session
            .load_player(&client, other, |pct| debug!("progress {pct:.0}%"))?;
        if let Some(notice) = update.notice.as_deref() {
            eprintln!("[WARN] {notice}");
        }
        if update.outcome == LoadOutcome::ComparisonReady {
            print_comparison(&session);
        }
        session.exit_comparison();
    }

    Ok(())
}

fn print_player(player: &PlayerSnapshot, cli: &Cli) {
    let profile = player.data.profile.data();
    let field = |name: &str| {
        profile
            .and_then(|p| p.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    println!(
        "{}",
        field("name")
            .or_else(|| field("username"))
            .unwrap_or_else(|| player.username.clone())
    );
    if let Some(location) = field("location") {
        println!("  Location: {location}");
    }
    if let Some(joined) = profile
        .and_then(|p| p.get("joined"))
        .and_then(|v| v.as_i64())
        .and_then(format_date)
    {
        println!("  Joined: {joined}");
    }
    if let Some(status) = field("status") {
        println!("  Status: {status}");
    }

    let stats = player.data.stats_summary();
    if !stats.is_empty() {
        println!();
        println!("Ratings");
        for entry in &stats.ratings {
            match entry.record {
                Some(r) => println!(
                    "  {:<7} {:>5}  {}W-{}L-{}D",
                    entry.time_class.label(),
                    entry.rating,
                    r.win,
                    r.loss,
                    r.draw
                ),
                None => println!("  {:<7} {:>5}", entry.time_class.label(), entry.rating),
            }
        }
        if let Some(tactics) = stats.tactics_highest {
            println!("  Tactics {tactics:>5}");
        }
        if let Some(rush) = stats.puzzle_rush_best {
            println!("  Puzzle Rush best {rush}");
        }
    }

    let clubs = player.data.clubs();
    let tournaments = player.data.finished_tournaments();
    let matches = player.data.finished_matches();
    println!();
    println!(
        "Clubs: {}  Finished tournaments: {}  Finished matches: {}",
        clubs.len(),
        tournaments.len(),
        matches.len()
    );
    for club in clubs.iter().take(LIST_LIMIT) {
        println!("  club  {}", club.name.as_deref().unwrap_or("Unnamed Club"));
    }
    for entry in tournaments.iter().take(LIST_LIMIT) {
        println!(
            "  tourn {}",
            entry.name.as_deref().unwrap_or("Unnamed Tournament")
        );
    }

    let games = player.data.recent_games();
    if games.is_empty() {
        println!();
        println!("No recent games available");
        return;
    }

    let traversal = if cli.reverse_streaks {
        Traversal::Reverse
    } else {
        Traversal::Forward
    };
    let metrics = compute_metrics(&games, &player.username, traversal);
    println!();
    println!(
        "Recent games: {}  Record: {}W-{}L-{}D  Win rate: {:.1}%",
        metrics.total_games, metrics.wins, metrics.losses, metrics.draws, metrics.win_rate
    );
    if metrics.current_streak.count > 0 {
        let kind = match metrics.current_streak.kind {
            StreakKind::Win => "Wins",
            StreakKind::Loss => "Losses",
            StreakKind::None => "",
        };
        println!("  Current streak: {} {kind}", metrics.current_streak.count);
    }
    println!(
        "  Best win streak: {}  Worst loss streak: {}",
        metrics.best_streak.count, metrics.worst_streak.count
    );

    let mut view = player.game_view();
    view.set_filter(GameFilter {
        time_control: cli.time_control.clone(),
        result: cli.result,
    });
    view.set_sort(cli.sort);
    if !view.go_to_page(cli.page) {
        eprintln!("[WARN] page {} does not exist, showing page 1", cli.page);
    }
    let page = view.current_page();
    if page.games.is_empty() {
        println!("  No games match the filters");
        return;
    }
    println!(
        "  Page {}/{} ({} matching)",
        page.page, page.total_pages, page.total_filtered
    );
    for game in page.games {
        let opponent = game.opponent_side(&player.username);
        let when = game
            .end_time
            .and_then(format_date)
            .unwrap_or_else(|| "N/A".to_string());
        let opening = game.pgn.as_deref().and_then(extract_opening);
        print!(
            "  {:<4} vs {} ({}) | {} | {}",
            game.outcome_for(&player.username).label(),
            opponent.username,
            opponent.rating.unwrap_or(0),
            format_time_control(&game.time_control),
            when
        );
        if let Some(opening) = opening {
            print!(" | {opening}");
        }
        println!();
    }
}

fn print_comparison(session: &Session) {
    let Some(comparison) = session.comparison() else {
        return;
    };
    let (Some(p1), Some(p2)) = (comparison.player1.as_ref(), comparison.player2.as_ref()) else {
        return;
    };
    println!();
    println!("{:<8} {:>12} {:>12}", "", p1.username, p2.username);
    let show = |v: Option<u32>| v.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
    for row in comparison.rows() {
        println!(
            "{:<8} {:>12} {:>12}",
            row.time_class.label(),
            show(row.player1),
            show(row.player2)
        );
    }
}
