use std::cmp::Reverse;
use std::str::FromStr;

use crate::model::{Game, Outcome};

pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    RatingDesc,
    RatingAsc,
}

impl SortOrder {
    pub fn key(self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date-desc",
            SortOrder::DateAsc => "date-asc",
            SortOrder::RatingDesc => "rating-desc",
            SortOrder::RatingAsc => "rating-asc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date-desc" => Ok(SortOrder::DateDesc),
            "date-asc" => Ok(SortOrder::DateAsc),
            "rating-desc" => Ok(SortOrder::RatingDesc),
            "rating-asc" => Ok(SortOrder::RatingAsc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Conjunctive game filter. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    pub time_control: Option<String>,
    pub result: Option<Outcome>,
}

impl GameFilter {
    pub fn matches(&self, game: &Game, username: &str) -> bool {
        let tc_ok = self
            .time_control
            .as_deref()
            .is_none_or(|tc| game.matches_time_control(tc));
        let result_ok = self
            .result
            .is_none_or(|wanted| game.outcome_for(username) == wanted);
        tc_ok && result_ok
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GamePage<'a> {
    pub games: Vec<&'a Game>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
}

pub fn total_pages(filtered: usize) -> usize {
    filtered.div_ceil(PAGE_SIZE)
}

/// Filters then sorts. The sort is stable, so ties keep their input order.
pub fn filter_and_sort<'a>(
    games: &'a [Game],
    username: &str,
    filter: &GameFilter,
    sort: SortOrder,
) -> Vec<&'a Game> {
    view_indices(games, username, filter, sort)
        .into_iter()
        .map(|idx| &games[idx])
        .collect()
}

fn view_indices(games: &[Game], username: &str, filter: &GameFilter, sort: SortOrder) -> Vec<usize> {
    let mut out: Vec<usize> = (0..games.len())
        .filter(|idx| filter.matches(&games[*idx], username))
        .collect();
    match sort {
        SortOrder::DateDesc => out.sort_by_key(|idx| Reverse(games[*idx].end_time_or_zero())),
        SortOrder::DateAsc => out.sort_by_key(|idx| games[*idx].end_time_or_zero()),
        SortOrder::RatingDesc => {
            out.sort_by_key(|idx| Reverse(games[*idx].opponent_rating(username)))
        }
        SortOrder::RatingAsc => out.sort_by_key(|idx| games[*idx].opponent_rating(username)),
    }
    out
}

/// Slice of an already filtered list; pages past the end are empty.
pub fn paginate<'a>(filtered: &[&'a Game], page: usize) -> Vec<&'a Game> {
    if page == 0 {
        return Vec::new();
    }
    filtered
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .copied()
        .collect()
}

pub fn apply<'a>(
    games: &'a [Game],
    username: &str,
    filter: &GameFilter,
    sort: SortOrder,
    page: usize,
) -> GamePage<'a> {
    let filtered = filter_and_sort(games, username, filter, sort);
    GamePage {
        games: paginate(&filtered, page),
        page,
        total_pages: total_pages(filtered.len()),
        total_filtered: filtered.len(),
    }
}

/// Filter, sort and page state over one player's games. The source list is
/// never reordered; every change recomputes the filtered view.
#[derive(Debug, Clone)]
pub struct GameView {
    games: Vec<Game>,
    username: String,
    filter: GameFilter,
    sort: SortOrder,
    page: usize,
    filtered: Vec<usize>,
}

impl GameView {
    /// Takes games in upstream (oldest first) order and keeps them newest first.
    pub fn new(mut chronological: Vec<Game>, username: &str) -> Self {
        chronological.reverse();
        let mut view = Self {
            games: chronological,
            username: username.to_string(),
            filter: GameFilter::default(),
            sort: SortOrder::default(),
            page: 1,
            filtered: Vec::new(),
        };
        view.refresh();
        view
    }

    fn refresh(&mut self) {
        self.filtered = view_indices(&self.games, &self.username, &self.filter, self.sort);
        self.page = 1;
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn filter(&self) -> &GameFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn set_filter(&mut self, filter: GameFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn set_time_control(&mut self, time_control: Option<String>) {
        self.filter.time_control = time_control.filter(|tc| !tc.trim().is_empty());
        self.refresh();
    }

    pub fn set_result(&mut self, result: Option<Outcome>) {
        self.filter.result = result;
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.refresh();
    }

    pub fn reset(&mut self) {
        self.filter = GameFilter::default();
        self.sort = SortOrder::default();
        self.refresh();
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_filtered(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len())
    }

    /// Moves to `page` if it exists. Returns false and stays put otherwise.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages().max(1) {
            return false;
        }
        self.page = page;
        true
    }

    pub fn filtered_games(&self) -> Vec<&Game> {
        self.filtered.iter().map(|idx| &self.games[*idx]).collect()
    }

    pub fn current_page(&self) -> GamePage<'_> {
        let filtered = self.filtered_games();
        GamePage {
            games: paginate(&filtered, self.page),
            page: self.page,
            total_pages: total_pages(filtered.len()),
            total_filtered: filtered.len(),
        }
    }
}
