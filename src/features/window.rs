//! Lookback window selection
//!
//! Every statistic is computed over a window of an entity's history
//! strictly before the target date: the last N distinct game dates, or
//! all prior games. Windows are measured in distinct dates, so both ends
//! of a doubleheader are always selected together.

use crate::features::roles::{role_of, Role};
use crate::{GameAppearance, Handedness, PitchEvent, PitcherId, PlateAppearance};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A lookback scope: the last N games, or everything prior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Window {
    Games(usize),
    All,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Games(n) => write!(f, "{}", n),
            Window::All => write!(f, "All"),
        }
    }
}

impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Window::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Window::Games(n)),
            _ => Err(format!("Invalid window: {}. Use a positive integer or 'All'.", s)),
        }
    }
}

impl TryFrom<String> for Window {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Window> for String {
    fn from(w: Window) -> String {
        w.to_string()
    }
}

/// Rows that carry a game date
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for GameAppearance {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for PitchEvent {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for PlateAppearance {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Select the window of history rows for a target date
///
/// Only rows dated strictly before `target` are eligible; rows on or
/// after the target date never appear (look-ahead is forbidden). For
/// `Games(n)` the n most recent distinct dates are chosen and every row
/// sharing a chosen date is included. Fewer than n available dates is not
/// an error: whatever exists is returned, and an empty selection signals
/// "no history" to the aggregators.
pub fn select_window<'a, T: Dated>(
    history: &'a [T],
    target: NaiveDate,
    window: Window,
) -> Vec<&'a T> {
    let prior: Vec<&T> = history.iter().filter(|row| row.date() < target).collect();

    match window {
        Window::All => prior,
        Window::Games(n) => {
            let dates: BTreeSet<NaiveDate> = prior.iter().map(|row| row.date()).collect();
            let selected: BTreeSet<NaiveDate> = dates.into_iter().rev().take(n).collect();
            prior
                .into_iter()
                .filter(|row| selected.contains(&row.date()))
                .collect()
        }
    }
}

/// Explicit query predicate for aggregations
///
/// Enumerates the supported filter dimensions instead of ad-hoc optional
/// keywords: pitcher handedness, role set, and a specific pitcher.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub pitcher_hand: Option<Handedness>,
    pub roles: Option<Vec<Role>>,
    pub pitcher: Option<PitcherId>,
}

impl QueryFilter {
    pub fn with_hand(hand: Handedness) -> Self {
        QueryFilter {
            pitcher_hand: Some(hand),
            ..Default::default()
        }
    }

    pub fn with_roles(roles: Vec<Role>) -> Self {
        QueryFilter {
            roles: Some(roles),
            ..Default::default()
        }
    }

    /// Whether a pitch event passes every configured dimension
    ///
    /// An event with an unresolvable role is excluded by any role filter
    /// (never defaulted into a category).
    pub fn matches_event(&self, event: &PitchEvent) -> bool {
        if let Some(hand) = self.pitcher_hand {
            if event.pitcher_hand != Some(hand) {
                return false;
            }
        }
        if let Some(roles) = &self.roles {
            match role_of(event) {
                Some(role) if roles.contains(&role) => {}
                _ => return false,
            }
        }
        if let Some(pitcher) = &self.pitcher {
            if &event.pitcher != pitcher {
                return false;
            }
        }
        true
    }

    /// Whether a plate appearance passes the handedness dimension
    pub fn matches_pa(&self, pa: &PlateAppearance) -> bool {
        match self.pitcher_hand {
            Some(hand) => pa.pitcher_hand == hand,
            None => true,
        }
    }
}
