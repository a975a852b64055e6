//! Pitcher role classification
//!
//! A pitcher's role in a game is derived from the earliest inning they
//! worked in that appearance: Starter (inning <= 3), MiddleReliever
//! (4-6), EndingPitcher (7+). Both pitch-level innings and box-score
//! "entered in inning N" ordinals feed the same boundaries.

use crate::{Handedness, PitchEvent, PitcherId, TeamAbbr};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;

/// Pitcher role for one game appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Starter,
    MiddleReliever,
    EndingPitcher,
}

impl Role {
    /// Classify from the earliest inning pitched in the appearance
    ///
    /// Boundaries are inclusive downward: inning 3 is still a Starter,
    /// inning 6 still a MiddleReliever.
    pub fn from_starting_inning(inning: u32) -> Role {
        if inning <= 3 {
            Role::Starter
        } else if inning <= 6 {
            Role::MiddleReliever
        } else {
            Role::EndingPitcher
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Starter => "Starter",
            Role::MiddleReliever => "MiddleReliever",
            Role::EndingPitcher => "EndingPitcher",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Assign `inning_start` to every pitch event
///
/// For each (pitcher, date) group the starting inning is the minimum
/// inning observed in the group, so the field is constant within a group.
/// Groups that never resolve an inning keep `None` and stay outside every
/// role category.
pub fn assign_starting_innings(events: &mut [PitchEvent]) {
    let mut min_innings: HashMap<(PitcherId, NaiveDate), u32> = HashMap::new();

    for event in events.iter() {
        min_innings
            .entry((event.pitcher.clone(), event.date))
            .and_modify(|inning| *inning = (*inning).min(event.inning))
            .or_insert(event.inning);
    }

    for event in events.iter_mut() {
        event.inning_start = min_innings.get(&(event.pitcher.clone(), event.date)).copied();
    }
}

/// Resolved role of a pitch event, if its starting inning is known
pub fn role_of(event: &PitchEvent) -> Option<Role> {
    event.inning_start.map(Role::from_starting_inning)
}

/// Extract a starting inning from a box-score "entered in inning N" ordinal
///
/// Accepts strings like "1", "7th", "entered 8th"; the first run of digits
/// is the inning. The resulting inning is classified with the same
/// boundaries as pitch-level data.
pub fn starting_inning_from_entered(text: &str) -> Option<u32> {
    let digits = Regex::new(r"\d+").unwrap();
    digits.find(text)?.as_str().parse().ok()
}

/// Throwing hand of each team's starting pitcher per game date
///
/// The starter is the pitcher with the lowest starting inning for that
/// team and date; resolution is independent of input row order. Teams
/// whose starter has no recorded hand are absent from the map.
pub fn starter_hands(events: &[PitchEvent]) -> HashMap<(TeamAbbr, NaiveDate), Handedness> {
    // (earliest starting inning, hand) per team-date
    let mut best: HashMap<(TeamAbbr, NaiveDate), (u32, Option<Handedness>)> = HashMap::new();

    for event in events {
        let Some(start) = event.inning_start else {
            continue;
        };
        let key = (event.team.clone(), event.date);
        match best.get(&key) {
            Some((current, _)) if *current <= start => {}
            _ => {
                best.insert(key, (start, event.pitcher_hand));
            }
        }
    }

    best.into_iter()
        .filter_map(|(key, (_, hand))| hand.map(|h| (key, h)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(pitcher: &str, date: NaiveDate, inning: u32) -> PitchEvent {
        PitchEvent {
            pitcher: PitcherId(pitcher.to_string()),
            date,
            inning,
            outcome: Some("field_out".to_string()),
            team: TeamAbbr::new("NYY"),
            pitcher_hand: Some(Handedness::Right),
            inning_start: None,
        }
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    #[test]
    fn test_boundary_innings() {
        assert_eq!(Role::from_starting_inning(1), Role::Starter);
        assert_eq!(Role::from_starting_inning(3), Role::Starter);
        assert_eq!(Role::from_starting_inning(4), Role::MiddleReliever);
        assert_eq!(Role::from_starting_inning(6), Role::MiddleReliever);
        assert_eq!(Role::from_starting_inning(7), Role::EndingPitcher);
        assert_eq!(Role::from_starting_inning(9), Role::EndingPitcher);
    }

    #[test]
    fn test_starting_inning_is_group_minimum() {
        let mut events = vec![
            event("p1", d(4, 1), 3),
            event("p1", d(4, 1), 1),
            event("p1", d(4, 1), 2),
            event("p2", d(4, 1), 7),
        ];
        assign_starting_innings(&mut events);

        assert!(events[..3].iter().all(|e| e.inning_start == Some(1)));
        assert_eq!(events[3].inning_start, Some(7));
        assert_eq!(role_of(&events[0]), Some(Role::Starter));
        assert_eq!(role_of(&events[3]), Some(Role::EndingPitcher));
    }

    #[test]
    fn test_same_pitcher_different_dates() {
        let mut events = vec![event("p1", d(4, 1), 1), event("p1", d(4, 5), 6)];
        assign_starting_innings(&mut events);

        assert_eq!(events[0].inning_start, Some(1));
        assert_eq!(events[1].inning_start, Some(6));
        assert_eq!(role_of(&events[1]), Some(Role::MiddleReliever));
    }

    #[test]
    fn test_entered_ordinal_extraction() {
        assert_eq!(starting_inning_from_entered("1"), Some(1));
        assert_eq!(starting_inning_from_entered("7th"), Some(7));
        assert_eq!(starting_inning_from_entered("entered 8th"), Some(8));
        assert_eq!(starting_inning_from_entered("CG"), None);
    }

    #[test]
    fn test_entered_ordinal_uses_same_boundaries() {
        let inning = starting_inning_from_entered("6th").unwrap();
        assert_eq!(Role::from_starting_inning(inning), Role::MiddleReliever);
    }

    #[test]
    fn test_starter_hand_picks_lowest_inning() {
        let mut starter = event("p1", d(4, 1), 1);
        starter.pitcher_hand = Some(Handedness::Left);
        let mut reliever = event("p2", d(4, 1), 8);
        reliever.pitcher_hand = Some(Handedness::Right);

        // Reliever listed first; resolution must not depend on order
        let mut events = vec![reliever, starter];
        assign_starting_innings(&mut events);
        let hands = starter_hands(&events);

        assert_eq!(
            hands.get(&(TeamAbbr::new("NYY"), d(4, 1))),
            Some(&Handedness::Left)
        );
    }
}
