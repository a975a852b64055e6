//! Per-game feature assembly
//!
//! Produces one feature row for a (batter, game) pair by running the
//! window selector and rate aggregators over every window x category
//! combination. All history lives in an immutable context built once at
//! startup; nothing is mutated while rows are assembled, so the same
//! underlying log rows serve every target date unchanged.

use crate::features::rates;
use crate::features::roles::Role;
use crate::features::window::{select_window, QueryFilter, Window};
use crate::{BatterId, GameAppearance, Handedness, PitchEvent, PlateAppearance, TeamAbbr};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Immutable snapshot of all ingested history, grouped for assembly
///
/// Replaces the mutable roster/cache state of the legacy pipeline: built
/// once from the cleaned tables and passed by shared reference.
pub struct HistoryContext {
    games_by_batter: HashMap<BatterId, Vec<GameAppearance>>,
    pas_by_batter: HashMap<BatterId, Vec<PlateAppearance>>,
    events_by_team: HashMap<TeamAbbr, Vec<PitchEvent>>,
}

impl HistoryContext {
    /// Group and date-sort the cleaned tables
    pub fn new(
        games: Vec<GameAppearance>,
        plate_appearances: Vec<PlateAppearance>,
        pitch_events: Vec<PitchEvent>,
    ) -> Self {
        let mut games_by_batter: HashMap<BatterId, Vec<GameAppearance>> = HashMap::new();
        for game in games {
            games_by_batter.entry(game.batter.clone()).or_default().push(game);
        }
        for history in games_by_batter.values_mut() {
            history.sort_by_key(|g| g.date);
        }

        let mut pas_by_batter: HashMap<BatterId, Vec<PlateAppearance>> = HashMap::new();
        for pa in plate_appearances {
            pas_by_batter.entry(pa.batter.clone()).or_default().push(pa);
        }
        for history in pas_by_batter.values_mut() {
            history.sort_by_key(|pa| pa.date);
        }

        let mut events_by_team: HashMap<TeamAbbr, Vec<PitchEvent>> = HashMap::new();
        for event in pitch_events {
            events_by_team.entry(event.team.clone()).or_default().push(event);
        }
        for history in events_by_team.values_mut() {
            history.sort_by_key(|e| e.date);
        }

        HistoryContext {
            games_by_batter,
            pas_by_batter,
            events_by_team,
        }
    }

    /// Tracked batters, in stable id order
    pub fn batters(&self) -> Vec<&BatterId> {
        let mut ids: Vec<&BatterId> = self.games_by_batter.keys().collect();
        ids.sort();
        ids
    }

    /// Full game log for a batter, sorted by date
    pub fn games_for(&self, batter: &BatterId) -> Option<&[GameAppearance]> {
        self.games_by_batter.get(batter).map(Vec::as_slice)
    }

    fn pas_for(&self, batter: &BatterId) -> &[PlateAppearance] {
        self.pas_by_batter.get(batter).map(Vec::as_slice).unwrap_or(&[])
    }

    fn events_for(&self, team: &TeamAbbr) -> &[PitchEvent] {
        self.events_by_team.get(team).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One training example: identifiers, per-window features, label
///
/// The column set is fixed: a window with no usable data yields `None`,
/// never a dropped column, so columns align positionally across rows.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub batter: BatterId,
    pub date: NaiveDate,
    pub opponent: TeamAbbr,
    /// Batter's mean hits per game, one value per window
    pub hits_per_game: Vec<Option<f64>>,
    /// Batter's hits per PA vs the opposing starter's hand, per window
    pub hits_per_pa: Vec<Option<f64>>,
    /// Opposing starter's hits allowed per out, per window
    pub starter_hits_per_out: Vec<Option<f64>>,
    /// Opposing bullpen's hits allowed per out, per window
    pub bullpen_hits_per_out: Vec<Option<f64>>,
    /// Label: hits in this game
    pub hits: u32,
}

impl FeatureRow {
    /// Feature values flattened in canonical column order
    pub fn values(&self) -> Vec<Option<f64>> {
        let mut values = Vec::with_capacity(self.hits_per_game.len() * 4);
        values.extend(&self.hits_per_game);
        values.extend(&self.hits_per_pa);
        values.extend(&self.starter_hits_per_out);
        values.extend(&self.bullpen_hits_per_out);
        values
    }
}

/// Assembles one feature row per (batter, game) pair
pub struct FeatureAssembler<'a> {
    context: &'a HistoryContext,
    windows: &'a [Window],
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(context: &'a HistoryContext, windows: &'a [Window]) -> Self {
        FeatureAssembler { context, windows }
    }

    /// Build the feature row for one of the batter's games
    ///
    /// Every window uses only history dated strictly before the game.
    /// Unresolved inputs (starter hand unknown, no role-resolved events,
    /// empty window) surface as nulls; imputation is left to the
    /// modeling stage.
    pub fn assemble(&self, game: &GameAppearance) -> FeatureRow {
        let batter_games = self
            .context
            .games_for(&game.batter)
            .unwrap_or(&[]);
        let batter_pas = self.context.pas_for(&game.batter);
        let opponent_events = self.context.events_for(&game.opponent);

        let starter_filter = QueryFilter::with_roles(vec![Role::Starter]);
        let bullpen_filter =
            QueryFilter::with_roles(vec![Role::MiddleReliever, Role::EndingPitcher]);
        let hand_filter = game.starter_hand.map(QueryFilter::with_hand);

        let mut hits_per_game = Vec::with_capacity(self.windows.len());
        let mut hits_per_pa = Vec::with_capacity(self.windows.len());
        let mut starter_hits_per_out = Vec::with_capacity(self.windows.len());
        let mut bullpen_hits_per_out = Vec::with_capacity(self.windows.len());

        for &window in self.windows {
            let own_games = select_window(batter_games, game.date, window);
            hits_per_game.push(rates::hits_per_game(&own_games));

            // Null when the opposing starter's hand never resolved
            let vs_hand = match &hand_filter {
                Some(filter) => {
                    let own_pas = select_window(batter_pas, game.date, window);
                    rates::hits_per_pa(&own_pas, filter)
                }
                None => None,
            };
            hits_per_pa.push(vs_hand);

            // Team-history scope: the opponent's pitching as a staff, not
            // any one pitcher's cross-team record
            let staff_events = select_window(opponent_events, game.date, window);
            starter_hits_per_out.push(rates::hits_per_out(&staff_events, &starter_filter));
            bullpen_hits_per_out.push(rates::hits_per_out(&staff_events, &bullpen_filter));
        }

        FeatureRow {
            batter: game.batter.clone(),
            date: game.date,
            opponent: game.opponent.clone(),
            hits_per_game,
            hits_per_pa,
            starter_hits_per_out,
            bullpen_hits_per_out,
            hits: game.hits,
        }
    }

    pub fn windows(&self) -> &[Window] {
        self.windows
    }
}

/// Starting-pitcher handedness for a team on a date, from the context's
/// pitch events
pub fn starter_hand_for(
    context: &HistoryContext,
    team: &TeamAbbr,
    date: NaiveDate,
) -> Option<Handedness> {
    let events = context.events_for(team);
    crate::features::roles::starter_hands(events)
        .get(&(team.clone(), date))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PitcherId;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn game(batter: &str, date: NaiveDate, opp: &str, hits: u32) -> GameAppearance {
        GameAppearance {
            batter: BatterId(batter.to_string()),
            date,
            opponent: TeamAbbr::new(opp),
            hits,
            plate_appearances: 4,
            starter_hand: Some(Handedness::Right),
        }
    }

    fn pa(batter: &str, date: NaiveDate, hand: Handedness, hit: bool) -> PlateAppearance {
        PlateAppearance {
            batter: BatterId(batter.to_string()),
            date,
            pitcher_hand: hand,
            hit,
        }
    }

    fn event(team: &str, date: NaiveDate, inning_start: u32, outcome: &str) -> PitchEvent {
        PitchEvent {
            pitcher: PitcherId(format!("{}-p{}", team, inning_start)),
            date,
            inning: inning_start,
            outcome: Some(outcome.to_string()),
            team: TeamAbbr::new(team),
            pitcher_hand: Some(Handedness::Right),
            inning_start: Some(inning_start),
        }
    }

    fn windows() -> Vec<Window> {
        vec![Window::Games(1), Window::Games(3), Window::Games(7), Window::All]
    }

    fn scenario_context() -> HistoryContext {
        let games = vec![
            game("b1", d(4, 1), "BOS", 2),
            game("b1", d(4, 3), "BOS", 0),
            game("b1", d(4, 5), "BOS", 1),
            game("b1", d(4, 6), "BOS", 1),
        ];
        let pas = vec![
            pa("b1", d(4, 1), Handedness::Right, true),
            pa("b1", d(4, 1), Handedness::Right, false),
            pa("b1", d(4, 3), Handedness::Right, false),
            pa("b1", d(4, 5), Handedness::Right, true),
        ];
        let events = vec![
            event("BOS", d(4, 1), 1, "single"),
            event("BOS", d(4, 1), 1, "field_out"),
            event("BOS", d(4, 1), 8, "field_out"),
            event("BOS", d(4, 3), 1, "field_out"),
            event("BOS", d(4, 5), 7, "double"),
            event("BOS", d(4, 5), 7, "field_out"),
        ];
        HistoryContext::new(games, pas, events)
    }

    #[test]
    fn test_window_3_hits_per_game() {
        let context = scenario_context();
        let assembler = FeatureAssembler::new(&context, &[Window::Games(3)]);

        let target = game("b1", d(4, 6), "BOS", 1);
        let row = assembler.assemble(&target);

        // Games on 4/1 (2), 4/3 (0), 4/5 (1) -> mean 1.0
        assert_eq!(row.hits_per_game, vec![Some(1.0)]);
    }

    #[test]
    fn test_unresolved_starter_hand_yields_null_pa_rate() {
        let context = scenario_context();
        let w = windows();
        let assembler = FeatureAssembler::new(&context, &w);

        let mut target = game("b1", d(4, 6), "BOS", 1);
        target.starter_hand = None;
        let row = assembler.assemble(&target);

        assert!(row.hits_per_pa.iter().all(Option::is_none));
        // Other categories are unaffected
        assert!(row.hits_per_game.iter().any(Option::is_some));
    }

    #[test]
    fn test_starter_and_bullpen_scopes() {
        let context = scenario_context();
        let w = windows();
        let assembler = FeatureAssembler::new(&context, &w);

        let target = game("b1", d(4, 6), "BOS", 1);
        let row = assembler.assemble(&target);

        // All-window starter events: 1 hit, 2 outs -> 0.5
        assert_eq!(row.starter_hits_per_out[3], Some(0.5));
        // All-window bullpen events: 1 hit, 2 outs -> 0.5
        assert_eq!(row.bullpen_hits_per_out[3], Some(0.5));
        // Last-1-date window (4/5) has no starter events at all
        assert_eq!(row.starter_hits_per_out[0], None);
    }

    #[test]
    fn test_first_game_has_all_null_features() {
        let context = scenario_context();
        let w = windows();
        let assembler = FeatureAssembler::new(&context, &w);

        let target = game("b1", d(4, 1), "BOS", 2);
        let row = assembler.assemble(&target);

        assert!(row.values().iter().all(Option::is_none));
        assert_eq!(row.hits, 2);
    }

    #[test]
    fn test_fixed_value_count() {
        let context = scenario_context();
        let w = windows();
        let assembler = FeatureAssembler::new(&context, &w);

        for date in [d(4, 1), d(4, 3), d(4, 6)] {
            let row = assembler.assemble(&game("b1", date, "BOS", 0));
            assert_eq!(row.values().len(), 16);
        }
    }

    #[test]
    fn test_starter_hand_lookup() {
        let context = scenario_context();
        assert_eq!(
            starter_hand_for(&context, &TeamAbbr::new("BOS"), d(4, 1)),
            Some(Handedness::Right)
        );
        assert_eq!(
            starter_hand_for(&context, &TeamAbbr::new("BOS"), d(4, 2)),
            None
        );
    }
}
