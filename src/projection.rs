// View Projection - display-only aggregates derived from session state
//
// Nothing here mutates the catalog or the session.

use serde::Serialize;

use crate::engines::prediction::{odds, option_pools, share};
use crate::models::{ActivityEntry, Market, MarketKind, Participant, MAX_OPTIONS};
use crate::session::Session;

/// Rows on the big-screen leaderboard
pub const LEADERBOARD_SIZE: usize = 5;

/// Entries in the big-screen ticker
pub const TICKER_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionLine {
    pub index: usize,
    pub label: String,
    pub pool: f64,
    pub odds: f64,
    /// Percentage of all staked value
    pub share: f64,
}

/// Per-option pools, odds and shares for a Prediction market
pub fn option_lines(market: &Market, participants: &[Participant]) -> Vec<OptionLine> {
    let pools = option_pools(participants, market.options.len());
    let staked: f64 = pools.iter().sum();

    market
        .options
        .iter()
        .zip(pools.iter())
        .enumerate()
        .map(|(index, (label, pool))| OptionLine {
            index,
            label: label.clone(),
            pool: *pool,
            odds: odds(staked, *pool),
            share: share(*pool, &pools),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub label: String,
    pub address: String,
    pub score: u32,
}

/// Top participants by score, ties kept in join order
pub fn leaderboard(participants: &[Participant], limit: usize) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
        .into_iter()
        .take(limit)
        .map(|p| LeaderboardRow {
            label: p.address.chars().take(6).collect(),
            address: p.address.clone(),
            score: p.score,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub name: String,
    pub value: f64,
}

/// Chart data for the big-screen display
pub fn chart(market: &Market, participants: &[Participant]) -> Vec<ChartRow> {
    match market.kind {
        MarketKind::Prediction => option_lines(market, participants)
            .into_iter()
            .take(MAX_OPTIONS)
            .map(|line| ChartRow { name: line.label, value: line.pool })
            .collect(),
        MarketKind::Arena | MarketKind::RedPacket => leaderboard(participants, LEADERBOARD_SIZE)
            .into_iter()
            .map(|row| ChartRow { name: row.label, value: row.score as f64 })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BigScreen {
    pub market: Market,
    pub chart: Vec<ChartRow>,
    pub participant_count: usize,
    pub ticker: Vec<ActivityEntry>,
}

pub fn big_screen(market: &Market, session: &Session) -> BigScreen {
    BigScreen {
        market: market.clone(),
        chart: chart(market, &session.participants),
        participant_count: session.participants.len(),
        ticker: session.recent_activity(TICKER_SIZE).into_iter().cloned().collect(),
    }
}

/// Total handed out by a red packet this session
pub fn claimed_total(participants: &[Participant]) -> f64 {
    participants.iter().filter_map(|p| p.claimed_amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarketStatus;

    fn market(kind: MarketKind, options: &[&str]) -> Market {
        Market {
            id: "m".into(),
            kind,
            title: "t".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            entry_fee: 1.0,
            total_pool: 0.0,
            created_at: 0,
            status: MarketStatus::Open,
            creator: "0xc".into(),
        }
    }

    fn scored(address: &str, score: u32) -> Participant {
        let mut p = Participant::player(address);
        p.score = score;
        p
    }

    #[test]
    fn test_option_lines() {
        let m = market(MarketKind::Prediction, &["A", "B", "C"]);
        let participants = vec![Participant::bettor("0xa", 0, 2.0), Participant::bettor("0xb", 1, 3.0)];

        let lines = option_lines(&m, &participants);
        assert_eq!(lines[0].odds, 2.5);
        assert_eq!(lines[0].share, 40.0);
        assert_eq!(lines[1].share, 60.0);
        assert_eq!(lines[2].odds, 2.0);
        assert_eq!(lines[2].share, 0.0);
    }

    #[test]
    fn test_leaderboard_top_five() {
        let participants: Vec<Participant> = (0..8).map(|i| scored(&format!("0x{:08}", i), i * 10)).collect();
        let rows = leaderboard(&participants, LEADERBOARD_SIZE);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].score, 70);
        assert_eq!(rows[4].score, 30);
        assert_eq!(rows[0].label, "0x0000");
    }

    #[test]
    fn test_chart_by_kind() {
        let prediction = market(MarketKind::Prediction, &["Yes", "No"]);
        let rows = chart(&prediction, &[Participant::bettor("0xa", 1, 4.0)]);
        assert_eq!(rows, vec![
            ChartRow { name: "Yes".into(), value: 0.0 },
            ChartRow { name: "No".into(), value: 4.0 },
        ]);

        let arena = market(MarketKind::Arena, &[]);
        let rows = chart(&arena, &[scored("0xaaaaaaaa", 3), scored("0xbbbbbbbb", 9)]);
        assert_eq!(rows[0].name, "0xbbbb");
        assert_eq!(rows[0].value, 9.0);
    }

    #[test]
    fn test_claimed_total() {
        let participants = vec![Participant::claimer("0xa", 1.25), Participant::claimer("0xb", 2.0)];
        assert_eq!(claimed_total(&participants), 3.25);
    }
}
