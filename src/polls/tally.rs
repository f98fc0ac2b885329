//! Vote tallies
//!
//! Percentages are rounded per option, so a poll's rendered percentages do
//! not always sum to exactly 100. Options keep the server's order.

use super::types::Poll;

/// One row of a rendered tally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    pub key: String,
    pub label: String,
    pub count: u64,
    pub percentage: u32,
}

/// `round(count / total * 100)`, or 0 when nobody has voted
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Tally every option of a poll in server order
pub fn tally(poll: &Poll) -> Vec<TallyRow> {
    let total = poll.total_votes();
    poll.elements
        .iter()
        .map(|option| TallyRow {
            key: option.key().to_string(),
            label: option.label.clone(),
            count: option.count,
            percentage: percentage(option.count, total),
        })
        .collect()
}
