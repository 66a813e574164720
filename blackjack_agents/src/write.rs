use crate::ThreadSummary;
use blackjack_lib::Chips;
use std::collections::BTreeMap;
use std::io::Write;

/// Chip balance of every participant at every round index, `None` where nothing was recorded.
pub type ChipsHistory = BTreeMap<String, Vec<Option<Chips>>>;

const WIDTH: usize = 80;
const TEXT_WIDTH: usize = "Conservative AI Player".len() + 20;
const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;

fn csv_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes `history` as CSV: a `round` column followed by one column per participant. Rounds
/// nobody recorded are left blank.
pub fn write_history_csv(history: &ChipsHistory, mut writer: impl Write) -> std::io::Result<()> {
    let header: Vec<String> = std::iter::once("round".to_string())
        .chain(history.keys().map(|name| csv_field(name)))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    let rounds = history.values().map(Vec::len).max().unwrap_or(0);
    for round in 0..rounds {
        let row: Vec<String> = std::iter::once(round.to_string())
            .chain(history.values().map(|slots| match slots.get(round) {
                Some(Some(chips)) => chips.to_string(),
                _ => String::new(),
            }))
            .collect();
        writeln!(writer, "{}", row.join(","))?;
    }
    writer.flush()
}

/// Writes `history` as a pretty printed JSON object of name to balances, `null` for gaps.
pub fn write_history_json(history: &ChipsHistory, mut writer: impl Write) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, history)?;
    writeln!(writer)?;
    writer.flush()
}

fn profit(chips: Chips, start: Chips) -> String {
    let diff = chips - start;
    if diff >= 0 {
        format!("{} (+{})", chips, diff)
    } else {
        format!("{} ({})", chips, diff)
    }
}

/// Writes the final balance of every participant of every completed thread, along with the
/// profit relative to their starting balance.
pub fn write_final_summary(
    summaries: &[ThreadSummary],
    player_starting_chips: Chips,
    dealer_starting_chips: Chips,
    mut writer: impl Write,
) -> std::io::Result<()> {
    let mut summaries: Vec<&ThreadSummary> = summaries.iter().collect();
    summaries.sort_by_key(|s| s.thread_id);

    writeln!(writer, "{:-^WIDTH$}", " final statistics ")?;
    for summary in summaries {
        writeln!(writer, "{:-^WIDTH$}", format!(" thread #{} ", summary.thread_id))?;
        for (name, chips) in &summary.players {
            writeln!(
                writer,
                "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
                format!("{}:", name),
                profit(*chips, player_starting_chips)
            )?;
        }
        writeln!(
            writer,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            format!("{}:", crate::DEALER_NAME),
            profit(summary.dealer_chips, dealer_starting_chips)
        )?;
    }
    writeln!(writer, "{}", "-".repeat(WIDTH))?;
    writer.flush()
}
