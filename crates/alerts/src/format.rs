//! Report formatting for Telegram delivery.
//!
//! Telegram rejects messages past roughly 4096 characters; rows are
//! packed into chunks capped well below that so a report never needs a
//! row split across messages.

use stablewatch_core::RateItem;

/// Chunk ceiling for one Telegram message payload.
pub const MAX_CHUNK_CHARS: usize = 3500;

/// Smallest allowed report size.
pub const MIN_TOP_N: usize = 1;
/// Largest allowed report size.
pub const MAX_TOP_N: usize = 50;

/// Clamp a requested report size into the allowed range.
pub fn clamp_top_n(n: usize) -> usize {
    n.clamp(MIN_TOP_N, MAX_TOP_N)
}

/// Format one ranked report row as Telegram HTML.
pub fn format_row(rank: usize, item: &RateItem) -> String {
    let platform = if item.chain.is_empty() {
        item.platform.to_string()
    } else {
        format!("{} ({})", item.platform, item.chain)
    };
    format!(
        "{rank:>2}. <b>{platform}</b> — <b>{apy:.2}%</b> APY  |  TVL: {tvl}\n{url}",
        apy = item.apy,
        tvl = format_usd(item.tvl_usd),
        url = item.source_url,
    )
}

/// Dollar amount with thousands separators, no decimals.
pub fn format_usd(value: f64) -> String {
    let negative = value < 0.0;
    let mut digits = format!("{:.0}", value.abs());
    let mut insert_at = digits.len() as isize - 3;
    while insert_at > 0 {
        digits.insert(insert_at as usize, ',');
        insert_at -= 3;
    }
    if negative {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Render the top `top_n` items as message chunks.
///
/// `top_n` is clamped to `MIN_TOP_N..=MAX_TOP_N`. Each chunk stays under
/// [`MAX_CHUNK_CHARS`] and rows are never split across chunks.
pub fn build_report(items: &[RateItem], top_n: usize) -> Vec<String> {
    let top_n = clamp_top_n(top_n);
    let mut chunks = Vec::new();
    let mut buf = String::new();

    for (i, item) in items.iter().take(top_n).enumerate() {
        let row = format_row(i + 1, item);
        if !buf.is_empty() && buf.len() + row.len() > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut buf));
        }
        buf.push_str(&row);
        buf.push_str("\n\n");
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}
