//! Extraction of curated games from the curator listing markup.

use std::collections::HashSet;

use tracing::warn;

use crate::dao::models::{AppId, TierEntity, TierId};

const BLOCK_MARKER: &str = "<div class=\"recommendation\"";
const APP_ID_ATTRIBUTE: &str = "data-ds-appid=";
const DESCRIPTION_MARKER: &str = "<div class=\"recommendation_desc\">";
const DESCRIPTION_END: &str = "</div>";

/// Tier assigned when neither the description nor the tier list identifies one.
pub const FALLBACK_TIER: TierId = 1;

/// Game entry as it appears on the curator listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedGame {
    /// Store identifier read from the block's `data-ds-appid` attribute.
    pub app_id: AppId,
    /// Curator blurb with line breaks and `&quot;` entities removed.
    pub description: String,
    /// Tier derived from the blurb's leading symbol.
    pub tier: TierId,
}

/// Parse every recommendation block of `markup`.
///
/// `tiers` must be ordered by ascending id: the longest symbol prefixing the description
/// wins and descriptions without a known symbol fall into the lowest tier.
/// Duplicate app ids keep their first occurrence.
pub fn parse_listing(markup: &str, tiers: &[TierEntity]) -> Vec<ListedGame> {
    let cleaned = markup
        .replace(['\r', '\n', '\t'], "")
        .replace("&quot;", "")
        .replace("class='recommendation'", "class=\"recommendation\"")
        .replace("class='recommendation_desc'", "class=\"recommendation_desc\"");
    let lowest_tier = tiers.first().map(|tier| tier.id).unwrap_or(FALLBACK_TIER);

    let mut seen = HashSet::new();
    cleaned
        .split(BLOCK_MARKER)
        .filter_map(|block| {
            let raw_id = attribute(block, APP_ID_ATTRIBUTE)?.trim();
            let app_id = match raw_id.parse::<AppId>() {
                Ok(app_id) => app_id,
                Err(err) => {
                    warn!(raw_id, error = %err, "skipping recommendation with invalid app id");
                    return None;
                }
            };
            if !seen.insert(app_id) {
                return None;
            }

            let description = between(block, DESCRIPTION_MARKER, DESCRIPTION_END)
                .map(str::trim)
                .unwrap_or_default()
                .to_owned();
            let tier = tier_for(&description, tiers).unwrap_or(lowest_tier);

            Some(ListedGame {
                app_id,
                description,
                tier,
            })
        })
        .collect()
}

/// Tier with the longest symbol prefixing `description`, so `★★` beats `★`.
pub fn tier_for(description: &str, tiers: &[TierEntity]) -> Option<TierId> {
    let description = description.trim_start();
    tiers
        .iter()
        .rev()
        .filter(|tier| !tier.symbol.is_empty() && description.starts_with(tier.symbol.as_str()))
        .max_by_key(|tier| tier.symbol.len())
        .map(|tier| tier.id)
}

/// Value of a quoted attribute, single or double quotes alike.
fn attribute<'a>(haystack: &'a str, name: &str) -> Option<&'a str> {
    let from = haystack.find(name)? + name.len();
    let rest = &haystack[from..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    between(rest, &quote.to_string(), &quote.to_string())
}

fn between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let rest = &haystack[from..];
    let to = rest.find(end).unwrap_or(rest.len());
    Some(&rest[..to])
}
