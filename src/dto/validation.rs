//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

use crate::dto::catalog::TierDto;

/// Validates that a Discord identifier is a snowflake: 1 to 20 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_discord_id("80351110224678912") // Ok
/// validate_discord_id("abc")               // Err - not numeric
/// validate_discord_id("")                  // Err - empty
/// ```
pub fn validate_discord_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 20 {
        let mut err = ValidationError::new("discord_id_length");
        err.message = Some(
            format!("Discord ID must be between 1 and 20 digits (got {})", id.len()).into(),
        );
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("discord_id_format");
        err.message = Some("Discord ID must contain only digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a tier list is non-empty, uses unique identifiers and unique symbols.
pub fn validate_tier_list(tiers: &[TierDto]) -> Result<(), ValidationError> {
    if tiers.is_empty() {
        let mut err = ValidationError::new("tiers_empty");
        err.message = Some("At least one tier is required".into());
        return Err(err);
    }

    let mut ids = HashSet::new();
    let mut symbols = HashSet::new();
    for tier in tiers {
        if !ids.insert(tier.id) {
            let mut err = ValidationError::new("tier_id_duplicate");
            err.message = Some(format!("Tier {} is defined more than once", tier.id).into());
            return Err(err);
        }
        let symbol = tier.symbol.trim();
        if !symbols.insert(symbol) {
            let mut err = ValidationError::new("tier_symbol_duplicate");
            err.message = Some(format!("Symbol `{symbol}` is used by several tiers").into());
            return Err(err);
        }
    }

    Ok(())
}
