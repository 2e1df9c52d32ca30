use std::collections::HashMap;

use serde::Deserialize;

/// Envelope returned by the curator listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListingEnvelope {
    #[serde(default)]
    pub results_html: Option<String>,
}

/// Details endpoint payload, keyed by the stringified app id.
pub type AppDetailsResponse = HashMap<String, AppDetailsEnvelope>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<AppDetailsData>,
}

#[derive(Debug, Deserialize)]
pub struct AppDetailsData {
    pub name: Option<String>,
    pub header_image: Option<String>,
    pub achievements: Option<AchievementsData>,
    pub price_overview: Option<PriceOverview>,
}

#[derive(Debug, Deserialize)]
pub struct AchievementsData {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Deserialize)]
pub struct PriceOverview {
    #[serde(default)]
    pub discount_percent: u8,
}

/// Store details relevant to a curated game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameDetails {
    pub title: Option<String>,
    pub image: Option<String>,
    pub achievements_total: u32,
    pub discount_percent: u8,
}

impl From<AppDetailsData> for GameDetails {
    fn from(value: AppDetailsData) -> Self {
        Self {
            title: value.name.filter(|name| !name.is_empty()),
            image: value.header_image.filter(|image| !image.is_empty()),
            achievements_total: value.achievements.map(|a| a.total).unwrap_or_default(),
            discount_percent: value
                .price_overview
                .map(|price| price.discount_percent)
                .unwrap_or_default(),
        }
    }
}
