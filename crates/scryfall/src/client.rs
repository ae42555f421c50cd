use async_trait::async_trait;
use deck_core::{CardLookup, CardRecord, CardSearch, CoreResult};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::{ScryfallError, ScryfallResult};
use crate::types::{ScryfallCard, ScryfallErrorBody, SearchPage};

pub const DEFAULT_BASE_URL: &str = "https://api.scryfall.com";

const USER_AGENT: &str = concat!("deckforge/", env!("CARGO_PKG_VERSION"));

/// Scryfall returns 175 cards per search page; stop paging well before
/// walking an entire result set.
const MAX_SEARCH_PAGES: usize = 4;

/// Client for the Scryfall REST API
#[derive(Clone)]
pub struct ScryfallClient {
    client: Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> ScryfallResult<Response> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        Ok(response)
    }

    async fn api_error(response: Response) -> ScryfallError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Scryfall");
            return ScryfallError::RateLimited;
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ScryfallErrorBody>(&error_text) {
            Ok(body) => body.details,
            Err(_) => error_text,
        };
        ScryfallError::Api {
            message,
            status_code: Some(status.as_u16()),
        }
    }

    /// Fuzzy lookup of a single card. `Ok(None)` when nothing matches.
    pub async fn named(&self, name: &str) -> ScryfallResult<Option<CardRecord>> {
        debug!(name = %name, "Looking up card");

        let response = self
            .get(&format!("{}/cards/named", self.base_url), &[("fuzzy", name)])
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(name = %name, "Card not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let card: ScryfallCard = response.json().await?;
        Ok(Some(card.into_card_record()))
    }

    /// Search ordered by EDHREC rank, returning at most `limit` cards.
    pub async fn search_cards(&self, query: &str, limit: usize) -> ScryfallResult<Vec<CardRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        debug!(query = %query, limit, "Searching cards");

        let response = self
            .get(
                &format!("{}/cards/search", self.base_url),
                &[("q", query), ("order", "edhrec")],
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(query = %query, "Search returned no cards");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let mut page: SearchPage = response.json().await?;
        let mut cards = Vec::with_capacity(limit.min(page.data.len()));
        let mut pages = 1;

        loop {
            cards.extend(
                page.data
                    .drain(..)
                    .take(limit - cards.len())
                    .map(ScryfallCard::into_card_record),
            );

            let next = match (&page.next_page, page.has_more) {
                (Some(next), true) if cards.len() < limit && pages < MAX_SEARCH_PAGES => next.clone(),
                _ => break,
            };

            let response = self.get(&next, &[]).await?;
            if !response.status().is_success() {
                return Err(Self::api_error(response).await);
            }
            page = response.json().await?;
            pages += 1;
        }

        debug!(query = %query, returned = cards.len(), "Search complete");
        Ok(cards)
    }
}

#[async_trait]
impl CardLookup for ScryfallClient {
    async fn lookup(&self, name: &str) -> CoreResult<Option<CardRecord>> {
        Ok(self.named(name).await?)
    }
}

#[async_trait]
impl CardSearch for ScryfallClient {
    async fn search(&self, query: &str, limit: usize) -> CoreResult<Vec<CardRecord>> {
        Ok(self.search_cards(query, limit).await?)
    }
}
