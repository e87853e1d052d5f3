//! Read-only views: preheat history and the provider catalog.

use crate::error::DistResult;
use crate::models::{DistributionHistory, DistributionProvider, ProviderRef};
use crate::repository::DistributionRepository;

/// Page size of the history grid.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// One-based page of `items`. Page 0 is treated as page 1.
pub(crate) fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    if page_size == 0 {
        return Vec::new();
    }
    let start = page.saturating_sub(1).saturating_mul(page_size);
    items.iter().skip(start).take(page_size).cloned().collect()
}

/// Preheat history as last fetched from the backend.
#[derive(Debug)]
pub struct HistoryLog {
    repository: DistributionRepository,
    records: Vec<DistributionHistory>,
}

impl HistoryLog {
    pub fn new(repository: DistributionRepository) -> Self {
        Self {
            repository,
            records: Vec::new(),
        }
    }

    /// Refetch the whole log. On failure the previous records stay.
    pub async fn refresh(&mut self) -> DistResult<usize> {
        let records = self.repository.list_history().await?;
        tracing::debug!(count = records.len(), "Preheat history refreshed");
        self.records = records;
        Ok(self.records.len())
    }

    pub fn records(&self) -> &[DistributionHistory] {
        &self.records
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// Case-insensitive substring match on image, status, provider and
    /// instance.
    pub fn filtered(&self, keyword: &str) -> Vec<DistributionHistory> {
        let keyword = keyword.trim();
        self.records
            .iter()
            .filter(|r| keyword.is_empty() || r.matches_keyword(keyword))
            .cloned()
            .collect()
    }

    pub fn page(&self, page: usize) -> Vec<DistributionHistory> {
        self.page_with_size(page, HISTORY_PAGE_SIZE)
    }

    pub fn page_with_size(&self, page: usize, page_size: usize) -> Vec<DistributionHistory> {
        paginate(&self.records, page, page_size)
    }
}

/// Provider kinds offered by the backend.
#[derive(Debug)]
pub struct ProviderCatalog {
    repository: DistributionRepository,
    providers: Vec<DistributionProvider>,
}

impl ProviderCatalog {
    pub fn new(repository: DistributionRepository) -> Self {
        Self {
            repository,
            providers: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> DistResult<&[DistributionProvider]> {
        self.providers = self.repository.list_providers().await?;
        tracing::debug!(count = self.providers.len(), "Provider kinds loaded");
        Ok(&self.providers)
    }

    pub fn providers(&self) -> &[DistributionProvider] {
        &self.providers
    }

    /// Look up a kind by id, falling back to a case-insensitive name match.
    pub fn find(&self, kind: &str) -> Option<&DistributionProvider> {
        self.providers
            .iter()
            .find(|p| p.id == kind)
            .or_else(|| self.providers.iter().find(|p| p.name.eq_ignore_ascii_case(kind)))
    }

    /// Full provider metadata for an instance's provider reference.
    pub fn resolve(&self, reference: &ProviderRef) -> Option<DistributionProvider> {
        match reference {
            ProviderRef::Embedded(provider) => Some(provider.clone()),
            ProviderRef::Kind(kind) => self.find(kind).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::repository::{PREHEATS_PATH, PROVIDERS_PATH};
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "http://registry.test";

    fn repository(mock: &MockHttpClient) -> DistributionRepository {
        DistributionRepository::new(BASE, Arc::new(mock.clone()))
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(paginate(&items, 1, 3), vec![1, 2, 3]);
        assert_eq!(paginate(&items, 3, 3), vec![7]);
        assert_eq!(paginate(&items, 0, 3), vec![1, 2, 3]);
        assert!(paginate(&items, 4, 3).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
    }

    #[tokio::test]
    async fn test_history_refresh_filter_and_page() {
        let mock = MockHttpClient::new();
        let records: Vec<_> = (0..60)
            .map(|i| {
                json!({
                    "image": format!("library/{}:{}", if i % 2 == 0 { "redis" } else { "nginx" }, i),
                    "timestamp": 1700000000 + i,
                    "status": "SUCCESS",
                    "provider": "dragonfly",
                    "instance": "1"
                })
            })
            .collect();
        mock.set_response(
            "GET",
            &format!("{}{}", BASE, PREHEATS_PATH),
            MockResponse::json(json!(records)),
        );

        let mut log = HistoryLog::new(repository(&mock));
        assert_eq!(log.refresh().await.unwrap(), 60);
        assert_eq!(log.page(1).len(), 50);
        assert_eq!(log.page(2).len(), 10);
        assert_eq!(log.filtered("NGINX").len(), 30);
        assert_eq!(log.page_with_size(2, 25)[0].image, "library/nginx:25");
    }

    #[tokio::test]
    async fn test_history_failure_keeps_records() {
        let mock = MockHttpClient::new();
        let url = format!("{}{}", BASE, PREHEATS_PATH);
        mock.push_response("GET", &url, MockResponse::json(json!([{"image": "a"}])));
        mock.set_response("GET", &url, MockResponse::status(503, ""));

        let mut log = HistoryLog::new(repository(&mock));
        log.refresh().await.unwrap();
        assert!(log.refresh().await.is_err());
        assert_eq!(log.total_count(), 1);
    }

    #[tokio::test]
    async fn test_catalog_resolves_references() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "GET",
            &format!("{}{}", BASE, PROVIDERS_PATH),
            MockResponse::json(json!([
                {"ID": "dragonfly", "Name": "Dragonfly", "Version": "0.10.1"},
                {"name": "Kraken", "version": "0.1.3"}
            ])),
        );

        let mut catalog = ProviderCatalog::new(repository(&mock));
        assert_eq!(catalog.load().await.unwrap().len(), 2);

        let by_id = catalog.resolve(&ProviderRef::Kind("dragonfly".into())).unwrap();
        assert_eq!(by_id.version, "0.10.1");
        let by_name = catalog.resolve(&ProviderRef::Kind("kraken".into())).unwrap();
        assert_eq!(by_name.name, "Kraken");
        assert!(catalog.resolve(&ProviderRef::Kind("other".into())).is_none());
    }
}
