//! Discovery endpoints

use quarry_core::dto::catalog::{CategoryList, VariantList};

use crate::QuarryClient;
use crate::error::Result;

impl QuarryClient {
    /// List the strategy variants the orchestrator runs
    pub async fn variants(&self) -> Result<VariantList> {
        let response = self.client.get(self.url("/scraping/variants")).send().await?;
        self.handle_response(response).await
    }

    /// List the categories a job may ask for
    pub async fn categories(&self) -> Result<CategoryList> {
        let response = self
            .client
            .get(self.url("/scraping/categories"))
            .send()
            .await?;
        self.handle_response(response).await
    }
}
