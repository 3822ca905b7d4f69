//! JSON dataset loading for the in-memory store.
//!
//! The CLI's thin trigger surface: a dataset file holds the three
//! collections, already shaped by whatever ingestion produced them.

use crate::memory::MemoryStore;
use lookthrough_model::{Company, Fund, Project};
use serde::{Deserialize, Serialize};

/// The three collections of a store dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub funds: Vec<Fund>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Dataset {
    /// Parse a dataset from JSON.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of entities across all three collections.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.funds.len() + self.companies.len() + self.projects.len()
    }
}

impl MemoryStore {
    /// Build a store populated from a dataset.
    #[must_use]
    pub fn from_dataset(dataset: Dataset) -> Self {
        let store = Self::new();
        for fund in dataset.funds {
            store.insert_fund(fund);
        }
        for company in dataset.companies {
            store.insert_company(company);
        }
        for project in dataset.projects {
            store.insert_project(project);
        }
        store
    }

    /// Build a store straight from dataset JSON.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_dataset(Dataset::from_json_str(json)?))
    }
}
