//! Entity seeder.
//!
//! Widens the lookup by `target` each round and only inspects results past
//! the prefix seen in earlier rounds. Stops when the quota is met, when a
//! round brings back nothing new (the lookup pool is exhausted), or after
//! `max_rounds` rounds.

use crate::error::QueryError;
use kgrag_core::graph::EntityLookup;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolved seed entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSet {
    /// Distinct entity names in discovery order.
    pub entities: Vec<String>,
    pub rounds: usize,
    /// True when the loop stopped short of the target.
    pub exhausted: bool,
}

impl SeedSet {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

pub struct EntitySeeder {
    lookup: Arc<dyn EntityLookup>,
    max_rounds: usize,
}

impl EntitySeeder {
    pub fn new(lookup: Arc<dyn EntityLookup>, max_rounds: usize) -> Self {
        Self {
            lookup,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Collect up to `target` distinct entities similar to `query`.
    pub async fn seed(&self, query: &str, target: usize) -> Result<SeedSet, QueryError> {
        let mut set = SeedSet::default();
        if target == 0 {
            return Ok(set);
        }

        let mut seen = HashSet::new();
        let mut inspected = 0;

        loop {
            set.rounds += 1;
            let width = target * set.rounds;
            let results = self.lookup.top_k(query, width).await?;

            if results.len() <= inspected {
                set.exhausted = true;
                break;
            }

            for hit in &results[inspected..] {
                if seen.insert(hit.entity_name.clone()) {
                    set.entities.push(hit.entity_name.clone());
                    if set.entities.len() == target {
                        break;
                    }
                }
            }
            inspected = results.len();
            debug!(round = set.rounds, width, found = set.entities.len(), "Seeding round");

            if set.entities.len() >= target {
                break;
            }
            if results.len() < width || set.rounds >= self.max_rounds {
                set.exhausted = true;
                break;
            }
        }

        info!(
            index = self.lookup.name(),
            target,
            found = set.entities.len(),
            rounds = set.rounds,
            exhausted = set.exhausted,
            "Seed entities resolved"
        );
        Ok(set)
    }

    /// Link each extracted mention to its closest entity, dropping duplicates.
    pub async fn link(&self, mentions: &[String]) -> Result<SeedSet, QueryError> {
        let mut set = SeedSet {
            rounds: 1,
            ..Default::default()
        };
        let mut seen = HashSet::new();
        for mention in mentions {
            if let Some(hit) = self.lookup.top_k(mention, 1).await?.into_iter().next() {
                debug!(mention = %mention, entity = %hit.entity_name, "Linked mention");
                if seen.insert(hit.entity_name.clone()) {
                    set.entities.push(hit.entity_name);
                }
            }
        }
        Ok(set)
    }
}

/// Parse a one-entity-per-line extraction response.
///
/// Strips list markers and numbering, drops blanks and duplicates.
pub fn parse_mentions(response: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    response
        .lines()
        .map(|line| {
            let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            let rest = &line[digits..];
            let line = if digits > 0 && (rest.starts_with('.') || rest.starts_with(')')) {
                rest[1..].trim_start()
            } else {
                line
            };
            line.trim().trim_matches('"').trim().to_string()
        })
        .filter(|m| !m.is_empty())
        .filter(|m| seen.insert(m.clone()))
        .collect()
}
