//! Catalog query construction.
//!
//! Queries render to the store's `items.find(...)` search language.
//! Each criterion becomes its own single-key JSON object and multiple
//! criteria are joined under `$and`, which keeps rendering
//! deterministic regardless of builder call order.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
enum NameFilter {
    Equals(String),
    Matches(Vec<String>),
}

/// Builder for an item search against the store catalog.
#[derive(Debug, Clone)]
pub struct ItemQuery {
    repos: Vec<String>,
    path_pattern: Option<String>,
    name: Option<NameFilter>,
    include: Vec<String>,
}

impl ItemQuery {
    /// Starts a query scoped to one repository.
    #[must_use]
    pub fn repo(repo: impl Into<String>) -> Self {
        Self {
            repos: vec![repo.into()],
            path_pattern: None,
            name: None,
            include: Vec::new(),
        }
    }

    /// Widens the repository criterion to also match `repo`.
    #[must_use]
    pub fn or_repo(mut self, repo: impl Into<String>) -> Self {
        self.repos.push(repo.into());
        self
    }

    /// Restricts item folder paths to a `*` glob pattern.
    #[must_use]
    pub fn path_matches(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = Some(pattern.into());
        self
    }

    /// Restricts item names to an exact value.
    #[must_use]
    pub fn name_equals(mut self, name: impl Into<String>) -> Self {
        self.name = Some(NameFilter::Equals(name.into()));
        self
    }

    /// Restricts item names to a `*` glob pattern.
    #[must_use]
    pub fn name_matches(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(NameFilter::Matches(vec![pattern.into()]));
        self
    }

    /// Restricts item names to any of several `*` glob patterns.
    #[must_use]
    pub fn name_matches_any<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name = Some(NameFilter::Matches(
            patterns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Selects the fields each result row should carry.
    #[must_use]
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Renders the query in the store's search language.
    #[must_use]
    pub fn to_aql(&self) -> String {
        let mut criteria: Vec<Value> = Vec::new();
        match self.repos.as_slice() {
            [] => {}
            [repo] => criteria.push(json!({ "repo": repo })),
            repos => {
                let alternatives: Vec<Value> =
                    repos.iter().map(|r| json!({ "repo": r })).collect();
                criteria.push(json!({ "$or": alternatives }));
            }
        }
        if let Some(pattern) = &self.path_pattern {
            criteria.push(json!({ "path": { "$match": pattern } }));
        }
        match &self.name {
            None => {}
            Some(NameFilter::Equals(name)) => criteria.push(json!({ "name": name })),
            Some(NameFilter::Matches(patterns)) => match patterns.as_slice() {
                [] => {}
                [pattern] => criteria.push(json!({ "name": { "$match": pattern } })),
                patterns => {
                    let alternatives: Vec<Value> = patterns
                        .iter()
                        .map(|p| json!({ "name": { "$match": p } }))
                        .collect();
                    criteria.push(json!({ "$or": alternatives }));
                }
            },
        }

        let find = match criteria.len() {
            0 => json!({}).to_string(),
            1 => criteria[0].to_string(),
            _ => json!({ "$and": criteria }).to_string(),
        };
        if self.include.is_empty() {
            format!("items.find({find})")
        } else {
            let fields: Vec<String> =
                self.include.iter().map(|f| format!("\"{f}\"")).collect();
            format!("items.find({find}).include({})", fields.join(","))
        }
    }
}
