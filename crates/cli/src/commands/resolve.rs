use serde::Serialize;
use toolgate_core::config::AppConfig;
use toolgate_core::Catalog;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct Resolution {
    query: String,
    product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<Vec<RankedCandidate>>,
}

#[derive(Debug, Serialize)]
struct RankedCandidate {
    product_id: i64,
    score: u32,
    name: String,
}

pub fn run(config: &AppConfig, query: &str, explain: bool) -> CommandResult {
    let catalog = match &config.catalog.path {
        Some(path) => match Catalog::load(path) {
            Ok(catalog) => catalog,
            Err(error) => {
                return CommandResult::failure("resolve", "config_validation", error.to_string(), 2)
            }
        },
        None => Catalog::builtin(),
    };

    let candidates = explain.then(|| {
        catalog
            .candidates(query)
            .into_iter()
            .map(|candidate| RankedCandidate {
                product_id: candidate.entry_id,
                score: candidate.score,
                name: catalog
                    .entries()
                    .iter()
                    .find(|entry| entry.id.parse() == Some(candidate.entry_id))
                    .map(|entry| entry.name.clone())
                    .unwrap_or_default(),
            })
            .collect()
    });

    let resolution =
        Resolution { query: query.to_string(), product_id: catalog.resolve(query), candidates };
    CommandResult::document("resolve", 0, &resolution)
}
