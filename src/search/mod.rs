//! Catalog search and location derivation.
//!
//! Keyword matching uses an in-memory Tantivy index over the cached catalog,
//! rebuilt whenever a new catalog snapshot is seen. Structured filters are
//! applied on the properties themselves.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Property;

/// Field boost values.
const BOOST_NAME: f32 = 10.0;
const BOOST_LOCATION: f32 = 6.0;
const BOOST_PROPERTY_TYPE: f32 = 3.0;

/// Writer heap size; the index only ever holds one catalog.
const WRITER_HEAP_BYTES: usize = 20_000_000;

/// Structured filters evaluated against cached properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    pub q: Option<String>,
    /// Case-insensitive match on city, state or country
    pub location: Option<String>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<f64>,
    pub guests: Option<u32>,
    pub pets: Option<bool>,
    pub active: Option<bool>,
}

impl PropertyFilter {
    /// Whether a property satisfies every structured filter (keyword excluded).
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(location) = self.location.as_deref() {
            let needle = location.trim().to_lowercase();
            let hit = property.address.as_ref().is_some_and(|a| {
                [&a.city, &a.state, &a.country]
                    .into_iter()
                    .flatten()
                    .any(|part| part.to_lowercase().contains(&needle))
            });
            if !hit {
                return false;
            }
        }
        if let Some(min) = self.min_bedrooms {
            if property.bedrooms.unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(min) = self.min_bathrooms {
            if property.bathroom_count().unwrap_or(0.0) < min {
                return false;
            }
        }
        if let Some(guests) = self.guests {
            if property.max_guests.unwrap_or(0) < guests {
                return false;
            }
        }
        if let Some(pets) = self.pets {
            if (property.max_pets.unwrap_or(0) > 0) != pets {
                return false;
            }
        }
        if let Some(active) = self.active {
            if property.active.unwrap_or(true) != active {
                return false;
            }
        }
        true
    }

    fn keyword(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<Property>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// A distinct location present in the catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub property_count: usize,
}

/// Distinct city/state/country triples with property counts, most common first.
pub fn derive_locations(properties: &[Property]) -> Vec<Location> {
    let mut counts: HashMap<(String, Option<String>, Option<String>), usize> = HashMap::new();

    for address in properties.iter().filter_map(|p| p.address.as_ref()) {
        let Some(city) = address.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };
        let key = (
            city.to_string(),
            address.state.clone(),
            address.country.clone(),
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut locations: Vec<Location> = counts
        .into_iter()
        .map(|((city, state, country), property_count)| Location {
            city,
            state,
            country,
            property_count,
        })
        .collect();

    locations.sort_by(|a, b| {
        b.property_count
            .cmp(&a.property_count)
            .then_with(|| a.city.cmp(&b.city))
            .then_with(|| a.state.cmp(&b.state))
    });
    locations
}

/// Search index schema fields.
struct SearchFields {
    property_id: Field,
    name: Field,
    location: Field,
    property_type: Field,
}

/// In-memory Tantivy index over one catalog snapshot.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
    snapshot: RwLock<Option<i64>>,
}

impl SearchIndex {
    pub fn new() -> Result<Self, AppError> {
        let mut schema_builder = Schema::builder();
        let property_id = schema_builder.add_text_field("property_id", STORED);
        let name = schema_builder.add_text_field("name", TEXT);
        let location = schema_builder.add_text_field("location", TEXT);
        let property_type = schema_builder.add_text_field("property_type", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            property_id,
            name,
            location,
            property_type,
        };

        let index = Index::create_in_ram(schema);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
            snapshot: RwLock::new(None),
        })
    }

    /// Rebuild the index if `snapshot` differs from the one last indexed.
    pub async fn sync(&self, snapshot: i64, properties: &[Property]) -> Result<(), AppError> {
        if *self.snapshot.read().await == Some(snapshot) {
            return Ok(());
        }

        let mut current = self.snapshot.write().await;
        if *current == Some(snapshot) {
            return Ok(());
        }

        self.rebuild(properties).await?;
        *current = Some(snapshot);
        Ok(())
    }

    /// Replace the indexed documents with `properties`.
    pub async fn rebuild(&self, properties: &[Property]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for property in properties {
            writer.add_document(self.create_document(property))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} properties", properties.len());
        Ok(())
    }

    /// Ids of properties matching the keyword query, best match first.
    pub fn keyword_matches(&self, query_str: &str, limit: usize) -> Result<Vec<(i64, f32)>, AppError> {
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let base_parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.name, self.fields.location, self.fields.property_type],
        );
        let base_query = base_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Validation(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.location, BOOST_LOCATION),
            (self.fields.property_type, BOOST_PROPERTY_TYPE),
        ];

        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let id = doc.get_first(self.fields.property_id)?.as_str()?.parse().ok()?;
                Some((id, score))
            })
            .collect())
    }

    /// Filter and page through a catalog snapshot.
    ///
    /// With a keyword the results are ordered by relevance, otherwise catalog
    /// order is kept.
    pub fn search_catalog(
        &self,
        properties: &[Property],
        filter: &PropertyFilter,
        offset: usize,
        limit: usize,
    ) -> Result<SearchPage, AppError> {
        let matching: Vec<&Property> = match filter.keyword() {
            Some(q) => {
                let by_id: HashMap<i64, &Property> =
                    properties.iter().map(|p| (p.id, p)).collect();
                self.keyword_matches(q, properties.len())?
                    .into_iter()
                    .filter_map(|(id, _)| by_id.get(&id).copied())
                    .filter(|p| filter.matches(p))
                    .collect()
            }
            None => properties.iter().filter(|p| filter.matches(p)).collect(),
        };

        let total = matching.len();
        let results = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(SearchPage {
            results,
            total,
            limit,
            offset,
        })
    }

    fn create_document(&self, property: &Property) -> TantivyDocument {
        let location = property
            .address
            .as_ref()
            .map(|a| {
                [&a.street1, &a.city, &a.state, &a.country, &a.postal_code]
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        doc!(
            self.fields.property_id => property.id.to_string(),
            self.fields.name => property.name.clone().unwrap_or_default(),
            self.fields.location => location,
            self.fields.property_type => property.property_type.clone().unwrap_or_default()
        )
    }
}
