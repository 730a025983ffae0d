use serde::{Deserialize, Serialize};

/// Canonical catalog identifier. Stored as text in the catalog and parsed on read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn parse(&self) -> Option<i64> {
        self.0.trim().parse::<i64>().ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub analytics_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub finish: String,
    #[serde(default)]
    pub format: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProductId(id.into()),
            name: name.into(),
            analytics_name: String::new(),
            category: String::new(),
            material: String::new(),
            finish: String::new(),
            format: String::new(),
        }
    }

    pub fn with_analytics_name(mut self, value: impl Into<String>) -> Self {
        self.analytics_name = value.into();
        self
    }

    pub fn with_category(mut self, value: impl Into<String>) -> Self {
        self.category = value.into();
        self
    }

    pub fn with_material(mut self, value: impl Into<String>) -> Self {
        self.material = value.into();
        self
    }

    pub fn with_finish(mut self, value: impl Into<String>) -> Self {
        self.finish = value.into();
        self
    }

    pub fn with_format(mut self, value: impl Into<String>) -> Self {
        self.format = value.into();
        self
    }

    /// Fields used for exact matching and substring boosting.
    pub fn primary_fields(&self) -> [&str; 2] {
        [&self.name, &self.analytics_name]
    }

    /// All searchable fields, primary first.
    pub fn searchable_fields(&self) -> [&str; 6] {
        [
            &self.name,
            &self.analytics_name,
            &self.category,
            &self.material,
            &self.finish,
            &self.format,
        ]
    }
}
