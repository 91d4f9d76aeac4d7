use serde::Serialize;

/// A delimiter-separated column such as `genres` (`"Action;Indie"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiValuedField {
    pub column: String,
    pub delimiter: char,
}

impl MultiValuedField {
    pub fn new(column: impl Into<String>, delimiter: char) -> Self {
        Self {
            column: column.into(),
            delimiter,
        }
    }
}

/// Which catalog columns play which role. Defaults follow the public Steam
/// store export (`steam.csv`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSchema {
    pub id: String,
    pub name: String,
    pub developer: String,
    pub release_date: String,
    pub genres: MultiValuedField,
    pub tags: MultiValuedField,
    pub price: String,
    pub positive_ratings: String,
    pub negative_ratings: String,
    pub average_playtime: String,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            id: "appid".into(),
            name: "name".into(),
            developer: "developer".into(),
            release_date: "release_date".into(),
            genres: MultiValuedField::new("genres", ';'),
            tags: MultiValuedField::new("tags", ';'),
            price: "price".into(),
            positive_ratings: "positive_ratings".into(),
            negative_ratings: "negative_ratings".into(),
            average_playtime: "average_playtime".into(),
        }
    }
}

impl CatalogSchema {
    /// Numeric columns offered to the correlation view by default.
    pub fn numeric_columns(&self) -> Vec<&str> {
        vec![
            self.price.as_str(),
            self.positive_ratings.as_str(),
            self.negative_ratings.as_str(),
            self.average_playtime.as_str(),
        ]
    }

    /// Role name paired with the configured column, in display order.
    pub fn roles(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("id", self.id.as_str()),
            ("name", self.name.as_str()),
            ("developer", self.developer.as_str()),
            ("release_date", self.release_date.as_str()),
            ("genres", self.genres.column.as_str()),
            ("tags", self.tags.column.as_str()),
            ("price", self.price.as_str()),
            ("positive_ratings", self.positive_ratings.as_str()),
            ("negative_ratings", self.negative_ratings.as_str()),
            ("average_playtime", self.average_playtime.as_str()),
        ]
    }
}
