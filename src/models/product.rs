use chrono::{DateTime, FixedOffset};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Catalog product, in the camelCase shape shared by the table and seed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[garde(length(min = 1, max = 64))]
    pub product_id: String,

    #[garde(length(min = 1, max = 100))]
    pub category: String,

    #[serde(with = "timestamp")]
    #[garde(skip)]
    pub created_date: DateTime<FixedOffset>,

    #[garde(length(max = 2000))]
    pub description: String,

    #[serde(with = "timestamp")]
    #[garde(skip)]
    pub modified_date: DateTime<FixedOffset>,

    #[garde(length(min = 1, max = 200))]
    pub name: String,

    #[garde(dive)]
    pub package: Package,

    #[garde(inner(url))]
    pub pictures: Vec<String>,

    /// Price in minor currency units (cents).
    #[garde(range(min = 0))]
    pub price: i64,

    #[serde(default)]
    #[garde(inner(length(min = 1, max = 100)))]
    pub tags: Vec<String>,
}

/// Shipping dimensions of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Package {
    #[garde(range(min = 0))]
    pub height: i64,
    #[garde(range(min = 0))]
    pub length: i64,
    #[garde(range(min = 0))]
    pub weight: i64,
    #[garde(range(min = 0))]
    pub width: i64,
}

impl Product {
    /// Sort key of the product's catalog item.
    pub fn sort_key(&self) -> String {
        format!("PRODUCT#{}", self.product_id)
    }
}

/// Timestamps come either as RFC 3339 or as `2017-04-17T01:14:03 -02:00`.
pub mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    const SPACED_OFFSET: &str = "%Y-%m-%dT%H:%M:%S %:z";

    pub fn parse(value: &str) -> Option<DateTime<FixedOffset>> {
        let value = value.trim();
        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, SPACED_OFFSET))
            .ok()
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lemons() -> serde_json::Value {
        json!({
            "PK": "PRODUCT",
            "SK": "PRODUCT#4c1fadaa-213a-4ea8-aa32-58c217604e3c",
            "productId": "4c1fadaa-213a-4ea8-aa32-58c217604e3c",
            "category": "fruit",
            "createdDate": "2017-04-17T01:14:03 -02:00",
            "description": "Bright, juicy lemons.",
            "modifiedDate": "2019-03-13T12:18:27 -01:00",
            "name": "Fresh Lemons",
            "package": { "height": 948, "length": 455, "weight": 54, "width": 905 },
            "pictures": ["https://img.example.com/lemon_1205-1667.jpg"],
            "price": 7160,
            "tags": ["citrus", "fresh"]
        })
    }

    #[test]
    fn test_deserialize_seed_shape() {
        let product: Product = serde_json::from_value(lemons()).unwrap();
        assert_eq!(product.name, "Fresh Lemons");
        assert_eq!(product.price, 7160);
        assert_eq!(product.package.weight, 54);
        assert_eq!(product.created_date.offset().local_minus_utc(), -2 * 3600);
        assert_eq!(product.sort_key(), "PRODUCT#4c1fadaa-213a-4ea8-aa32-58c217604e3c");
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_rfc3339_timestamp_accepted() {
        assert!(timestamp::parse("2024-01-02T03:04:05Z").is_some());
        assert!(timestamp::parse("2024-01-02T03:04:05+01:00").is_some());
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_tags_default_to_empty() {
        let mut value = lemons();
        value.as_object_mut().unwrap().remove("tags");
        let product: Product = serde_json::from_value(value).unwrap();
        assert!(product.tags.is_empty());
    }

    #[test]
    fn test_invalid_picture_url_fails_validation() {
        let mut value = lemons();
        value["pictures"] = json!(["not a url"]);
        let product: Product = serde_json::from_value(value).unwrap();
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_negative_price_fails_validation() {
        let mut value = lemons();
        value["price"] = json!(-1);
        let product: Product = serde_json::from_value(value).unwrap();
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut value = lemons();
        value["createdDate"] = json!("17/04/2017");
        assert!(serde_json::from_value::<Product>(value).is_err());
    }
}
