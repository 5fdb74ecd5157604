use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::ProductId, error::ValidationError};

/// Body of `POST /product/add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub image: String,
}

impl NewProduct {
    /// Checks run in form order: name, then price, then image.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.price.is_finite() {
            return Err(ValidationError::InvalidPrice);
        }
        if self.price <= 0.0 {
            return Err(ValidationError::NonPositivePrice);
        }
        if self.image.trim().is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, price: f64, image: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            image: image.to_string(),
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        assert_eq!(draft("Widget", 9.99, "w.png").validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_name_before_other_checks() {
        assert_eq!(
            draft("   ", -1.0, "").validate(),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn rejects_non_finite_price() {
        assert_eq!(
            draft("Widget", f64::NAN, "w.png").validate(),
            Err(ValidationError::InvalidPrice)
        );
        assert_eq!(
            draft("Widget", f64::INFINITY, "w.png").validate(),
            Err(ValidationError::InvalidPrice)
        );
    }

    #[test]
    fn rejects_zero_and_negative_price() {
        assert_eq!(
            draft("Widget", 0.0, "w.png").validate(),
            Err(ValidationError::NonPositivePrice)
        );
        assert_eq!(
            draft("Widget", -9.99, "w.png").validate(),
            Err(ValidationError::NonPositivePrice)
        );
    }

    #[test]
    fn rejects_blank_image() {
        assert_eq!(
            draft("Widget", 9.99, " ").validate(),
            Err(ValidationError::EmptyImage)
        );
    }
}
