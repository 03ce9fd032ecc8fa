//! Inventory products and their categories.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;
use uuid::Uuid;

use super::pricing::{PriceInput, PricingEngine};
use crate::config::CATEGORY_TABLE;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Fruits,
    Bakery,
    Dairy,
    Meat,
    Sweets,
    ReadyToEat,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Fruits,
        Category::Bakery,
        Category::Dairy,
        Category::Meat,
        Category::Sweets,
        Category::ReadyToEat,
    ];

    /// Single-letter storage code.
    pub fn code(&self) -> char {
        match self {
            Category::Fruits => 'f',
            Category::Bakery => 'b',
            Category::Dairy => 'd',
            Category::Meat => 'm',
            Category::Sweets => 's',
            Category::ReadyToEat => 'r',
        }
    }

    pub fn label(&self) -> &'static str {
        self.entry().1
    }

    /// `[max%, min%]` band for the fallback discount rate.
    pub fn band(&self) -> [u32; 2] {
        self.entry().2
    }

    fn entry(&self) -> &'static (char, &'static str, [u32; 2]) {
        let code = self.code();
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .unwrap_or(&CATEGORY_TABLE[0])
    }

    /// Accepts either the storage code (`"d"`) or the slug (`"dairy"`).
    pub fn parse(raw: &str) -> AppResult<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| (needle.len() == 1 && needle.starts_with(c.code())) || needle == c.slug())
            .ok_or_else(|| AppError::InvalidCategory(raw.to_string()))
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Fruits => "fruits",
            Category::Bakery => "bakery",
            Category::Dairy => "dairy",
            Category::Meat => "meat",
            Category::Sweets => "sweets",
            Category::ReadyToEat => "ready-to-eat",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Inventory item owned by a vendor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub category: Category,
    pub expiry_date: NaiveDate,
    pub units: i32,
    #[schema(value_type = String, example = "3.50")]
    pub marked_price: Decimal,
    /// Manual discount percentage
    #[schema(value_type = Option<String>, example = "25")]
    pub discount: Option<Decimal>,
    /// Derived from marked price, discount and days to expiry
    #[schema(value_type = String, example = "1.48")]
    pub final_price: Decimal,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn price_input(&self) -> PriceInput {
        PriceInput {
            category: self.category,
            marked_price: self.marked_price,
            discount: self.discount,
            expiry_date: self.expiry_date,
        }
    }

    /// Recompute `final_price` from the other pricing fields.
    pub fn reprice(&mut self, engine: &PricingEngine, today: NaiveDate) -> AppResult<()> {
        self.final_price = engine.final_price(&self.price_input(), today)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_available(&self, today: NaiveDate) -> bool {
        self.units > 0 && self.expiry_date >= today
    }
}

/// Vendor input for a new listing.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProduct {
    #[validate(length(min = 1, message = "Product name is required"))]
    #[schema(example = "Greek Yoghurt")]
    pub name: String,
    /// Category code or slug
    #[schema(example = "dairy")]
    pub category: String,
    pub expiry_date: NaiveDate,
    #[validate(range(min = 1, message = "Units must be at least 1"))]
    #[schema(example = 12)]
    pub units: i32,
    #[schema(value_type = String, example = "2.40")]
    pub marked_price: Decimal,
    #[schema(value_type = Option<String>, example = "20")]
    pub discount: Option<Decimal>,
    #[validate(length(min = 1, message = "Location is required"))]
    #[schema(example = "Library Cafe")]
    pub location: String,
}

/// Partial update of a listing.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductPatch {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub units: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub marked_price: Option<Decimal>,
    /// `Some(None)` is not expressible in JSON; use `clear_discount`.
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub clear_discount: bool,
    pub location: Option<String>,
}

impl ProductPatch {
    pub fn apply(self, product: &mut Product) -> AppResult<()> {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = Category::parse(&category)?;
        }
        if let Some(expiry) = self.expiry_date {
            product.expiry_date = expiry;
        }
        if let Some(units) = self.units {
            if units < 0 {
                return Err(AppError::validation("Units cannot be negative"));
            }
            product.units = units;
        }
        if let Some(price) = self.marked_price {
            product.marked_price = price;
        }
        if self.clear_discount {
            product.discount = None;
        } else if let Some(discount) = self.discount {
            product.discount = Some(discount);
        }
        if let Some(location) = self.location {
            product.location = location;
        }
        Ok(())
    }
}

/// Offers page for one category.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryOffers {
    pub category: Category,
    pub label: String,
    pub products: Vec<Product>,
    /// Distinct pickup locations among `products`
    pub locations: Vec<String>,
    #[schema(value_type = String)]
    pub eco_points: Decimal,
    #[schema(value_type = String)]
    pub eco_points_value: Decimal,
}
