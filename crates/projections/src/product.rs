//! Product catalogue: seeded, read-only reference data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::Result;

/// A product in the store.
///
/// The `stock` column is a projection used for the inventory bootstrap;
/// the inventory event streams are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub category: String,
    pub stock: i64,
}

/// Access to the product reference table.
#[async_trait]
pub trait ProductCatalogue: Send + Sync {
    /// Lists all products, ordered by name.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Looks up a single product by id.
    async fn find(&self, product_id: &str) -> Result<Option<Product>>;

    /// Inserts the given products if the table is empty.
    async fn seed(&self, products: &[Product]) -> Result<()>;
}

/// The catalogue shipped with the binary, inserted on first start.
pub fn default_catalogue() -> Vec<Product> {
    vec![
        Product {
            id: "prod-001".to_string(),
            name: "Wireless Noise-Cancelling Headphones".to_string(),
            description: "Premium over-ear headphones with active noise cancellation and 30-hour battery life.".to_string(),
            price: 349.99,
            image_url: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400".to_string(),
            category: "Electronics".to_string(),
            stock: 50,
        },
        Product {
            id: "prod-002".to_string(),
            name: "Mechanical Keyboard RGB".to_string(),
            description: "Cherry MX switches with per-key RGB lighting and aluminum frame.".to_string(),
            price: 179.99,
            image_url: "https://images.unsplash.com/photo-1618384887929-16ec33fab9ef?w=400".to_string(),
            category: "Electronics".to_string(),
            stock: 120,
        },
        Product {
            id: "prod-003".to_string(),
            name: "Ultrawide Curved Monitor 34\"".to_string(),
            description: "UWQHD 3440x1440 144Hz IPS panel with USB-C connectivity.".to_string(),
            price: 699.99,
            image_url: "https://images.unsplash.com/photo-1527443224154-c4a3942d3acf?w=400".to_string(),
            category: "Electronics".to_string(),
            stock: 30,
        },
        Product {
            id: "prod-004".to_string(),
            name: "Ergonomic Office Chair".to_string(),
            description: "Adjustable lumbar support, breathable mesh, and 4D armrests.".to_string(),
            price: 549.99,
            image_url: "https://images.unsplash.com/photo-1592078615290-033ee584e267?w=400".to_string(),
            category: "Furniture".to_string(),
            stock: 25,
        },
        Product {
            id: "prod-005".to_string(),
            name: "Smart LED Desk Lamp".to_string(),
            description: "Adjustable color temperature, brightness levels, and USB charging port.".to_string(),
            price: 89.99,
            image_url: "https://images.unsplash.com/photo-1507473885765-e6ed057ab6fe?w=400".to_string(),
            category: "Home".to_string(),
            stock: 200,
        },
        Product {
            id: "prod-006".to_string(),
            name: "Premium Laptop Backpack".to_string(),
            description: "Water-resistant 17\" laptop compartment with anti-theft design.".to_string(),
            price: 129.99,
            image_url: "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=400".to_string(),
            category: "Accessories".to_string(),
            stock: 80,
        },
    ]
}

/// PostgreSQL-backed product catalogue.
#[derive(Clone)]
pub struct PgProductCatalogue {
    pool: PgPool,
}

impl PgProductCatalogue {
    /// Creates a new PostgreSQL product catalogue.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            image_url: row.try_get("image_url")?,
            category: row.try_get("category")?,
            stock: row.try_get("stock")?,
        })
    }
}

#[async_trait]
impl ProductCatalogue for PgProductCatalogue {
    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, image_url, category, stock FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn find(&self, product_id: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, image_url, category, stock FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn seed(&self, products: &[Product]) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for p in products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, description, price, image_url, category, stock)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&p.id)
            .bind(&p.name)
            .bind(&p.description)
            .bind(p.price)
            .bind(&p.image_url)
            .bind(&p.category)
            .bind(p.stock)
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(count = products.len(), "seeded product catalogue");
        Ok(())
    }
}
