//! Repository for the `listings` table.

use dealroom_core::listing::NewListing;
use dealroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::listing::ListingRow;

/// Column list for `listings` queries.
const COLUMNS: &str = "\
    id, seller_id, title, description, industry, location, asking_price, status, \
    revenue, profit, cash_flow, ebitda, year_established, employees, \
    created_at, updated_at";

pub struct ListingRepo;

impl ListingRepo {
    /// Insert a listing, returning the full row.
    pub async fn create(pool: &PgPool, input: &NewListing) -> Result<ListingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO listings \
                (seller_id, title, description, industry, location, asking_price, status, \
                 revenue, profit, cash_flow, ebitda, year_established, employees) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        let fin = &input.financials;
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(input.seller_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.industry)
            .bind(&input.location)
            .bind(input.asking_price)
            .bind(input.status.as_str())
            .bind(fin.revenue)
            .bind(fin.profit)
            .bind(fin.cash_flow)
            .bind(fin.ebitda)
            .bind(fin.year_established)
            .bind(fin.employees)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ListingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM listings WHERE id = $1");
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A seller's listings, newest first.
    pub async fn list_by_seller(
        pool: &PgPool,
        seller_id: DbId,
    ) -> Result<Vec<ListingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM listings WHERE seller_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(seller_id)
            .fetch_all(pool)
            .await
    }
}
