//! `listings` rows.

use dealroom_core::error::CoreError;
use dealroom_core::listing::{Financials, Listing};
use dealroom_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `listings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingRow {
    pub id: DbId,
    pub seller_id: DbId,
    pub title: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub asking_price: i64,
    pub status: String,
    pub revenue: Option<i64>,
    pub profit: Option<i64>,
    pub cash_flow: Option<i64>,
    pub ebitda: Option<i64>,
    pub year_established: Option<i32>,
    pub employees: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ListingRow> for Listing {
    type Error = CoreError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            industry: row.industry,
            location: row.location,
            asking_price: row.asking_price,
            status: row.status.parse()?,
            financials: Financials {
                revenue: row.revenue,
                profit: row.profit,
                cash_flow: row.cash_flow,
                ebitda: row.ebitda,
                year_established: row.year_established,
                employees: row.employees,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
