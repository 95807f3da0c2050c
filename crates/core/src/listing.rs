//! Business listings, as far as the NDA and document core needs them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Pending,
    Active,
    UnderOffer,
    Sold,
    Withdrawn,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 6] = [
        ListingStatus::Draft,
        ListingStatus::Pending,
        ListingStatus::Active,
        ListingStatus::UnderOffer,
        ListingStatus::Sold,
        ListingStatus::Withdrawn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Active => "active",
            ListingStatus::UnderOffer => "under_offer",
            ListingStatus::Sold => "sold",
            ListingStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown listing status '{s}'")))
    }
}

/// Figures only visible to the owner and to buyers holding a valid NDA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Financials {
    pub revenue: Option<i64>,
    pub profit: Option<i64>,
    pub cash_flow: Option<i64>,
    pub ebitda: Option<i64>,
    pub year_established: Option<i32>,
    pub employees: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: DbId,
    pub seller_id: DbId,
    pub title: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub asking_price: i64,
    pub status: ListingStatus,
    pub financials: Financials,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Listing {
    /// Owner bypass: the seller sees everything on their own listing.
    pub fn is_owned_by(&self, user_id: DbId) -> bool {
        self.seller_id == user_id
    }
}

/// Input for a new listing. The seller comes from the authenticated caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateListing {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub industry: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(range(min = 0))]
    pub asking_price: i64,
    #[serde(default)]
    pub financials: Financials,
}

/// Row values for a listing insert.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub seller_id: DbId,
    pub title: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub asking_price: i64,
    pub status: ListingStatus,
    pub financials: Financials,
}

/// Public fields of a listing; financials are served separately.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListingView {
    pub id: DbId,
    pub seller_id: DbId,
    pub title: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub asking_price: i64,
    pub status: ListingStatus,
    pub created_at: Timestamp,
}

impl From<&Listing> for ListingView {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            seller_id: listing.seller_id,
            title: listing.title.clone(),
            description: listing.description.clone(),
            industry: listing.industry.clone(),
            location: listing.location.clone(),
            asking_price: listing.asking_price,
            status: listing.status,
            created_at: listing.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FinancialsView {
    pub listing_id: DbId,
    #[serde(flatten)]
    pub financials: Financials,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, asking_price: i64) -> CreateListing {
        CreateListing {
            title: title.to_string(),
            description: "Profitable bakery".into(),
            industry: "Food".into(),
            location: "Austin, TX".into(),
            asking_price,
            financials: Financials::default(),
        }
    }

    #[test]
    fn create_listing_validation() {
        assert!(create("Corner Bakery", 450_000).validate().is_ok());
        assert!(create("", 450_000).validate().is_err());
        assert!(create("Corner Bakery", -1).validate().is_err());
    }

    #[test]
    fn status_round_trip() {
        for status in ListingStatus::ALL {
            assert_eq!(status.as_str().parse::<ListingStatus>().unwrap(), status);
        }
    }
}
