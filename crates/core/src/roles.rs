//! Role names carried in access tokens.

pub const ROLE_BUYER: &str = "buyer";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

/// Roles allowed on seller-only endpoints.
pub fn can_sell(role: &str) -> bool {
    role == ROLE_SELLER || role == ROLE_ADMIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sellers_and_admins_sell() {
        assert!(can_sell(ROLE_SELLER));
        assert!(can_sell(ROLE_ADMIN));
        assert!(!can_sell(ROLE_BUYER));
        assert!(!can_sell(""));
    }
}
