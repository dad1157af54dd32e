//! The API endpoints URIs.

/// The route for registering a new user.
pub const SIGN_UP: &str = "/api/sign-up";
/// The route for signing in with an email or username.
pub const SIGN_IN: &str = "/api/sign-in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/logout";
/// The route for the signed-in user's profile.
pub const GET_USER_INFO: &str = "/api/get-user-info";

/// The route to create a transaction.
pub const CREATE_TRANSACTION: &str = "/api/create-transaction";
/// The route to edit a transaction.
pub const EDIT_TRANSACTION: &str = "/api/edit-transaction";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/delete-transaction";
/// The route to list the signed-in user's transactions.
pub const GET_TRANSACTIONS: &str = "/api/get-transactions";

/// The route to create a budget.
pub const CREATE_BUDGET: &str = "/api/create-budget";
/// The route to delete a budget.
pub const DELETE_BUDGET: &str = "/api/delete-budget";
/// The route to list the signed-in user's budgets.
pub const GET_BUDGETS: &str = "/api/get-budgets";
/// The route to compare a budget with actual spending.
pub const COMPARE_BUDGET: &str = "/api/compare-budget";
/// The route for spending per category over the last week or month.
pub const SPENDING_SUMMARY: &str = "/api/spending-summary";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::SIGN_UP);
        assert_endpoint_is_valid_uri(endpoints::SIGN_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::GET_USER_INFO);

        assert_endpoint_is_valid_uri(endpoints::CREATE_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::EDIT_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::DELETE_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::GET_TRANSACTIONS);

        assert_endpoint_is_valid_uri(endpoints::CREATE_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::DELETE_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::GET_BUDGETS);
        assert_endpoint_is_valid_uri(endpoints::COMPARE_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::SPENDING_SUMMARY);
    }
}
