//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    auth::{get_log_out, post_sign_in, post_sign_up},
    budget::{create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint},
    comparison::compare_budget_endpoint,
    endpoints,
    not_found::get_404_not_found,
    summary::spending_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transactions_endpoint,
    },
    user::get_user_info_endpoint,
};

/// Return a router with all the app's routes.
///
/// Protected routes take [crate::auth::Claims] as an argument, which rejects
/// requests without a valid token cookie.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::SIGN_UP, post(post_sign_up))
        .route(endpoints::SIGN_IN, post(post_sign_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::GET_USER_INFO, get(get_user_info_endpoint))
        .route(
            endpoints::CREATE_TRANSACTION,
            post(create_transaction_endpoint),
        )
        .route(endpoints::EDIT_TRANSACTION, put(edit_transaction_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::GET_TRANSACTIONS, get(get_transactions_endpoint))
        .route(endpoints::CREATE_BUDGET, post(create_budget_endpoint))
        .route(endpoints::DELETE_BUDGET, post(delete_budget_endpoint))
        .route(endpoints::GET_BUDGETS, get(get_budgets_endpoint))
        .route(endpoints::COMPARE_BUDGET, get(compare_budget_endpoint))
        .route(endpoints::SPENDING_SUMMARY, get(spending_summary_endpoint));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
