//! OpenAPI documentation configuration.
//!
//! Served as JSON at `/api-docs/openapi.json` and browsable at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    account_handler, auth_handler, energy_handler, product_handler, rewards_handler,
};
use crate::domain::{
    AccountResponse, ActivityLog, ActivityType, Category, CategoryOffers, ChartRequest,
    ChartResponse, CyclingPoint, DailyAverage, Debit, EcoPoints, EnergyCategory, EnergyDashboard,
    EnergyTypeFilter, LabelledSeries, NewActivity, NewProduct, Product, ProductPatch, Redemption,
    Trace, UserResponse, UserRole, VoucherResponse, WalkingPoint,
};
use crate::services::{RewardsDashboard, TokenResponse};
use crate::types::MessageResponse;

/// OpenAPI documentation for the Green Campus API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Green Campus API",
        version = "0.1.0",
        description = "Campus sustainability backend: discounted food marketplace, eco-points rewards and energy analytics",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::signup,
        auth_handler::verify,
        auth_handler::resend,
        auth_handler::login,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        account_handler::get_account,
        account_handler::change_password,
        product_handler::list_products,
        product_handler::create_product,
        product_handler::update_product,
        product_handler::delete_product,
        product_handler::category_offers,
        product_handler::expiring_offers,
        rewards_handler::list_activities,
        rewards_handler::log_activity,
        rewards_handler::balance,
        rewards_handler::dashboard,
        rewards_handler::list_redemptions,
        rewards_handler::redeem,
        rewards_handler::claim_voucher,
        energy_handler::dashboard,
        energy_handler::get_energy_data,
        energy_handler::get_co2_energy_data,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            AccountResponse,
            TokenResponse,
            MessageResponse,
            auth_handler::SignupRequest,
            auth_handler::VerifyRequest,
            auth_handler::EmailRequest,
            auth_handler::LoginRequest,
            auth_handler::ResetPasswordRequest,
            account_handler::ChangePasswordRequest,
            Category,
            Product,
            NewProduct,
            ProductPatch,
            CategoryOffers,
            ActivityType,
            ActivityLog,
            NewActivity,
            WalkingPoint,
            CyclingPoint,
            DailyAverage,
            Debit,
            Redemption,
            EcoPoints,
            VoucherResponse,
            RewardsDashboard,
            rewards_handler::RedeemRequest,
            EnergyCategory,
            EnergyTypeFilter,
            ChartRequest,
            ChartResponse,
            Trace,
            LabelledSeries,
            EnergyDashboard,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup, email verification, login and password reset"),
        (name = "Account", description = "Signed-in user's profile"),
        (name = "Inventory", description = "Vendor listings"),
        (name = "Offers", description = "Discounted products for shoppers"),
        (name = "Rewards", description = "Activities, eco points and vouchers"),
        (name = "Energy", description = "Campus energy and emission charts")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_endpoints_are_documented() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/get_energy_data"));
        assert!(doc.paths.paths.contains_key("/get_co2_energy_data"));
        assert!(doc.paths.paths.contains_key("/rewards/vouchers/{code}/claim"));
    }
}
