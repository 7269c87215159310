use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FormFit Billing API",
        description = "Subscription, trial and quota accounting for the FormFit fitness-analysis platform.",
        version = "1.0.0",
        contact(name = "FormFit Team", email = "support@formfit.app"),
        license(name = "MIT",)
    ),
    paths(
        // Trial ledger
        crate::routes::trial::check_free_trial,
        crate::routes::trial::update_free_trial,
        // Quota ledger
        crate::routes::quota::check_quota,
        // Payments
        crate::routes::payments::create_order,
        crate::routes::payments::payment_success,
        // Subscription lifecycle
        crate::routes::subscriptions::cancel_subscription,
        crate::routes::subscriptions::pause_subscription,
        crate::routes::subscriptions::resume_subscription,
        crate::routes::subscriptions::reactivate_subscription,
        crate::routes::subscriptions::update_subscription,
        crate::routes::subscriptions::subscription_status,
        crate::routes::subscriptions::list_plans,
        // Geo
        crate::routes::geo::location,
        // Users
        crate::routes::users::sync_profile,
    ),
    components(schemas(
        crate::error::ApiErrorResponse,
        crate::routes::HealthResponse,
        crate::routes::trial::TrialRequest,
        crate::routes::quota::QuotaRequest,
        crate::routes::quota::QuotaStatusResponse,
        crate::routes::payments::CreateOrderRequest,
        crate::routes::payments::CreateOrderResponse,
        crate::routes::payments::PaymentSuccessRequest,
        crate::routes::payments::PaymentSuccessResponse,
        crate::routes::subscriptions::SubscriptionActionRequest,
        crate::routes::subscriptions::UpdateSubscriptionRequest,
        crate::routes::subscriptions::SubscriptionResponse,
        crate::routes::subscriptions::SubscriptionStatusResponse,
        crate::routes::subscriptions::ListPlansResponse,
        crate::routes::users::SyncProfileRequest,
        services::trial::ports::TrialStatus,
        services::user::ports::User,
        services::geo::ports::GeoCurrency,
        services::payments::GatewayOrder,
        services::subscription::ports::SubscriptionPlan,
        services::subscription::ports::SubscriptionStatus,
        services::subscription::ports::SubscriptionTransaction,
        services::subscription::ports::SubscriptionWithPlan,
        services::subscription::ports::UserSubscription,
        services::subscription::ports::PaymentOutcome,
    )),
    tags(
        (name = "Trial", description = "Free-trial ledger endpoints"),
        (name = "Quota", description = "Paid-plan quota ledger endpoints"),
        (name = "Payments", description = "Payment gateway order and confirmation endpoints"),
        (name = "Subscriptions", description = "Subscription lifecycle endpoints"),
        (name = "Geo", description = "Currency display endpoints"),
        (name = "Users", description = "Cached profile endpoints"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
