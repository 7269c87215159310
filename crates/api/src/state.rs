use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub trial_service: Arc<dyn services::trial::ports::TrialService>,
    pub quota_service: Arc<dyn services::quota::ports::QuotaService>,
    pub subscription_service: Arc<dyn services::subscription::ports::SubscriptionService>,
    pub user_service: Arc<dyn services::user::ports::UserService>,
    pub geo_service: Arc<dyn services::geo::ports::GeoService>,
}
