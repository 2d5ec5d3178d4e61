use crate::auth::WalletToken;
use crate::errors::WalletApiError;
use crate::metrics;
use crate::models::{
    DepositResponse, DepositView, DisableRequest, Envelope, InitializeRequest, MutationRequest,
    TokenResponse, TransactionView, TransactionsResponse, WalletResponse, WalletView,
    WithdrawalResponse, WithdrawalView,
};
use crate::services::WalletService;
use actix_web::{error, web, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "wallet-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Open a wallet for `customer_xid`
pub async fn initialize(
    service: web::Data<Arc<WalletService>>,
    form: web::Form<InitializeRequest>,
) -> Result<HttpResponse, WalletApiError> {
    let token = service.initialize(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(TokenResponse { token })))
}

/// Enable the wallet
pub async fn enable_wallet(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
) -> Result<HttpResponse, WalletApiError> {
    let wallet = service.enable(token.as_str()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(WalletResponse {
        wallet: WalletView::enabled(&wallet),
    })))
}

/// Current balance of an enabled wallet
pub async fn view_balance(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
) -> Result<HttpResponse, WalletApiError> {
    let wallet = service.view_balance(token.as_str()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(WalletResponse {
        wallet: WalletView::enabled(&wallet),
    })))
}

/// Disable the wallet; requires `is_disabled=true`
pub async fn disable_wallet(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
    form: web::Form<DisableRequest>,
) -> Result<HttpResponse, WalletApiError> {
    let wallet = service.disable(token.as_str(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(WalletResponse {
        wallet: WalletView::disabled(&wallet),
    })))
}

pub async fn deposit(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
    form: web::Form<MutationRequest>,
) -> Result<HttpResponse, WalletApiError> {
    let mutation = service.deposit(token.as_str(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(DepositResponse {
        deposit: DepositView::from(&mutation),
    })))
}

pub async fn withdraw(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
    form: web::Form<MutationRequest>,
) -> Result<HttpResponse, WalletApiError> {
    let mutation = service.withdraw(token.as_str(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(WithdrawalResponse {
        withdrawal: WithdrawalView::from(&mutation),
    })))
}

/// Mutation history, most recent first
pub async fn transactions(
    service: web::Data<Arc<WalletService>>,
    token: WalletToken,
) -> Result<HttpResponse, WalletApiError> {
    let mutations = service.transactions(token.as_str()).await?;
    Ok(HttpResponse::Created().json(Envelope::success(TransactionsResponse {
        transactions: mutations.iter().map(TransactionView::from).collect(),
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> Result<HttpResponse, WalletApiError> {
    let body = metrics::metrics_handler()
        .map_err(|e| WalletApiError::Internal(format!("Failed to gather metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Undecodable forms are answered with the fail envelope
fn form_error(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!("Rejected request body: {}", err);
    WalletApiError::BadForm(err.to_string()).into()
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .service(
            web::scope("/api/v1")
                .route("/init", web::post().to(initialize))
                .service(
                    web::resource("/wallet")
                        .route(web::post().to(enable_wallet))
                        .route(web::get().to(view_balance))
                        .route(web::patch().to(disable_wallet)),
                )
                .route("/wallet/deposits", web::post().to(deposit))
                .route("/wallet/withdrawals", web::post().to(withdraw))
                .route("/wallet/transactions", web::get().to(transactions))
                .route("/health", web::get().to(health_check)),
        )
        .route("/metrics", web::get().to(metrics_endpoint))
        .route("/health", web::get().to(health_check));
}
