//! API Gateway for the marketplace engine

mod api;
mod error;
mod config;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse};
use tracing::{info, Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber, fmt::format::FmtSpan};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_service::LedgerService;
use listing_service::ListingService;
use order_service::OrderService;

use crate::api::{
    account::{create_account, get_account, get_balance, top_up},
    listing::{create_listing, get_listing, get_feed, flag_listing, add_comment, get_comments},
    moderation::{get_flags, resolve_flag},
    offer::{make_offer, get_offers, accept_offer, decline_offer, withdraw_offer},
    order::{place_order, get_order, modify_order, confirm_order, cancel_order, complete_order, get_orders},
};
use crate::config::AppConfig;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Account routes
        api::account::create_account,
        api::account::get_account,
        api::account::get_balance,
        api::account::top_up,
        // Listing routes
        api::listing::create_listing,
        api::listing::get_listing,
        api::listing::get_feed,
        api::listing::flag_listing,
        api::listing::add_comment,
        api::listing::get_comments,
        // Offer routes
        api::offer::make_offer,
        api::offer::get_offers,
        api::offer::accept_offer,
        api::offer::decline_offer,
        api::offer::withdraw_offer,
        // Order routes
        api::order::place_order,
        api::order::get_order,
        api::order::modify_order,
        api::order::confirm_order,
        api::order::cancel_order,
        api::order::complete_order,
        api::order::get_orders,
        // Moderation routes
        api::moderation::get_flags,
        api::moderation::resolve_flag,
    ),
    components(
        schemas(
            // Account API
            api::account::CreateAccountRequest,
            api::account::TopUpRequest,
            common::model::account::Account,
            common::model::account::PointsBalance,

            // Listing API
            api::listing::CreateListingRequest,
            api::listing::FeedQuery,
            api::listing::FlagListingRequest,
            api::listing::AddCommentRequest,
            common::model::listing::Listing,
            common::model::listing::ListingKind,
            common::model::listing::ListingStatus,

            // Offer API
            api::offer::MakeOfferRequest,
            api::offer::AcceptOfferRequest,
            api::offer::OfferActionRequest,
            common::model::offer::Offer,
            common::model::offer::OfferStatus,

            // Order API
            api::order::PlaceOrderRequest,
            api::order::ModifyOrderRequest,
            api::order::OrderActionRequest,
            common::model::order::Order,
            common::model::order::OrderStatus,

            // Moderation API
            api::moderation::ResolveFlagRequest,
            common::model::moderation::Flag,
            common::model::moderation::FlagStatus,
            common::model::moderation::Comment,

            // Response models
            api::response::ApiResponse<common::model::account::Account>,
            api::response::ApiResponse<common::model::order::Order>,
            api::response::ApiResponse<common::model::listing::Listing>,
            api::response::ApiListResponse<common::model::order::Order>,
            api::response::ApiListResponse<common::model::offer::Offer>,
            api::response::PaginatedResponse<common::model::listing::Listing>,
            api::response::ResponseMetadata,
            api::response::PaginationMetadata
        )
    ),
    tags(
        (name = "account", description = "Account and point balance endpoints"),
        (name = "listing", description = "Feed, listing, and comment endpoints"),
        (name = "offer", description = "Offer flow endpoints"),
        (name = "order", description = "Order management endpoints"),
        (name = "moderation", description = "Staff moderation endpoints")
    ),
    info(
        title = "Pasar Marketplace API",
        version = "1.0.0",
        description = "API for the points-based community marketplace: listings, feed, offers, orders, and moderation"
    )
)]
struct ApiDoc;

/// Marketplace API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    // Initialize services
    let _config = AppConfig::new();
    let ledger = Arc::new(LedgerService::new());
    let listings = Arc::new(ListingService::new());
    let orders = Arc::new(OrderService::new(ledger.clone(), listings.clone()));

    // Create app state
    let state = Arc::new(AppState {
        ledger,
        listings,
        orders,
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up API routes
    let api_routes = Router::new()
        // Account routes
        .route("/accounts", post(create_account))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/balance", get(get_balance))
        .route("/accounts/:id/top-up", post(top_up))
        .route("/accounts/:id/orders", get(get_orders))

        // Listing routes
        .route("/feed", get(get_feed))
        .route("/listings", post(create_listing))
        .route("/listings/:id", get(get_listing))
        .route("/listings/:id/flag", post(flag_listing))
        .route("/listings/:id/comments", post(add_comment))
        .route("/listings/:id/comments", get(get_comments))
        .route("/listings/:id/offers", get(get_offers))

        // Offer routes
        .route("/offers", post(make_offer))
        .route("/offers/:id/accept", post(accept_offer))
        .route("/offers/:id/decline", post(decline_offer))
        .route("/offers/:id/withdraw", post(withdraw_offer))

        // Order routes
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/modify", post(modify_order))
        .route("/orders/:id/confirm", post(confirm_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/complete", post(complete_order))

        // Moderation routes
        .route("/moderation/flags", get(get_flags))
        .route("/moderation/flags/:id/resolve", post(resolve_flag));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let app = Router::new()
        .nest("/api/v1", api_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(log_level)
                )
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level))
        )
        .with_state(state);

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// App state shared across handlers
pub struct AppState {
    /// Points ledger (accounts, balances, escrow)
    pub ledger: Arc<LedgerService>,
    /// Listings, feed, and moderation
    pub listings: Arc<ListingService>,
    /// Order and offer submission
    pub orders: Arc<OrderService>,
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
