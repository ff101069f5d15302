//! Marketplace engine integration module

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH, Instant};

use clap::Parser;
use common::model::listing::ListingKind;
use dotenv::dotenv;
use listing_service::FeedFilter;
use rust_decimal_macros::dec;
use tokio::signal;
use tracing::{info, debug, Level};
use tracing_subscriber::{FmtSubscriber, EnvFilter, fmt::format::FmtSpan};
use ledger_service::LedgerService;
use listing_service::ListingService;
use order_service::OrderService;
use pricing_engine::OrderDraft;
use uuid::Uuid;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Run with demo data
    #[clap(short, long)]
    demo: bool,
}

// Static variable to track service start time
static START_TIME: AtomicU64 = AtomicU64::new(0);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    // Create an environment filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,listing_service=debug,order_service=debug,ledger_service=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        if env_debug == "1" {
            debug!("Debug logging enabled");
        }
    }

    info!("Starting Pasar Marketplace Engine...");

    // Initialize service start time for uptime tracking
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    START_TIME.store(now, Ordering::Relaxed);

    // Initialize services
    let ledger = Arc::new(LedgerService::new());
    let listings = Arc::new(ListingService::new());
    let orders = Arc::new(OrderService::new(ledger.clone(), listings.clone()));

    // Create demo data if requested
    if args.demo {
        info!("Creating demo data...");
        create_demo_data(
            ledger.clone(),
            listings.clone(),
            orders.clone(),
        ).await?;
    }

    // Start API server in a separate task
    let api_handle = {
        let ledger = ledger.clone();
        let listings = listings.clone();
        let orders = orders.clone();

        tokio::spawn(async move {
            // Create app state
            let state = Arc::new(api_gateway::AppState {
                ledger,
                listings,
                orders,
            });

            // Set up CORS
            let cors = tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any);

            // Set up API routes
            let api_routes = axum::Router::new()
                // Health Check
                .route("/health", axum::routing::get(health_check))
                // Account routes
                .route("/accounts", axum::routing::post(api_gateway::api::account::create_account))
                .route("/accounts/:id", axum::routing::get(api_gateway::api::account::get_account))
                .route("/accounts/:id/balance", axum::routing::get(api_gateway::api::account::get_balance))
                .route("/accounts/:id/top-up", axum::routing::post(api_gateway::api::account::top_up))
                .route("/accounts/:id/orders", axum::routing::get(api_gateway::api::order::get_orders))

                // Listing routes
                .route("/feed", axum::routing::get(api_gateway::api::listing::get_feed))
                .route("/listings", axum::routing::post(api_gateway::api::listing::create_listing))
                .route("/listings/:id", axum::routing::get(api_gateway::api::listing::get_listing))
                .route("/listings/:id/flag", axum::routing::post(api_gateway::api::listing::flag_listing))
                .route("/listings/:id/comments", axum::routing::post(api_gateway::api::listing::add_comment))
                .route("/listings/:id/comments", axum::routing::get(api_gateway::api::listing::get_comments))
                .route("/listings/:id/offers", axum::routing::get(api_gateway::api::offer::get_offers))

                // Offer routes
                .route("/offers", axum::routing::post(api_gateway::api::offer::make_offer))
                .route("/offers/:id/accept", axum::routing::post(api_gateway::api::offer::accept_offer))
                .route("/offers/:id/decline", axum::routing::post(api_gateway::api::offer::decline_offer))
                .route("/offers/:id/withdraw", axum::routing::post(api_gateway::api::offer::withdraw_offer))

                // Order routes
                .route("/orders", axum::routing::post(api_gateway::api::order::place_order))
                .route("/orders/:id", axum::routing::get(api_gateway::api::order::get_order))
                .route("/orders/:id/modify", axum::routing::post(api_gateway::api::order::modify_order))
                .route("/orders/:id/confirm", axum::routing::post(api_gateway::api::order::confirm_order))
                .route("/orders/:id/cancel", axum::routing::post(api_gateway::api::order::cancel_order))
                .route("/orders/:id/complete", axum::routing::post(api_gateway::api::order::complete_order))

                // Moderation routes
                .route("/moderation/flags", axum::routing::get(api_gateway::api::moderation::get_flags))
                .route("/moderation/flags/:id/resolve", axum::routing::post(api_gateway::api::moderation::resolve_flag));

            // Combine all routes
            let app = axum::Router::new()
                .nest("/api/v1", api_routes)
                .layer(cors)
                .layer(tower_http::trace::TraceLayer::new_for_http()
                    .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(log_level))
                    .on_request(tower_http::trace::DefaultOnRequest::new().level(log_level))
                    .on_response(tower_http::trace::DefaultOnResponse::new().level(log_level)))
                .with_state(state);

            // Parse address to listen on
            let port = std::env::var("API_PORT").unwrap_or_else(|_| "8081".to_string());
            let port: u16 = port.parse().expect("Invalid API_PORT value");
            info!("Starting API server on 0.0.0.0:{}", port);
            let addr: std::net::SocketAddr = ([0, 0, 0, 0], port).into();

            // Start the server
            let listener = tokio::net::TcpListener::bind(&addr).await.expect("Failed to bind to address");
            axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.expect("Server error");
        })
    };

    // Wait for the API server to finish
    api_handle.await?;

    info!("Shutting down");
    Ok(())
}

// Health check endpoint
async fn health_check(
    State(state): State<Arc<api_gateway::AppState>>,
) -> impl IntoResponse {
    let start_time = Instant::now();

    // Check if the ledger is responsive
    let ledger_start = Instant::now();
    let ledger_status = match state.ledger.get_account(Uuid::nil()).await {
        // Any response means the service is working, even a miss for a nil UUID
        Ok(_) => "up",
        Err(common::error::Error::AccountNotFound(_)) => "up",
        Err(_) => "down",
    };
    let ledger_latency = ledger_start.elapsed().as_millis() as u64;

    // Check if the listing service is responsive
    let listings_start = Instant::now();
    let listings_status = match state.listings.feed(&FeedFilter::default()).await {
        Ok(_) => "up",
        Err(_) => "down",
    };
    let listings_latency = listings_start.elapsed().as_millis() as u64;

    // Check if the order service is responsive
    let orders_start = Instant::now();
    let orders_status = match state.orders.get_order(Uuid::nil()).await {
        Ok(_) => "up",
        Err(_) => "down",
    };
    let orders_latency = orders_start.elapsed().as_millis() as u64;

    // Overall status depends on all services
    let overall_status = if ledger_status == "up" &&
                           listings_status == "up" &&
                           orders_status == "up" {
        "healthy"
    } else {
        "degraded"
    };

    // Get system metrics
    let memory_usage = get_memory_usage_mb();
    let uptime = get_uptime_seconds();

    // Total response time for this health check
    let total_latency = start_time.elapsed().as_millis() as u64;

    // Build the health information JSON
    let health_info = serde_json::json!({
        "status": overall_status,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "services": {
            "ledger_service": {
                "status": ledger_status,
                "latency_ms": ledger_latency
            },
            "listing_service": {
                "status": listings_status,
                "latency_ms": listings_latency
            },
            "order_service": {
                "status": orders_status,
                "latency_ms": orders_latency
            }
        },
        "system": {
            "memory_usage_mb": memory_usage,
        },
        "health_check_latency_ms": total_latency
    });

    if overall_status == "healthy" {
        (axum::http::StatusCode::OK, Json(health_info))
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(health_info))
    }
}

// Helper function to get uptime in seconds
fn get_uptime_seconds() -> u64 {
    let current_start = START_TIME.load(Ordering::Relaxed);
    if current_start == 0 {
        // First call, initialize start time
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        START_TIME.store(now, Ordering::Relaxed);
        return 0;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    now.saturating_sub(current_start)
}

// Helper function to get memory usage in MB
fn get_memory_usage_mb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        use std::fs::File;
        use std::io::Read;

        if let Ok(mut file) = File::open("/proc/self/status") {
            let mut contents = String::new();
            if file.read_to_string(&mut contents).is_ok() {
                if let Some(line) = contents.lines().find(|l| l.starts_with("VmRSS:")) {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<u64>() {
                            return kb / 1024; // Convert KB to MB
                        }
                    }
                }
            }
        }
    }

    // Default if we can't get the actual usage or not on Linux
    0
}

/// Create demo data for testing
async fn create_demo_data(
    ledger: Arc<LedgerService>,
    listings: Arc<ListingService>,
    orders: Arc<OrderService>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Create demo accounts
    let amara = ledger.create_account("amara").await?;
    let jonas = ledger.create_account("jonas").await?;
    let dana = ledger.create_staff_account("dana").await?;

    info!("Created demo accounts: Amara = {}, Jonas = {}, Dana (staff) = {}", amara.id, jonas.id, dana.id);

    // Seed point balances
    ledger.top_up(amara.id, dec!(500)).await?;
    ledger.top_up(jonas.id, dec!(200)).await?;

    info!("Seeded demo balances");

    // Jonas sells tomatoes and offers bike repair
    let tomatoes = listings.create_listing(
        jonas.id,
        ListingKind::Sell,
        "Fresh tomatoes",
        "Garden tomatoes picked this morning",
        "produce",
        dec!(5),
        "kg",
        Some(dec!(50)),
    ).await?;

    listings.create_listing(
        jonas.id,
        ListingKind::Service,
        "Bike repair",
        "Tune-ups and flat fixes, same week",
        "services",
        dec!(20),
        "hour",
        None,
    ).await?;

    // Amara wants firewood
    let firewood = listings.create_listing(
        amara.id,
        ListingKind::Buy,
        "Looking for firewood",
        "Need seasoned hardwood for winter",
        "firewood",
        dec!(10),
        "bundle",
        None,
    ).await?;

    info!("Created demo listings");

    // Amara orders 10 kg of tomatoes
    let draft = OrderDraft {
        quantity: "10".to_string(),
        delivery_address: "12 Orchard Lane".to_string(),
        delivery_date: Some(chrono::Utc::now().date_naive()),
        additional_dates: Vec::new(),
        instructions: Some("Leave at the gate".to_string()),
    };
    let order = orders.place_order(amara.id, tomatoes.id, &draft).await?;

    info!("Placed demo order {} ({} points held)", order.id, order.total_price);

    // Jonas offers firewood against Amara's buy listing
    let offer = orders.make_offer(
        jonas.id,
        firewood.id,
        dec!(4),
        dec!(9),
        Some("Dry oak, can deliver this weekend".to_string()),
    ).await?;

    info!("Created demo offer {}", offer.id);

    info!("Demo data created successfully");
    Ok(())
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
