use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logitrack_cli::config::ClientConfig;
use logitrack_cli::render;
use logitrack_client::{ApiClient, Credentials, Registration};
use logitrack_core::orders::{NewOrder, OrderStatus};
use logitrack_core::reports::{summarize_by_carrier, ReportFilters, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use logitrack_core::session::SessionStore;
use logitrack_core::storage::FileStorage;
use logitrack_core::types::DbId;
use logitrack_live::LiveClient;
use logitrack_views::pages::{AdminDashboard, MyOrdersPage, ShipmentHistoryPage, TrackOrderPage};
use logitrack_views::{DashboardKind, LiveOptions, Page, Reconciler, ViewError};

#[derive(Parser)]
#[command(name = "logitrack", author, version, about = "LogiTrack shipment client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOGITRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOGITRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Submit a new shipment order
    CreateOrder {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        /// e.g. 30x20x10
        #[arg(long)]
        dimensions: String,
        #[arg(long)]
        product_type: String,
        #[arg(long)]
        address: String,
    },
    /// List orders, optionally filtered by status
    Orders {
        /// "En espera", "En tránsito" or "Entregado"
        #[arg(long)]
        status: Option<OrderStatus>,
        /// Keep following live updates until Ctrl-C
        #[arg(long, conflicts_with = "status")]
        watch: bool,
    },
    /// Past shipments
    History,
    /// Status and history of one order
    Track {
        order_id: DbId,
        #[arg(long)]
        watch: bool,
    },
    /// Orders waiting for assignment (admin)
    Queue {
        #[arg(long)]
        watch: bool,
    },
    /// Assign a waiting order to a carrier and route (admin)
    Assign {
        order_id: DbId,
        #[arg(long)]
        carrier: DbId,
        #[arg(long)]
        route: DbId,
    },
    /// Change only the carrier of an assigned order (admin)
    Reassign {
        order_id: DbId,
        #[arg(long)]
        carrier: DbId,
    },
    /// Carriers currently available
    Carriers {
        /// Mark carriers that cannot take this weight
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Known routes
    Routes,
    /// Shipment report with per-carrier totals
    Report {
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        carrier: Option<DbId>,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "logitrack=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    // --- Configuration ---
    let config = ClientConfig::from_env()?;
    tracing::debug!(api_url = %config.api_url, ws_url = %config.ws_url, "Loaded client configuration");

    // --- Session ---
    let session = Arc::new(SessionStore::load(FileStorage::new(&config.session_dir)));
    let api = Arc::new(ApiClient::new(config.api_url.clone(), Arc::clone(&session)));
    let live = LiveOptions {
        client: LiveClient::new(config.ws_url.clone()).with_session(session),
        reconnect: config.reconnect.clone(),
    };

    match cli.command {
        Command::Login { email, password } => {
            let user = api.login(&Credentials { email, password }).await?;
            let landing = match DashboardKind::for_user(&user) {
                DashboardKind::Admin => "queue",
                DashboardKind::User => "orders",
            };
            println!("Signed in as {} ({}). Try `logitrack {landing}`.", user.email, user.role);
        }
        Command::Logout => {
            api.logout();
            println!("Signed out.");
        }
        Command::Whoami => match api.session().current_user() {
            Some(user) => println!("{} #{} ({})", user.email, user.id, user.role),
            None => println!("Not signed in."),
        },
        Command::Register {
            name,
            email,
            password,
        } => {
            api.register(&Registration {
                name,
                email,
                password,
            })
            .await?;
            println!("Account created. Sign in with `logitrack login`.");
        }
        Command::CreateOrder {
            weight,
            dimensions,
            product_type,
            address,
        } => {
            api.create_order(&NewOrder {
                weight,
                dimensions,
                product_type,
                destination_address: address,
            })
            .await?;
            println!("Order created.");
        }
        Command::Orders {
            status: Some(status),
            ..
        } => {
            let orders = api.list_orders(Some(status)).await?;
            print!("{}", render::orders(&orders));
        }
        Command::Orders { status: None, watch } => {
            let page = MyOrdersPage::mount(Arc::clone(&api), watch.then(|| live.clone())).await?;
            show(page.page(), watch, |list| render::orders(list.orders())).await?;
            page.unmount().await;
        }
        Command::History => {
            let history = ShipmentHistoryPage::load(&api).await?;
            print!("{}", render::orders(history.orders()));
        }
        Command::Track { order_id, watch } => {
            let tracking =
                TrackOrderPage::mount(Arc::clone(&api), order_id, watch.then(|| live.clone()))
                    .await?;
            show(tracking.page(), watch, |view| {
                let status = view
                    .status()
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string());
                format!(
                    "Order #{} is {status}\n{}",
                    view.order_id(),
                    render::history(view.history())
                )
            })
            .await?;
            tracking.unmount().await;
        }
        Command::Queue { watch } => {
            let dashboard =
                AdminDashboard::mount(Arc::clone(&api), watch.then(|| live.clone())).await?;
            if let Some(banner) = dashboard.fleet_error() {
                eprintln!("{banner}");
            }
            show(dashboard.queue(), watch, |queue| render::orders(queue.orders())).await?;
            dashboard.unmount().await;
        }
        Command::Assign {
            order_id,
            carrier,
            route,
        } => {
            let mut dashboard = AdminDashboard::mount(Arc::clone(&api), None).await?;
            dashboard.queue().loaded().await;
            let result = dashboard.assign(order_id, carrier, route).await;
            dashboard.unmount().await;
            result.map_err(banner)?;
            println!("Order #{order_id} assigned to carrier #{carrier} on route #{route}.");
        }
        Command::Reassign { order_id, carrier } => {
            logitrack_views::require_admin(api.session()).map_err(ViewError::from).map_err(banner)?;
            api.reassign_carrier(order_id, carrier).await?;
            println!("Order #{order_id} reassigned to carrier #{carrier}.");
        }
        Command::Carriers { weight } => {
            let carriers = api.available_carriers().await?;
            print!("{}", render::carriers(&carriers, weight));
        }
        Command::Routes => {
            let routes = api.routes().await?;
            print!("{}", render::routes(&routes));
        }
        Command::Report {
            from,
            to,
            status,
            carrier,
            page,
            limit,
        } => {
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    bail!("--from ({from}) is after --to ({to})");
                }
            }
            let filters = ReportFilters {
                from,
                to,
                status,
                carrier_id: carrier,
            };
            let entries = api.fetch_reports(&filters, page, limit).await?;
            let summaries = summarize_by_carrier(&entries);
            print!("{}", render::report(&entries, &summaries));
        }
    }

    Ok(())
}

/// Lead with the page banner, keep the underlying error as the cause.
fn banner(err: ViewError) -> anyhow::Error {
    let banner = err.banner();
    anyhow::Error::new(err).context(banner)
}

/// Print the page once it has loaded; with `watch`, reprint on every
/// change until Ctrl-C.
async fn show<R: Reconciler>(
    page: &Page<R>,
    watch: bool,
    draw: impl Fn(&R) -> String,
) -> Result<()> {
    page.loaded().await;
    if let Some(error) = page.error().await {
        bail!(error);
    }
    print!("{}", page.view(&draw).await);
    if !watch {
        return Ok(());
    }

    let mut changes = page.changes();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing live channel");
                return Ok(());
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                println!("---");
                print!("{}", page.view(&draw).await);
            }
        }
    }
}

