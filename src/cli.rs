use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use starflight::adapters::{HttpPushBackend, StaticTokenProvider, SystemTimeProvider};
use starflight::client::StarFlightClient;
use starflight::config::{ClientConfig, DEFAULT_PUSH_SERVER_URL};
use starflight::dispatch::{LocalNotification, NotificationDispatcher, NotificationRenderer};
use starflight::executor::{CallbackDriver, StarFlightCallback, callback_queue};
use starflight::store::RegistrationStore;
use starflight::types::ClientError;

pub(crate) async fn run() -> i32 {
    let cli = Cli::parse();
    match &cli.command {
        Command::Register(args) => run_register(&cli, &args.tags).await,
        Command::Refresh => run_refresh(&cli).await,
        Command::Unregister(args) => run_unregister(&cli, &args.tags).await,
        Command::Opened(args) => run_opened(&cli, &args.uuid).await,
        Command::Receive(args) => run_receive(&cli, &args.payload),
        Command::Status => run_status(&cli),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "starflight",
    version,
    about = "StarFlight push notification demo client"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, env = "STARFLIGHT_SERVER_URL", default_value = DEFAULT_PUSH_SERVER_URL)]
    server_url: String,
    #[arg(long, env = "STARFLIGHT_APP_ID")]
    app_id: Option<String>,
    #[arg(long, env = "STARFLIGHT_CLIENT_SECRET")]
    client_secret: Option<String>,
    #[arg(long, env = "STARFLIGHT_PLATFORM", default_value = "android")]
    platform: String,
    #[arg(long, env = "STARFLIGHT_APP_NAME", default_value = "StarFlight")]
    app_name: String,
    #[arg(long, env = "STARFLIGHT_STATE_DIR", default_value = ".starflight")]
    state_dir: PathBuf,
    /// Platform registration token, needed for the first registration.
    #[arg(long, env = "STARFLIGHT_TOKEN")]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register for push notifications with the supplied tags
    Register(TagArgs),
    /// Refresh the stored registration if needed
    Refresh,
    /// Remove the supplied tags, or the whole registration when none given
    Unregister(TagArgs),
    /// Record that a message was opened
    Opened(OpenedArgs),
    /// Feed one inbound push payload to the notification dispatcher
    Receive(ReceiveArgs),
    /// Show the local registration state
    Status,
}

#[derive(Args, Debug)]
struct TagArgs {
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Args, Debug)]
struct OpenedArgs {
    uuid: String,
}

#[derive(Args, Debug)]
struct ReceiveArgs {
    payload: String,
}

fn resolve_config(cli: &Cli, require_credentials: bool) -> Result<ClientConfig, String> {
    let app_id = cli.app_id.clone().unwrap_or_default();
    let client_secret = cli.client_secret.clone().unwrap_or_default();
    if require_credentials && (app_id.is_empty() || client_secret.is_empty()) {
        return Err("--app-id and --client-secret are required".to_string());
    }
    Ok(ClientConfig {
        server_url: cli.server_url.clone(),
        app_id,
        client_secret,
        platform: cli.platform.clone(),
        app_name: cli.app_name.clone(),
        state_dir: cli.state_dir.clone(),
    })
}

type DemoClient = StarFlightClient<HttpPushBackend, StaticTokenProvider, SystemTimeProvider>;

fn build_client(cli: &Cli) -> Result<(DemoClient, CallbackDriver), String> {
    let config = resolve_config(cli, true)?;
    let backend = HttpPushBackend::new(&config).map_err(|err| err.to_string())?;
    let store = RegistrationStore::open(&config.state_dir);
    let tokens = StaticTokenProvider::new(cli.token.as_deref().unwrap_or_default());
    let (queue, driver) = callback_queue();
    let client = StarFlightClient::new(store, backend, tokens, SystemTimeProvider, queue);
    Ok((client, driver))
}

/// Prints each outcome and remembers whether anything failed, for the exit
/// code.
struct PrintCallback {
    label: &'static str,
    failed: Arc<AtomicBool>,
}

impl PrintCallback {
    fn new(label: &'static str, failed: &Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            label,
            failed: Arc::clone(failed),
        })
    }
}

impl<T: std::fmt::Debug + Send + Sync + 'static> StarFlightCallback<T> for PrintCallback {
    fn on_success(&self, response: T) {
        println!("{} succeeded: {response:?}", self.label);
    }

    fn on_failure(&self, message: &str, _cause: &ClientError) {
        eprintln!("{} failed: {message}", self.label);
        self.failed.store(true, Ordering::SeqCst);
    }
}

/// Runs queued callbacks until every background task has finished and
/// released its queue handle.
async fn drain(mut driver: CallbackDriver, failed: &Arc<AtomicBool>) -> i32 {
    while driver.run_next().await {}
    if failed.load(Ordering::SeqCst) { 1 } else { 0 }
}

async fn run_register(cli: &Cli, tags: &[String]) -> i32 {
    let (client, driver) = match build_client(cli) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    if !client.is_registered() && cli.token.is_none() {
        eprintln!("error: --token is required for the first registration");
        return 2;
    }

    let failed = Arc::new(AtomicBool::new(false));
    client.register(tags, Some(PrintCallback::new("registration", &failed)));
    drop(client);
    drain(driver, &failed).await
}

async fn run_refresh(cli: &Cli) -> i32 {
    let (client, driver) = match build_client(cli) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    if let Err(err) = client.refresh_registration() {
        eprintln!("refresh failed: {err}");
        return 1;
    }
    drop(client);
    let failed = Arc::new(AtomicBool::new(false));
    drain(driver, &failed).await
}

async fn run_unregister(cli: &Cli, tags: &[String]) -> i32 {
    let (client, driver) = match build_client(cli) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    let failed = Arc::new(AtomicBool::new(false));
    if tags.is_empty() {
        client.unregister(None, Some(PrintCallback::new("unregistration", &failed)));
    } else {
        client.unregister(Some(tags), Some(PrintCallback::new("unregistration", &failed)));
    }
    drop(client);
    drain(driver, &failed).await
}

async fn run_opened(cli: &Cli, raw_uuid: &str) -> i32 {
    let message_uuid = match Uuid::parse_str(raw_uuid) {
        Ok(message_uuid) => message_uuid,
        Err(err) => {
            eprintln!("error: invalid message uuid '{raw_uuid}': {err}");
            return 2;
        }
    };
    let (client, driver) = match build_client(cli) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    let failed = Arc::new(AtomicBool::new(false));
    client.message_opened(message_uuid, Some(PrintCallback::new("message open", &failed)));
    drop(client);
    drain(driver, &failed).await
}

struct ConsoleRenderer;

impl NotificationRenderer for ConsoleRenderer {
    fn show(&self, id: u32, notification: &LocalNotification) {
        println!(
            "[notification {id}] {}: {}",
            notification.title, notification.body
        );
        if let Some(url) = &notification.url {
            println!("  opens {url}");
        }
    }
}

fn run_receive(cli: &Cli, payload: &str) -> i32 {
    let config = match resolve_config(cli, false) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    let dispatcher = NotificationDispatcher::new(&config.app_name, ConsoleRenderer);
    match dispatcher.dispatch(payload) {
        Ok(Some(_)) => 0,
        Ok(None) => {
            println!("notification dropped");
            0
        }
        Err(err) => {
            eprintln!("could not read push notification data: {err}");
            1
        }
    }
}

fn run_status(cli: &Cli) -> i32 {
    let config = match resolve_config(cli, false) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    let store = RegistrationStore::open(&config.state_dir);
    match store.registration_token() {
        Some(token) => {
            println!("registered with token {token}");
            if let Some(client_uuid) = store.client_uuid() {
                println!("client uuid: {client_uuid}");
            }
            let tags = store.registered_tags();
            if !tags.is_empty() {
                println!("tags: {}", tags.join(","));
            }
        }
        None => println!("not registered"),
    }
    0
}
