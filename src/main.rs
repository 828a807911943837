use std::io::Error;
use std::sync::Arc;

use ace_router::{
    application::{
        handlers::delivery_scheduler::DeliveryScheduler,
        services::{
            channel::{ChannelRegistry, EmailChannelSelection},
            clock::{Clock, SystemClock},
            policy::PolicyEngine,
            reporter::Reporter,
        },
        usecases::send_message::SendOrchestrator,
    },
    config::{Config, LogFormat},
    domain::events::MessageSentEvent,
    infrastructure::{
        monitoring::TracingReporter, plugins::PluginTable, rendering::template::TemplateRenderer,
    },
    presentation::http::{build_routes, endpoints::root::ApiState},
};
use poem::{Server, listener::TcpListener};
use tokio::{
    main,
    sync::broadcast::{self, error::RecvError},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const SENT_EVENTS_CAPACITY: usize = 256;

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

fn build_state(config: &Config) -> anyhow::Result<Arc<ApiState>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);
    let plugins = PluginTable::new(config.clone(), clock.clone());

    let channels = plugins.load_channels(&config.enabled_channels)?;
    let policies = plugins
        .load_policies(&config.enabled_policies)?
        .into_iter()
        .map(|(_, policy)| policy)
        .collect();

    let registry = ChannelRegistry::new(
        channels,
        EmailChannelSelection {
            default: config.default_email_channel.clone(),
            transactional: config.transactional_email_channel.clone(),
        },
    );
    info!(channels = ?registry.names(), "Channel registry ready");

    let (sent_events, mut sent_receiver) =
        broadcast::channel::<MessageSentEvent>(SENT_EVENTS_CAPACITY);
    tokio::spawn(async move {
        loop {
            match sent_receiver.recv().await {
                Ok(event) => debug!(
                    unique_name = %format!("{}.{}", event.app_label, event.name),
                    channel = %event.channel,
                    uuid = %event.uuid,
                    "Message sent"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Sent event listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let scheduler =
        DeliveryScheduler::new(config.delivery_settings(), clock.clone(), reporter.clone())
            .with_sent_events(sent_events);
    let orchestrator = SendOrchestrator::new(
        Arc::new(PolicyEngine::new(policies, reporter.clone())),
        Arc::new(registry),
        Arc::new(TemplateRenderer::new(config.template_dir.clone())),
        Arc::new(scheduler),
        reporter,
    );

    Ok(Arc::new(ApiState {
        orchestrator: Arc::new(orchestrator),
        clock,
    }))
}

#[main]
async fn main() -> Result<(), Error> {
    let config = Config::try_parse().map_err(Error::other)?;
    init_logging(&config);

    let server_url = config.server_url();
    let state = build_state(&config).map_err(|err| Error::other(format!("{err:#}")))?;

    info!("Starting server at {}", server_url);

    Server::new(TcpListener::bind(format!("{}:{}", config.host, config.port)))
        .run(build_routes(state, &server_url))
        .await
}
