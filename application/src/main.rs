use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, config, graphql, ApiToken, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use futures::{future, TryFutureExt as _};
use hub::{infra::Postgres, Hub};
use juniper::EmptySubscription;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written to `stderr` instead of `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] to be emitted, set once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    init_logging();

    _ = start().await;
}

/// Sets up the global [`tracing`] subscriber, splitting events between
/// `stdout` and `stderr` by their level.
fn init_logging() {
    let enabled = |meta: &log::Metadata<'_>, stderr: bool| {
        let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
        meta.is_span()
            || (STDERR_LEVELS.contains(meta.level()) == stderr
                && max >= *meta.level())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(move |meta| enabled(meta, false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(move |meta| enabled(meta, true))),
        )
        .init();
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        hub,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    postgres.migrate().await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;

    let (hub, background) = Hub::new(hub.into(), postgres);

    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    if server.api_token.is_none() {
        log::warn!("no API token configured, mutations are not protected");
    }
    let api_token = ApiToken(server.api_token.map(Arc::new));

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(hub))
        .layer(Extension(api_token))
        .layer(cors_layer(&server.cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response),
        );

    let addr = (server.host.clone(), server.port);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        log::error!(
            "failed to listen on `{}:{}`: {e}",
            server.host,
            server.port,
        );
    })?;
    log::info!("listening on `{}:{}`", server.host, server.port);

    future::try_join(
        axum::serve(listener, app)
            .into_future()
            .map_err(|e| log::error!("webserver failed: {e}")),
        background.into_future().map_err(drop),
    )
    .await
    .map(drop)
}

/// Builds a [`CorsLayer`] allowing GraphQL requests from the configured
/// origins.
///
/// A `*` origin allows any.
fn cors_layer(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ]);
    if conf.origins.iter().any(|o| o == "*") {
        return Ok(cors.allow_origin(Any));
    }

    let origins = conf
        .origins
        .iter()
        .map(|origin| {
            origin.parse::<http::header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not a correct CORS origin: {e}");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cors.allow_origin(origins))
}

/// Creates a [`tracing::Span`] for the provided HTTP request.
fn request_span<B>(r: &http::Request<B>) -> tracing::Span {
    let client_ip = InsecureClientIp::from(r.headers(), r.extensions())
        .map(|ip| ip.0.to_string())
        .ok();

    tracing::info_span!(
        "HTTP request",
        http.client_ip = client_ip,
        http.flavor = ?r.version(),
        http.host = r.uri().host(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.scheme = r.uri().scheme().map(http::uri::Scheme::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Logs the provided HTTP response within its request [`tracing::Span`].
fn log_response<B>(
    r: &http::Response<B>,
    dur: time::Duration,
    span: &tracing::Span,
) {
    let status = r.status();
    _ = span.record("http.status_code", status.as_u16());

    let duration = format!("{}ms", dur.as_millis());
    if status.is_client_error() || status.is_server_error() {
        tracing::error!(duration = %duration);
    } else {
        tracing::info!(duration = %duration);
    }
}
