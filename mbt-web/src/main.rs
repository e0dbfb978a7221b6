//! Servidor web Axum que expõe o etiquetador baseado em memória via HTTP

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use mbt_core::{
    corpus::demo_texts, InputKind, MbtError, Pipeline, Sentence, SentenceReader, TagResult,
    Tagger, TaggerConfig, TaggerModel, Trainer, Word,
};
use serde::{Deserialize, Serialize};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Serve a memory-based tagger over HTTP
#[derive(Debug, Parser)]
struct Args {
    /// read tagger settings from a JSON file
    #[arg(short, long, value_name = "SETTINGS")]
    settings: Option<PathBuf>,
    /// train from a tagged corpus instead of the built-in one
    #[arg(short, long, value_name = "CORPUS")]
    corpus: Option<PathBuf>,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
    /// maximum number of requests tagged at the same time
    #[arg(long, default_value_t = 25)]
    max_connections: usize,
}

/// Estado compartilhado da aplicação
struct AppState {
    model: Arc<TaggerModel>,
}

#[derive(Deserialize)]
struct TokenInput {
    word: String,
    #[serde(default)]
    enrichment: Vec<String>,
    /// Tag de referência opcional, ecoada na resposta.
    #[serde(default)]
    tag: Option<String>,
}

/// Texto livre (uma ou mais sentenças) ou tokens já separados.
#[derive(Deserialize)]
struct TagRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tokens: Option<Vec<TokenInput>>,
}

#[derive(Serialize)]
struct TagResponse {
    sentences: Vec<Vec<TagResult>>,
    total_tokens: usize,
    processing_ms: u64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    known_template: String,
    unknown_template: String,
    beam_size: usize,
    lexicon_entries: usize,
}

/// Erro convertido em resposta JSON.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<MbtError> for ApiError {
    fn from(err: MbtError) -> Self {
        let status = match &err {
            MbtError::MalformedLine { .. } | MbtError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    info!(?args, "iniciando");
    let model = load_model(&args)?;
    let state = Arc::new(AppState { model });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/tag", post(tag_handler))
        .route("/tag/lines", post(tag_lines_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .layer(GlobalConcurrencyLimitLayer::new(args.max_connections))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Etiquetador iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Treina o modelo a partir do corpus informado ou do embutido.
fn load_model(args: &Args) -> mbt_core::Result<Arc<TaggerModel>> {
    let config = match &args.settings {
        Some(path) => TaggerConfig::from_json_file(path)?,
        None => TaggerConfig::default(),
    };
    let Some(path) = &args.corpus else {
        return Ok(Arc::clone(Pipeline::demo(config)?.model()));
    };

    let kind = config.input_kind;
    let training = TaggerConfig {
        input_kind: if kind == InputKind::Untagged {
            InputKind::Tagged
        } else {
            kind
        },
        ..config
    };
    let reader = BufReader::new(File::open(path)?);
    let (model, report) = Trainer::new(training)?.train(reader)?;
    info!("corpus {} carregado\n{}", path.display(), report);
    Ok(Arc::new(model.with_input_kind(kind)))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model = &state.model;
    Json(HealthResponse {
        status: "ok",
        known_template: model.known_template().to_string(),
        unknown_template: model.unknown_template().to_string(),
        beam_size: model.config().beam_size,
        lexicon_entries: model.lexicon().len(),
    })
}

/// Etiquetagem via JSON
async fn tag_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TagRequest>,
) -> Result<Json<TagResponse>, ApiError> {
    let sentences = match (req.text, req.tokens) {
        (_, Some(tokens)) if !tokens.is_empty() => vec![tokens_to_sentence(tokens)],
        (Some(text), _) if !text.trim().is_empty() => split_text(&state.model, &text)?,
        _ => {
            return Err(ApiError(
                StatusCode::BAD_REQUEST,
                "texto ou tokens vazios".into(),
            ))
        }
    };

    let model = Arc::clone(&state.model);
    let start = Instant::now();
    let sentences = run_blocking(move || {
        let mut tagger = Tagger::new(model);
        sentences
            .into_iter()
            .map(|mut s| tagger.tag_sentence(&mut s))
            .collect::<mbt_core::Result<Vec<_>>>()
    })
    .await?;

    let total_tokens = sentences.iter().map(Vec::len).sum();
    info!(total_tokens, "requisição etiquetada");
    Ok(Json(TagResponse {
        sentences,
        total_tokens,
        processing_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Etiquetagem texto-para-texto no formato configurado do modelo
async fn tag_lines_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<String, ApiError> {
    let model = Arc::clone(&state.model);
    run_blocking(move || {
        let mut pipeline = Pipeline::new(model);
        let mut out = Vec::new();
        let stats = pipeline.process(body.as_bytes(), &mut out)?;
        if stats.skipped_lines > 0 {
            warn!(skipped = stats.skipped_lines, "linhas ignoradas na requisição");
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    })
    .await
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(domain, text)| {
            serde_json::json!({
                "domain": domain,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Divide texto livre em sentenças pelo marcador configurado.
fn split_text(model: &TaggerModel, text: &str) -> Result<Vec<Sentence>, ApiError> {
    let eos = model.config().eos_marker.clone();
    SentenceReader::new(text.as_bytes(), InputKind::Untagged, eos)
        .collect::<mbt_core::Result<Vec<_>>>()
        .map_err(ApiError::from)
}

fn tokens_to_sentence(tokens: Vec<TokenInput>) -> Sentence {
    Sentence::from_words(
        tokens
            .into_iter()
            .map(|t| {
                let mut word = Word::new(&t.word);
                word.input_tag = t.tag;
                word.enrichment = t.enrichment;
                word
            })
            .collect(),
    )
}

/// A decodificação é síncrona: roda fora do runtime assíncrono.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> mbt_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => Err(ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}
