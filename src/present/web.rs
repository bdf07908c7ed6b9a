//! 搜索网页服务
//!
//! 单页面：左侧搜索框，右侧显示所选谚语的分析，由两个 JSON 接口支撑。
//! 服务只读取合并后的数据集，不调用模型。

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::WebConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::Analysis;
use crate::present::search::{ProverbIndex, SearchHit};

pub struct AppState {
    pub index: ProverbIndex,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ProverbResponse {
    pub id: u64,
    pub proverb_gurmukhi: String,
    pub romanized: Option<String>,
    pub literal_translation: String,
    pub analysis: Analysis,
}

pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: WebConfig, index: ProverbIndex) -> Self {
        Self {
            config,
            state: Arc::new(AppState { index }),
        }
    }

    pub async fn start(&self) -> PipelineResult<()> {
        let address = format!("{}:{}", self.config.bind_addr, self.config.port);
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| PipelineError::Config(format!("failed to bind {address}: {e}")))?;

        tracing::info!(
            "search server listening on http://{} ({} proverbs)",
            address,
            self.state.index.len()
        );

        axum::serve(listener, create_router(self.state.clone()))
            .await
            .map_err(|e| PipelineError::Io(format!("server error: {e}")))
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/search", get(search))
        .route("/api/proverbs/:id", get(proverb))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let hits = state.index.search(&params.q);
    tracing::debug!(query = %params.q, hits = hits.len(), "search");
    Json(SearchResponse {
        query: params.q,
        hits,
    })
}

pub async fn proverb(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ProverbResponse>, (StatusCode, Json<serde_json::Value>)> {
    let entry = state.index.get(id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no proverb with id {id}") })),
        )
    })?;

    Ok(Json(ProverbResponse {
        id: entry.id,
        proverb_gurmukhi: entry.proverb_gurmukhi.clone(),
        romanized: entry.romanized_form.clone(),
        literal_translation: entry.literal_translation.clone(),
        analysis: entry.analysis.clone(),
    }))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Punjabi Proverb Explorer</title>
<style>
  body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
  #search { width: 35%; padding: 1.5rem; border-right: 1px solid #ddd; }
  #analysis { flex: 1; padding: 1.5rem; }
  input { width: 100%; padding: 0.5rem; font-size: 1rem; box-sizing: border-box; }
  label { display: block; margin: 0.5rem 0; cursor: pointer; }
  .gurmukhi { font-size: 1.6rem; }
  .muted { color: #777; }
</style>
</head>
<body>
<div id="search">
  <h2>Find a proverb</h2>
  <input id="query" placeholder="Type it in English letters, e.g. uchi dukan" autofocus>
  <div id="candidates"></div>
</div>
<div id="analysis"><p class="muted">Select a proverb to see its meaning.</p></div>
<script>
const candidates = document.getElementById("candidates");
const analysis = document.getElementById("analysis");
let timer = null;

function text(tag, value, cls) {
  const el = document.createElement(tag);
  el.textContent = value;
  if (cls) el.className = cls;
  return el;
}

async function show(id) {
  const res = await fetch("/api/proverbs/" + id);
  if (!res.ok) return;
  const p = await res.json();
  analysis.replaceChildren(
    text("p", p.proverb_gurmukhi, "gurmukhi"),
    text("p", p.romanized || "", "muted"),
    text("h3", "Meaning"),
    text("p", p.analysis.actual_translation),
    text("h3", "Deeper analysis"),
    text("p", p.analysis.deeper_analysis)
  );
}

async function search(q) {
  const res = await fetch("/api/search?q=" + encodeURIComponent(q));
  const data = await res.json();
  candidates.replaceChildren();
  if (q.trim() && data.hits.length === 0) {
    candidates.append(text("p", "No close match found.", "muted"));
  }
  for (const hit of data.hits) {
    const label = document.createElement("label");
    const radio = document.createElement("input");
    radio.type = "radio";
    radio.name = "pick";
    radio.style.width = "auto";
    radio.onchange = () => show(hit.id);
    label.append(radio, " " + hit.proverb_gurmukhi + " (" + hit.romanized + ")");
    candidates.append(label);
  }
}

document.getElementById("query").addEventListener("input", (e) => {
  clearTimeout(timer);
  timer = setTimeout(() => search(e.target.value), 200);
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::{MergedEntry, ProverbEntry};

    fn state() -> Arc<AppState> {
        let entry = MergedEntry::new(
            ProverbEntry::new(4, "ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ").with_literal_translation("High shop"),
            Analysis {
                actual_translation: "Looks better than it is.".to_string(),
                deeper_analysis: "Fancy storefront, poor goods.".to_string(),
            },
        );
        Arc::new(AppState {
            index: ProverbIndex::new(vec![entry], &PipelineConfig::default().search),
        })
    }

    #[tokio::test]
    async fn test_search_endpoint_returns_hits() {
        let Json(response) = search(
            State(state()),
            Query(SearchParams {
                q: "uchi dukan".to_string(),
            }),
        )
        .await;
        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.hits[0].id, 4);
    }

    #[tokio::test]
    async fn test_unknown_proverb_is_not_found() {
        let result = proverb(State(state()), Path(99)).await;
        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_proverb_endpoint_includes_analysis() {
        let Json(response) = proverb(State(state()), Path(4)).await.unwrap();
        assert_eq!(response.analysis.actual_translation, "Looks better than it is.");
        assert_eq!(
            response.romanized.as_deref(),
            Some("uccī dukāna phikkā pakavāna")
        );
    }
}
