//! Server-rendered front end. Holds no product state of its own: every page
//! is built from, and every form is forwarded to, the product API through
//! [`ProductApiClient`].

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, instrument, warn};

use crate::app::{health, with_http_layers};
use crate::client::ProductApiClient;
use crate::products::dto::{ProductRequest, ProductResponse};

#[derive(Clone)]
pub struct WebState {
    pub api: ProductApiClient,
    pub templates: Arc<Tera>,
}

impl WebState {
    pub fn new(api: ProductApiClient) -> anyhow::Result<Self> {
        Ok(Self {
            api,
            templates: Arc::new(templates()?),
        })
    }
}

pub fn templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("edit.html", include_str!("../templates/edit.html")),
    ])
    .context("load templates")?;
    Ok(tera)
}

pub fn build_web(state: WebState) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/products", post(create))
        .route("/products/:id", post(update))
        .route("/products/:id/edit", get(edit))
        .route("/products/:id/delete", post(delete))
        .route("/health", get(health))
        .with_state(state);
    with_http_layers(router)
}

/// Raw form fields; price stays text until submitted so bad input can be
/// echoed back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
}

impl ProductForm {
    fn to_request(&self) -> Result<ProductRequest, String> {
        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| "Product price must be a number".to_string())?;
        Ok(ProductRequest {
            name: self.name.clone(),
            price,
            description: Some(self.description.clone()),
        })
    }
}

impl From<&ProductResponse> for ProductForm {
    fn from(p: &ProductResponse) -> Self {
        Self {
            name: p.name.clone(),
            price: format!("{:.2}", p.price),
            description: p.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProductRow {
    id: i32,
    name: String,
    price: String,
    description: String,
}

impl From<ProductResponse> for ProductRow {
    fn from(p: ProductResponse) -> Self {
        Self {
            id: p.id,
            price: format!("{:.2}", p.price),
            name: p.name,
            description: p.description,
        }
    }
}

#[instrument(skip(state))]
async fn index(State(state): State<WebState>) -> Response {
    render_index(&state, ProductForm::default(), None).await
}

#[instrument(skip(state, form))]
async fn create(State(state): State<WebState>, Form(form): Form<ProductForm>) -> Response {
    let request = match form.to_request() {
        Ok(r) => r,
        Err(msg) => return render_index(&state, form, Some(msg)).await,
    };
    match state.api.create_product(&request).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => render_index(&state, form, Some(e.to_string())).await,
    }
}

#[instrument(skip(state))]
async fn edit(State(state): State<WebState>, Path(id): Path<i32>) -> Response {
    match state.api.get_product(id).await {
        Ok(product) => render_edit(&state, id, ProductForm::from(&product), None),
        Err(e) => render_index(&state, ProductForm::default(), Some(e.to_string())).await,
    }
}

#[instrument(skip(state, form))]
async fn update(
    State(state): State<WebState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Response {
    let request = match form.to_request() {
        Ok(r) => r,
        Err(msg) => return render_edit(&state, id, form, Some(msg)),
    };
    match state.api.update_product(id, &request).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => render_edit(&state, id, form, Some(e.to_string())),
    }
}

#[instrument(skip(state))]
async fn delete(State(state): State<WebState>, Path(id): Path<i32>) -> Response {
    match state.api.delete_product(id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => render_index(&state, ProductForm::default(), Some(e.to_string())).await,
    }
}

async fn render_index(state: &WebState, form: ProductForm, error: Option<String>) -> Response {
    let (products, error) = match state.api.list_products().await {
        Ok(products) => (products, error),
        // a submit error is more useful to the user than the listing failure
        Err(e) => (Vec::new(), error.or_else(|| Some(e.to_string()))),
    };
    if let Some(msg) = &error {
        warn!(error = %msg, "rendering product list with error");
    }
    let rows: Vec<ProductRow> = products.into_iter().map(ProductRow::from).collect();

    let mut ctx = Context::new();
    ctx.insert("products", &rows);
    ctx.insert("form", &form);
    ctx.insert("error", &error);
    render(state, "index.html", &ctx)
}

fn render_edit(state: &WebState, id: i32, form: ProductForm, error: Option<String>) -> Response {
    if let Some(msg) = &error {
        warn!(product_id = id, error = %msg, "rendering edit form with error");
    }
    let mut ctx = Context::new();
    ctx.insert("id", &id);
    ctx.insert("form", &form);
    ctx.insert("error", &error);
    render(state, "edit.html", &ctx)
}

fn render(state: &WebState, template: &str, ctx: &Context) -> Response {
    match state.templates.render(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = ?e, template, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
        }
    }
}
