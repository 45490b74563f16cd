//! Quick search and IMEI lookups.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use celltrack_core::imei::{imei_info, is_valid_imei, normalize_imei, ImeiInfo};
use celltrack_core::search::{parse_search_query, SearchQuery};
use celltrack_core::validation::validate_search_query;
use celltrack_core::{PhoneListing, SaleListing};
use celltrack_db::PhoneFilter;

use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/imei/{imei}", get(imei_lookup))
        .route("/search", get(search))
}

/// `GET /imei/{imei}`
#[derive(Debug, Serialize)]
pub struct ImeiResponse {
    /// Input with spaces and dashes removed.
    pub imei: String,
    pub valid: bool,
    /// TAC/serial breakdown, present only for valid IMEIs.
    pub info: Option<ImeiInfo>,
    /// The phone in inventory with this IMEI, if any.
    pub phone: Option<PhoneListing>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// `GET /search?q=`
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// How the input was understood.
    pub query: SearchQuery,
    pub phones: Vec<PhoneListing>,
    /// Set when the input was a `SALE:` QR payload.
    pub sale: Option<SaleListing>,
}

async fn imei_lookup(
    State(state): State<Arc<AppState>>,
    Path(imei): Path<String>,
) -> ApiResult<Json<ImeiResponse>> {
    let imei = normalize_imei(&imei);
    let phone = state.db.phones().get_by_imei(&imei).await?;

    Ok(Json(ImeiResponse {
        valid: is_valid_imei(&imei),
        info: imei_info(&imei),
        phone,
        imei,
    }))
}

/// Resolves the search box input.
///
/// IMEIs, ids and `PHONE:` payloads resolve to at most one phone; a `SALE:`
/// payload resolves to the sale and its phone; anything else runs the
/// inventory text search, sold phones included.
async fn search(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let input = validate_search_query(&params.q)?;
    if input.is_empty() {
        return Ok(Json(SearchResponse {
            query: SearchQuery::Text { text: input },
            phones: Vec::new(),
            sale: None,
        }));
    }

    let query = parse_search_query(&input);
    debug!(?query, "Search");

    let phones = state.db.phones();
    let (found, sale): (Vec<PhoneListing>, Option<SaleListing>) = match &query {
        SearchQuery::Imei { imei, .. } => (phones.get_by_imei(imei).await?.into_iter().collect(), None),
        SearchQuery::Uuid { id } => match phones.get(id).await? {
            Some(phone) => (vec![phone], None),
            None => {
                let sale = state.db.sales().get(id).await?;
                (sale_phone(&state, sale.as_ref()).await?, sale)
            }
        },
        SearchQuery::QrPhone { id, .. } => (phones.get(id).await?.into_iter().collect(), None),
        SearchQuery::QrSale { id } => {
            let sale = state.db.sales().get(id).await?;
            (sale_phone(&state, sale.as_ref()).await?, sale)
        }
        SearchQuery::Text { text } => {
            let filter = PhoneFilter {
                include_sold: true,
                ..PhoneFilter::default()
            }
            .search(text.as_str());
            let page = phones.list(&filter, 1, state.config.page_size()).await?;
            (page.items, None)
        }
    };

    Ok(Json(SearchResponse {
        query,
        phones: found,
        sale,
    }))
}

async fn sale_phone(state: &AppState, sale: Option<&SaleListing>) -> ApiResult<Vec<PhoneListing>> {
    match sale {
        Some(sale) => Ok(state
            .db
            .phones()
            .get(&sale.sale.phone_id)
            .await?
            .into_iter()
            .collect()),
        None => Ok(Vec::new()),
    }
}
