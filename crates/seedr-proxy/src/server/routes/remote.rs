//! Synchronous remote storage endpoints
//!
//! Each handler performs one provider call and relays its JSON result.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Path, Query, State,
    },
    Json,
};
use serde_json::Value;

use crate::error::{Error, Result, ValidationDetail};
use crate::server::state::AppState;
use crate::types::remote::{AddTorrentForm, DeleteItemQuery, RemoteStatusQuery};
use crate::types::ItemType;

/// POST /add - Add a torrent by magnet link
pub async fn add_torrent(
    State(state): State<AppState>,
    form: std::result::Result<Form<AddTorrentForm>, FormRejection>,
) -> Result<Json<Value>> {
    let Form(form) = form?;
    let magnet = form
        .magnet
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::Validation(vec![ValidationDetail::missing("body", "magnet")]))?;

    tracing::info!("Adding torrent");
    Ok(Json(state.remote().add_torrent(&magnet).await?))
}

/// GET /list - List the account's root folder
pub async fn list_contents(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(Json(state.remote().list_contents().await?))
}

/// GET /status - One file when `file_id` is given, otherwise the listing
pub async fn remote_status(
    State(state): State<AppState>,
    query: std::result::Result<Query<RemoteStatusQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;

    let result = match query.file_id {
        Some(file_id) => state.remote().get_file(&file_id).await?,
        None => state.remote().list_contents().await?,
    };
    Ok(Json(result))
}

/// DELETE /items/:item_id - Delete a remote file or folder
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    query: std::result::Result<Query<DeleteItemQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let item_type = match query.item_type.as_deref() {
        Some(raw) => raw.parse()?,
        None => ItemType::default(),
    };

    tracing::info!(item_id = %item_id, "Deleting remote {}", item_type.as_str());
    let result = match item_type {
        ItemType::File => state.remote().delete_file(&item_id).await?,
        ItemType::Folder => state.remote().delete_folder(&item_id).await?,
    };
    Ok(Json(result))
}
