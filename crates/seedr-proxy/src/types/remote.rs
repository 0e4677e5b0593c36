//! Request-side types for the remote storage endpoints

use serde::Deserialize;
use std::str::FromStr;

use crate::error::Error;

/// Kind of remote item a delete targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemType {
    #[default]
    File,
    Folder,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::File => "file",
            ItemType::Folder => "folder",
        }
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ItemType::File),
            "folder" => Ok(ItemType::Folder),
            other => Err(Error::InvalidItemType(other.to_string())),
        }
    }
}

/// Form body of `POST /add`
#[derive(Debug, Deserialize)]
pub struct AddTorrentForm {
    pub magnet: Option<String>,
}

/// Query of `GET /status`
#[derive(Debug, Deserialize)]
pub struct RemoteStatusQuery {
    pub file_id: Option<String>,
}

/// Query of `DELETE /items/:item_id`
///
/// Kept as a raw string so an unknown value is a 400, not a 422.
#[derive(Debug, Deserialize)]
pub struct DeleteItemQuery {
    pub item_type: Option<String>,
}
