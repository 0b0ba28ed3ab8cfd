//storage holds the MongoDB snapshot schema & async CRUD, plus mesh export

pub mod export;
pub mod models;

use std::time::Duration;

use bson::{Document, doc};
use futures_util::stream::TryStreamExt;
use log::info;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use thiserror::Error;

use crate::models::TerrainSnapshot;

pub use export::write_obj;

// Give up on an unreachable server after this long unless the URI says otherwise
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error(transparent)]
    Scene(#[from] isle_core::SceneError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

// One collection of terrain snapshots, unique by name
pub struct SceneStore {
    col: Collection<TerrainSnapshot>,
}

impl SceneStore {
    // Initialize the MongoDB collection and its unique name index
    pub async fn init(uri: &str, db_name: &str, col_name: &str) -> Result<Self> {
        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("isle".to_string());
        opts.server_selection_timeout.get_or_insert(SERVER_SELECTION_TIMEOUT);
        let client = Client::with_options(opts)?;
        let col = client.database(db_name).collection(col_name);

        let index_model = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        col.create_index(index_model).await?;

        Ok(Self { col })
    }

    pub async fn list_names(&self) -> Result<Vec<String>> {
        // Only the names; the heightmaps stay on the server
        let mut cursor = self
            .col
            .clone_with_type::<Document>()
            .find(doc! {})
            .projection(doc! { "name": 1, "_id": 0 })
            .sort(doc! { "name": 1 })
            .await?;
        let mut names = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            if let Ok(name) = doc.get_str("name") {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub async fn read_by_name(&self, name: &str) -> Result<Option<TerrainSnapshot>> {
        Ok(self.col.find_one(doc! { "name": name }).await?)
    }

    // Insert a snapshot. An existing document with the same name is replaced.
    pub async fn create(&self, doc_obj: &TerrainSnapshot) -> Result<()> {
        doc_obj
            .terrain_config()
            .validate()
            .map_err(isle_core::SceneError::from)?;

        let result = self
            .col
            .replace_one(doc! { "name": &doc_obj.name }, doc_obj)
            .upsert(true)
            .await?;

        info!(
            "{} snapshot {:?} ({}x{}, {} heights)",
            if result.matched_count > 0 { "replaced" } else { "stored" },
            doc_obj.name,
            doc_obj.width,
            doc_obj.height,
            doc_obj.height_map.len()
        );
        Ok(())
    }

    // Returns whether a document was removed
    pub async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let result = self.col.delete_one(doc! { "name": name }).await?;
        let deleted = result.deleted_count > 0;
        if deleted {
            info!("deleted snapshot {:?}", name);
        }
        Ok(deleted)
    }

    // Drop the whole collection (for clean-up)
    pub async fn drop_all(&self) -> Result<()> {
        self.col.drop().await?;
        info!("dropped snapshot collection {}", self.col.name());
        Ok(())
    }
}
