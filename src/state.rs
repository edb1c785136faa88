use std::sync::Arc;

use crate::db::MediaRepository;
use crate::services::assets::AssetStore;
use crate::services::scratch::ScratchDir;

#[derive(Clone)]
pub struct AppState {
    pub media: Arc<dyn MediaRepository>,
    pub assets: Arc<dyn AssetStore>,
    pub scratch: Arc<ScratchDir>,
}
