use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    services::{ChatService, Notifier, PostService},
    storage::{ImageStore, PgImageStore},
    websocket::ConnectionRegistry,
};

/// Everything a request handler needs, built once at startup and cloned
/// into each worker. No module-level singletons; the registry and services
/// live here and are handed to whoever needs them.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub registry: ConnectionRegistry,
    pub notifier: Notifier,
    pub chat: ChatService,
    pub posts: PostService,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        let registry = ConnectionRegistry::new();
        let notifier = Notifier::new(db.clone(), registry.clone());
        let chat = ChatService::new(db.clone(), registry.clone(), notifier.clone());
        let images: Arc<dyn ImageStore> = Arc::new(PgImageStore::new(db.clone()));
        let posts = PostService::new(db.clone(), images, notifier.clone());

        Self {
            db,
            config,
            registry,
            notifier,
            chat,
            posts,
        }
    }
}
