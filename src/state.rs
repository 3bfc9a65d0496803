use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::token::{generate_secret, TokenKeys};
use crate::config::Config;
use crate::services::{
    AuthService, CategoryService, MicropostCategoryService, MicropostService, UserService,
};
use crate::uploads::ImageStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub users: UserService,
    pub auth: AuthService,
    pub categories: CategoryService,
    pub microposts: MicropostService,
    pub micropost_categories: MicropostCategoryService,
    pub images: ImageStore,
}

impl AppState {
    /// Wire every service to the one shared pool.
    pub fn new(db: DbPool, config: Config) -> Self {
        let secret = config.auth.jwt_secret.clone().unwrap_or_else(|| {
            tracing::warn!(
                "No auth.jwt_secret configured; using a random secret, sessions end on restart"
            );
            generate_secret()
        });
        let keys = TokenKeys::new(&secret, config.auth.token_hours);

        let users = UserService::new(db.clone(), config.auth.bcrypt_cost);
        let micropost_categories = MicropostCategoryService::new(db.clone());

        Self {
            auth: AuthService::new(users.clone(), keys, config.auth.admin_emails.clone()),
            categories: CategoryService::new(db.clone()),
            microposts: MicropostService::new(
                db.clone(),
                users.clone(),
                micropost_categories.clone(),
            ),
            images: ImageStore::new(config.uploads_path()),
            users,
            micropost_categories,
            db,
            config,
        }
    }
}
