use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    hub::NotificationHub,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub hub: NotificationHub,
    pub config: AppConfig,
}
