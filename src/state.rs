use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn, orm_from_pool},
    middleware::auth::SessionKeys,
    payments::PaymentGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub payments: Arc<dyn PaymentGateway>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        payments: Arc<dyn PaymentGateway>,
        sessions: SessionKeys,
    ) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            payments,
            sessions: Arc::new(sessions),
        }
    }
}
