// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Methods may return any error type convertible from `sqlstencil::Error`.

#[derive(Debug)]
pub enum AppError {
    Database(sqlstencil::Error),
    NotFound
}

impl From<sqlstencil::Error> for AppError {
    fn from(err: sqlstencil::Error) -> Self {
        AppError::Database(err)
    }
}

#[sqlstencil::schema(dialect = "sqlite")]
mod db {
    use super::AppError;

    #[entity(table = "products")]
    pub struct Product {
        #[key]
        pub id: i64,
        pub name: String,
        pub price: i64
    }

    #[repository(entity = Product)]
    pub trait ProductRepo {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{by_key}}")]
        fn find(&self, id: i64) -> Result<Option<Product>, AppError>;

        #[sql("SELECT COUNT(*) FROM {{table}}")]
        async fn count(&self) -> Result<i64, AppError>;
    }
}

fn main() {
    use db::ProductRepo;

    let repo = db::ProductRepoImpl::new(sqlstencil::mock::MockConnection::new());
    match repo.find(1) {
        Ok(_) | Err(AppError::NotFound) | Err(AppError::Database(_)) => {}
    }
}
