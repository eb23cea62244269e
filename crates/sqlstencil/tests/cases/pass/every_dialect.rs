// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! One entity rendered for every dialect.

#[sqlstencil::schema]
mod db {
    #[entity(table = "orders", schema = "shop")]
    pub struct Order {
        #[key]
        #[generated]
        pub id: i64,
        pub customer: String,
        pub total: i64
    }

    #[repository(entity = Order, name = "PgOrders")]
    pub trait PgRepo {
        #[sql("SELECT {{columns}} FROM {{table}} {{orderby total:desc}} {{limit 10}}")]
        fn top(&self) -> Result<Vec<Order>, sqlstencil::Error>;
    }

    #[repository(entity = Order, name = "MyOrders", dialect = "mysql")]
    pub trait MyRepo {
        #[sql("SELECT {{columns}} FROM {{table}} {{orderby total:desc}} {{limit 10}}")]
        fn top(&self) -> Result<Vec<Order>, sqlstencil::Error>;
    }

    #[repository(entity = Order, name = "LiteOrders", dialect = "sqlite")]
    pub trait LiteRepo {
        #[sql("SELECT {{columns}} FROM {{table}} {{orderby total:desc}} {{limit 10}}")]
        fn top(&self) -> Result<Vec<Order>, sqlstencil::Error>;
    }

    #[repository(entity = Order, name = "MsOrders", dialect = "sqlserver")]
    pub trait MsRepo {
        #[sql("SELECT {{columns}} FROM {{table}} {{orderby total:desc}} {{limit 10}}")]
        fn top(&self) -> Result<Vec<Order>, sqlstencil::Error>;
    }

    #[repository(entity = Order, name = "OraOrders", dialect = "oracle")]
    pub trait OraRepo {
        #[sql("SELECT {{columns}} FROM {{table}} {{orderby total:desc}} {{limit 10}}")]
        fn top(&self) -> Result<Vec<Order>, sqlstencil::Error>;
    }
}

fn main() {
    let _ = db::PgOrders::new(sqlstencil::mock::MockConnection::new());
    let _ = db::OraOrders::new(sqlstencil::mock::MockConnection::new());
}
