// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime predicates, sorts, conditionals and raw rows.

#[sqlstencil::schema(dialect = "sqlserver")]
mod db {
    use sqlstencil::{Predicate, Rows, Sort};

    #[entity(table = "people", audit)]
    pub struct Person {
        #[key]
        #[generated]
        pub id: i64,
        pub name: String,
        pub nickname: Option<String>,
        pub created_at: String,
        pub updated_at: String
    }

    #[repository(entity = Person)]
    pub trait PersonRepo {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{where --param filter}} {{orderby name --param sort}}")]
        fn search(
            &self,
            filter: Predicate<Person>,
            sort: Sort<Person>
        ) -> Result<Vec<Person>, sqlstencil::Error>;

        #[sql("SELECT {{columns}} FROM {{table}} WHERE 1 = 1{{if notnull=nickname}} AND nickname = @nickname{{/if}}")]
        fn by_nickname(&self, nickname: Option<String>) -> Result<Vec<Person>, sqlstencil::Error>;

        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{where}}")]
        #[filter(|p| p.name.starts_with(prefix) && p.id > 10)]
        fn by_prefix(&self, prefix: &str) -> Result<Vec<Person>, sqlstencil::Error>;

        #[sql("SELECT name, COUNT(*) AS n FROM {{table}} GROUP BY name")]
        async fn stats(&self) -> Result<Rows, sqlstencil::Error>;
    }
}

fn main() {
    use db::{Person, PersonRepo};

    let repo = db::PersonRepoImpl::new(sqlstencil::mock::MockConnection::new());
    let _ = repo.search(Person::NAME.contains("an"), Person::ID.desc());
}
