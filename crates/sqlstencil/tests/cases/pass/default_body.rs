// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Methods with a default body and no template are left alone.

#[sqlstencil::schema]
mod db {
    #[entity(table = "tags")]
    pub struct Tag {
        #[key]
        pub id: i64,
        pub label: String
    }

    #[repository(entity = Tag)]
    pub trait TagRepo {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<Tag>, sqlstencil::Error>;

        fn labels(&self) -> Result<Vec<String>, sqlstencil::Error> {
            Ok(self.all()?.into_iter().map(|tag| tag.label).collect())
        }
    }
}

fn main() {
    use db::TagRepo;

    let repo = db::TagRepoImpl::new(sqlstencil::mock::MockConnection::new());
    let _ = repo.labels();
}
