// tests/support/fixtures.rs
use blog_search::domain::article::{Article, ArticleRepository, Author};

pub fn john_smith() -> Author {
    Author::new("John Smith")
}

pub fn john_doe() -> Author {
    Author::new("John Doe")
}

pub struct Seeded {
    pub spring: Article,
    pub practice: Article,
}

/// Two articles: one by John Smith and John Doe, one by John Doe alone whose
/// title is the only one containing "practice".
pub async fn seed(repo: &dyn ArticleRepository) -> Seeded {
    let spring = repo
        .save(Article::new("Spring Data Elasticsearch").with_authors([john_smith(), john_doe()]))
        .await
        .expect("seed spring article");
    let practice = repo
        .save(Article::new("What should we practice next?").with_authors([john_doe()]))
        .await
        .expect("seed practice article");
    Seeded { spring, practice }
}
