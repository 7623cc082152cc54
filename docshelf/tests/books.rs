//! End-to-end scenarios for a book catalog against the in-memory backend.

use bson::{Bson, Uuid, doc};
use serde::{Deserialize, Serialize};

use docshelf::{memory::InMemoryStore, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Book {
    id: Uuid,
    title: String,
    author: String,
    genre: String,
    published_year: i32,
    price: f64,
    in_stock: bool,
}

impl Document for Book {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "books"
    }
}

fn book(
    title: &str,
    author: &str,
    genre: &str,
    published_year: i32,
    price: f64,
    in_stock: bool,
) -> Book {
    Book {
        id: Uuid::new(),
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        published_year,
        price,
        in_stock,
    }
}

fn catalog() -> Vec<Book> {
    vec![
        book("1984", "George Orwell", "Dystopian", 1949, 9.99, true),
        book("Animal Farm", "George Orwell", "Dystopian", 1945, 7.99, true),
        book("Burmese Days", "George Orwell", "Fiction", 1934, 8.50, false),
        book("The Hobbit", "J.R.R. Tolkien", "Fantasy", 1937, 14.99, true),
        book("The Fellowship of the Ring", "J.R.R. Tolkien", "Fantasy", 1954, 17.50, true),
        book("Wuthering Heights", "Emily Bronte", "Fiction", 1847, 6.99, false),
        book("Dune", "Frank Herbert", "Science Fiction", 1965, 12.50, true),
        book("Neuromancer", "William Gibson", "Science Fiction", 1984, 11.25, false),
        book("The Martian", "Andy Weir", "Science Fiction", 2011, 15.99, true),
        book("Project Hail Mary", "Andy Weir", "Science Fiction", 2021, 18.99, true),
        book("Klara and the Sun", "Kazuo Ishiguro", "Fiction", 2021, 16.75, false),
    ]
}

async fn seeded_store() -> DocumentStore<InMemoryStore> {
    let store = DocumentStore::new(InMemoryStore::new());
    store
        .typed_collection::<Book>()
        .insert(catalog())
        .await
        .unwrap();

    store
}

fn titles(books: &[Book]) -> Vec<&str> {
    books
        .iter()
        .map(|b| b.title.as_str())
        .collect()
}

#[tokio::test]
async fn finds_books_by_genre() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .find(
            FindQuery::builder()
                .filter(Filter::eq("genre", "Science Fiction"))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|b| b.genre == "Science Fiction"));
}

#[tokio::test]
async fn finds_books_published_after_1950() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .find(
            FindQuery::builder()
                .filter(Filter::gt("published_year", 1950))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|b| b.published_year > 1950));
}

#[tokio::test]
async fn finds_books_by_author() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .find(
            FindQuery::builder()
                .filter(Filter::eq("author", "George Orwell"))
                .sort("published_year", SortDirection::Asc)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(titles(&results), vec!["Burmese Days", "Animal Farm", "1984"]);
}

#[tokio::test]
async fn updates_one_book_price() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let modified = books
        .update_where(Filter::eq("title", "The Hobbit"), doc! { "price": 15.99 })
        .await
        .unwrap();
    assert_eq!(modified, 1);

    let hobbit = books
        .find_one(
            FindQuery::builder()
                .filter(Filter::eq("title", "The Hobbit"))
                .build(),
        )
        .await
        .unwrap()
        .unwrap();
    assert!((hobbit.price - 15.99).abs() < 1e-9);

    // Everything else is untouched.
    let others = books
        .find(
            FindQuery::builder()
                .filter(Filter::ne("title", "The Hobbit"))
                .build(),
        )
        .await
        .unwrap();
    assert!(others.iter().all(|b| (b.price - 15.99).abs() > 1e-9));
}

#[tokio::test]
async fn deletes_one_book_by_title() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let deleted = books
        .delete_where(Filter::eq("title", "Wuthering Heights"))
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let remaining = books.find(FindQuery::new()).await.unwrap();
    assert_eq!(remaining.len(), 10);
    assert!(remaining.iter().all(|b| b.title != "Wuthering Heights"));
}

#[tokio::test]
async fn finds_in_stock_books_published_after_2010() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .find(
            FindQuery::builder()
                .filter(Filter::eq("in_stock", true).and(Filter::gt("published_year", 2010)))
                .sort("published_year", SortDirection::Asc)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(titles(&results), vec!["The Martian", "Project Hail Mary"]);
}

#[tokio::test]
async fn projects_title_author_and_price() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .project(
            FindQuery::builder()
                .filter(Filter::eq("genre", "Fantasy"))
                .project(Projection::include(["title", "author", "price"]))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for result in results {
        let fields = result.as_document().unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.get("title").is_some());
        assert!(fields.get("author").is_some());
        assert!(fields.get("price").is_some());
        assert!(fields.get("genre").is_none());
        assert!(fields.get("id").is_none());
    }
}

#[tokio::test]
async fn sorts_by_price_in_both_directions() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let ascending = books
        .find(
            FindQuery::builder()
                .sort("price", SortDirection::Asc)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(ascending.first().map(|b| b.title.as_str()), Some("Wuthering Heights"));
    assert_eq!(ascending.last().map(|b| b.title.as_str()), Some("Project Hail Mary"));

    let descending = books
        .find(
            FindQuery::builder()
                .sort("price", SortDirection::Desc)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(descending.first().map(|b| b.title.as_str()), Some("Project Hail Mary"));
}

#[tokio::test]
async fn paginates_five_books_at_a_time() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let results = books
            .find(
                PaginationParams::new(page, 5)
                    .apply(FindQuery::builder())
                    .sort("title", SortDirection::Asc)
                    .build(),
            )
            .await
            .unwrap();

        match page {
            1 | 2 => assert_eq!(results.len(), 5),
            _ => assert_eq!(results.len(), 1),
        }

        seen.extend(results.into_iter().map(|b| b.title));
    }

    assert_eq!(seen.len(), 11);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
}

#[tokio::test]
async fn averages_price_per_genre() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .aggregate(
            Pipeline::builder()
                .group(ValueExpr::field("genre"), [(
                    "average_price",
                    Accumulator::Avg(ValueExpr::field("price")),
                )])
                .sort("_id", SortDirection::Asc)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 4);

    let fantasy = results
        .iter()
        .filter_map(|r| r.as_document())
        .find(|d| d.get_str("_id").ok() == Some("Fantasy"))
        .unwrap();
    let average = fantasy.get_f64("average_price").unwrap();
    assert!((average - 16.245).abs() < 1e-9);
}

#[tokio::test]
async fn finds_the_most_prolific_author() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let results = books
        .aggregate(
            Pipeline::builder()
                .group(ValueExpr::field("author"), [(
                    "book_count",
                    Accumulator::Sum(ValueExpr::lit(1)),
                )])
                .sort("book_count", SortDirection::Desc)
                .limit(1)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let top = results[0].as_document().unwrap();
    assert_eq!(top.get_str("_id").ok(), Some("George Orwell"));
    assert_eq!(top.get_i64("book_count").ok(), Some(3));
}

#[tokio::test]
async fn counts_books_per_decade() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let decade = ValueExpr::subtract(
        ValueExpr::field("published_year"),
        ValueExpr::modulo(ValueExpr::field("published_year"), ValueExpr::lit(10)),
    );

    let results = books
        .aggregate(
            Pipeline::builder()
                .project([("decade", decade)])
                .group(ValueExpr::field("decade"), [(
                    "count",
                    Accumulator::Sum(ValueExpr::lit(1)),
                )])
                .sort("_id", SortDirection::Asc)
                .build(),
        )
        .await
        .unwrap();

    let decades: Vec<(i64, i64)> = results
        .iter()
        .filter_map(|r| r.as_document())
        .map(|d| (d.get_i64("_id").unwrap(), d.get_i64("count").unwrap()))
        .collect();

    assert_eq!(
        decades,
        vec![
            (1840, 1),
            (1930, 2),
            (1940, 2),
            (1950, 1),
            (1960, 1),
            (1980, 1),
            (2010, 1),
            (2020, 2),
        ],
    );
}

#[tokio::test]
async fn creates_and_lists_indexes() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    books.create_index(IndexSpec::asc("title")).await.unwrap();
    books
        .create_index(IndexSpec::compound([
            IndexKey::asc("author"),
            IndexKey::asc("published_year"),
        ]))
        .await
        .unwrap();

    let indexes = books.list_indexes().await.unwrap();
    let names: Vec<&str> = indexes
        .iter()
        .map(|i| i.name.as_str())
        .collect();

    assert_eq!(names, vec!["title_1", "author_1_published_year_1"]);
}

#[tokio::test]
async fn drops_indexes_by_spec_and_by_name() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let title = IndexSpec::asc("title");
    books.create_index(title.clone()).await.unwrap();
    books
        .create_index(IndexSpec::compound([
            IndexKey::asc("author"),
            IndexKey::asc("published_year"),
        ]))
        .await
        .unwrap();

    books.drop_index(&title).await.unwrap();
    books
        .drop_index_named("author_1_published_year_1")
        .await
        .unwrap();

    assert!(books.list_indexes().await.unwrap().is_empty());
}

#[tokio::test]
async fn explain_shows_index_adoption() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    let query = FindQuery::builder()
        .filter(Filter::eq("title", "Dune"))
        .build();

    let before = books.explain(query.clone()).await.unwrap();
    assert!(before.is_collection_scan());
    assert_eq!(before.stats.documents_examined, 11);
    assert_eq!(before.stats.returned, 1);

    books.create_index(IndexSpec::asc("title")).await.unwrap();

    let after = books.explain(query).await.unwrap();
    assert_eq!(after.used_index(), Some("title_1"));
    assert_eq!(after.stats.keys_examined, 1);
    assert_eq!(after.stats.documents_examined, 1);
    assert_eq!(after.stats.returned, 1);
}

#[tokio::test]
async fn compound_index_serves_author_queries() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    books
        .create_index(IndexSpec::compound([
            IndexKey::asc("author"),
            IndexKey::asc("published_year"),
        ]))
        .await
        .unwrap();

    let report = books
        .explain(
            FindQuery::builder()
                .filter(
                    Filter::eq("author", "J.R.R. Tolkien")
                        .and(Filter::gt("published_year", 1950)),
                )
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(report.used_index(), Some("author_1_published_year_1"));
    assert_eq!(report.stats.returned, 1);
}

#[tokio::test]
async fn hints_override_the_planner() {
    let store = seeded_store().await;
    let books = store.typed_collection::<Book>();

    books.create_index(IndexSpec::asc("title")).await.unwrap();

    let natural = books
        .explain(
            FindQuery::builder()
                .filter(Filter::eq("title", "Dune"))
                .hint(Hint::Natural)
                .build(),
        )
        .await
        .unwrap();
    assert!(natural.is_collection_scan());
    assert_eq!(natural.stats.documents_examined, 11);

    let forced = books
        .explain(
            FindQuery::builder()
                .filter(Filter::eq("title", "Dune"))
                .hint(Hint::Index("title_1".to_string()))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(forced.used_index(), Some("title_1"));

    let unknown = books
        .explain(
            FindQuery::builder()
                .hint(Hint::Index("publisher_1".to_string()))
                .build(),
        )
        .await;
    assert!(matches!(unknown, Err(DocumentStoreError::IndexNotFound(_, _))));
}

#[tokio::test]
async fn typed_documents_round_trip_by_id() {
    let store = DocumentStore::new(InMemoryStore::new());
    let books = store.typed_collection::<Book>();

    let dune = book("Dune", "Frank Herbert", "Science Fiction", 1965, 12.50, true);
    books.insert(vec![dune.clone()]).await.unwrap();

    let fetched = books.get(vec![*dune.id()]).await.unwrap();
    assert_eq!(fetched, vec![dune]);
}

#[tokio::test]
async fn dynamic_store_exposes_the_same_operations() {
    let store = seeded_store().await.into_dyn();
    let books = store.collection("books");

    let results = books
        .find(
            FindQuery::builder()
                .filter(Filter::eq("genre", "Dystopian"))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 2);

    books.create_index(IndexSpec::asc("genre")).await.unwrap();
    let report = books
        .explain(
            FindQuery::builder()
                .filter(Filter::eq("genre", "Dystopian"))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(report.used_index(), Some("genre_1"));

    let doc = Bson::Document(doc! { "title": "Untitled", "genre": "Unknown" });
    books
        .insert(vec![(Uuid::new(), doc)])
        .await
        .unwrap();
    assert_eq!(
        books.find(FindQuery::new()).await.unwrap().len(),
        12,
    );

    store.shutdown().await.unwrap();
}
