use linkhop_core::{Link, Platform, ShortCode, Stats};
use linkhop_storage::{LinkRepository, MySqlRepository, StatsRepository, StorageError, LIST_PAGE_SIZE};
use linkhop_test_infra::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::default())
            .await
            .expect("start mysql");
        let pool = mysql.connect().await.expect("connect mysql");

        let repo = MySqlRepository::new(pool);
        repo.migrate().await.expect("run migrations");

        Self { _mysql: mysql, repo }
    }
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn insert_and_get_link() {
    let fixture = Fixture::start().await;
    let link = Link::new(code("abc12345"), "https://example.com/page");

    LinkRepository::insert(&fixture.repo, &link).await.unwrap();

    let got = fixture.repo.get(&link.id).await.unwrap().unwrap();
    assert_eq!(got.original_url, "https://example.com/page");
    assert_eq!(
        got.created_at.as_millisecond(),
        link.created_at.as_millisecond()
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn insert_conflicts_when_id_already_exists() {
    let fixture = Fixture::start().await;
    let id = code("abc12345");

    LinkRepository::insert(&fixture.repo, &Link::new(id.clone(), "https://one.example/a"))
        .await
        .unwrap();

    let err = LinkRepository::insert(&fixture.repo, &Link::new(id, "https://two.example/b"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn delete_removes_link() {
    let fixture = Fixture::start().await;
    let id = code("todelete");

    LinkRepository::insert(&fixture.repo, &Link::new(id.clone(), "https://example.com/page"))
        .await
        .unwrap();

    assert!(fixture.repo.delete(&id).await.unwrap());
    assert!(fixture.repo.get(&id).await.unwrap().is_none());
    assert!(!fixture.repo.delete(&id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_pages_through_every_link() {
    let fixture = Fixture::start().await;
    let total = LIST_PAGE_SIZE as usize * 2 + 5;

    for i in 0..total {
        let link = Link::new(code(&format!("link{i:04}")), "https://example.com/page");
        LinkRepository::insert(&fixture.repo, &link).await.unwrap();
    }

    let links = fixture.repo.list().await.unwrap();
    assert_eq!(links.len(), total);
    assert!(links.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn stats_insert_list_and_delete() {
    let fixture = Fixture::start().await;
    let id = code("abc12345");
    let first = Stats::new(id.clone(), Platform::Instagram);
    let second = Stats::new(id.clone(), Platform::Unknown);

    StatsRepository::insert(&fixture.repo, &first).await.unwrap();
    StatsRepository::insert(&fixture.repo, &second).await.unwrap();

    let listed = fixture.repo.list_by_link(&id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|s| s.id == first.id && s.platform == Platform::Instagram));

    assert_eq!(fixture.repo.delete_by_link(&id).await.unwrap(), 2);
    assert!(fixture.repo.list_by_link(&id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn ids_differing_only_in_case_are_distinct_links() {
    let fixture = Fixture::start().await;
    let lower = code("abcdefgh");
    let upper = code("ABCDEFGH");

    LinkRepository::insert(&fixture.repo, &Link::new(lower.clone(), "https://lower.example/a"))
        .await
        .unwrap();
    assert!(fixture.repo.get(&upper).await.unwrap().is_none());

    LinkRepository::insert(&fixture.repo, &Link::new(upper.clone(), "https://upper.example/b"))
        .await
        .unwrap();

    let got = fixture.repo.get(&upper).await.unwrap().unwrap();
    assert_eq!(got.id, upper);
    assert_eq!(got.original_url, "https://upper.example/b");

    assert!(fixture.repo.delete(&upper).await.unwrap());
    assert_eq!(
        fixture.repo.get(&lower).await.unwrap().unwrap().original_url,
        "https://lower.example/a"
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn stats_are_kept_apart_for_ids_differing_only_in_case() {
    let fixture = Fixture::start().await;
    let lower = code("abcdefgh");
    let upper = code("ABCDEFGH");

    StatsRepository::insert(&fixture.repo, &Stats::new(lower.clone(), Platform::Twitter))
        .await
        .unwrap();
    StatsRepository::insert(&fixture.repo, &Stats::new(upper.clone(), Platform::YouTube))
        .await
        .unwrap();

    assert_eq!(fixture.repo.list_by_link(&lower).await.unwrap().len(), 1);
    assert_eq!(fixture.repo.delete_by_link(&upper).await.unwrap(), 1);
    assert_eq!(fixture.repo.list_by_link(&lower).await.unwrap().len(), 1);
}
