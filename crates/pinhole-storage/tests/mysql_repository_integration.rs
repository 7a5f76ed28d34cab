use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use pinhole_core::ShortCode;
use pinhole_storage::{
    Mapping, MappingPatch, MySqlRepository, ReadRepository, RenameOutcome, Repository,
};
use pinhole_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        let repo = MySqlRepository::new(pool);
        repo.migrate().await.expect("create schema");

        Self {
            _mysql: mysql,
            repo,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(16)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn mapping(value: &str, url: &str) -> Mapping {
    // MySQL keeps microsecond precision
    let now = Timestamp::from_microsecond(Timestamp::now().as_microsecond()).unwrap();
    Mapping::new(code(value), url, now)
}

#[tokio::test]
async fn insert_and_get() {
    let fixture = Fixture::start().await;
    let original = mapping("abc123", "https://example.com");

    assert!(fixture.repo.insert_if_absent(&original).await.unwrap());

    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got, original);
}

#[tokio::test]
async fn insert_reports_collision() {
    let fixture = Fixture::start().await;

    assert!(fixture
        .repo
        .insert_if_absent(&mapping("abc123", "https://one.example"))
        .await
        .unwrap());
    assert!(!fixture
        .repo
        .insert_if_absent(&mapping("abc123", "https://two.example"))
        .await
        .unwrap());

    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got.target_url, "https://one.example");
}

#[tokio::test]
async fn codes_differing_in_case_are_distinct() {
    let fixture = Fixture::start().await;

    assert!(fixture.repo.insert_if_absent(&mapping("abc", "https://lower")).await.unwrap());
    assert!(fixture.repo.insert_if_absent(&mapping("ABC", "https://upper")).await.unwrap());
    assert_eq!(fixture.repo.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert_if_absent(&mapping("hot", "https://example.com"))
        .await
        .unwrap();

    let repo = Arc::new(fixture.repo.clone());
    let handles: Vec<_> = (0..200)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.atomic_increment(&code("hot")).await.unwrap() })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    let got = fixture.repo.get(&code("hot")).await.unwrap().unwrap();
    assert_eq!(got.access_count, 200);
    assert!(fixture.repo.atomic_increment(&code("cold")).await.unwrap().is_none());
}

#[tokio::test]
async fn update_and_rename() {
    let fixture = Fixture::start().await;
    let original = mapping("aaa", "https://a.example");
    fixture.repo.insert_if_absent(&original).await.unwrap();
    fixture
        .repo
        .insert_if_absent(&mapping("bbb", "https://b.example"))
        .await
        .unwrap();

    let later = original.updated_at + SignedDuration::from_secs(10);
    let updated = fixture
        .repo
        .update(&code("aaa"), MappingPatch::target("https://c.example", later))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.target_url, "https://c.example");
    assert_eq!(updated.updated_at, later);

    let outcome = fixture
        .repo
        .rename_if_absent(&code("aaa"), &code("bbb"), later)
        .await
        .unwrap();
    assert_eq!(outcome, RenameOutcome::TargetTaken);

    let outcome = fixture
        .repo
        .rename_if_absent(&code("aaa"), &code("ccc"), later)
        .await
        .unwrap();
    assert!(matches!(outcome, RenameOutcome::Renamed(ref m) if m.code == code("ccc")));
    assert!(fixture.repo.get(&code("aaa")).await.unwrap().is_none());

    let outcome = fixture
        .repo
        .rename_if_absent(&code("aaa"), &code("ddd"), later)
        .await
        .unwrap();
    assert_eq!(outcome, RenameOutcome::SourceMissing);
}

#[tokio::test]
async fn delete_is_permanent() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert_if_absent(&mapping("gone", "https://example.com"))
        .await
        .unwrap();

    assert!(fixture.repo.delete(&code("gone")).await.unwrap());
    assert!(fixture.repo.get(&code("gone")).await.unwrap().is_none());
    assert!(!fixture.repo.delete(&code("gone")).await.unwrap());
}

#[tokio::test]
async fn increment_returns_the_counted_mapping() {
    let fixture = Fixture::start().await;
    let original = mapping("abc", "https://example.com");
    fixture.repo.insert_if_absent(&original).await.unwrap();

    let counted = fixture
        .repo
        .atomic_increment(&code("abc"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(counted.access_count, 1);
    assert_eq!(counted.target_url, original.target_url);
    assert_eq!(counted.created_at, original.created_at);
}
