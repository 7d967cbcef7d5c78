use asset_service::models::asset::ListAssetsRequest;
use asset_service::{Code, EntityKind};

use crate::common::TestApp;

fn request(parent_id: i64, page_number: i64, page_size: i64) -> ListAssetsRequest {
    ListAssetsRequest {
        parent_id,
        page_number,
        page_size,
    }
}

mod list_assets {
    use super::*;

    #[tokio::test]
    async fn pages_cover_every_asset_once() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("Paged").await;
        let other_id = app.create_lab("Other").await;
        for i in 0..7 {
            app.upload(EntityKind::Lab, lab_id, &format!("file{i}.txt"), b"x")
                .await
                .unwrap();
        }
        app.upload(EntityKind::Lab, other_id, "elsewhere.txt", b"y")
            .await
            .unwrap();

        let mut seen = Vec::new();
        let mut page_number = 1;
        loop {
            let page = app
                .labs
                .list_assets(request(lab_id, page_number, 3))
                .await
                .unwrap();
            assert_eq!(page.total_count, 7);
            if page.assets.is_empty() {
                break;
            }
            assert!(page.assets.len() <= 3);
            seen.extend(page.assets.into_iter().map(|a| a.asset_id));
            page_number += 1;
        }

        assert_eq!(seen.len() as u64, 7);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(page_number, 4);
    }

    #[tokio::test]
    async fn page_rows_are_ordered_by_id() {
        let app = TestApp::spawn().await;
        let article_id = app.create_article("Ordered").await;
        let first = app
            .upload(EntityKind::Article, article_id, "z.txt", b"1")
            .await
            .unwrap();
        let second = app
            .upload(EntityKind::Article, article_id, "a.txt", b"2")
            .await
            .unwrap();

        let page = app
            .articles
            .list_assets(request(article_id, 1, 10))
            .await
            .unwrap();

        assert_eq!(page.assets, vec![first, second]);
    }

    #[tokio::test]
    async fn parent_without_assets_is_an_empty_page() {
        let app = TestApp::spawn().await;

        for kind in EntityKind::ALL {
            let parent_id = app.create_parent(kind).await;
            let page = app
                .service(kind)
                .list_assets(request(parent_id, 1, 10))
                .await
                .unwrap();
            assert_eq!(page.total_count, 0);
            assert!(page.assets.is_empty());
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("Short").await;
        app.upload(EntityKind::Lab, lab_id, "only.txt", b"x")
            .await
            .unwrap();

        let page = app
            .labs
            .list_assets(request(lab_id, 5, 10))
            .await
            .unwrap();

        assert_eq!(page.total_count, 1);
        assert!(page.assets.is_empty());
    }

    #[tokio::test]
    async fn huge_bounds_give_an_empty_page() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("Huge bounds").await;
        for i in 0..3 {
            app.upload(EntityKind::Lab, lab_id, &format!("f{i}.txt"), b"x")
                .await
                .unwrap();
        }

        for (page, size) in [(i64::MAX, i64::MAX), (3, i64::MAX), (i64::MAX, 1), (2, 2)] {
            let listed = app
                .labs
                .list_assets(request(lab_id, page, size))
                .await
                .unwrap();
            assert_eq!(listed.total_count, 3);
            if (page, size) == (2, 2) {
                assert_eq!(listed.assets.len(), 1);
            } else {
                assert!(listed.assets.is_empty(), "page {page} size {size}");
            }
        }
    }

    #[tokio::test]
    async fn huge_page_size_returns_everything_on_page_one() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("One page").await;
        for i in 0..4 {
            app.upload(EntityKind::Lab, lab_id, &format!("f{i}.txt"), b"x")
                .await
                .unwrap();
        }

        let listed = app
            .labs
            .list_assets(request(lab_id, 1, i64::MAX))
            .await
            .unwrap();

        assert_eq!(listed.total_count, 4);
        assert_eq!(listed.assets.len(), 4);
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let app = TestApp::spawn().await;

        let err = app
            .labs
            .list_assets(request(12, 1, 10))
            .await
            .unwrap_err();

        assert_eq!(err.code, Code::NotFound);
        assert_eq!(err.message, "Lab with id '12' not found");
    }

    #[tokio::test]
    async fn invalid_bounds_are_rejected() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("Bounds").await;

        for (page, size) in [(0, 10), (1, 0), (-3, 10), (1, -1)] {
            let err = app
                .labs
                .list_assets(request(lab_id, page, size))
                .await
                .unwrap_err();
            assert_eq!(err.code, Code::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn listing_only_shows_own_kind() {
        let app = TestApp::spawn().await;
        let lab_id = app.create_lab("Lab one").await;
        let article_id = app.create_article("Article one").await;
        assert_eq!(lab_id, article_id);
        app.upload(EntityKind::Lab, lab_id, "lab.txt", b"l")
            .await
            .unwrap();
        app.upload(EntityKind::Article, article_id, "article.txt", b"a")
            .await
            .unwrap();

        let labs = app.labs.list_assets(request(lab_id, 1, 10)).await.unwrap();
        let articles = app
            .articles
            .list_assets(request(article_id, 1, 10))
            .await
            .unwrap();

        assert_eq!(labs.total_count, 1);
        assert_eq!(labs.assets[0].filename, "lab.txt");
        assert_eq!(articles.total_count, 1);
        assert_eq!(articles.assets[0].filename, "article.txt");
    }
}
