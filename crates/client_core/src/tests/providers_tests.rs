use super::*;
use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn client() -> Client {
    ProviderConfig::default()
        .with_timeout(Duration::from_secs(5))
        .http_client()
        .expect("client")
}

#[test]
fn og_title_wins_over_document_title() {
    let html = r#"<html><head>
        <title>다른 제목 - 네이버 지도</title>
        <meta property="og:title" content="을지로 국밥 : 네이버 플레이스">
    </head></html>"#;
    assert_eq!(extract_page_title(html).as_deref(), Some("을지로 국밥"));
}

#[test]
fn document_title_is_used_and_cleaned_when_no_og_tag() {
    assert_eq!(
        extract_page_title("<TITLE>을지로 국밥 | 네이버 지도</TITLE>").as_deref(),
        Some("을지로 국밥")
    );
    assert_eq!(extract_page_title("<title>네이버 MY PLACE</title>"), None);
    assert_eq!(extract_page_title("<p>no title</p>"), None);
}

#[test]
fn strip_tags_removes_highlight_markup() {
    assert_eq!(strip_tags("<b>을지로</b> 국밥"), "을지로 국밥");
    assert_eq!(strip_tags("plain"), "plain");
    assert_eq!(strip_tags("broken <b"), "broken");
}

#[test]
fn search_reply_maps_items_and_skips_untitled_ones() {
    let body = r#"{
        "total": 2,
        "items": [
            {"title": "<b>국밥</b>집", "category": "한식>국밥", "address": "서울특별시 중구 1",
             "roadAddress": "서울특별시 중구 을지로 100", "telephone": "", "link": "", "mapx": "1", "mapy": "2"},
            {"title": "  ", "address": "부산광역시"}
        ]
    }"#;
    let candidates = parse_search_response(body.as_bytes()).expect("parse");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].road_address, "서울특별시 중구 을지로 100");
    assert_eq!(candidates[0].category, "한식>국밥");
}

#[test]
fn search_reply_errors_are_classified() {
    let err = parse_search_response(br#"{"errorMessage": "Authentication failed", "errorCode": "024"}"#)
        .expect_err("rejected");
    assert!(matches!(err, ProviderError::Rejected { status: None, .. }));

    let err = parse_search_response(br#"{"total": 0}"#).expect_err("no items");
    assert!(matches!(err, ProviderError::Malformed(_)));

    let err = parse_search_response(b"<html>").expect_err("not json");
    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[test]
fn geocode_reply_statuses() {
    let ok = br#"{"status": "OK", "results": [{"geometry": {"location": {"lat": 35.1, "lng": 129.0}}}]}"#;
    assert_eq!(
        parse_geocode_response(ok).expect("ok"),
        Some(Coordinate::new(35.1, 129.0))
    );

    let empty = br#"{"status": "ZERO_RESULTS", "results": []}"#;
    assert_eq!(parse_geocode_response(empty).expect("zero"), None);

    let denied = br#"{"status": "REQUEST_DENIED", "error_message": "invalid key", "results": []}"#;
    match parse_geocode_response(denied).expect_err("denied") {
        ProviderError::Rejected { message, .. } => assert_eq!(message, "REQUEST_DENIED: invalid key"),
        other => panic!("unexpected error: {other:?}"),
    }

    let out_of_range = br#"{"status": "OK", "results": [{"geometry": {"location": {"lat": 95.0, "lng": 0.0}}}]}"#;
    assert_eq!(parse_geocode_response(out_of_range).expect("ok"), None);
}

#[test]
fn enrichment_reply_drops_blank_fields() {
    let body = r#"{"status": "영업 중", "businessHours": "", "phoneNumber": null,
                    "recentVibes": "아늑함", "priceRange": "1만원대"}"#;
    let enrichment = parse_enrichment_response(body.as_bytes()).expect("parse");
    assert_eq!(enrichment.status.as_deref(), Some("영업 중"));
    assert_eq!(enrichment.business_hours, None);
    assert_eq!(enrichment.phone_number, None);
    assert_eq!(enrichment.price_range.as_deref(), Some("1만원대"));
    assert_eq!(enrichment.last_updated, None);

    let err = parse_enrichment_response(br#"{"error": "No search results found"}"#)
        .expect_err("rejected");
    assert!(matches!(err, ProviderError::Rejected { .. }));
}

#[test]
fn config_reads_credentials_and_ignores_blanks() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("NAVER_CLIENT_ID", "id"),
        ("NAVER_CLIENT_SECRET", "  "),
        ("GOOGLE_MAPS_API_KEY", "key"),
    ]);
    let config = ProviderConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
    assert_eq!(config.naver_client_id.as_deref(), Some("id"));
    assert_eq!(config.naver_client_secret, None);
    assert_eq!(config.google_api_key.as_deref(), Some("key"));
    assert_eq!(config.enrich_url, None);
    assert_eq!(config.naver_search_url, DEFAULT_NAVER_SEARCH_URL);
}

#[tokio::test]
async fn naver_search_sends_credentials_and_query() {
    async fn local(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(headers["x-naver-client-id"], "id");
        assert_eq!(headers["x-naver-client-secret"], "secret");
        assert_eq!(params.get("display").map(String::as_str), Some("5"));
        Json(serde_json::json!({
            "items": [{"title": params["query"], "category": "카페", "address": "제주특별자치도 제주시"}]
        }))
    }
    let base = serve(Router::new().route("/v1/search/local.json", get(local))).await;
    let config = ProviderConfig {
        naver_client_id: Some("id".into()),
        naver_client_secret: Some("secret".into()),
        naver_search_url: format!("{base}/v1/search/local.json"),
        ..ProviderConfig::default()
    };

    let search = NaverLocalSearch::new(client(), &config);
    let candidates = search.search("제주 카페").await.expect("search");
    assert_eq!(candidates[0].title, "제주 카페");
}

#[tokio::test]
async fn unconfigured_adapters_fail_without_a_request() {
    let config = ProviderConfig::default();
    let err = NaverLocalSearch::new(client(), &config)
        .search("국밥")
        .await
        .expect_err("no credentials");
    assert!(matches!(err, ProviderError::NotConfigured(_)));

    let err = GoogleGeocoder::new(client(), &config)
        .geocode("서울")
        .await
        .expect_err("no key");
    assert!(matches!(err, ProviderError::NotConfigured("GOOGLE_MAPS_API_KEY")));

    let err = HttpEnricher::new(client(), &config)
        .enrich("국밥", "서울")
        .await
        .expect_err("no url");
    assert!(matches!(err, ProviderError::NotConfigured("PLACEBOOK_ENRICH_URL")));
}

#[tokio::test]
async fn geocoder_reads_the_first_result() {
    async fn geocode(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("key").map(String::as_str), Some("key"));
        Json(serde_json::json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 37.5, "lng": 127.0}}}]
        }))
    }
    let base = serve(Router::new().route("/geocode/json", get(geocode))).await;
    let config = ProviderConfig {
        google_api_key: Some("key".into()),
        google_geocode_url: format!("{base}/geocode/json"),
        ..ProviderConfig::default()
    };

    let coordinate = GoogleGeocoder::new(client(), &config)
        .geocode("서울특별시 중구 세종대로 110")
        .await
        .expect("geocode");
    assert_eq!(coordinate, Some(Coordinate::new(37.5, 127.0)));
}

#[tokio::test]
async fn enricher_surfaces_service_errors() {
    async fn update(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["name"] == "국밥" {
            return (
                StatusCode::OK,
                Json(serde_json::json!({ "status": "영업 중", "priceRange": "1만원대" })),
            );
        }
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No search results found" })),
        )
    }
    let base = serve(Router::new().route("/api/update-info", post(update))).await;
    let config = ProviderConfig {
        enrich_url: Some(format!("{base}/api/update-info")),
        ..ProviderConfig::default()
    };
    let enricher = HttpEnricher::new(client(), &config);

    let enrichment = enricher.enrich("국밥", "서울").await.expect("enrich");
    assert_eq!(enrichment.price_range.as_deref(), Some("1만원대"));

    match enricher.enrich("없는 가게", "서울").await.expect_err("missing") {
        ProviderError::Rejected { status, message } => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "No search results found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn page_titles_are_fetched_and_extracted() {
    async fn page() -> axum::response::Html<&'static str> {
        axum::response::Html(r#"<meta property="og:title" content="을지로 국밥 - 네이버 지도">"#)
    }
    let base = serve(Router::new().route("/entry/place/1", get(page))).await;

    let title = PageTitleFetcher::new(client())
        .resolve_title(&format!("{base}/entry/place/1"))
        .await
        .expect("title");
    assert_eq!(title.as_deref(), Some("을지로 국밥"));
}
