use std::fs;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use langviews::app::state::{METRIC_DAILY_VIEWS, METRIC_VIEWS_BY_LANGUAGE};
use langviews::fetch::{decode_websites, FetchError, WebsiteClient};
use langviews::types::Language;
use langviews::ChartState;

const FIXTURE: &str = r#"[
    {
        "url": "gophers.dev",
        "tags": [{"name": "go"}],
        "website_views": [
            {"date": "2024-01-01", "count": "3"},
            {"date": "2024-01-02", "count": 5}
        ]
    },
    {
        "url": "polyglot.io",
        "tags": [{"name": "go"}, {"name": "rust"}],
        "website_views": [
            {"date": "2024-01-01", "count": 10},
            {"date": "2024-01-03", "count": "bogus"}
        ]
    },
    {
        "url": "crustaceans.rs",
        "tags": [{"name": "rust"}],
        "website_views": [
            {"date": "2024-01-02", "count": 7}
        ]
    },
    {
        "url": "untagged.example",
        "website_views": [
            {"date": "2024-01-01", "count": 99}
        ]
    }
]"#;

/// Serve a single canned HTTP response on an ephemeral port, returning the
/// base URL to reach it.
async fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_full_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let websites = decode_websites(FIXTURE).unwrap();
    assert_eq!(websites.len(), 4);

    // Initialize state with one language selected
    let mut state = ChartState::new(vec![
        Language::displayed("go"),
        Language {
            name: "rust".to_string(),
            displayed: false,
        },
    ]);
    state.update_with_websites(websites);

    // Aggregation over the selected language only
    {
        let totals = state.views_by_language();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].language, "go");
        // gophers.dev (3 + 5) plus polyglot.io (10 + unparseable 0)
        assert_eq!(totals[0].views, 18);

        let daily = state.daily_views();
        assert_eq!(daily.len(), 4);
        assert!(daily.iter().all(|view| view.website != "crustaceans.rs"));
        assert!(daily.iter().all(|view| view.website != "untagged.example"));
    }

    // Widening the selection recomputes; the multi-tag site counts once per language
    {
        state.set_displayed("rust", true);
        let totals = state.views_by_language();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].views, 18);
        assert_eq!(totals[1].views, 17); // polyglot.io 10 + crustaceans.rs 7

        // Flattening preserves the total record count of surviving websites
        let daily = state.daily_views();
        assert_eq!(daily.len(), 5);
    }

    // Results for the current selection are cached
    {
        let key = state.selection_key();
        assert!(state.chart_cache.get(&key).is_some());
        let cached = state.chart_data();
        assert_eq!(cached.views_by_language.len(), 2);
    }

    // Plot generation for both metrics
    {
        state.plot_path = temp_dir
            .path()
            .join("test_plot.png")
            .to_str()
            .unwrap()
            .to_string();

        for metric in &[METRIC_VIEWS_BY_LANGUAGE, METRIC_DAILY_VIEWS] {
            state.current_metric = metric.to_string();
            assert!(langviews::plotting::generate_plot(&mut state).is_ok());
            assert!(fs::metadata(&state.plot_path).is_ok());
        }
    }
}

#[tokio::test]
async fn test_fetch_workflow() {
    let base_url = serve_once("HTTP/1.1 200 OK", FIXTURE.to_string()).await;
    let client = WebsiteClient::new(base_url);

    let websites = client
        .fetch_websites(&["go".to_string(), "rust".to_string()])
        .await
        .unwrap();
    assert_eq!(websites.len(), 4);
    assert_eq!(websites[0].url, "gophers.dev");
    assert_eq!(websites[0].website_views[0].count, 3);
}

#[tokio::test]
async fn test_fetch_empty_object_response() {
    // The upstream answers an empty tag filter with an empty JSON object
    let base_url = serve_once("HTTP/1.1 200 OK", "{}".to_string()).await;
    let client = WebsiteClient::new(base_url);

    let websites = client.fetch_websites(&[]).await.unwrap();
    assert!(websites.is_empty());
}

#[tokio::test]
async fn test_error_handling() {
    // Unreachable server
    {
        let client = WebsiteClient::new("http://127.0.0.1:1");
        let result = client.fetch_websites(&["go".to_string()]).await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    // Non-2xx response
    {
        let base_url = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            "oops".to_string(),
        )
        .await;
        let client = WebsiteClient::new(base_url);
        let result = client.fetch_websites(&["go".to_string()]).await;
        assert!(matches!(result, Err(FetchError::Status(status)) if status.as_u16() == 500));
    }

    // Malformed body
    {
        let base_url = serve_once("HTTP/1.1 200 OK", "not json".to_string()).await;
        let client = WebsiteClient::new(base_url);
        let result = client.fetch_websites(&["go".to_string()]).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
