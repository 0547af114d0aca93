use axum::{http::StatusCode, routing::get, Router};
use std::net::SocketAddr;

/// Fixture server on its own runtime so the child process can reach it while
/// the test thread blocks on `assert_cmd`.
fn spawn_fixture(app: Router) -> (tokio::runtime::Runtime, SocketAddr) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("tokio runtime");
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    rt.spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });
    (rt, addr)
}

fn results_page() -> &'static str {
    r#"<html><body>
<div class="ezO2md"><a href="/url?q=https://one.example/&amp;sa=U"><span>One</span></a></div>
<div class="ezO2md"><a href="/url?q=https://two.example/a%3Fb%3D1&amp;sa=U"><span>Two</span></a></div>
</body></html>"#
}

#[test]
fn fetch_prints_cleaned_text() {
    let app = Router::new()
        .route(
            "/",
            get(|| async {
                axum::response::Html(
                    "<html><head><style>x{}</style></head><body><h1>Title</h1><script>no()</script><p>  body text  </p></body></html>",
                )
            }),
        )
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
    let (_rt, addr) = spawn_fixture(app);

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
        .args(["fetch", "--url", &format!("http://{addr}/")])
        .assert()
        .success()
        .stdout("Title\nbody text\n");

    let url = format!("http://{addr}/missing");
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
        .args(["fetch", "--url", &url])
        .assert()
        .success()
        .stdout(predicates::str::diff(format!(
            "Failed to fetch {url}, status code: 404\n"
        )));
}

#[test]
fn search_prints_json_url_list() {
    let app = Router::new().route("/search", get(|| async { axum::response::Html(results_page()) }));
    let (_rt, addr) = spawn_fixture(app);

    let out = std::process::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
        .args(["search", "--query", "rust", "--num-results", "2"])
        .env_remove("GSEARCH_SEARCH_PROVIDER")
        .env("GSEARCH_GOOGLE_ENDPOINT", format!("http://{addr}/search"))
        .output()
        .expect("run gsearch-mcp search");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    assert_eq!(
        v,
        serde_json::json!(["https://one.example/", "https://two.example/a?b=1"])
    );
}

#[test]
fn search_failure_is_printed_as_a_single_entry() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let out = std::process::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
        .args(["search", "--query", "rust"])
        .env_remove("GSEARCH_SEARCH_PROVIDER")
        .env("GSEARCH_GOOGLE_ENDPOINT", format!("http://{addr}/search"))
        .output()
        .expect("run gsearch-mcp search");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    let items = v.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert!(items[0]
        .as_str()
        .unwrap_or("")
        .starts_with("Error performing Google search: "));
}

#[test]
fn search_with_zero_results_prints_empty_list() {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
        .args(["search", "--query", "rust", "--num-results", "0"])
        .env("GSEARCH_GOOGLE_ENDPOINT", "http://127.0.0.1:9/search")
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn only_the_tool_operations_are_exposed() {
    for sub in ["doctor", "version", "config"] {
        assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("gsearch-mcp"))
            .arg(sub)
            .assert()
            .failure()
            .stderr(predicates::str::contains("unrecognized subcommand"));
    }
}
