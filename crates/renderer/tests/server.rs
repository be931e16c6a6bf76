use prerender_core::Route;
use prerender_renderer::StaticServer;
use std::fs;

fn build_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("index.html"),
        r#"<html><body><div id="root"></div><script src="/assets/app.js"></script></body></html>"#,
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets/app.js"), "console.log('app');").unwrap();
    fs::create_dir_all(dir.path().join("blog")).unwrap();
    fs::write(dir.path().join("blog/index.html"), "<html>blog shell</html>").unwrap();
    dir
}

#[tokio::test]
async fn serves_files_from_build_dir() {
    let dir = build_dir();
    let server = StaticServer::start(dir.path()).await.unwrap();

    let body = reqwest::get(format!("{}/assets/app.js", server.base_url()))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "console.log('app');");

    let response = reqwest::get(format!("{}/blog/", server.base_url()))
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "<html>blog shell</html>");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_routes_get_the_original_shell() {
    let dir = build_dir();
    let server = StaticServer::start(dir.path()).await.unwrap();

    // Overwriting the root after startup must not change the fallback
    fs::write(dir.path().join("index.html"), "<html>prerendered root</html>").unwrap();

    let route = Route::parse("/industries/edtech").unwrap();
    let response = reqwest::get(route.url(server.base_url())).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(r#"<div id="root"></div>"#));
    assert!(!body.contains("prerendered root"));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_shell_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let server = StaticServer::start(dir.path()).await.unwrap();

    let response = reqwest::get(format!("{}/nowhere", server.base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_listening() {
    let dir = build_dir();
    let server = StaticServer::start(dir.path()).await.unwrap();
    let url = format!("{}/assets/app.js", server.base_url());
    assert!(server.addr().ip().is_loopback());

    server.shutdown().await.unwrap();
    assert!(reqwest::get(url).await.is_err());
}
