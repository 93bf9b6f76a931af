//! Form page

use axum::response::Html;

const INDEX_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>YouTube Audio Downloader</title>
</head>
<body>
  <h1>YouTube Audio Downloader</h1>
  <p>Paste a YouTube video or playlist URL to download its audio as MP3.</p>
  <form method="post" action="/download">
    <input type="text" name="url" size="60"
           placeholder="https://www.youtube.com/watch?v=...">
    <button type="submit">Download</button>
  </form>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
