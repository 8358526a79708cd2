use axum::{extract::State, http::StatusCode, response::Html};

use crate::{config::RelayMode, state::AppState};

const HOME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Instagram Post Relay</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css">
</head>
<body>
<main class="container">
<hgroup>
<h1>Instagram Post Relay</h1>
<p>API Status: <strong>running</strong></p>
</hgroup>

<section>
<h2>Try It Out</h2>
<form id="relay-form">
<input type="url" id="post-url" placeholder="https://www.instagram.com/p/XXXXX/" required>
<button type="submit">Fetch</button>
</form>
<div id="result"></div>
</section>

<section>
<h2>POST /download</h2>
<p>Send a JSON payload with an Instagram post URL.</p>
<pre><code>curl -X POST http://localhost:5000/download \
  -H "Content-Type: application/json" \
  -d '{"url": "https://www.instagram.com/p/XXXXX/"}'</code></pre>
<p>Active mode: <code>{{MODE}}</code>. Responses carry <code>status</code>, <code>message</code> and <code>{{KEY}}</code>.</p>
<pre><code>{"status": "success", "message": "{{SAMPLE}}", "{{KEY}}": ["..."]}</code></pre>
<p><strong>Note:</strong> requires valid Instagram session cookies in Netscape format with <code>sessionid</code> and <code>csrftoken</code>.</p>
</section>
</main>
<script>
document.getElementById("relay-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const result = document.getElementById("result");
  result.textContent = "Working...";
  try {
    const response = await fetch("/download", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ url: document.getElementById("post-url").value }),
    });
    const data = await response.json();
    const list = document.createElement("ul");
    for (const entry of data["{{KEY}}"] || []) {
      const item = document.createElement("li");
      item.textContent = entry;
      list.appendChild(item);
    }
    result.textContent = (data.status === "success" ? "Success: " : "Error: ") + data.message;
    result.appendChild(list);
  } catch (err) {
    result.textContent = "Error: request failed, please try again.";
  }
});
</script>
</body>
</html>"#;

/// Renders the static status page for the active mode.
pub fn render_home(mode: RelayMode) -> String {
    let (name, key, sample) = match mode {
        RelayMode::Urls => ("urls", "media_urls", "Media URLs extracted successfully."),
        RelayMode::Download => ("download", "files", "Download complete! Files saved in ig_downloads_..."),
    };

    HOME_TEMPLATE
        .replace("{{MODE}}", name)
        .replace("{{KEY}}", key)
        .replace("{{SAMPLE}}", sample)
}

pub async fn home(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    (StatusCode::OK, Html(render_home(state.mode)))
}
