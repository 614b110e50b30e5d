// src/server/inject.rs

/// Path the live-reload client script is served from.
pub const CLIENT_SCRIPT_PATH: &str = "/__sitepipe/livereload.js";

/// Path of the server-sent events stream the client subscribes to.
pub const EVENTS_PATH: &str = "/__sitepipe/events";

/// Browser side of live reload. Full reloads on `reload`, stylesheet
/// cache-busting on `css`.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  if (!window.EventSource) {
    return;
  }
  var source = new EventSource("/__sitepipe/events");
  source.addEventListener("reload", function () {
    window.location.reload();
  });
  source.addEventListener("css", function () {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    Array.prototype.forEach.call(links, function (link) {
      var url = new URL(link.href, window.location.href);
      url.searchParams.set("sitepipe", Date.now().toString());
      link.href = url.toString();
    });
  });
})();
"#;

/// Insert the client `<script>` tag before the last `</body>`, or append it
/// when the document has none.
pub fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_SCRIPT_PATH}"></script>"#);
    // ASCII lowercasing keeps byte offsets identical.
    let lower = html.to_ascii_lowercase();

    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}
