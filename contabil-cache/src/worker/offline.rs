//! Synthesized offline page.

use crate::worker::request::Response;

/// Self-contained HTML; no external resources.
pub const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Offline - ContabilidadePRO</title>
  <style>
    body { margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center;
           font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
           background: #f8fafc; color: #1e293b; }
    .card { max-width: 420px; padding: 2rem; text-align: center; background: #fff;
            border-radius: 12px; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.08); }
    h1 { font-size: 1.5rem; margin: 0 0 0.75rem; }
    p { color: #475569; line-height: 1.5; }
    button { margin-top: 1rem; padding: 0.6rem 1.4rem; border: 0; border-radius: 8px;
             background: #2563eb; color: #fff; font-size: 1rem; cursor: pointer; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Você está offline</h1>
    <p>Não foi possível conectar ao ContabilidadePRO. Verifique sua conexão com a internet.
       Os dados já carregados continuam disponíveis.</p>
    <button onclick="window.location.reload()">Tentar novamente</button>
  </div>
</body>
</html>
"#;

/// The offline page as a 200 HTML response.
pub fn offline_response() -> Response {
    Response::ok(OFFLINE_PAGE).with_header("Content-Type", "text/html; charset=utf-8")
}
