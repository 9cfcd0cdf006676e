use crate::server::api::{self, ApiState, PayloadError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            content_type: "application/json",
            body,
        }
    }
}

/// Dispatches one request. `path` may carry a query string.
pub fn route_request(state: &ApiState, method: &str, path: &str, body: &str) -> HttpResponse {
    let route = path.split('?').next().unwrap_or(path);
    match (method, route) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => error_response(500, &err.to_string()),
        },
        ("GET", "/api/categories") => payload_response(api::categories_payload(state, path)),
        ("GET", "/api/candidates") => payload_response(api::candidates_payload(state, path)),
        ("POST", "/api/optimize") => payload_response(api::optimize_payload(state, body)),
        (_, "/" | "/api/health" | "/api/categories" | "/api/candidates" | "/api/optimize") => {
            error_response(405, "Method not allowed")
        }
        _ => error_response(404, "Route not found"),
    }
}

fn payload_response(result: Result<String, PayloadError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err @ PayloadError::Serialize(_)) => {
            error_response(500, &err.to_string())
        }
        Err(err) => error_response(400, &err.to_string()),
    }
}

fn error_response(status_code: u16, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Porygon Team Optimizer</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    h1 { margin-bottom: 8px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input, select { width: 100%; padding: 8px; box-sizing: border-box; }
    .toggle { display:flex; align-items:center; gap:8px; font-weight: normal; }
    .toggle input { width: auto; }
    button { margin-top: 12px; padding: 8px 14px; }
    table { border-collapse: collapse; margin-top: 8px; }
    td, th { border: 1px solid #ddd; padding: 4px 10px; text-align: left; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 80px; }
  </style>
</head>
<body>
  <h1>Pokemon Team Optimizer</h1>
  <p>Strongest team whose members resist every damage type at least once.</p>

  <div class="card">
    <label for="size">Team size</label>
    <input id="size" type="number" min="1" value="6" />
    <label for="gens">Generations (comma separated, empty means all)</label>
    <input id="gens" placeholder="1, 2, 3" />
    <label for="fossils">Fossils</label>
    <select id="fossils">
      <option value="all">all</option>
      <option value="one">one</option>
      <option value="none" selected>none</option>
    </select>
    <label class="toggle"><input id="legendaries" type="checkbox" /> Include legendaries</label>
    <label class="toggle"><input id="pseudo" type="checkbox" /> Include pseudo-legendaries</label>
    <label class="toggle"><input id="starters" type="checkbox" /> Allow more than one starter</label>
    <label for="include">Include (comma separated names)</label>
    <input id="include" />
    <label for="exclude">Exclude (comma separated names)</label>
    <input id="exclude" />
    <div><button id="solve-btn">Solve</button></div>
  </div>

  <div id="result"></div>
  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const result = document.getElementById('result');
    const list = (id) => document.getElementById(id).value.split(',').map(s => s.trim()).filter(Boolean);

    function render(data) {
      if (data.status !== 'optimal') {
        result.innerHTML = '<p><strong>Status: ' + data.status + '</strong></p>';
        return;
      }
      let html = '<p><strong>Status: optimal</strong> (total strength ' + data.total_strength + ')</p><table><tr><th>Pokemon</th><th>Type 1</th><th>Type 2</th></tr>';
      for (const m of data.members) {
        html += '<tr><td>' + m.name + '</td><td>' + (m.type1 || '') + '</td><td>' + (m.type2 || '') + '</td></tr>';
      }
      html += '</table><table><tr><th>Type</th><th>Minimal factor</th><th>Optimal defender</th></tr>';
      for (const r of data.resistances) {
        html += '<tr><td>' + r.category + '</td><td>' + r.min_multiplier + '</td><td>' + r.defender + '</td></tr>';
      }
      result.innerHTML = html + '</table>';
    }

    document.getElementById('solve-btn').addEventListener('click', async () => {
      const payload = {
        team_size: Math.max(1, Number(document.getElementById('size').value) || 6),
        include: list('include'),
        exclude: list('exclude'),
        filter: {
          generations: list('gens').map(Number).filter(n => n > 0),
          include_legendaries: document.getElementById('legendaries').checked,
          include_pseudo_legendaries: document.getElementById('pseudo').checked,
          allow_multiple_starters: document.getElementById('starters').checked,
          fossils: document.getElementById('fossils').value,
        },
      };
      output.textContent = 'Solving…';
      result.innerHTML = '';
      const response = await fetch('/api/optimize', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload),
      });
      const text = await response.text();
      output.textContent = 'HTTP ' + response.status + '\n' + text;
      if (response.ok) {
        try { render(JSON.parse(text)); } catch (e) {}
      }
    });
  </script>
</body>
</html>
"#
    .to_string()
}
