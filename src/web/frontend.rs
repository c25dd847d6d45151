//! Embedded HTML/CSS/JS frontend for the crmlens dashboard.
//!
//! Compiled into the binary as a string constant. Charts are drawn as inline
//! SVG from the chart spec the server returns; no external assets.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>crmlens</title>
<style>
:root {
  --bg: #0a0e14;
  --surface: #121820;
  --border: #25303c;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #00ff41;
  --pink: #ff006e;
  --cyan: #00d4ff;
  --yellow: #ffff00;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex; align-items: center; justify-content: space-between;
  margin-bottom: 20px; padding-bottom: 16px; border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; color: var(--accent); font-family: var(--mono); }
.health { display: flex; align-items: center; gap: 8px; color: var(--text-muted); font-size: 13px; }
.dot { width: 12px; height: 12px; border-radius: 50%; background: #808080; box-shadow: 0 0 8px currentColor; }

.panel { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; margin-bottom: 16px; }
.panel h2 { font-size: 13px; text-transform: uppercase; letter-spacing: 0.06em; color: var(--text-muted); margin-bottom: 12px; }

.row { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; }
input, select {
  background: var(--bg); color: var(--text); border: 1px solid var(--border);
  border-radius: 6px; padding: 6px 10px; font-family: var(--mono); font-size: 13px;
}
button {
  background: transparent; color: var(--accent); border: 1px solid var(--accent);
  border-radius: 6px; padding: 6px 12px; cursor: pointer; font-size: 13px;
}
button:hover { background: rgba(0, 255, 65, 0.1); }
button.active { background: var(--accent); color: var(--bg); }
button.danger { color: var(--pink); border-color: var(--pink); }

.status { margin-top: 10px; font-size: 13px; min-height: 20px; }
.status.success { color: var(--accent); }
.status.error { color: var(--pink); }

.view { min-height: 380px; display: flex; align-items: center; justify-content: center; }
.view svg { width: 100%; max-width: 720px; height: 380px; }
.placeholder { color: var(--text-muted); font-style: italic; text-align: center; }
pre.raw {
  width: 100%; max-height: 480px; overflow: auto; font-family: var(--mono); font-size: 12px;
  color: var(--cyan); white-space: pre-wrap; word-break: break-word;
}
.insights { white-space: pre-wrap; color: var(--text); font-size: 13px; }
.perm-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 12px; }
.perm-grid h3 { font-size: 12px; color: var(--cyan); margin-bottom: 6px; }
.perm-row { display: flex; justify-content: space-between; font-size: 12px; }
.perm-row .yes { color: var(--accent); }
.perm-row .no { color: var(--pink); }
.badge { display: inline-block; padding: 2px 10px; border-radius: 10px; font-size: 12px; margin-bottom: 8px; }
.hidden { display: none; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>crmlens</h1>
    <div class="health"><span class="dot" id="health-dot"></span><span id="health-label">no session</span></div>
  </header>

  <div class="panel" id="login-panel">
    <h2>Login</h2>
    <div class="row">
      <input id="username" placeholder="username" autocomplete="username">
      <input id="password" type="password" placeholder="password" autocomplete="current-password">
      <button onclick="login()">Log in</button>
    </div>
  </div>

  <div class="panel">
    <h2>Request</h2>
    <div class="row" id="quick"></div>
    <div class="row" style="margin-top: 10px">
      <select id="endpoint"></select>
      <input id="record-id" placeholder="id" size="8">
      <button onclick="callSelected()">Call</button>
      <button class="danger" onclick="clearView()">Clear</button>
    </div>
    <div class="status" id="status"></div>
  </div>

  <div class="panel">
    <div class="row" style="margin-bottom: 12px">
      <button id="mode-chart" onclick="switchView('chart')">Chart</button>
      <button id="mode-scene" onclick="switchView('scene')">3D</button>
      <button id="mode-json" onclick="switchView('json')">JSON</button>
    </div>
    <div class="view" id="chart-view"></div>
    <div class="view hidden" id="scene-view"></div>
    <pre class="raw hidden" id="json-view"></pre>
  </div>

  <div class="panel hidden" id="permissions-panel">
    <h2 id="permissions-title">Permissions</h2>
    <div id="permissions"></div>
  </div>

  <div class="panel">
    <h2>Insights</h2>
    <div class="insights" id="insights">Run a request to see insights.</div>
  </div>
</div>

<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function setStatus(kind, message) {
  const el = document.getElementById('status');
  el.className = 'status ' + (kind || '');
  el.textContent = message || '';
}

function esc(s) {
  return String(s).replace(/[&<>"]/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' }[c]));
}

// ---------------------------------------------------------------------------
// SVG chart drawing
// ---------------------------------------------------------------------------
const W = 720, H = 380;

function svg(inner) {
  return `<svg viewBox="0 0 ${W} ${H}" xmlns="http://www.w3.org/2000/svg">${inner}</svg>`;
}

function title(spec) {
  return `<text x="${W / 2}" y="24" text-anchor="middle" fill="${spec.theme.foreground}" font-size="16">${esc(spec.title)}</text>`;
}

function color(spec, i) {
  const p = spec.theme.palette;
  return p[i % p.length];
}

function arc(cx, cy, r0, r1, a0, a1) {
  const p = (r, a) => [cx + r * Math.cos(a), cy + r * Math.sin(a)];
  const large = a1 - a0 > Math.PI ? 1 : 0;
  const [x0, y0] = p(r1, a0), [x1, y1] = p(r1, a1), [x2, y2] = p(r0, a1), [x3, y3] = p(r0, a0);
  return `M${x0},${y0} A${r1},${r1} 0 ${large} 1 ${x1},${y1} L${x2},${y2} A${r0},${r0} 0 ${large} 0 ${x3},${y3} Z`;
}

function legend(spec, values) {
  return spec.labels.map((l, i) =>
    `<rect x="520" y="${60 + i * 22}" width="12" height="12" fill="${color(spec, i)}"/>` +
    `<text x="540" y="${71 + i * 22}" fill="${spec.theme.foreground}" font-size="12">${esc(l)} (${values[i]})</text>`
  ).join('');
}

function drawDoughnut(spec) {
  const values = spec.series[0].values;
  const total = values.reduce((a, b) => a + Math.max(b, 0), 0);
  let a = -Math.PI / 2, out = '';
  if (total > 0) {
    values.forEach((v, i) => {
      if (v <= 0) return;
      const span = Math.min(v / total * 2 * Math.PI, 2 * Math.PI - 1e-6);
      out += `<path d="${arc(260, 200, 80, 150, a, a + span)}" fill="${color(spec, i)}"/>`;
      a += span;
    });
  }
  return svg(title(spec) + out + legend(spec, values));
}

function drawPolar(spec) {
  const values = spec.series[0].values;
  const max = Math.max(...values, 1);
  const step = 2 * Math.PI / values.length;
  const out = values.map((v, i) =>
    v > 0 ? `<path d="${arc(260, 200, 0.01, 160 * v / max, -Math.PI / 2 + i * step, -Math.PI / 2 + (i + 1) * step)}" fill="${color(spec, i)}"/>` : ''
  ).join('');
  return svg(title(spec) + out + legend(spec, values));
}

function drawRadar(spec) {
  const values = spec.series[0].values, n = spec.labels.length, cx = W / 2, cy = 205, r = 140;
  const pt = (i, f) => {
    const a = -Math.PI / 2 + i * 2 * Math.PI / n;
    return [cx + r * f * Math.cos(a), cy + r * f * Math.sin(a)];
  };
  let grid = '';
  [0.25, 0.5, 0.75, 1].forEach(f => {
    grid += `<polygon points="${spec.labels.map((_, i) => pt(i, f).join(',')).join(' ')}" fill="none" stroke="${spec.theme.grid}"/>`;
  });
  const labels = spec.labels.map((l, i) => {
    const [x, y] = pt(i, 1.15);
    return `<text x="${x}" y="${y}" text-anchor="middle" fill="${spec.theme.foreground}" font-size="12">${esc(l)}</text>`;
  }).join('');
  const shape = `<polygon points="${values.map((v, i) => pt(i, v / 100).join(',')).join(' ')}" fill="${color(spec, 0)}" stroke="${spec.theme.foreground}"/>`;
  return svg(title(spec) + grid + shape + labels);
}

function drawBars(spec) {
  const values = spec.series[0].values, n = values.length;
  const max = Math.max(...values, 1), left = 50, bottom = 320, width = W - 80;
  const bw = width / Math.max(n, 1);
  const bars = values.map((v, i) => {
    const h = 260 * v / max, x = left + i * bw;
    return `<rect x="${x + bw * 0.15}" y="${bottom - h}" width="${bw * 0.7}" height="${h}" fill="${color(spec, i)}"/>` +
      `<text x="${x + bw / 2}" y="${bottom + 16}" text-anchor="middle" fill="${spec.theme.foreground}" font-size="11">${esc(spec.labels[i])}</text>`;
  }).join('');
  return svg(title(spec) + `<line x1="${left}" y1="${bottom}" x2="${left + width}" y2="${bottom}" stroke="${spec.theme.grid}"/>` + bars);
}

function drawLine(spec) {
  const values = spec.series[0].values, n = values.length;
  const max = Math.max(...values, 1), left = 50, bottom = 320, width = W - 80;
  const x = i => left + (n > 1 ? i * width / (n - 1) : width / 2);
  const y = v => bottom - 260 * v / max;
  const pts = values.map((v, i) => `${x(i)},${y(v)}`).join(' ');
  const dots = values.map((v, i) => `<circle cx="${x(i)}" cy="${y(v)}" r="4" fill="${spec.theme.foreground}"/>`).join('');
  const labels = spec.labels.map((l, i) => `<text x="${x(i)}" y="${bottom + 16}" text-anchor="middle" fill="${spec.theme.foreground}" font-size="11">${esc(l)}</text>`).join('');
  return svg(title(spec) + `<polyline points="${pts}" fill="none" stroke="${color(spec, 0)}" stroke-width="2"/>` + dots + labels);
}

function drawChart(spec) {
  switch (spec.kind) {
    case 'doughnut': return drawDoughnut(spec);
    case 'polarArea': return drawPolar(spec);
    case 'radar': return drawRadar(spec);
    case 'bar': return drawBars(spec);
    case 'line': return drawLine(spec);
    default: return '';
  }
}

function drawScene(commands) {
  let scale = 1, hex = 0x00ff41, particles = 0;
  commands.forEach(c => {
    if (c.op === 'scale') scale = c.value;
    if (c.op === 'color') hex = c.value;
    if (c.op === 'clear_particles') particles = 0;
    if (c.op === 'spawn_particles') particles = c.value;
  });
  const fill = '#' + hex.toString(16).padStart(6, '0');
  const s = Math.min(60 * scale, 170);
  let out = `<rect x="${W / 2 - s}" y="${H / 2 - s}" width="${2 * s}" height="${2 * s}" fill="none" stroke="${fill}" stroke-width="2" transform="rotate(20 ${W / 2} ${H / 2})"/>`;
  for (let i = 0; i < particles; i++) {
    out += `<circle cx="${Math.random() * W}" cy="${Math.random() * H}" r="3" fill="#00d4ff"/>`;
  }
  return svg(out);
}

// ---------------------------------------------------------------------------
// Snapshot rendering
// ---------------------------------------------------------------------------
function render(snap) {
  ['chart', 'scene', 'json'].forEach(m => {
    document.getElementById('mode-' + m).classList.toggle('active', snap.mode === m);
  });
  document.getElementById('chart-view').classList.toggle('hidden', snap.mode !== 'chart');
  document.getElementById('scene-view').classList.toggle('hidden', snap.mode !== 'scene');
  document.getElementById('json-view').classList.toggle('hidden', snap.mode !== 'json');

  const chartView = document.getElementById('chart-view');
  if (snap.chart) {
    chartView.innerHTML = drawChart(snap.chart);
  } else {
    chartView.innerHTML = `<div class="placeholder">${esc(snap.placeholder || '')}</div>`;
  }
  document.getElementById('scene-view').innerHTML = snap.scene.length ? drawScene(snap.scene) : '';
  document.getElementById('json-view').textContent = snap.raw;

  document.getElementById('insights').textContent =
    snap.insights_text || 'Run a request to see insights.';
  if (snap.status) setStatus(snap.status.kind, snap.status.message);
  document.getElementById('login-panel').classList.toggle('hidden', snap.logged_in);
  renderHealth(snap.health);
  renderPermissions(snap.permissions);
}

function renderPermissions(p) {
  const panel = document.getElementById('permissions-panel');
  panel.classList.toggle('hidden', !p);
  if (!p) return;

  const who = [p.full_name, p.role && `(${p.role.name})`].filter(Boolean).join(' ');
  document.getElementById('permissions-title').textContent = who || 'Permissions';

  let out = '';
  if (p.role) {
    const level = p.role.level != null ? ` \u2022 level ${p.role.level}` : '';
    out += `<span class="badge" style="background:${esc(p.role.color || '#333')}">${esc(p.role.name)}${level}</span>`;
    if (p.role.description) out += `<div class="placeholder">${esc(p.role.description)}</div>`;
  }
  out += '<div class="perm-grid">';
  p.sections.forEach(s => {
    out += `<div><h3>${esc(s.title)}</h3>`;
    s.rows.forEach(r => {
      const mark = r.granted ? '<span class="yes">\u2713</span>' : '<span class="no">\u2717</span>';
      out += `<div class="perm-row"><span>${esc(r.label)}</span>${mark}</div>`;
    });
    out += '</div>';
  });
  if (p.stats.length) {
    out += '<div><h3>STATISTICS</h3>';
    p.stats.forEach(([k, v]) => { out += `<div class="perm-row"><span>${esc(k)}</span><span>${esc(v)}</span></div>`; });
    out += '</div>';
  }
  document.getElementById('permissions').innerHTML = out + '</div>';
}

function renderHealth(h) {
  const dot = document.getElementById('health-dot');
  dot.style.background = h.color;
  dot.style.color = h.color;
  document.getElementById('health-label').textContent = h.label;
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------
async function call(endpoint) {
  const id = document.getElementById('record-id').value.trim();
  setStatus('', 'Requesting ' + endpoint + '...');
  try {
    render(await api('POST', '/api/call', id ? { endpoint, id } : { endpoint }));
  } catch (e) {
    setStatus('error', e.message);
  }
}

function callSelected() {
  call(document.getElementById('endpoint').value);
}

async function switchView(mode) {
  try { render(await api('POST', '/api/view', { mode })); } catch (e) { setStatus('error', e.message); }
}

async function clearView() {
  try { render(await api('POST', '/api/clear')); setStatus('', ''); } catch (e) { setStatus('error', e.message); }
}

async function login() {
  const username = document.getElementById('username').value;
  const password = document.getElementById('password').value;
  try {
    render(await api('POST', '/api/login', { username, password }));
    setStatus('success', 'Logged in');
  } catch (e) {
    setStatus('error', e.message);
  }
}

async function loadEndpoints() {
  const data = await api('GET', '/api/endpoints');
  document.getElementById('quick').innerHTML = data.quick
    .map(e => `<button title="${esc(e.description)}" onclick="call('${e.alias}')">${esc(e.alias)}</button>`)
    .join('');
  document.getElementById('endpoint').innerHTML = data.all
    .map(e => `<option value="${e.alias}">${esc(e.alias)} ${esc(e.path)}</option>`)
    .join('');
}

async function pollHealth() {
  try { renderHealth(await api('GET', '/api/health')); } catch (e) { /* server gone */ }
}

loadEndpoints();
api('GET', '/api/view').then(render);
setInterval(pollHealth, 10000);
</script>
</body>
</html>
"##;
