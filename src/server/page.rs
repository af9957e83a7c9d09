use std::path::Path;

use crate::export::ExportFormat;

pub(super) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn export_links() -> String {
    ExportFormat::ALL
        .iter()
        .map(|f| format!(r#"<a href="/export/{f}" download>{}</a>"#, f.extension().to_uppercase()))
        .collect::<Vec<_>>()
        .join("\n      ")
}

/// The preview page: the live frame plus the action buttons.
pub(super) fn build_preview_page(tag_name: &str, preset: &Path, size: (u32, u32)) -> String {
    let tag = html_escape(tag_name);
    let preset = html_escape(&preset.display().to_string());
    let (w, h) = size;
    let links = export_links();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>blob preview: {tag}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
    font-family: 'JetBrains Mono', monospace; font-size: 12px; }}
  .toolbar {{ display: flex; gap: 8px; align-items: center; padding: 8px 12px;
    border-bottom: 1px solid #1F1F1F; }}
  .toolbar .name {{ color: #E0E0E0; margin-right: auto; }}
  button, a {{ background: #141414; color: #E0E0E0; border: 1px solid #2A2A2A;
    padding: 4px 10px; border-radius: 3px; cursor: pointer; text-decoration: none; }}
  button:hover, a:hover {{ border-color: #D4AF37; }}
  button:disabled {{ opacity: 0.4; cursor: default; }}
  .stage {{ display: flex; justify-content: center; align-items: center;
    height: calc(100% - 80px); }}
  #frame {{ width: {w}px; height: {h}px; }}
  #frame svg {{ width: 100%; height: 100%; }}
  .status {{ padding: 6px 12px; color: #666; }}
</style>
</head>
<body>
<div class="toolbar">
  <span class="name">{tag} <span style="color:#666">{preset}</span></span>
  <button id="generate">Generate</button>
  <button id="randomize">Randomize gradient</button>
  <button id="stop">Add color stop</button>
  <button id="back" disabled>Back</button>
  {links}
</div>
<div class="stage"><div id="frame"></div></div>
<div class="status" id="status"></div>
<script>
  const frame = document.getElementById('frame');
  const status = document.getElementById('status');
  const back = document.getElementById('back');

  async function post(url) {{
    const res = await fetch(url, {{ method: 'POST' }});
    if (!res.ok) {{ status.textContent = await res.text(); return null; }}
    return res.json();
  }}

  function showGradient(g) {{
    if (!g) return;
    back.disabled = !g.can_go_back;
    status.textContent = 'gradient ' + g.gradient.colors.join(' → ') + ' @ ' + g.gradient.angle + '°';
  }}

  document.getElementById('generate').onclick = async () => {{
    const r = await post('/generate');
    if (r) status.textContent = 'seed ' + r.seed + ', ' + r.points + ' points';
  }};
  document.getElementById('randomize').onclick = async () => showGradient(await post('/gradient/randomize'));
  document.getElementById('stop').onclick = async () => showGradient(await post('/gradient/stop'));
  back.onclick = async () => showGradient(await post('/gradient/back'));

  let busy = false;
  async function poll() {{
    if (!busy) {{
      busy = true;
      try {{
        const res = await fetch('/frame.svg', {{ cache: 'no-store' }});
        if (res.ok) frame.innerHTML = await res.text();
      }} catch (_) {{}}
      busy = false;
    }}
    requestAnimationFrame(poll);
  }}
  poll();
</script>
</body>
</html>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_actions_and_exports() {
        let page = build_preview_page("blob-hero", Path::new("presets/hero.json"), (600, 600));
        assert!(page.contains("<title>blob preview: blob-hero</title>"));
        assert!(page.contains(r#"href="/export/jpeg""#));
        assert!(page.contains("'/gradient/back'"));
        assert!(page.contains("#frame { width: 600px; height: 600px; }"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
