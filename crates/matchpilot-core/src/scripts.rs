//! Page probes and selectors.
//!
//! All JavaScript the engine evaluates lives here. Each script starts with a
//! `/* tag */` comment so logs (and the scripted test page) can tell them apart.

use serde_json::Value;

use crate::classifier::PageSnapshot;
use crate::remote::{PageError, RemotePage};

pub const FILE_INPUT: &str = r#"input[type="file"]"#;
pub const NAMED_FILE_INPUT: &str = r#"input[type="file"][name="file"]"#;
pub const CREDENTIAL_INPUT: &str = r#"input[name="password"]"#;
pub const SUBMIT_INPUT: &str = r#"input[type="submit"]"#;
pub const PING_CONTROL: &str = r#"input[value="Ping"]"#;
pub const RUN_CONTROL: &str = r#"input[value="Run"]"#;
pub const MANAGER_LINK: &str = r#"[data-matchpilot="manager-link"]"#;

/// Text shown in a participant slot nobody has claimed yet.
pub const PLACEHOLDER_SLOT_TEXT: &str = "anonymous";

pub const BODY_TEXT: &str = "/* body-text */ (document.body ? document.body.innerText : '')";

pub const PAGE_SNAPSHOT: &str = r#"/* page-snapshot */ (() => ({
  url: window.location.href,
  title: document.title,
  text: document.body ? document.body.textContent : '',
  hasUploadLink: !!document.querySelector('a[href*="uploadplayer"]'),
  hasRunLink: !!document.querySelector('a[href*="run.php"]')
}))()"#;

pub const TABLE_CELLS: &str = "/* table-cells */ Array.from(document.querySelectorAll('td')).map(td => td.textContent.trim())";

pub const KEEPALIVE: &str = "/* keepalive */ 1";

/// Selector of the `index`-th tagged placeholder slot.
pub fn slot_selector(index: usize) -> String {
    format!(r#"[data-matchpilot-slot="{}"]"#, index)
}

/// Tag the manager link in the row whose first cell names `contest`.
///
/// Evaluates to `true` when a link was tagged with [`MANAGER_LINK`].
pub fn mark_manager_link(contest: &str) -> String {
    let name = Value::String(contest.trim().to_lowercase());
    format!(
        r#"/* mark-manager-link */ ((name) => {{
  document.querySelectorAll('[data-matchpilot="manager-link"]').forEach(el => el.removeAttribute('data-matchpilot'));
  for (const row of document.querySelectorAll('tr')) {{
    const cells = row.querySelectorAll('td');
    if (cells.length === 0 || cells[0].textContent.trim().toLowerCase() !== name) continue;
    for (const link of row.querySelectorAll('a')) {{
      if (link.textContent.includes('Manager')) {{
        link.setAttribute('data-matchpilot', 'manager-link');
        return true;
      }}
    }}
  }}
  return false;
}})({name})"#
    )
}

/// Tag every cell showing `placeholder` with its slot index, in document order.
///
/// Evaluates to the number of tagged cells.
pub fn tag_placeholder_slots(placeholder: &str) -> String {
    let text = Value::String(placeholder.to_string());
    format!(
        r#"/* tag-slots */ ((text) => {{
  let index = 0;
  for (const cell of document.querySelectorAll('td')) {{
    if (cell.textContent.trim() === text) {{
      cell.setAttribute('data-matchpilot-slot', String(index));
      index += 1;
    }}
  }}
  return index;
}})({text})"#
    )
}

/// Write `name` into slot `index`.
///
/// Prefers the inline editor a click on the cell opens; falls back to
/// replacing the cell text. Evaluates to `"editor"`, `"text"` or `"missing"`.
pub fn bind_slot(index: usize, name: &str) -> String {
    let value = Value::String(name.to_string());
    format!(
        r#"/* bind-slot */ ((index, value) => {{
  const cell = document.querySelector('[data-matchpilot-slot="' + index + '"]');
  if (!cell) return 'missing';
  const active = document.activeElement;
  const input = cell.querySelector('input') || (active && active.tagName === 'INPUT' ? active : null);
  if (input) {{
    input.value = value;
    input.dispatchEvent(new Event('change', {{ bubbles: true }}));
    input.dispatchEvent(new KeyboardEvent('keypress', {{ key: 'Enter', keyCode: 13, bubbles: true }}));
    input.blur();
    return 'editor';
  }}
  cell.textContent = value;
  return 'text';
}})({index}, {value})"#
    )
}

/// Visible text of the page body.
pub async fn body_text(page: &dyn RemotePage) -> Result<String, PageError> {
    let value = page.evaluate(BODY_TEXT).await?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

/// URL, text and link markers in one round trip.
pub async fn snapshot(page: &dyn RemotePage) -> Result<PageSnapshot, PageError> {
    let value = page.evaluate(PAGE_SNAPSHOT).await?;
    serde_json::from_value(value)
        .map_err(|e| PageError::Script(format!("unexpected snapshot shape: {}", e)))
}

/// Trimmed text of every table cell, in document order.
pub async fn table_cells(page: &dyn RemotePage) -> Result<Vec<String>, PageError> {
    let value = page.evaluate(TABLE_CELLS).await?;
    Ok(value
        .as_array()
        .map(|cells| {
            cells
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default())
}
