//! Dashboard page markup.
//!
//! The page is static apart from the slider bounds; all output regions are
//! filled in by the session script from `/api/sessions` responses.

use vacancy_map_render::html::escape;
use vacancy_map_vacancy_models::{AreaMeasure, WealthMeasure};

use crate::config::{AppKind, YearBounds};
use crate::session::{
    INPUT_AREA_MEASURE, INPUT_WEALTH_MEASURE, INPUT_YEAR, OUTPUT_MAP, OUTPUT_MAP_IMAGE,
};

/// Navbar title of the tabbed dashboard.
pub const TABS_TITLE: &str = "A Closer Look at Chicago Vacancies";

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; margin: 0; color: #212529; }
.page-fluid { padding: 1rem; }
.navbar { display: flex; align-items: center; gap: 1.5rem; padding: 0.75rem 1rem; border-bottom: 1px solid #dee2e6; }
.navbar .title { font-size: 1.25rem; font-weight: 600; margin-right: auto; }
.navbar button { background: none; border: none; padding: 0.5rem 0; cursor: pointer; font-size: 1rem; color: #6c757d; }
.navbar button.active { color: #212529; border-bottom: 2px solid #0d6efd; }
.tab-panel { display: none; padding: 1rem; }
.tab-panel.active { display: block; }
.card { border: 1px solid #dee2e6; border-radius: 0.5rem; }
.card-header { padding: 0.75rem 1rem; border-bottom: 1px solid #dee2e6; font-weight: 600; }
.card-body { padding: 1rem; }
.layout-sidebar { display: flex; min-height: 100vh; }
.layout-sidebar aside { width: 250px; padding: 1rem; background: #f8f9fa; border-right: 1px solid #dee2e6; }
.layout-sidebar section { flex: 1; padding: 1rem; }
.control { display: block; margin-bottom: 1rem; }
.control label { display: block; margin-bottom: 0.25rem; font-weight: 500; }
.output.error { color: #b02a37; }
";

const SCRIPT: &str = r#"
(function () {
  var sessionId = null;

  function apply(outputs) {
    outputs.forEach(function (o) {
      var el = document.getElementById("output-" + o.name);
      if (!el) { return; }
      el.classList.remove("error");
      if (o.kind === "image") {
        var img = document.createElement("img");
        img.src = o.src;
        img.alt = o.alt;
        img.style.width = o.width;
        el.replaceChildren(img);
      } else if (o.kind === "html") {
        el.innerHTML = o.html;
      } else {
        el.classList.add("error");
        el.textContent = o.message;
      }
    });
  }

  function send(name, value) {
    if (!sessionId) { return; }
    fetch("/api/sessions/" + sessionId + "/inputs", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ name: name, value: value })
    })
      .then(function (res) { return res.ok ? res.json() : null; })
      .then(function (body) { if (body) { apply(body.outputs); } });
  }

  document.querySelectorAll("[data-input]").forEach(function (el) {
    el.addEventListener("change", function () {
      send(el.dataset.input, el.type === "range" ? Number(el.value) : el.value);
    });
    if (el.type === "range") {
      el.addEventListener("input", function () {
        var label = document.getElementById(el.id + "-value");
        if (label) { label.textContent = el.value; }
      });
    }
  });

  document.querySelectorAll("[data-tab]").forEach(function (button) {
    button.addEventListener("click", function () {
      document.querySelectorAll("[data-tab]").forEach(function (b) {
        b.classList.toggle("active", b === button);
      });
      document.querySelectorAll(".tab-panel").forEach(function (panel) {
        panel.classList.toggle("active", panel.id === button.dataset.tab);
      });
    });
  });

  window.addEventListener("beforeunload", function () {
    if (sessionId) {
      fetch("/api/sessions/" + sessionId, { method: "DELETE", keepalive: true });
    }
  });

  fetch("/api/sessions", { method: "POST" })
    .then(function (res) { return res.json(); })
    .then(function (body) {
      sessionId = body.sessionId;
      apply(body.outputs);
    });
})();
"#;

/// Renders the full dashboard page for `app`.
#[must_use]
pub fn render(app: AppKind, years: YearBounds) -> String {
    let body = match app {
        AppKind::Images => format!(r#"<main class="page-fluid">{}</main>"#, image_panel()),
        AppKind::Map => format!(
            r#"<div class="layout-sidebar"><aside>{}</aside><section>{}</section></div>"#,
            year_slider(years),
            output_region(OUTPUT_MAP)
        ),
        AppKind::Tabs => tabs(years),
    };

    let title = match app {
        AppKind::Images => "Chicago Wealth Maps",
        AppKind::Map => "Vacancy Data Map",
        AppKind::Tabs => TABS_TITLE,
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
<script>{SCRIPT}</script>
</body>
</html>
"#
    )
}

fn tabs(years: YearBounds) -> String {
    let nav = format!(
        concat!(
            r#"<nav class="navbar"><span class="title">{}</span>"#,
            r#"<button class="active" data-tab="tab-wealth">Aggregate Wealth and Area Divisions</button>"#,
            r#"<button data-tab="tab-yearly">Yearly Reports Interactive Map</button></nav>"#
        ),
        escape(TABS_TITLE)
    );

    let wealth_panel = format!(
        r#"<div id="tab-wealth" class="tab-panel active">{}</div>"#,
        card("Total Reported Vacant Lots 2011 - 2024", &image_panel())
    );

    let map_body = format!("{}{}", year_slider(years), output_region(OUTPUT_MAP));
    let yearly_panel = format!(
        r#"<div id="tab-yearly" class="tab-panel">{}</div>"#,
        card("Vacancy Data Map", &map_body)
    );

    format!("{nav}{wealth_panel}{yearly_panel}")
}

fn card(title: &str, body: &str) -> String {
    format!(
        r#"<div class="card"><div class="card-header">{}</div><div class="card-body">{body}</div></div>"#,
        escape(title)
    )
}

fn image_panel() -> String {
    let areas: Vec<String> = AreaMeasure::all().iter().map(ToString::to_string).collect();
    let wealths: Vec<String> = WealthMeasure::all()
        .iter()
        .map(ToString::to_string)
        .collect();

    format!(
        "{}{}{}",
        select(
            INPUT_AREA_MEASURE,
            "Area Measure:",
            &areas,
            &AreaMeasure::default().to_string()
        ),
        select(
            INPUT_WEALTH_MEASURE,
            "Wealth Measure:",
            &wealths,
            &WealthMeasure::default().to_string()
        ),
        output_region(OUTPUT_MAP_IMAGE)
    )
}

fn select(id: &str, label: &str, choices: &[String], selected: &str) -> String {
    let options: String = choices
        .iter()
        .map(|choice| {
            let attr = if choice == selected { " selected" } else { "" };
            let choice = escape(choice);
            format!(r#"<option value="{choice}"{attr}>{choice}</option>"#)
        })
        .collect();

    format!(
        r#"<div class="control"><label for="{id}">{}</label><select id="{id}" data-input="{id}">{options}</select></div>"#,
        escape(label)
    )
}

fn year_slider(years: YearBounds) -> String {
    let initial = years.initial();
    format!(
        concat!(
            r#"<div class="control"><label for="{id}">Select Year: <span id="{id}-value">{initial}</span></label>"#,
            r#"<input type="range" id="{id}" data-input="{id}" min="{min}" max="{max}" value="{initial}" step="1"></div>"#
        ),
        id = INPUT_YEAR,
        initial = initial,
        min = years.min,
        max = years.max,
    )
}

fn output_region(name: &str) -> String {
    format!(r#"<div id="output-{name}" class="output"></div>"#)
}
