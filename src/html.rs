//! HTML page rendering
//!
//! Builds the single dashboard page from a [`DashboardPage`]. Tables and cards
//! are rendered server-side; the 3D maps (deck.gl) and the bar chart and
//! choropleth (Plotly) are drawn client-side from embedded figure JSON.

use crate::dashboard::{CountyPanel, CountySelector, DashboardPage, MapPanel, PAGE_TITLE};
use crate::shaper::InteractionRow;
use crate::summary::{format_thousands, SummaryCard};
use serde::Serialize;

/// Interaction rows rendered into the page; the API serves the rest
pub const INTERACTION_TABLE_ROWS: usize = 1000;

/// Searched instead of the DOM once the table is truncated
pub const INTERACTION_SEARCH_URL: &str = "/api/interactions";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// JSON safe to inline inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

pub fn render_page(page: &DashboardPage) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <style>{css}</style>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <script src="https://unpkg.com/deck.gl@8.9.35/dist.min.js"></script>
</head>
<body>
    <div class="container">
        <h1>{heading}</h1>
        {interactions}
        <div class="columns">
            {out_map}
            {in_map}
        </div>
        <h2>Net Migration to the New York metropolitan area counties</h2>
        <div id="regional-bar" class="chart"></div>
        <h2>Explore the migration data:</h2>
        {selector}
        {county}
        {ask}
        <footer>Render {render_id} at {generated_at}</footer>
    </div>
    <script type="application/json" id="out-map-spec">{out_map_json}</script>
    <script type="application/json" id="in-map-spec">{in_map_json}</script>
    <script type="application/json" id="bar-spec">{bar_json}</script>
    <script type="application/json" id="choropleth-spec">{choropleth_json}</script>
    <script>{js}</script>
</body>
</html>"#,
        page_title = PAGE_TITLE,
        heading = escape_html(page.title),
        css = inline_css(),
        js = inline_javascript(),
        interactions = render_interactions(&page.interactions),
        out_map = render_map_panel(&page.out_map, "out-map"),
        in_map = render_map_panel(&page.in_map, "in-map"),
        selector = render_selector(&page.selector),
        county = page.county.as_ref().map(render_county).unwrap_or_default(),
        ask = render_ask(),
        render_id = page.render_id,
        generated_at = page.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        out_map_json = script_json(&page.out_map.figure),
        in_map_json = script_json(&page.in_map.figure),
        bar_json = script_json(&page.bar_chart.to_plotly()),
        choropleth_json = script_json(&page.county.as_ref().map(|c| c.choropleth.to_plotly())),
    )
}

fn render_interactions(rows: &[InteractionRow]) -> String {
    let shown = rows.len().min(INTERACTION_TABLE_ROWS);
    let search_source = if shown < rows.len() {
        format!(" data-search-url=\"{}\"", INTERACTION_SEARCH_URL)
    } else {
        String::new()
    };

    let body: String = rows
        .iter()
        .take(INTERACTION_TABLE_ROWS)
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>\n",
                escape_html(&row.name1),
                escape_html(&row.name2),
                format_thousands(row.count as i64),
            )
        })
        .collect();

    format!(
        r#"<h2>County pairs with the most interaction (by exemption)</h2>
<input type="search" class="table-search" data-table="interactions" placeholder="Search counties...">
<table id="interactions" class="sortable" data-limit="{limit}"{search_source}>
<thead><tr><th>County</th><th>County</th><th class="num">Interactions</th></tr></thead>
<tbody>
{body}</tbody>
</table>
<p class="note" id="interactions-note">Showing {shown} of {total} county pairs.</p>"#,
        body = body,
        limit = INTERACTION_TABLE_ROWS,
        search_source = search_source,
        shown = format_thousands(shown as i64),
        total = format_thousands(rows.len() as i64),
    )
}

fn render_map_panel(panel: &MapPanel, id: &str) -> String {
    let column = panel.figure.direction.label();
    let rows: String = panel
        .table
        .iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td class=\"num\">{}</td></tr>\n",
                escape_html(&row.name1),
                format_thousands(row.count as i64),
            )
        })
        .collect();

    format!(
        r#"<div class="column">
    <h2>{title}</h2>
    <div id="{id}" class="map"></div>
    <details>
        <summary>See data</summary>
        <table class="sortable">
        <thead><tr><th>County</th><th class="num">{column}</th></tr></thead>
        <tbody>
{rows}        </tbody>
        </table>
    </details>
</div>"#,
        title = escape_html(&panel.figure.title),
        id = id,
        column = column,
        rows = rows,
    )
}

fn render_selector(selector: &CountySelector) -> String {
    let options: String = selector
        .options
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let selected = if Some(idx) == selector.selected_index {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{value}\"{selected}>{value}</option>",
                value = escape_html(name),
                selected = selected,
            )
        })
        .collect();

    format!(
        r#"<form method="get" action="/" class="selector">
    <label for="county">Select a County:</label>
    <select id="county" name="county" onchange="this.form.submit()">{options}</select>
</form>"#,
        options = options,
    )
}

fn render_card(card: &SummaryCard) -> String {
    format!(
        r#"<div class="card" style="background-color: {background};">
    <h3 style="color: {color};">{title}</h3>
    <h2 style="color: {color};" class="card-value">{value}</h2>
    <p>{caption}</p>
</div>"#,
        background = card.background,
        color = card.color,
        title = card.title,
        value = card.value,
        caption = card.caption,
    )
}

fn render_county(county: &CountyPanel) -> String {
    let cards: String = county.cards.iter().map(render_card).collect();

    let destinations: String = county
        .destinations
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td>{name}</td><td><div class="bar"><span style="width: {pct:.1}%"></span></div><span class="num">{count}</span></td></tr>
"#,
                name = escape_html(&row.name),
                pct = row.share * 100.0,
                count = format_thousands(row.count as i64),
            )
        })
        .collect();

    format!(
        r#"<h2>Selected County: {name}</h2>
<div class="cards">{cards}</div>
<div class="columns wide-left">
    <div class="column"><div id="choropleth" class="chart"></div></div>
    <div class="column">
        <table class="sortable">
        <thead><tr><th>County</th><th>Interactions</th></tr></thead>
        <tbody>
{destinations}        </tbody>
        </table>
    </div>
</div>"#,
        name = escape_html(&county.name),
        cards = cards,
        destinations = destinations,
    )
}

fn render_ask() -> &'static str {
    r#"<h2>Ask a question about the migration data:</h2>
<form id="ask-form" class="ask">
    <label for="question">Enter your question here:</label>
    <textarea id="question" name="question" rows="4"></textarea>
    <button type="submit">Get Answer</button>
</form>
<div id="answer"></div>"#
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; margin: 0; color: #111827; }
.container { max-width: 1400px; margin: 0 auto; padding: 24px; }
h1 { font-size: 2rem; }
h2 { font-size: 1.3rem; margin-top: 32px; }
table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
th, td { padding: 6px 10px; border-bottom: 1px solid #e5e7eb; text-align: left; }
th { cursor: pointer; background: #f9fafb; }
.num { text-align: right; font-variant-numeric: tabular-nums; }
#interactions { display: block; max-height: 420px; overflow-y: auto; }
.table-search { width: 320px; padding: 6px; margin-bottom: 8px; }
.note { color: #6b7280; font-size: 0.8rem; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
.columns.wide-left { grid-template-columns: 2fr 1fr; }
.map { position: relative; height: 480px; }
.chart { min-height: 420px; }
.cards { display: grid; grid-template-columns: repeat(3, 1fr); gap: 24px; }
.card { padding: 20px; border-radius: 15px; margin-bottom: 20px; }
.card-value { font-size: 36px; margin: 8px 0; }
.bar { display: inline-block; width: 60%; height: 8px; background: #e5e7eb; border-radius: 4px; margin-right: 8px; }
.bar span { display: block; height: 100%; background: #2563eb; border-radius: 4px; }
.ask textarea { display: block; width: 100%; margin: 8px 0; }
.answer-ok { padding: 12px; background: #f0fdf4; border-left: 4px solid #16a34a; }
.answer-failed { padding: 12px; background: #fef2f2; border-left: 4px solid #dc2626; }
footer { margin-top: 48px; color: #9ca3af; font-size: 0.75rem; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
function spec(id) {
    return JSON.parse(document.getElementById(id).textContent);
}

function drawMap(container, figure) {
    if (!figure || typeof deck === 'undefined') return;
    const layers = figure.layers.map(function (layer, idx) {
        if (layer.type === 'ColumnLayer') {
            return new deck.ColumnLayer({
                id: container + '-columns-' + idx,
                data: figure.data,
                getPosition: d => [d.long, d.lat],
                getElevation: d => d.migration,
                elevationScale: layer.elevation_scale,
                radius: layer.radius,
                coverage: layer.coverage,
                getFillColor: layer.fill_color,
                pickable: layer.pickable,
                autoHighlight: layer.auto_highlight,
            });
        }
        return new deck.ScatterplotLayer({
            id: container + '-points-' + idx,
            data: figure.data,
            getPosition: d => [d.long, d.lat],
            getRadius: d => d.migration / layer.radius_divisor,
            getFillColor: layer.color,
            pickable: layer.pickable,
        });
    });
    new deck.DeckGL({
        container: container,
        initialViewState: figure.initial_view_state,
        controller: true,
        layers: layers,
        getTooltip: ({object}) => object && (object.name + ': ' + object.migration.toLocaleString()),
    });
}

function drawPlot(container, figure) {
    if (!figure || typeof Plotly === 'undefined' || !document.getElementById(container)) return;
    Plotly.newPlot(container, figure.data, figure.layout, {responsive: true});
}

function filterRows(table, needle) {
    table.querySelectorAll('tbody tr').forEach(function (row) {
        row.style.display = row.textContent.toLowerCase().includes(needle) ? '' : 'none';
    });
}

function fillRows(table, rows) {
    const body = table.querySelector('tbody');
    body.replaceChildren();
    rows.forEach(function (row) {
        const tr = document.createElement('tr');
        [row.County_Name1, row.County_Name2, row.Migration_Count.toLocaleString('en-US')]
            .forEach(function (value, idx) {
                const td = document.createElement('td');
                td.textContent = value;
                if (idx === 2) td.className = 'num';
                tr.appendChild(td);
            });
        body.appendChild(tr);
    });
}

// Truncated tables search the full set server-side
function wireSearch() {
    document.querySelectorAll('.table-search').forEach(function (input) {
        const table = document.getElementById(input.dataset.table);
        const url = table.dataset.searchUrl;
        if (!url) {
            input.addEventListener('input', function () {
                filterRows(table, input.value.toLowerCase());
            });
            return;
        }

        const original = table.querySelector('tbody').innerHTML;
        const note = document.getElementById(table.id + '-note');
        const originalNote = note.textContent;
        let timer = null;
        let latest = 0;
        input.addEventListener('input', function () {
            clearTimeout(timer);
            timer = setTimeout(async function () {
                const query = input.value.trim();
                const request = ++latest;
                if (!query) {
                    table.querySelector('tbody').innerHTML = original;
                    note.textContent = originalNote;
                    return;
                }
                try {
                    const params = new URLSearchParams({q: query, limit: table.dataset.limit});
                    const response = await fetch(url + '?' + params);
                    const rows = (await response.json()).data || [];
                    if (request !== latest) return;
                    fillRows(table, rows);
                    note.textContent = rows.length + ' matching county pairs (first ' + table.dataset.limit + ' shown).';
                } catch (err) {
                    note.textContent = 'Search failed: ' + err;
                }
            }, 250);
        });
    });
}

function wireSorting() {
    document.querySelectorAll('table.sortable th').forEach(function (th, idx) {
        th.addEventListener('click', function () {
            const table = th.closest('table');
            const column = Array.from(th.parentNode.children).indexOf(th);
            const body = table.querySelector('tbody');
            const asc = th.dataset.order !== 'asc';
            th.dataset.order = asc ? 'asc' : 'desc';
            const key = cell => {
                const text = cell.textContent.trim();
                const number = Number(text.replace(/,/g, ''));
                return Number.isNaN(number) ? text.toLowerCase() : number;
            };
            Array.from(body.rows)
                .sort((a, b) => {
                    const x = key(a.cells[column]);
                    const y = key(b.cells[column]);
                    return (x > y ? 1 : x < y ? -1 : 0) * (asc ? 1 : -1);
                })
                .forEach(row => body.appendChild(row));
        });
    });
}

function wireAsk() {
    const form = document.getElementById('ask-form');
    const target = document.getElementById('answer');
    form.addEventListener('submit', async function (event) {
        event.preventDefault();
        const question = document.getElementById('question').value;
        target.textContent = '...';
        try {
            const response = await fetch('/api/ask', {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify({question: question}),
            });
            const reply = (await response.json()).data;
            target.className = reply.status === 'answered' ? 'answer-ok' : 'answer-failed';
            target.textContent = reply.status === 'answered' ? reply.text : reply.reason;
        } catch (err) {
            target.className = 'answer-failed';
            target.textContent = 'Request failed: ' + err;
        }
    });
}

drawMap('out-map', spec('out-map-spec'));
drawMap('in-map', spec('in-map-spec'));
drawPlot('regional-bar', spec('bar-spec'));
drawPlot('choropleth', spec('choropleth-spec'));
wireSearch();
wireSorting();
wireAsk();
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::search;
    use crate::test_support::fixture_dashboard;

    fn page() -> DashboardPage {
        fixture_dashboard(|_| {}).render(None).unwrap()
    }

    fn ranked_rows(n: usize) -> Vec<InteractionRow> {
        (0..n)
            .map(|i| InteractionRow {
                name1: format!("Origin {} County, ST", i),
                name2: format!("Destination {} County, ST", i),
                count: (n - i) as u64,
                code: format!("{:010}", i),
            })
            .collect()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
        assert_eq!(escape_html("O'Brien County, IA"), "O&#39;Brien County, IA");
    }

    #[test]
    fn test_script_json_cannot_close_script_tag() {
        let json = script_json(&"</script><script>alert(1)</script>");
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn test_page_has_every_section() {
        let html = render_page(&page());

        assert!(html.contains("<title>2003-2004 US Migration Patterns</title>"));
        assert!(html.contains("County pairs with the most interaction"));
        assert!(html.contains("Top Counties by Out-Migration"));
        assert!(html.contains("Top Counties by In-Migration"));
        assert!(html.contains("id=\"regional-bar\""));
        assert!(html.contains("Select a County:"));
        assert!(html.contains("Selected County: New York County, NY"));
        assert!(html.contains("+20,000"));
        assert!(html.contains("Population gain"));
        assert!(html.contains("Get Answer"));
    }

    #[test]
    fn test_default_county_is_selected_option() {
        let html = render_page(&page());
        assert!(html.contains("<option value=\"New York County, NY\" selected>"));
    }

    #[test]
    fn test_interaction_rows_are_formatted() {
        let html = render_page(&page());

        assert!(html.contains("<td>New York County, NY</td><td>Kings County, NY</td><td class=\"num\">1,200</td>"));
        assert!(html.contains("Showing 4 of 4 county pairs."));
    }

    #[test]
    fn test_small_table_searches_in_page() {
        let html = render_interactions(&ranked_rows(10));

        assert!(!html.contains("data-search-url"));
        assert!(html.contains("Origin 9 County, ST"));
    }

    #[test]
    fn test_truncated_table_searches_full_set() {
        let mut rows = ranked_rows(INTERACTION_TABLE_ROWS + 1);
        rows[INTERACTION_TABLE_ROWS].name2 = "Loving County, TX".to_string();

        let html = render_interactions(&rows);

        // The low-ranked pair is not in the page, so the box must go to the API
        assert!(!html.contains("Loving County, TX"));
        assert!(html.contains(r#"data-search-url="/api/interactions""#));
        assert!(html.contains(r#"data-limit="1000""#));
        assert!(html.contains("Showing 1,000 of 1,001 county pairs."));
        assert!(inline_javascript().contains("table.dataset.searchUrl"));

        // ...where the search covers every row
        let found = search(&rows, "loving");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].count, 1);
    }
}
