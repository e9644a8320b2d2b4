//! End-to-end pipeline tests

use crate::engine::{analyze_document, detect_fields, run_job};
use crate::selector::StructuralSelector;
use crate::types::{AnalysisNote, FieldKind, JobSpec, Strategy, Tier};
use std::collections::BTreeMap;

fn frontpage_html(items: usize) -> String {
    let mut html = String::from("<html><head><title>News</title></head><body><table>");
    for i in 0..items {
        html.push_str(&format!(
            "<tr class='athing'><td><span class='titleline'>\
             <a href='/item?id={i}'>Story number {i} with a headline</a></span></td></tr>"
        ));
    }
    html.push_str("</table></body></html>");
    html
}

#[test]
fn repeated_items_always_produce_a_matching_candidate() {
    let analysis = analyze_document(&frontpage_html(12));
    assert!(analysis
        .candidates
        .iter()
        .any(|c| c.selector.to_string() == ".athing" && c.count == 12));
}

#[test]
fn pipeline_is_idempotent_for_identical_input() {
    let html = frontpage_html(8);
    let a = analyze_document(&html);
    let b = analyze_document(&html);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let item = StructuralSelector::parse(".athing").unwrap();
    let fa = detect_fields(&html, &item, FieldKind::DEFAULT);
    let fb = detect_fields(&html, &item, FieldKind::DEFAULT);
    assert_eq!(
        serde_json::to_string(&fa).unwrap(),
        serde_json::to_string(&fb).unwrap()
    );
}

/// Scenario A: 30 elements of class `athing`, each with an anchor; the top
/// candidate is `.athing` with count 30 and title/url come back from the
/// anchor for every item.
#[test]
fn scenario_a_classed_list_with_anchors() {
    let html = frontpage_html(30);
    let analysis = analyze_document(&html);
    let top = &analysis.candidates[0];
    assert_eq!(top.selector.to_string(), ".athing");
    assert_eq!(top.count, 30);

    let item = StructuralSelector::parse(".athing").unwrap();
    let picks = detect_fields(&html, &item, &[FieldKind::Title, FieldKind::Url]);
    let title = picks.iter().find(|p| p.field == FieldKind::Title).unwrap();
    let url = picks.iter().find(|p| p.field == FieldKind::Url).unwrap();

    let job = JobSpec::from_selections("frontpage", &item, &picks);
    let records = run_job(&html, &job, None).unwrap();
    assert_eq!(records.len(), 30);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(
            record.values.get("title").unwrap().as_deref(),
            Some(format!("Story number {i} with a headline").as_str()),
            "title via {}",
            title.selector
        );
        assert_eq!(
            record.values.get("url").unwrap().as_deref(),
            Some(format!("/item?id={i}").as_str()),
            "url via {}",
            url.selector
        );
    }
}

/// Scenario B: a Date | Company | Title grid maps date to column one and
/// title to column three, with no class names involved.
#[test]
fn scenario_b_header_table_columns() {
    let mut html = String::from(
        "<html><body><table><thead>\
         <tr><th>Date</th><th>Company</th><th>Title</th></tr>\
         </thead><tbody>",
    );
    for i in 0..10 {
        html.push_str(&format!(
            "<tr><td>2024-02-{:02}</td><td>Initech {i}</td><td>Quarterly filing {i}</td></tr>",
            i + 1
        ));
    }
    html.push_str("</tbody></table></body></html>");

    let analysis = analyze_document(&html);
    let rows = analysis
        .candidates
        .iter()
        .find(|c| c.origin == Strategy::TableRow)
        .expect("table-row candidate");
    assert_eq!(rows.count, 10);

    let item = rows.selector.clone();
    let picks = detect_fields(&html, &item, &[FieldKind::Date, FieldKind::Title]);
    let date = picks.iter().find(|p| p.field == FieldKind::Date).unwrap();
    let title = picks.iter().find(|p| p.field == FieldKind::Title).unwrap();
    assert_eq!(date.selector.to_string(), "td:nth-child(1)");
    assert_eq!(title.selector.to_string(), "td:nth-child(3)");
    assert_eq!(date.tier, Tier::VeryHigh);

    let job = JobSpec::from_selections("filings", &item, &picks);
    let records = run_job(&html, &job, None).unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(
        records[2].values.get("date").unwrap().as_deref(),
        Some("2024-02-03")
    );
    assert_eq!(
        records[2].values.get("title").unwrap().as_deref(),
        Some("Quarterly filing 2")
    );
}

/// Scenario C: a document carrying a registered generator signal plus one
/// structural class signal reports that framework with the summed score;
/// a plain document reports nothing.
#[test]
fn scenario_c_framework_scoring() {
    let html = "<html><head><meta name='generator' content='WordPress 6.4'></head><body>\
        <article class='hentry'><h2>a</h2></article>\
        <article class='hentry'><h2>b</h2></article>\
        <article class='hentry'><h2>c</h2></article>\
        </body></html>";
    let analysis = analyze_document(html);
    let best = analysis.framework.expect("framework detected");
    assert_eq!(best.framework, "wordpress");
    assert!(best.confidence >= 55);
    assert!(!analysis.notes.contains(&AnalysisNote::NoFrameworkMatch));

    let plain = analyze_document("<html><body><p>nothing here</p></body></html>");
    assert!(plain.framework.is_none());
    assert!(plain.notes.contains(&AnalysisNote::NoFrameworkMatch));
}

/// Scenario D: empty input produces zero candidates and an empty preview,
/// without raising.
#[test]
fn scenario_d_empty_document() {
    let analysis = analyze_document("");
    assert!(analysis.candidates.is_empty());
    assert!(analysis.frameworks.is_empty());
    assert!(analysis.notes.contains(&AnalysisNote::EmptyDocument));

    let job = JobSpec {
        name: "empty".to_string(),
        item_selector: ".athing".to_string(),
        fields: BTreeMap::new(),
    };
    assert!(run_job("", &job, None).unwrap().is_empty());
    assert!(run_job("   \n", &job, Some(5)).unwrap().is_empty());
}

/// Framework-hinted candidates outrank generic ones and are flagged boosted.
#[test]
fn framework_hints_boost_candidates() {
    let mut html = String::from(
        "<html><head><meta name='generator' content='WordPress 6.4'>\
         <script src='/wp-content/themes/x.js'></script></head><body>",
    );
    for i in 0..6 {
        html.push_str(&format!(
            "<article class='hentry'>\
             <h2 class='entry-title'><a href='/p/{i}'>Post number {i}</a></h2>\
             </article>"
        ));
    }
    for i in 0..6 {
        html.push_str(&format!("<div class='widget'>sidebar widget {i}</div>"));
    }
    html.push_str("</body></html>");

    let analysis = analyze_document(&html);
    let top = &analysis.candidates[0];
    assert_eq!(top.tier, Tier::VeryHigh);
    assert!(top.boosted);
    assert_eq!(top.selector.to_string(), ".hentry");
    let widget_pos = analysis
        .candidates
        .iter()
        .position(|c| c.selector.to_string() == ".widget")
        .expect("widget candidate present");
    assert!(widget_pos > 0);
}

/// A bad stored field selector is dropped while the rest of the job runs;
/// a bad item selector fails that job alone.
#[test]
fn malformed_selectors_degrade_per_field() {
    let html = frontpage_html(4);
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), ".titleline a".to_string());
    fields.insert("broken".to_string(), "[[nope".to_string());
    let job = JobSpec {
        name: "partial".to_string(),
        item_selector: ".athing".to_string(),
        fields,
    };
    let records = run_job(&html, &job, None).unwrap();
    assert_eq!(records.len(), 4);
    assert!(records[0].values.get("title").unwrap().is_some());
    assert!(!records[0].values.contains_key("broken"));

    let bad_item = JobSpec {
        name: "bad".to_string(),
        item_selector: "[[nope".to_string(),
        fields: BTreeMap::new(),
    };
    assert!(run_job(&html, &bad_item, None).is_err());
}

/// The preview path is a strict prefix of the production path.
#[test]
fn preview_equals_production_prefix() {
    let html = frontpage_html(20);
    let item = StructuralSelector::parse(".athing").unwrap();
    let picks = detect_fields(&html, &item, &[FieldKind::Title, FieldKind::Url]);
    let job = JobSpec::from_selections("frontpage", &item, &picks);
    let all = run_job(&html, &job, None).unwrap();
    let preview = run_job(&html, &job, Some(5)).unwrap();
    assert_eq!(all.len(), 20);
    assert_eq!(preview[..], all[..5]);
}
