#![allow(dead_code)]

use dom_host::{MemoryHost, SettleOptions, SettleReport, diff_lines, outline, settle};
use mutate::Engine;

pub fn engine(markup: &str) -> Engine<MemoryHost> {
    Engine::new(MemoryHost::new(markup))
}

/// Settles and fails the test if the tree never goes quiet.
pub fn settled(engine: &mut Engine<MemoryHost>) -> SettleReport {
    let report = settle(engine, SettleOptions::default());
    assert!(report.converged, "tree did not settle: {report:?}");
    report
}

pub fn body(engine: &Engine<MemoryHost>) -> String {
    engine.host().body_html()
}

/// Replaces the body from outside the engine.
pub fn set_body(engine: &mut Engine<MemoryHost>, markup: &str) {
    let doc = engine.host_mut().document_mut().expect("tree");
    let body = doc.body();
    doc.set_inner_html(body, markup).expect("body accepts children");
}

pub fn assert_tree(engine: &Engine<MemoryHost>, expected: &str) {
    let doc = engine.host().document().expect("tree");
    let actual = outline(doc, doc.body());
    let expected_doc = html::Document::parse(expected);
    let expected = outline(&expected_doc, expected_doc.body());
    let diff = diff_lines(&expected, &actual);
    assert!(diff.is_empty(), "tree mismatch\n{diff}");
}
