mod common;

use common::{body, engine, settled};
use dom_host::{MemoryHost, SettleOptions, settle};
use mutate::{Controller, Engine, EngineConfig, Position};

const PAGE: &str = r#"<div class="a" title="t"><p>x</p></div><aside></aside>"#;

fn apply_all(e: &mut Engine<MemoryHost>) -> Vec<Controller> {
    vec![
        e.mutate_content("p", |v| format!("{v}1")),
        e.mutate_classes("div", |c| {
            c.add("b");
        }),
        e.mutate_attribute("div", "title", |v| v.map(|v| format!("{v}!"))),
        e.mutate_content("p", |v| format!("[{v}]")),
        e.mutate_classes("div", |c| {
            c.remove("a");
        }),
        e.mutate_attribute("div", "class", |v| v.map(|v| format!("{v} z"))),
        e.mutate_position("p", || Position::append_to("aside")),
        e.mutate_clone("div", None),
    ]
}

#[test]
fn every_revert_order_restores_the_page() {
    let orders: [&[usize]; 4] = [
        &[0, 1, 2, 3, 4, 5, 6, 7],
        &[7, 6, 5, 4, 3, 2, 1, 0],
        &[3, 0, 7, 5, 1, 6, 2, 4],
        &[6, 2, 4, 0, 7, 1, 3, 5],
    ];
    for order in orders {
        let mut e = engine(PAGE);
        let mut controllers = apply_all(&mut e);
        settled(&mut e);
        assert_ne!(body(&e), PAGE);

        for &i in order {
            controllers[i].revert(&mut e);
            settled(&mut e);
        }
        assert_eq!(body(&e), PAGE, "revert order {order:?}");
        assert!(e.tracked_nodes().is_empty(), "revert order {order:?}");
        assert_eq!(e.subscription_count(), 1);
        assert!(e.clones().is_empty());
    }
}

#[test]
fn reverting_in_one_batch_restores_the_page() {
    let mut e = engine(PAGE);
    let mut controllers = apply_all(&mut e);
    settled(&mut e);
    for c in &mut controllers {
        c.revert(&mut e);
    }
    settled(&mut e);
    assert_eq!(body(&e), PAGE);
}

#[test]
fn reverting_the_later_of_two_matches_only_the_earlier() {
    let mut only_first = engine(PAGE);
    let _a = only_first.mutate_attribute("div", "title", |_| Some("first".to_string()));
    settled(&mut only_first);

    let mut both = engine(PAGE);
    let _a = both.mutate_attribute("div", "title", |_| Some("first".to_string()));
    let mut b = both.mutate_attribute("div", "title", |v| v.map(|v| format!("{v} second")));
    settled(&mut both);
    assert!(body(&both).contains(r#"title="first second""#));

    b.revert(&mut both);
    settled(&mut both);
    assert_eq!(body(&both), body(&only_first));
}

#[test]
fn own_writes_are_not_written_twice() {
    let mut e = engine("<h1>x</h1>");
    let _c = e.mutate_content("h1", |_| "hello".to_string());
    let first = settled(&mut e);
    assert_eq!(first.writes, 1);

    let second = settled(&mut e);
    assert_eq!(second.writes, 0);
    assert_eq!(second.rounds, 0);
    assert_eq!(e.host().write_count(), 1);
}

#[test]
fn external_changes_are_reasserted() {
    let mut e = engine("<p>old</p>");
    let p = e.host().select_first("p").unwrap();
    let _c = e.mutate_content("p", |_| "new".to_string());
    settled(&mut e);

    for outside in ["other", "<b>bold</b>", ""] {
        e.host_mut()
            .document_mut()
            .unwrap()
            .set_inner_html(p, outside)
            .unwrap();
        let report = settled(&mut e);
        assert_eq!(report.writes, 1);
        assert_eq!(body(&e), "<p>new</p>");
    }
}

#[test]
fn uncanonical_content_never_settles_without_canonicalization() {
    let config = EngineConfig {
        canonicalize_content: false,
        ..EngineConfig::default()
    };
    let mut e = Engine::with_config(MemoryHost::new("<p></p>"), config);
    let _c = e.mutate_content("p", |_| "<b>x".to_string());
    let report = settle(&mut e, SettleOptions { max_rounds: 8 });
    assert!(!report.converged);
    assert_eq!(report.rounds, 8);

    let mut e = engine("<p></p>");
    let _c = e.mutate_content("p", |_| "<b>x".to_string());
    let report = settled(&mut e);
    assert_eq!(report.writes, 1);
}

#[test]
fn watcher_can_start_disconnected() {
    let config = EngineConfig {
        watch_on_start: false,
        ..EngineConfig::default()
    };
    let mut e = Engine::with_config(MemoryHost::new("<p>a</p>"), config);
    assert!(!e.is_connected());
    let _c = e.mutate_content("p", |_| "b".to_string());
    settled(&mut e);
    assert_eq!(body(&e), "<p>b</p>");

    e.connect();
    assert!(e.is_connected());
}

#[test]
fn no_tree_means_noop_controllers() {
    let mut e = Engine::new(MemoryHost::no_tree());
    assert!(e.mutate_content("p", |_| String::new()).is_noop());
    assert!(e.mutate_classes("p", |c| c.clear()).is_noop());
    assert!(e.mutate_attribute("p", "title", |_| None).is_noop());
    assert!(e.mutate_position("p", || Position::append_to("div")).is_noop());
    assert!(e.mutate_clone("p", None).is_noop());
    let mut noop = e.mutate_content("p", |_| String::new());
    noop.revert(&mut e);
    assert_eq!(e.directive_count(), 0);
    assert!(settle(&mut e, SettleOptions::default()).converged);
}
