//! CLI smoke entry point.
//!
//! # Responsibility
//! - Boot a demo page through `fieldnote_core` and drive one commenting
//!   session end to end.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Set `FIELDNOTE_LOG_DIR` to an absolute path to also write core logs.

use fieldnote_core::{
    init_commenting, init_logging, CommentApp, CommentingConfig, CommentingSession,
    DocumentOutline, LogLevel,
};
use log::info;
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

const DEMO_OUTLINE: &str = r#"{"nodes": [
    {"kind": "comments_output"},
    {"kind": "tab_control", "tab": "content"},
    {"kind": "tab_control", "tab": "promote"},
    {"kind": "field", "content_path": "title", "offset_top": 24.0},
    {"content_path": "body", "offset_top": 96.0, "children": [
        {"content_path": "0", "offset_top": 12.0, "children": [
            {"kind": "field", "content_path": "heading"}
        ]},
        {"content_path": "1", "offset_top": 140.0, "children": [
            {"kind": "field", "content_path": "text"}
        ]}
    ]},
    {"comments_disabled": true, "children": [
        {"kind": "field", "content_path": "slug"}
    ]}
]}"#;

const DEMO_CONFIG: &str = r#"{
    "current_tab": "content",
    "comments": [{"local_id": 1, "content_path": "body.1.text"}]
}"#;

fn main() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("FIELDNOTE_LOG_DIR") {
        init_logging(LogLevel::build_default().as_str(), &log_dir)?;
    }
    println!("fieldnote_core version={}", fieldnote_core::core_version());

    let config = CommentingConfig::from_json(DEMO_CONFIG)?;
    let app = Rc::new(CommentApp::from_config(&config));
    let document = Rc::new(RefCell::new(DocumentOutline::from_json(DEMO_OUTLINE)?.build()));
    let session = init_commenting(app.clone(), document)?;
    print_session("boot", &session);

    if let Some(heading) = session.widget_for_path("body.0.heading") {
        if let Some(local_id) = heading.on_add_clicked() {
            println!("added comment local_id={local_id} on body.0.heading");
        }
    }
    print_session("after add", &session);

    if let Some(annotation) = session
        .widget_for_path("body.1.text")
        .and_then(|widget| widget.annotation_for(1))
    {
        annotation.on_click();
        println!(
            "focused comment 1 marker_top={}",
            annotation.desired_position()
        );
    }

    if let Some(promote) = session.tabs().iter().find(|tab| tab.tab == "promote") {
        session.activate_tab(promote.element)?;
    }
    app.delete_comment(1);
    print_session("after delete", &session);

    app.set_enabled(false);
    print_session("comments disabled", &session);
    info!("event=cli_smoke module=cli status=ok");
    Ok(())
}

fn print_session(label: &str, session: &CommentingSession) {
    let state = session.app().state();
    println!(
        "[{label}] comments={} focused={:?} tab={:?} enabled={}",
        state.comments.len(),
        state.focused,
        state.current_tab,
        state.enabled
    );
    for widget in session.widgets() {
        let live = widget
            .annotations()
            .iter()
            .filter(|annotation| !annotation.is_destroyed())
            .count();
        println!(
            "  {} add_visible={} annotations={live}",
            widget.content_path(),
            widget.is_shown()
        );
    }
}
