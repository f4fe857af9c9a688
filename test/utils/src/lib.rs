use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.set_prepend_module_to_snapshot(false);
    settings.bind(f);
}

/// A chat answer as the backend streams it, including a keep-alive comment,
/// a blank separator line, and one malformed frame that must be skipped.
pub fn chat_stream_fixture() -> &'static str {
    return r#"
: keep-alive
data: {"type":"chunk","content":"Soak the rice "}

data: {"type":"chunk","content":"for 20 minutes, "}
data: {"type":"chunk","conte
data: {"type":"chunk","content":"then fry the eggs."}
data: {"type":"done"}
"#
    .trim_start();
}

pub fn chat_stream_error_fixture() -> &'static str {
    return r#"data: {"type":"chunk","content":"Start by"}
data: {"type":"error","error":"model crashed"}
data: {"type":"chunk","content":"never delivered"}
"#;
}
