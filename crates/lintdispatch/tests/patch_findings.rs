use std::path::PathBuf;

use insta::assert_snapshot;
use lintdispatch::app::patches::{Finding, check_patch_text};

#[test]
fn no_description_message() {
    let findings = check_patch_text(
        "patches/chromium/add_hook.patch",
        "Subject: add hook\n\ndiff --git a/a b/a\n",
    );
    let rendered: Vec<_> = findings.iter().map(ToString::to_string).collect();
    assert_snapshot!("no_description", rendered.join("\n"));
}

#[test]
fn unlisted_message() {
    let finding = Finding::Unlisted {
        manifest: PathBuf::from("patches/v8/.patches"),
        file: "stray.patch".into(),
    };
    assert_snapshot!("unlisted", finding.to_string());
}
