use crate::common::{ids, index, parent, run, text_with};
use larkdoc_babel::blocks::{BlockIndex, BlockKind, TextElement};
use larkdoc_babel::{ConvertOptions, Converter, MentionUserInfo, ResolveError};
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

type Resolved = Result<HashMap<String, MentionUserInfo>, ResolveError>;

fn mention(user_id: &str) -> TextElement {
    TextElement::MentionUser {
        user_id: user_id.to_string(),
    }
}

fn forest() -> BlockIndex {
    index(vec![
        text_with("p", vec![mention("u1"), run(" and "), mention("u2")]),
        parent("q", BlockKind::QuoteContainer, &["inner"]),
        text_with("inner", vec![run("cc "), mention("u1")]),
    ])
}

fn directory(calls: Rc<Cell<usize>>, seen: Rc<Cell<usize>>) -> impl Fn(&BTreeSet<String>) -> Resolved {
    move |wanted: &BTreeSet<String>| -> Resolved {
        calls.set(calls.get() + 1);
        seen.set(wanted.len());
        let mut users = HashMap::new();
        if wanted.contains("u1") {
            users.insert(
                "u1".to_string(),
                MentionUserInfo::new("A").with_email("a@x.com"),
            );
        }
        Ok(users)
    }
}

#[test]
fn test_expanded_mentions_use_resolver_once() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(0));
    let mut converter = Converter::new(ConvertOptions::default().with_expand_mentions(true))
        .with_resolver(directory(calls.clone(), seen.clone()));

    let blocks = forest();
    let out = converter.export_markdown(&blocks, &ids(&["p", "q"]));
    assert_eq!(
        out.markdown,
        "[@A](mailto:a@x.com) and @[user:u2]\n\n> cc [@A](mailto:a@x.com)\n"
    );
    assert_eq!(calls.get(), 1);
    assert_eq!(seen.get(), 2);

    // u1 is cached now; only the still unresolved u2 is asked for again.
    converter.export_markdown(&blocks, &ids(&["p"]));
    assert_eq!(calls.get(), 2);
    assert_eq!(seen.get(), 1);
    assert_eq!(converter.mention_cache().len(), 1);
}

#[test]
fn test_mentions_without_expansion_skip_resolver() {
    let calls = Rc::new(Cell::new(0));
    let mut converter = Converter::new(ConvertOptions::default())
        .with_resolver(directory(calls.clone(), Rc::new(Cell::new(0))));

    let out = converter.export_markdown(&forest(), &ids(&["p"]));
    assert_eq!(out.markdown, "@[user:u1] and @[user:u2]\n");
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_missing_resolver_degrades_to_placeholders() {
    let mut converter = Converter::new(ConvertOptions::default().with_expand_mentions(true));
    let out = converter.export_markdown(&forest(), &ids(&["p"]));
    assert_eq!(out.markdown, "@[user:u1] and @[user:u2]\n");
}

#[test]
fn test_failing_resolver_degrades_to_placeholders() {
    let mut converter = Converter::new(ConvertOptions::default().with_expand_mentions(true))
        .with_resolver(|_: &BTreeSet<String>| -> Resolved {
            Err(ResolveError("directory unavailable".to_string()))
        });
    let out = converter.export_markdown(&forest(), &ids(&["q"]));
    assert_eq!(out.markdown, "> cc @[user:u1]\n");
    assert!(converter.mention_cache().is_empty());
}

#[test]
fn test_name_without_email_renders_at_name() {
    let mut converter = Converter::new(ConvertOptions::default().with_expand_mentions(true))
        .with_resolver(|wanted: &BTreeSet<String>| -> Resolved {
            Ok(wanted
                .iter()
                .map(|id| (id.clone(), MentionUserInfo::new(format!("User {id}"))))
                .collect())
        });
    let out = converter.export_markdown(&forest(), &ids(&["p"]));
    assert_eq!(out.markdown, "@User u1 and @User u2\n");
}
