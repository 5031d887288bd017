//! Block → Markdown rendering of hand-built forests.

use crate::common::{export, export_with, ids, index, parent, run, text, text_with};
use insta::assert_snapshot;
use larkdoc_babel::blocks::{
    Block, BlockKind, BlockStyle, Callout, CalloutColor, DiagramType, DocTarget, FilePayload,
    ImagePayload, IsvPayload, StyleFlags, TextBody, TextElement, TextRun,
};
use larkdoc_babel::formats::markdown::export_markdown;
use larkdoc_babel::{ConvertOptions, MentionCache};

#[test]
fn test_document_kitchensink() {
    let blocks = index(vec![
        parent(
            "page",
            BlockKind::Page(Some(TextBody::plain("Release notes"))),
            &["intro", "b1", "b2", "o1", "o2", "code", "hr", "todo"],
        ),
        text("intro", "What changed:"),
        Block::new("b1", BlockKind::Bullet(Some(TextBody::plain("faster")))),
        parent("b2", BlockKind::Bullet(Some(TextBody::plain("smaller"))), &["b2a"]),
        Block::new("b2a", BlockKind::Bullet(Some(TextBody::plain("by half")))),
        Block::new("o1", BlockKind::Ordered(Some(TextBody::plain("install")))),
        Block::new("o2", BlockKind::Ordered(Some(TextBody::plain("run")))),
        Block::new(
            "code",
            BlockKind::Code(Some(TextBody::plain("cargo run").with_style(BlockStyle {
                language: Some("sh".to_string()),
                ..BlockStyle::default()
            }))),
        ),
        Block::new("hr", BlockKind::Divider),
        Block::new(
            "todo",
            BlockKind::Todo(Some(TextBody::plain("ship it").with_style(BlockStyle {
                done: true,
                ..BlockStyle::default()
            }))),
        ),
    ]);

    assert_snapshot!(export(&blocks, &["page"]), @r"
    # Release notes

    What changed:

    - faster
    - smaller
      - by half

    1. install
    2. run

    ```sh
    cargo run
    ```

    ---

    - [x] ship it
    ");
}

#[test]
fn test_ordered_numbering_restarts_per_run() {
    let blocks = index(vec![
        Block::new("a", BlockKind::Ordered(Some(TextBody::plain("a")))),
        Block::new("b", BlockKind::Ordered(Some(TextBody::plain("b")))),
        text("p", "break"),
        Block::new("c", BlockKind::Ordered(Some(TextBody::plain("c")))),
    ]);
    assert_eq!(
        export(&blocks, &["a", "b", "p", "c"]),
        "1. a\n2. b\n\nbreak\n\n1. c\n"
    );
}

#[test]
fn test_deep_headings_clamp_to_six() {
    let blocks = index(vec![
        Block::new("h8", BlockKind::heading(8, TextBody::plain("deep"))),
        Block::new("h2", BlockKind::heading(2, TextBody::plain("shallow"))),
    ]);
    assert_eq!(export(&blocks, &["h8", "h2"]), "###### deep\n\n## shallow\n");
}

#[test]
fn test_quote_container_and_callout() {
    let blocks = index(vec![
        parent("q", BlockKind::QuoteContainer, &["l1", "l2"]),
        Block::new("l1", BlockKind::Quote(Some(TextBody::plain("first")))),
        Block::new("l2", BlockKind::Quote(Some(TextBody::plain("second")))),
        parent(
            "c",
            BlockKind::Callout(Some(Callout {
                background: CalloutColor::LightRed,
                emoji: None,
            })),
            &["c1", "c2"],
        ),
        text("c1", "Do not"),
        text("c2", "Really"),
        parent("empty", BlockKind::Callout(None), &[]),
    ]);

    assert_snapshot!(export(&blocks, &["q", "c", "empty"]), @r"
    > first
    > second

    > [!CAUTION]
    > Do not
    >
    > Really

    > [!NOTE]
    ");
}

#[test]
fn test_inline_styles_and_links() {
    let bold = StyleFlags::default().with_bold();
    let blocks = index(vec![text_with(
        "p",
        vec![
            run("see "),
            TextElement::Run(TextRun {
                content: "the docs ".to_string(),
                style: bold,
                link: Some("https://en.wikipedia.org/wiki/Foo_(bar)".to_string()),
            }),
            TextElement::Run(TextRun {
                content: "x".to_string(),
                style: StyleFlags::default().with_strikethrough().with_underline(),
                link: None,
            }),
            TextElement::Equation {
                content: "a^2".to_string(),
            },
            TextElement::LineBreak,
            TextElement::AutoLink {
                url: "https://example.com".to_string(),
                style: StyleFlags::default().with_strikethrough(),
            },
        ],
    )]);

    assert_eq!(
        export(&blocks, &["p"]),
        "see [**the docs**](https://en.wikipedia.org/wiki/Foo_%28bar%29) <u>~~x~~</u>$a^2$<br>~~<https://example.com>~~\n"
    );
}

#[test]
fn test_inline_code_uses_long_enough_fence() {
    let blocks = index(vec![text_with(
        "p",
        vec![TextElement::Run(TextRun {
            content: "a`b".to_string(),
            style: StyleFlags::default().with_inline_code(),
            link: None,
        })],
    )]);
    assert_eq!(export(&blocks, &["p"]), "``a`b``\n");
}

#[test]
fn test_doc_mention_without_url_uses_document_id() {
    let blocks = index(vec![text_with(
        "p",
        vec![
            TextElement::MentionDoc {
                title: "Here".to_string(),
                target: DocTarget::Token(String::new()),
            },
            run(" and "),
            TextElement::MentionDoc {
                title: "There".to_string(),
                target: DocTarget::Token("doxcnOTHER".to_string()),
            },
        ],
    )]);
    let options = ConvertOptions::default().with_document_id("doxcnSELF");
    assert_eq!(
        export_with(&blocks, &["p"], &options),
        "[Here](lark://doc/doxcnSELF) and [There](lark://doc/doxcnOTHER)\n"
    );
}

#[test]
fn test_images_render_token_or_placeholder() {
    let blocks = index(vec![
        Block::new("none", BlockKind::Image(None)),
        parent(
            "tok",
            BlockKind::Image(Some(ImagePayload {
                token: Some("boxcn1".to_string()),
                ..ImagePayload::default()
            })),
            &["alt"],
        ),
        parent(
            "tok2",
            BlockKind::Image(Some(ImagePayload {
                token: Some("boxcn1".to_string()),
                ..ImagePayload::default()
            })),
            &["alt"],
        ),
        text("alt", "architecture"),
    ]);

    let out = export_markdown(
        &blocks,
        &ids(&["none", "tok", "tok2", "tok"]),
        &ConvertOptions::default(),
        &MentionCache::new(),
    );
    assert_eq!(
        out.markdown,
        "![image]()\n\n![architecture](boxcn1)\n\n![architecture](boxcn1)\n"
    );
    assert_eq!(out.image_tokens, vec!["boxcn1".to_string()]);

    let download = ConvertOptions::default().with_download_images(true);
    assert_eq!(
        export_with(&blocks, &["tok"], &download),
        "![architecture](static/boxcn1.png)\n"
    );
}

#[test]
fn test_embedded_objects_render_placeholders() {
    let blocks = index(vec![
        Block::new("sheet", BlockKind::Sheet(Some("shtcn1".to_string()))),
        Block::new("board", BlockKind::Board(None)),
        Block::new("diagram", BlockKind::Diagram(None)),
        Block::new("uml", BlockKind::Diagram(Some(DiagramType::Uml))),
        Block::new(
            "isv",
            BlockKind::Isv(Some(IsvPayload {
                component_type_id: "blk_timeline".to_string(),
                component_id: "cmp1".to_string(),
            })),
        ),
        Block::new(
            "file",
            BlockKind::File(Some(FilePayload {
                token: "boxcnF".to_string(),
                name: "report.pdf".to_string(),
            })),
        ),
        Block::new("addons", BlockKind::AddOns(Some("x".to_string()))),
        Block::new("catalog", BlockKind::WikiCatalog),
        Block::new("future", BlockKind::Unknown(999)),
    ]);

    assert_snapshot!(
        export(
            &blocks,
            &["sheet", "board", "diagram", "uml", "isv", "file", "addons", "catalog", "future"]
        ),
        @r"
    [Sheet](lark://sheet/shtcn1)

    [Board]

    [Diagram: Unknown]

    [Diagram: UML]

    [ISV blk_timeline: cmp1]

    [report.pdf](lark://file/boxcnF)
    "
    );
}

#[test]
fn test_grid_renders_columns_in_order() {
    let blocks = index(vec![
        parent(
            "grid",
            BlockKind::Grid {
                column_size: Some(2),
            },
            &["left", "stray", "right"],
        ),
        parent("left", BlockKind::GridColumn { width_ratio: Some(50) }, &["l"]),
        text("stray", "not a column"),
        parent("right", BlockKind::GridColumn { width_ratio: Some(50) }, &["r"]),
        text("l", "left side"),
        text("r", "right side"),
    ]);
    assert_eq!(export(&blocks, &["grid"]), "left side\n\nright side\n");
}

#[test]
fn test_missing_children_are_skipped() {
    let blocks = index(vec![
        parent("q", BlockKind::QuoteContainer, &["gone", "l"]),
        Block::new("l", BlockKind::Quote(Some(TextBody::plain("kept")))),
    ]);
    assert_eq!(export(&blocks, &["missing", "q"]), "> kept\n");
}

#[test]
fn test_empty_roots_give_empty_output() {
    let blocks = index(Vec::new());
    assert_eq!(export(&blocks, &[]), "");
    assert!(!BlockKind::Divider.is_list_item());
}
