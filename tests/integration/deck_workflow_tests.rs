/*!
 * End-to-end tests of deck translation: walker, unit translator and codec
 */

use std::io::Cursor;

use deck_translator::document::{
    pptx, Cell, Document, FormattingAttributes, Paragraph, Run, Shape, ShapeKind, Slide, Table, TextContainer,
};
use deck_translator::providers::mock::MockProvider;
use deck_translator::translation::{DocumentWalker, UnitLocation, UnitStatus};
use crate::common::{self, DeckBuilder, SlideBuilder};

fn text_of(document: &Document, slide: usize, shape: usize) -> &TextContainer {
    match &document.slides[slide].shapes[shape].kind {
        ShapeKind::Text(container) => container,
        other => panic!("expected text shape, got {:?}", other),
    }
}

#[tokio::test]
async fn test_scenarioA_singleParagraph_shouldKeepBoldItalic() {
    common::init_logging();
    let format = FormattingAttributes {
        bold: Some(true),
        italic: Some(true),
        ..FormattingAttributes::default()
    };
    let mut deck = Document::new(vec![Slide::new(vec![Shape::text(
        "Title",
        TextContainer::new(vec![Paragraph::with_runs(vec![Run::new("Hello world").formatted(format.clone())])]),
    )])]);
    let (provider, translator) = common::mock_translator(MockProvider::fixed("Bonjour le monde"));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(provider.call_count(), 1);
    let container = text_of(&deck, 0, 0);
    assert_eq!(container.paragraph_count(), 1);
    let runs = container.paragraphs()[0].runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "Bonjour le monde");
    assert_eq!(runs[0].format.bold, Some(true));
    assert_eq!(runs[0].format.italic, Some(true));
}

#[tokio::test]
async fn test_scenarioB_twoParagraphsOneLine_shouldClearSecond() {
    let mut deck = Document::new(vec![Slide::new(vec![Shape::text(
        "Body",
        TextContainer::new(vec![
            Paragraph::with_runs(vec![Run::new("Line one").formatted(FormattingAttributes {
                underline: Some(deck_translator::document::Underline::Single),
                ..FormattingAttributes::default()
            })])
            .at_level(1),
            Paragraph::from_text("Line two"),
        ]),
    )])]);
    let (_, translator) = common::mock_translator(MockProvider::fixed("Une seule ligne"));

    DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;

    let container = text_of(&deck, 0, 0);
    assert_eq!(container.paragraph_count(), 2);
    let first = &container.paragraphs()[0];
    assert_eq!(first.text(), "Une seule ligne");
    assert_eq!(first.level, Some(1));
    assert_eq!(first.runs()[0].format.underline, Some(deck_translator::document::Underline::Single));
    assert!(container.paragraphs()[1].runs().is_empty());
}

#[tokio::test]
async fn test_scenarioC_tableWithOneFilledCell_shouldCallOnce() {
    let table = Table::new(vec![
        vec![Cell::new(TextContainer::from_text("")), Cell::new(TextContainer::from_text("Total"))],
        vec![Cell::new(TextContainer::from_text(" ")), Cell::new(TextContainer::from_text(""))],
    ]);
    let original = table.clone();
    let mut deck = Document::new(vec![Slide::new(vec![Shape::table("Table", table)])]);
    let (provider, translator) = common::mock_translator(MockProvider::fixed("Gesamt"));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(report.total_units, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 3);
    let ShapeKind::Table(table) = &deck.slides[0].shapes[0].kind else {
        panic!("table shape expected");
    };
    assert_eq!(table.rows[0][1].text.full_text(), "Gesamt");
    assert_eq!(table.rows[0][0], original.rows[0][0]);
    assert_eq!(table.rows[1][0], original.rows[1][0]);
    assert_eq!(table.rows[1][1], original.rows[1][1]);
    assert!(!table.rows[1][0].text.is_modified());
}

#[tokio::test]
async fn test_echoTranslator_shouldLeaveDeckByteIdentical() {
    let paragraph = r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" b="1"/><a:t>Mixed </a:t></a:r><a:r><a:rPr lang="en-US" i="1"/><a:t>runs</a:t></a:r><a:br/><a:r><a:t>after break</a:t></a:r></a:p>"#;
    let bytes = DeckBuilder::new()
        .slide(
            SlideBuilder::new()
                .text_shape_xml("Body", paragraph)
                .table("Table", &[&["A", "B"]])
                .notes(&["Speaker", "notes"]),
        )
        .slide(SlideBuilder::new().text_shape("Closing", &["Thank you"]).picture("Logo"))
        .build();
    let mut deck = pptx::read(Cursor::new(bytes.clone())).unwrap();
    let before: Vec<String> = deck.text_containers().iter().map(|c| c.full_text()).collect();
    let (provider, translator) = common::mock_translator(MockProvider::echo());

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;
    assert!(report.is_complete());
    assert!(provider.call_count() > 0);

    let after: Vec<String> = deck.text_containers().iter().map(|c| c.full_text()).collect();
    assert_eq!(before, after);
    assert!(deck.text_containers().iter().all(|c| !c.is_modified()));

    let written = pptx::write(&deck, Cursor::new(Vec::new())).unwrap().into_inner();
    assert_eq!(common::package_entries(&written), common::package_entries(&bytes));
}

#[tokio::test]
async fn test_blankContainers_shouldNeverCallProvider() {
    let mut deck = Document::new(vec![Slide::new(vec![
        Shape::text("empty", TextContainer::from_text("")),
        Shape::text("spaces", TextContainer::from_text("  \n\t")),
        Shape::other("picture"),
    ])
    .with_notes(TextContainer::from_text(" "))]);
    let before: Vec<TextContainer> = deck.text_containers().into_iter().cloned().collect();
    let (provider, translator) = common::mock_translator(MockProvider::fixed("never"));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| panic!("no progress expected")).await;

    assert_eq!(provider.call_count(), 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total_units, 0);
    let after: Vec<TextContainer> = deck.text_containers().into_iter().cloned().collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_alwaysFailingProvider_shouldFailEachUnitOnceAndContinue() {
    let mut deck = Document::new(vec![
        Slide::new(vec![Shape::text("a", TextContainer::from_text("First"))]),
        Slide::new(vec![Shape::text("b", TextContainer::from_text("Second"))])
            .with_notes(TextContainer::from_text("Notes")),
    ]);
    let (provider, translator) = common::mock_translator(MockProvider::failing());

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;

    assert_eq!(provider.call_count(), 9);
    assert_eq!(report.failed, 3);
    assert_eq!(report.succeeded, 0);
    for outcome in &report.outcomes {
        assert_eq!(outcome.status, UnitStatus::Failed);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.error.is_some());
    }
    assert_eq!(text_of(&deck, 0, 0).full_text(), "First");
    assert!(!text_of(&deck, 0, 0).is_modified());
}

#[tokio::test]
async fn test_partialFailure_shouldOnlyAffectFailingUnit() {
    let mut deck = Document::new(vec![Slide::new(vec![
        Shape::text("a", TextContainer::from_text("One")),
        Shape::text("b", TextContainer::from_text("Two")),
        Shape::text("c", TextContainer::from_text("Three")),
    ])]);
    let (_, translator) = common::mock_translator(MockProvider::scripted(vec![
        Ok("Uno".to_string()),
        Err("down".to_string()),
        Err("down".to_string()),
        Err("down".to_string()),
        Ok("Tres".to_string()),
    ]));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;

    let statuses: Vec<UnitStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(statuses, vec![UnitStatus::Succeeded, UnitStatus::Failed, UnitStatus::Succeeded]);
    assert_eq!(text_of(&deck, 0, 0).full_text(), "Uno");
    assert_eq!(text_of(&deck, 0, 1).full_text(), "Two");
    assert_eq!(text_of(&deck, 0, 2).full_text(), "Tres");
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_walk_shouldVisitInPresentationOrderAndReportProgress() {
    let bytes = common::sample_deck().build();
    let mut deck = pptx::read(Cursor::new(bytes)).unwrap();
    let (provider, translator) = common::mock_translator(MockProvider::echo());
    let mut progress = Vec::new();

    let report = DocumentWalker::new(&translator)
        .walk(&mut deck, |processed, total| progress.push((processed, total)))
        .await;

    assert_eq!(report.total_units, 6);
    assert_eq!(progress, (1..=6).map(|i| (i, 6)).collect::<Vec<_>>());

    let sources: Vec<String> = provider
        .received_prompts()
        .iter()
        .map(|p| deck_translator::translation::prompts::source_text(p).unwrap().to_string())
        .collect();
    assert_eq!(
        sources,
        vec![
            "Quarterly Review",
            "Revenue grew\nCosts fell\nOutlook stable",
            "Mention the new region",
            "Region",
            "Sales",
            "North",
        ]
    );

    let locations: Vec<UnitLocation> = report.outcomes.iter().map(|o| o.location).collect();
    assert_eq!(locations[2], UnitLocation::Notes { slide: 0 });
    assert_eq!(
        locations[3],
        UnitLocation::TableCell {
            slide: 1,
            shape: 0,
            row: 0,
            column: 0
        }
    );
}

#[tokio::test]
async fn test_translatedDeck_shouldReopenWithNewText() {
    let bytes = common::sample_deck().build();
    let mut deck = pptx::read(Cursor::new(bytes)).unwrap();
    let (_, translator) = common::mock_translator(MockProvider::scripted(vec![
        Ok("Revisión trimestral".to_string()),
        Ok("Los ingresos crecieron\nLos costos bajaron".to_string()),
        Ok("Mencionar la nueva región".to_string()),
        Ok("Región".to_string()),
        Ok("Ventas".to_string()),
        Ok("Norte".to_string()),
    ]));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;
    assert_eq!(report.succeeded, 6);

    let written = pptx::write(&deck, Cursor::new(Vec::new())).unwrap().into_inner();
    let reopened = pptx::read(Cursor::new(written)).unwrap();

    assert_eq!(text_of(&reopened, 0, 0).full_text(), "Revisión trimestral");
    let body = text_of(&reopened, 0, 1);
    assert_eq!(body.paragraph_count(), 3);
    assert_eq!(body.full_text(), "Los ingresos crecieron\nLos costos bajaron\n");
    assert_eq!(reopened.slides[0].notes.as_ref().unwrap().full_text(), "Mencionar la nueva región");
    let ShapeKind::Table(table) = &reopened.slides[1].shapes[0].kind else {
        panic!("table shape expected");
    };
    assert_eq!(table.rows[1][0].text.full_text(), "Norte");
    assert!(table.rows[1][1].text.is_blank());
}

#[tokio::test]
async fn test_replyWithControlCharacters_shouldWriteWellFormedPart() {
    let bytes = DeckBuilder::new()
        .slide(SlideBuilder::new().text_shape("Title", &["Hello"]))
        .build();
    let mut deck = pptx::read(Cursor::new(bytes)).unwrap();
    let (_, translator) = common::mock_translator(MockProvider::fixed("Bon\u{1}jour\u{1b}"));

    let report = DocumentWalker::new(&translator).walk(&mut deck, |_, _| {}).await;
    assert_eq!(report.succeeded, 1);
    assert_eq!(text_of(&deck, 0, 0).full_text(), "Bonjour");

    let written = pptx::write(&deck, Cursor::new(Vec::new())).unwrap().into_inner();
    let (_, slide) = common::package_entries(&written)
        .into_iter()
        .find(|(name, _)| name == "ppt/slides/slide1.xml")
        .unwrap();
    let xml = String::from_utf8(slide).unwrap();
    assert!(xml.contains("Bonjour</a:t>"));
    assert!(!xml.contains('\u{1}'));
    assert!(!xml.contains('\u{1b}'));

    let reopened = pptx::read(Cursor::new(written)).unwrap();
    assert_eq!(text_of(&reopened, 0, 0).full_text(), "Bonjour");
}
