/*!
 * Tests for formatting snapshots and paragraph reconciliation
 */

use deck_translator::document::{
    Alignment, FontSize, FormattingAttributes, Paragraph, RgbColor, Run, TextContainer, Underline,
};
use deck_translator::translation::FormattingSnapshot;

fn bold_italic() -> FormattingAttributes {
    FormattingAttributes {
        bold: Some(true),
        italic: Some(true),
        ..FormattingAttributes::default()
    }
}

fn container_with(count: usize) -> TextContainer {
    TextContainer::new(
        (0..count)
            .map(|i| {
                Paragraph::with_runs(vec![
                    Run::new(format!("line {}", i)).formatted(FormattingAttributes {
                        size: Some(FontSize::from_points(18 + i as u32)),
                        ..FormattingAttributes::default()
                    }),
                    Run::new(" tail"),
                ])
                .at_level(i as u8)
            })
            .collect(),
    )
}

#[test]
fn test_apply_paragraphCount_shouldStayWithinBounds() {
    for original in 1..=4 {
        for translated in 1..=4 {
            let mut container = container_with(original);
            let snapshot = FormattingSnapshot::capture(&container);
            let lines: Vec<String> = (0..translated).map(|i| format!("t{}", i)).collect();
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

            snapshot.apply(&mut container, &lines);

            let count = container.paragraph_count();
            assert!(count >= original.min(translated), "{} -> {}: {}", original, translated, count);
            assert!(count <= original.max(translated), "{} -> {}: {}", original, translated, count);
            assert_eq!(count, original.max(translated));
        }
    }
}

#[test]
fn test_apply_eachLine_shouldBecomeSingleRunWithFirstRunFormat() {
    let mut container = container_with(2);
    let snapshot = FormattingSnapshot::capture(&container);

    snapshot.apply(&mut container, &["eins", "zwei", "drei"]);

    let paragraphs = container.paragraphs();
    assert_eq!(paragraphs.len(), 3);
    for (i, paragraph) in paragraphs.iter().take(2).enumerate() {
        assert_eq!(paragraph.runs().len(), 1);
        assert_eq!(paragraph.runs()[0].format.size, Some(FontSize::from_points(18 + i as u32)));
        assert_eq!(paragraph.level, Some(i as u8));
    }
    // The appended paragraph inherits defaults
    assert_eq!(paragraphs[2].runs().len(), 1);
    assert!(paragraphs[2].runs()[0].format.is_empty());
    assert_eq!(paragraphs[2].level, None);
    assert_eq!(container.full_text(), "eins\nzwei\ndrei");
}

#[test]
fn test_apply_fewerLines_shouldClearButKeepParagraphs() {
    let mut container = container_with(3);
    let snapshot = FormattingSnapshot::capture(&container);

    snapshot.apply(&mut container, &["only"]);

    assert_eq!(container.paragraph_count(), 3);
    assert_eq!(container.paragraphs()[0].text(), "only");
    assert!(container.paragraphs()[1].runs().is_empty());
    assert!(container.paragraphs()[2].runs().is_empty());
    // Layout of cleared paragraphs is untouched
    assert_eq!(container.paragraphs()[2].level, Some(2));
}

#[test]
fn test_apply_absentAttributes_shouldNotOverwriteExisting() {
    // Paragraph 0 sets nothing; paragraph 1 sets everything
    let full = FormattingAttributes {
        bold: Some(false),
        italic: Some(true),
        underline: Some(Underline::Double),
        size: Some(FontSize(2400)),
        font_name: Some("Calibri".to_string()),
        color: Some(RgbColor([0x11, 0x22, 0x33])),
    };
    let mut container = TextContainer::new(vec![
        Paragraph::from_text("plain"),
        Paragraph::with_runs(vec![Run::new("styled").formatted(full.clone())]).aligned(Alignment::Right),
    ]);
    let snapshot = FormattingSnapshot::capture(&container);

    snapshot.apply(&mut container, &["schlicht", "gestaltet"]);

    assert!(container.paragraphs()[0].runs()[0].format.is_empty());
    assert_eq!(container.paragraphs()[0].alignment, None);
    assert_eq!(container.paragraphs()[1].runs()[0].format, full);
    assert_eq!(container.paragraphs()[1].alignment, Some(Alignment::Right));
}

#[test]
fn test_restyle_onSameContainer_shouldBeNoOp() {
    let mut container = TextContainer::new(vec![
        Paragraph::with_runs(vec![Run::new("Hello").formatted(bold_italic()), Run::new(" world")])
            .aligned(Alignment::Center),
        Paragraph::new().at_level(1),
        Paragraph::from_text("third"),
    ]);
    let before = container.clone();
    let snapshot = FormattingSnapshot::capture(&container);

    snapshot.restyle(&mut container);
    assert_eq!(container, before);

    // Capturing again after restyling yields the same snapshot
    assert_eq!(FormattingSnapshot::capture(&container), snapshot);
}

#[test]
fn test_capture_zeroRunParagraph_shouldRecordLayoutOnly() {
    let container = TextContainer::new(vec![Paragraph::new().aligned(Alignment::Justify).at_level(3)]);
    let snapshot = FormattingSnapshot::capture(&container);

    let format = snapshot.get(0).unwrap();
    assert_eq!(format.alignment, Some(Alignment::Justify));
    assert_eq!(format.level, Some(3));
    assert!(format.first_run.is_none());
}
