//! Terminal presentation of assessments.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use colored::{ColoredString, Colorize};
use itertools::Itertools;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::{
    annotate::{Segment, map_annotations, segments},
    assessment::{
        AnnotationKind, AssessmentOrigin, AssessmentResult, DisplayColor, EssayTask, TaskKind,
    },
    catalog::{CatalogEntry, Difficulty},
};

/// One row of the criteria table.
#[derive(Tabled)]
struct CriterionRow {
    /// Human-readable criterion name.
    #[tabled(rename = "Criterion")]
    criterion: &'static str,
    /// Band awarded.
    #[tabled(rename = "Band")]
    band:      String,
    /// Examiner feedback.
    #[tabled(rename = "Feedback")]
    feedback:  String,
}

/// Paints `text` in the terminal color for `color`.
fn paint(text: &str, color: DisplayColor) -> ColoredString {
    match color {
        DisplayColor::Orange => text.truecolor(255, 165, 0),
        DisplayColor::Red => text.red(),
        DisplayColor::Yellow => text.yellow(),
        DisplayColor::Green => text.green(),
        DisplayColor::Blue => text.blue(),
    }
}

/// Renders the per-criterion bands and feedback as a table.
pub fn criteria_table(result: &AssessmentResult) -> String {
    let rows = result
        .criteria()
        .labelled()
        .into_iter()
        .map(|(criterion, score)| CriterionRow {
            criterion,
            band: score.score().to_string(),
            feedback: score.feedback().to_string(),
        })
        .collect::<Vec<_>>();

    Table::new(&rows)
        .with(Panel::header("Band Breakdown"))
        .with(Panel::footer(format!("Overall: {}", result.overall_band())))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(60).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

/// Renders `essay` with every placeable annotation underlined in its color
/// and numbered.
pub fn highlighted_essay(result: &AssessmentResult, essay: &str) -> String {
    let spans = map_annotations(essay, result.annotations());
    let mut marker = 0;
    segments(essay, &spans)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.to_string(),
            Segment::Highlight(text, annotation) => {
                marker += 1;
                format!(
                    "{}{}",
                    paint(text, annotation.display_color()).underline(),
                    format!("[{marker}]").dimmed()
                )
            }
        })
        .collect()
}

/// Numbered notes for the highlights produced by [`highlighted_essay`].
pub fn annotation_notes(result: &AssessmentResult, essay: &str) -> String {
    map_annotations(essay, result.annotations())
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let annotation = span.annotation;
            format!(
                "[{}] {} {} -> {}: {}",
                i + 1,
                paint(annotation.kind.label(), annotation.display_color()).bold(),
                annotation.original_text.strikethrough(),
                annotation.correction.green(),
                annotation.explanation
            )
        })
        .join("\n")
}

/// One-line legend of annotation colors.
pub fn legend() -> String {
    [
        AnnotationKind::Spelling,
        AnnotationKind::Grammar,
        AnnotationKind::VocabularyUpgrade,
        AnnotationKind::Style,
        AnnotationKind::Coherence,
    ]
    .into_iter()
    .map(|kind| paint(kind.label(), kind.display_color()).to_string())
    .join("  ")
}

/// Full report: header, table, annotated essay, corrections and summary.
pub fn report(task: &EssayTask, essay: &str, result: &AssessmentResult) -> String {
    let origin = match result.origin() {
        AssessmentOrigin::Backend => "examiner model".normal(),
        AssessmentOrigin::Offline => "offline estimate".yellow(),
    };
    let optimal = task.optimal_range();

    let mut out = vec![
        format!(
            "{} {}  ({origin})",
            "Overall band:".bold(),
            result.overall_band().to_string().bright_cyan().bold()
        ),
        format!(
            "{} {} words, {} (target {}-{})",
            "Length:".bold(),
            result.word_count(),
            result.word_count_status(),
            optimal.start(),
            optimal.end()
        ),
        criteria_table(result),
    ];

    if !result.annotations().is_empty() {
        out.push(format!("{}  {}", "Annotated essay".bold(), legend()));
        out.push(highlighted_essay(result, essay));
        let notes = annotation_notes(result, essay);
        if !notes.is_empty() {
            out.push(notes);
        }
    }

    if !result.corrections().is_empty() {
        out.push("Corrections".bold().to_string());
        out.push(
            result
                .corrections()
                .iter()
                .map(|c| {
                    format!(
                        "- {}\n  {}\n  {}",
                        c.original.red(),
                        c.corrected.green(),
                        c.explanation.dimmed()
                    )
                })
                .join("\n"),
        );
    }

    out.push(format!("{} {}", "Summary:".bold(), result.summary()));
    out.join("\n\n")
}

/// One row of the task catalog listing.
#[derive(Tabled)]
struct CatalogRow {
    /// Entry id.
    #[tabled(rename = "ID")]
    id:         &'static str,
    /// Task kind.
    #[tabled(rename = "Task")]
    kind:       TaskKind,
    /// Chart type or theme.
    #[tabled(rename = "Category")]
    category:   &'static str,
    /// Difficulty rating.
    #[tabled(rename = "Difficulty")]
    difficulty: Difficulty,
    /// Short title.
    #[tabled(rename = "Title")]
    title:      &'static str,
}

/// Renders the built-in task bank as a table.
pub fn catalog_table(entries: &'static [CatalogEntry]) -> String {
    let rows = entries
        .iter()
        .map(|entry| CatalogRow {
            id:         &entry.id,
            kind:       entry.kind,
            category:   &entry.category,
            difficulty: entry.difficulty,
            title:      &entry.title,
        })
        .collect::<Vec<_>>();

    Table::new(&rows)
        .with(Panel::header("Practice Tasks"))
        .with(Style::modern())
        .to_string()
}
