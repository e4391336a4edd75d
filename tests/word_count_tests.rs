use bandmark::assessment::{EssayTask, TaskKind, WordCountStatus, count_words, word_count_status};

#[test]
fn counts_whitespace_delimited_tokens() {
    assert_eq!(count_words(""), 0);
    assert_eq!(count_words("   \n\t "), 0);
    assert_eq!(count_words("one"), 1);
    assert_eq!(count_words("  one  two\nthree\tfour  "), 4);
    assert_eq!(count_words("well-being isn't hyphen-split"), 3);
}

#[test]
fn task2_boundaries() {
    let status = |n| word_count_status(TaskKind::Task2, n);
    assert_eq!(status(149), WordCountStatus::SeverelyUnderLength);
    assert_eq!(status(199), WordCountStatus::SeverelyUnderLength);
    assert_eq!(status(200), WordCountStatus::TooShortPenalized);
    assert_eq!(status(249), WordCountStatus::TooShortPenalized);
    assert_eq!(status(250), WordCountStatus::Optimal);
    assert_eq!(status(300), WordCountStatus::Optimal);
    assert_eq!(status(350), WordCountStatus::Optimal);
    assert_eq!(status(351), WordCountStatus::TooLongPenalized);
}

#[test]
fn task1_boundaries() {
    let status = |n| word_count_status(TaskKind::Task1, n);
    assert_eq!(status(99), WordCountStatus::SeverelyUnderLength);
    assert_eq!(status(100), WordCountStatus::TooShortPenalized);
    assert_eq!(status(149), WordCountStatus::TooShortPenalized);
    assert_eq!(status(150), WordCountStatus::Optimal);
    assert_eq!(status(250), WordCountStatus::Optimal);
    assert_eq!(status(251), WordCountStatus::TooLongPenalized);
}

#[test]
fn optimal_ranges_per_kind() {
    assert_eq!(TaskKind::Task1.optimal_range(), 150..=200);
    assert_eq!(TaskKind::Task2.optimal_range(), 250..=300);
    assert_eq!(EssayTask::new(TaskKind::Task2, "prompt").optimal_range(), 250..=300);
}

#[test]
fn status_serializes_to_display_labels() {
    for status in [
        WordCountStatus::Optimal,
        WordCountStatus::TooShortPenalized,
        WordCountStatus::SeverelyUnderLength,
        WordCountStatus::TooLongPenalized,
    ] {
        let json = serde_json::to_string(&status).expect("serialize");
        assert_eq!(json, format!("\"{status}\""));
    }
}

#[test]
fn task_kind_parses_loosely() {
    assert_eq!("task1".parse::<TaskKind>().expect("parse"), TaskKind::Task1);
    assert_eq!(" Task2 ".parse::<TaskKind>().expect("parse"), TaskKind::Task2);
    assert_eq!("2".parse::<TaskKind>().expect("parse"), TaskKind::Task2);
    assert!("task3".parse::<TaskKind>().is_err());
}
