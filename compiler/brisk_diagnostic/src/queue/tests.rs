use pretty_assertions::assert_eq;

use super::*;
use crate::ErrorCode;

fn error_at(code: ErrorCode, start: u32) -> Diagnostic {
    Diagnostic::error(code)
        .with_message(format!("error at {start}"))
        .with_label(Span::new(start, start + 1), "here")
}

#[test]
fn test_flush_sorts_by_location() {
    let mut queue = DiagnosticQueue::new();
    queue.add(error_at(ErrorCode::E4002, 20));
    queue.add(error_at(ErrorCode::E4001, 5));
    queue.add(Diagnostic::error(ErrorCode::E9001).with_message("no span"));

    let starts: Vec<Option<u32>> = queue
        .flush()
        .iter()
        .map(|d| d.primary_span().map(|s| s.start))
        .collect();
    assert_eq!(starts, vec![Some(5), Some(20), None]);
    assert!(queue.is_empty());
    assert!(!queue.has_errors());
}

#[test]
fn test_exact_duplicates_are_dropped() {
    let mut queue = DiagnosticQueue::new();
    assert!(queue.add(error_at(ErrorCode::E4001, 1)));
    assert!(!queue.add(error_at(ErrorCode::E4001, 1)));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_unlimited_keeps_duplicates() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
    queue.add(error_at(ErrorCode::E4001, 1));
    queue.add(error_at(ErrorCode::E4001, 1));
    assert_eq!(queue.error_count(), 2);
}

#[test]
fn test_error_limit() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
        error_limit: 2,
        deduplicate: true,
    });
    assert!(queue.add(error_at(ErrorCode::E4001, 1)));
    assert!(queue.add(error_at(ErrorCode::E4001, 2)));
    assert!(queue.limit_reached());
    assert!(!queue.add(error_at(ErrorCode::E4001, 3)));

    // Warnings are not subject to the error limit.
    assert!(queue.add(Diagnostic::warning(ErrorCode::E4002).with_message("w")));
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_vec_is_a_sink() {
    let mut sink: Vec<Diagnostic> = Vec::new();
    sink.emit(error_at(ErrorCode::E4005, 0));
    assert_eq!(sink.len(), 1);
}
