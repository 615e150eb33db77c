use recipe_fork::parse_timers;

#[test]
fn test_instruction_paragraph() {
    let text = "Sear the beef for 3-4 minutes per side. Braise for 2 hours and 30 minutes, \
                then let it rest another minute before slicing.";
    let timers = parse_timers(text);
    let seconds: Vec<u64> = timers.iter().map(|t| t.total_seconds).collect();
    let labels: Vec<&str> = timers.iter().map(|t| t.label.as_str()).collect();

    assert_eq!(seconds, vec![240, 9000, 60]);
    assert_eq!(labels, vec!["4 min", "2 hr 30 min", "1 min"]);
    for timer in &timers {
        assert_eq!(&text[timer.start_index..timer.end_index], timer.original_text);
    }
}

#[test]
fn test_offsets_are_bytes_after_multibyte_text() {
    let text = "Crème brûlée: bake 40 min";
    let timers = parse_timers(text);
    assert_eq!(timers.len(), 1);
    assert_eq!(&text[timers[0].start_index..timers[0].end_index], "40 min");
}

#[test]
fn test_compound_with_single_minute() {
    let timers = parse_timers("Cook 1 hour and 1 minute");
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].total_seconds, 3660);
    assert_eq!(timers[0].label, "1 hr 1 min");
}

#[test]
fn test_no_durations() {
    assert!(parse_timers("Season generously with salt.").is_empty());
    assert!(parse_timers("").is_empty());
}

#[test]
fn test_json_shape() {
    let timers = parse_timers("Rest 10 mins");
    let json = serde_json::to_value(&timers[0]).unwrap();
    assert_eq!(json["startIndex"], 5);
    assert_eq!(json["totalSeconds"], 600);
    assert_eq!(json["originalText"], "10 mins");
}
