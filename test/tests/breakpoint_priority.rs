use intercession_shared::TsBreakpointQueue;

fn queue() -> TsBreakpointQueue<&'static str> {
    let queue = TsBreakpointQueue::new();
    for item in ["a", "b", "c"] {
        queue.push_back(item);
    }
    queue
}

#[test]
fn ordinary_reader_waits_for_the_catch_up_reader() {
    let queue = queue();
    queue.set_breakpoint_at_begin();

    assert!(queue.pop_front().is_none());
    assert_eq!(queue.len(), 3);

    assert_eq!(queue.pop_at_breakpoint(), Some("a"));
    assert_eq!(queue.pop_front(), Some(("a", 2)));
    assert!(queue.pop_front().is_none());

    assert_eq!(queue.pop_at_breakpoint(), Some("b"));
    assert_eq!(queue.pop_at_breakpoint(), Some("c"));
    assert_eq!(queue.pop_at_breakpoint(), None);
    assert!(queue.breakpoint_at_end());

    assert_eq!(queue.pop_front(), Some(("b", 1)));
    assert_eq!(queue.pop_front(), Some(("c", 0)));
}

#[test]
fn removing_the_breakpoint_releases_the_reader() {
    let queue = queue();
    queue.set_breakpoint_at_begin();
    assert!(queue.pop_front().is_none());

    queue.remove_breakpoint();
    assert_eq!(queue.pop_front(), Some(("a", 2)));
}

#[test]
fn insertion_at_breakpoint_lands_before_the_cursor() {
    let queue = queue();
    queue.set_breakpoint_at_begin();
    queue.pop_at_breakpoint();

    assert_eq!(queue.push_at_breakpoint("x"), Some(4));
    assert_eq!(queue.pop_at_breakpoint(), Some("b"));
    assert_eq!(queue.snapshot(), vec!["a", "x", "b", "c"]);
}

#[test]
fn push_at_breakpoint_without_one_is_refused() {
    let queue = queue();
    assert_eq!(queue.push_at_breakpoint("x"), None);
    assert_eq!(queue.len(), 3);
}
