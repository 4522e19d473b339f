/// Routes `log` output through the test harness. Safe to call from every
/// test.
pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
