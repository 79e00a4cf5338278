/// Initialises `env_logger` for tests. The output is captured by the test
/// harness, so it is only shown for failing tests (or with `--nocapture`).
pub fn test_logger() {
    if cfg!(not(feature = "terma_miri")) {
        // Tests run in parallel, so the logger may already be initialised.
        let _ = env_logger::builder().is_test(true).try_init();
    }
}
