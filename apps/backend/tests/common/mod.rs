//! Shared bootstrap for integration tests.

#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}
