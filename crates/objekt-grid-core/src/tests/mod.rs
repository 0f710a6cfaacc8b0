mod background_tests;
mod runtime_tests;
