mod property_cache_tests;
mod stats_tests;
