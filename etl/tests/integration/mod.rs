mod loader_test;
mod pipeline_test;
mod postgres_store_test;
mod source_test;
