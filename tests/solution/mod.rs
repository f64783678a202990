mod tests_incremental;
