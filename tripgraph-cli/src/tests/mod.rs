//! Unit tests for tripgraph-cli: config loading, demo workers, runs and reports.
